use serde_json::json;

use crate::common::{PASSWORD, SIGNUP_BONUS, TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_and_receives_a_verification_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "Ada@Example.com", "password": PASSWORD, "display_name": "Ada"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["email"], "ada@example.com");

        let mail = app.wait_for_mail("ada@example.com", "Confirm your email").await;
        assert!(!TestApp::token_from(&mail).is_empty());
    }

    #[tokio::test]
    async fn email_addresses_are_unique_regardless_of_case() {
        let app = TestApp::spawn().await;
        app.register("ada@example.com", "Ada").await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "ADA@example.com", "password": PASSWORD, "display_name": "Other"}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.code(), "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn invalid_fields_are_reported_individually() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"email": "not-an-email", "password": "short", "display_name": ""}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert!(res.body["fields"]["email"].is_string());
        assert!(res.body["fields"]["password"].is_string());
        assert!(res.body["fields"]["display_name"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::REGISTER, &json!({"email": 12}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_a_token_with_member_permissions() {
        let app = TestApp::spawn().await;
        app.register("ada@example.com", "Ada").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["role"], "member");
        let permissions: Vec<&str> = res.body["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p.as_str())
            .collect();
        assert!(permissions.contains(&"contest:apply"));
        assert!(!permissions.contains(&"contest:create"));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.register("ada@example.com", "Ada").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": "wrong-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = TestApp::spawn().await;

        let missing = app.get_without_token(routes::ME).await;
        assert_eq!(missing.status, 401);
        assert_eq!(missing.code(), "TOKEN_MISSING");

        let invalid = app.get_with_token(routes::ME, "not.a.jwt").await;
        assert_eq!(invalid.status, 401);
        assert_eq!(invalid.code(), "TOKEN_INVALID");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_current_account() {
        let app = TestApp::spawn().await;
        let token = app.create_member("ada@example.com").await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "ada@example.com");
        assert_eq!(res.body["points_balance"], 0);
        assert_eq!(res.body["email_verified"], false);
        assert_eq!(res.body["subscription_tier"], "free");
    }

    #[tokio::test]
    async fn changing_password_requires_the_current_one() {
        let app = TestApp::spawn().await;
        let token = app.create_member("ada@example.com").await;

        let res = app
            .patch_with_token(
                routes::ME,
                &json!({"current_password": "wrong-password", "new_password": "another-secret"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["current_password"].is_string());

        let res = app
            .patch_with_token(
                routes::ME,
                &json!({"current_password": PASSWORD, "new_password": "another-secret", "display_name": "Countess"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["display_name"], "Countess");

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": "another-secret"}),
            )
            .await;
        assert_eq!(login.status, 200);
    }
}

mod email_verification {
    use super::*;

    #[tokio::test]
    async fn verifying_credits_the_signup_bonus_once() {
        let app = TestApp::spawn().await;
        let token = app.create_member("ada@example.com").await;
        let mail = app.wait_for_mail("ada@example.com", "Confirm your email").await;
        let verification = TestApp::token_from(&mail);

        let res = app
            .post_without_token(routes::VERIFY_EMAIL, &json!({"token": verification}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.body["email_verified"], true);
        assert_eq!(me.body["points_balance"], SIGNUP_BONUS);

        // Tokens are single use.
        let again = app
            .post_without_token(routes::VERIFY_EMAIL, &json!({"token": verification}))
            .await;
        assert_eq!(again.status, 400);
        assert_eq!(again.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn expired_verification_token_is_rejected() {
        use sea_orm::{ActiveModelTrait, Set};
        use server::entity::user;

        let app = TestApp::spawn().await;
        let id = app.register("ada@example.com", "Ada").await;
        let mail = app.wait_for_mail("ada@example.com", "Confirm your email").await;

        let mut active: user::ActiveModel = app.find_user(id).await.into();
        active.verification_expires_at =
            Set(Some(chrono::Utc::now() - chrono::Duration::minutes(1)));
        active.update(&app.db).await.unwrap();

        let res = app
            .post_without_token(
                routes::VERIFY_EMAIL,
                &json!({"token": TestApp::token_from(&mail)}),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn concurrent_verifications_credit_the_bonus_once() {
        use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
        use server::entity::points_transaction;

        let app = TestApp::spawn().await;
        let id = app.register("ada@example.com", "Ada").await;
        let mail = app.wait_for_mail("ada@example.com", "Confirm your email").await;
        let body = json!({"token": TestApp::token_from(&mail)});

        let (first, second) = tokio::join!(
            app.post_without_token(routes::VERIFY_EMAIL, &body),
            app.post_without_token(routes::VERIFY_EMAIL, &body),
        );
        let mut statuses = [first.status, second.status];
        statuses.sort();
        assert_eq!(statuses, [200, 400]);

        assert_eq!(app.find_user(id).await.points_balance, SIGNUP_BONUS);
        let rows = points_transaction::Entity::find()
            .filter(points_transaction::Column::UserId.eq(id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn resend_is_refused_once_verified() {
        let app = TestApp::spawn().await;
        let token = app.create_member("ada@example.com").await;

        let res = app
            .post_with_token(routes::RESEND_VERIFICATION, &json!({}), &token)
            .await;
        assert_eq!(res.status, 202, "{}", res.text);

        // The resend replaced the token from the registration email.
        let mail = app
            .wait_for_nth_mail("ada@example.com", "Confirm your email", 2)
            .await;
        let res = app
            .post_without_token(
                routes::VERIFY_EMAIL,
                &json!({"token": TestApp::token_from(&mail)}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .post_with_token(routes::RESEND_VERIFICATION, &json!({}), &token)
            .await;
        assert_eq!(res.status, 409);
    }
}

mod password_reset {
    use super::*;

    #[tokio::test]
    async fn forgot_password_does_not_reveal_unknown_addresses() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "nobody@example.com"}))
            .await;

        assert_eq!(res.status, 202);
    }

    #[tokio::test]
    async fn reset_link_sets_a_new_password() {
        let app = TestApp::spawn().await;
        app.register("ada@example.com", "Ada").await;

        let res = app
            .post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "ada@example.com"}))
            .await;
        assert_eq!(res.status, 202);

        let mail = app.wait_for_mail("ada@example.com", "Reset your password").await;
        let reset = TestApp::token_from(&mail);

        let res = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({"token": reset, "new_password": "brand-new-secret"}),
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": "brand-new-secret"}),
            )
            .await;
        assert_eq!(login.status, 200);

        let reused = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({"token": reset, "new_password": "yet-another-one"}),
            )
            .await;
        assert_eq!(reused.status, 400);
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        use sea_orm::{ActiveModelTrait, Set};
        use server::entity::user;

        let app = TestApp::spawn().await;
        let id = app.register("ada@example.com", "Ada").await;
        app.post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "ada@example.com"}))
            .await;
        let mail = app.wait_for_mail("ada@example.com", "Reset your password").await;

        let mut active: user::ActiveModel = app.find_user(id).await.into();
        active.reset_expires_at = Set(Some(chrono::Utc::now() - chrono::Duration::minutes(1)));
        active.update(&app.db).await.unwrap();

        let res = app
            .post_without_token(
                routes::RESET_PASSWORD,
                &json!({"token": TestApp::token_from(&mail), "new_password": "brand-new-secret"}),
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "TOKEN_EXPIRED");

        app.login("ada@example.com").await;
    }

    #[tokio::test]
    async fn a_reset_token_works_only_once_under_concurrency() {
        let app = TestApp::spawn().await;
        app.register("ada@example.com", "Ada").await;
        app.post_without_token(routes::FORGOT_PASSWORD, &json!({"email": "ada@example.com"}))
            .await;
        let mail = app.wait_for_mail("ada@example.com", "Reset your password").await;
        let reset = TestApp::token_from(&mail);

        let (first, second) = tokio::join!(
            app.post_without_token(
                routes::RESET_PASSWORD,
                &json!({"token": reset, "new_password": "first-new-secret"}),
            ),
            app.post_without_token(
                routes::RESET_PASSWORD,
                &json!({"token": reset, "new_password": "second-new-secret"}),
            ),
        );
        let mut statuses = [first.status, second.status];
        statuses.sort();
        assert_eq!(statuses, [200, 400]);
    }
}
