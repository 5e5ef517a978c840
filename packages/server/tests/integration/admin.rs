use serde_json::json;

use crate::common::{TestApp, routes};

mod users {
    use super::*;

    #[tokio::test]
    async fn admins_can_search_users() {
        let app = TestApp::spawn().await;
        let admin = app.create_bass_admin().await;
        app.register("ada@example.com", "Ada Lovelace").await;
        app.register("grace@example.com", "Grace Hopper").await;

        let res = app
            .get_with_token(&format!("{}?search=LOVELACE", routes::ADMIN_USERS), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["email"], "ada@example.com");

        let members = app
            .get_with_token(&format!("{}?role=member", routes::ADMIN_USERS), &admin)
            .await;
        assert_eq!(members.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn brand_admins_cannot_manage_users() {
        let app = TestApp::spawn().await;
        let brand = app.create_brand_admin().await;

        let res = app.get_with_token(routes::ADMIN_USERS, &brand).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn role_changes_apply_on_next_login() {
        let app = TestApp::spawn().await;
        let admin = app.create_bass_admin().await;
        let id = app.register("ada@example.com", "Ada").await;

        let res = app
            .patch_with_token(&routes::admin_user(id), &json!({"role": "brand_admin"}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "brand_admin");

        let token = app.login("ada@example.com").await;
        let me = app.get_with_token(routes::ME, &token).await;
        assert_eq!(me.body["role"], "brand_admin");

        let bad = app
            .patch_with_token(&routes::admin_user(id), &json!({"role": "overlord"}), &admin)
            .await;
        assert_eq!(bad.status, 400);
    }

    #[tokio::test]
    async fn admins_cannot_change_their_own_role() {
        let app = TestApp::spawn().await;
        let admin = app.create_bass_admin().await;
        let id = app.user_id("bass@studio.test").await;

        let res = app
            .patch_with_token(&routes::admin_user(id), &json!({"role": "member"}), &admin)
            .await;
        assert_eq!(res.status, 400);
    }
}

mod points {
    use super::*;

    #[tokio::test]
    async fn adjustments_cannot_overdraw() {
        let app = TestApp::spawn().await;
        let admin = app.create_bass_admin().await;
        let id = app.register("ada@example.com", "Ada").await;

        let credit = app
            .post_with_token(
                routes::ADMIN_ADJUST_POINTS,
                &json!({"user_id": id, "amount": 40, "reason": "Goodwill"}),
                &admin,
            )
            .await;
        assert_eq!(credit.status, 201);
        assert_eq!(credit.body["balance_after"], 40);
        assert_eq!(credit.body["kind"], "adjusted");

        let debit = app
            .post_with_token(
                routes::ADMIN_ADJUST_POINTS,
                &json!({"user_id": id, "amount": -50, "reason": "Chargeback"}),
                &admin,
            )
            .await;
        assert_eq!(debit.status, 400);
        assert_eq!(debit.code(), "INSUFFICIENT_POINTS");

        assert_eq!(app.find_user(id).await.points_balance, 40);
    }

    #[tokio::test]
    async fn zero_adjustments_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_bass_admin().await;
        let id = app.register("ada@example.com", "Ada").await;

        let res = app
            .post_with_token(
                routes::ADMIN_ADJUST_POINTS,
                &json!({"user_id": id, "amount": 0, "reason": "Nothing"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["amount"].is_string());
    }
}

mod analytics {
    use super::*;

    #[tokio::test]
    async fn analytics_summarise_activity() {
        let app = TestApp::spawn().await;
        let admin = app.create_bass_admin().await;
        let member = app.create_member("ada@example.com").await;
        let user_id = app.user_id("ada@example.com").await;
        let contest = app.create_open_contest(&admin, "Spot").await;
        app.create_draft_contest(&admin, "Later", None).await;
        app.apply(contest, &member).await;
        app.post_with_token(
            routes::ADMIN_ADJUST_POINTS,
            &json!({"user_id": user_id, "amount": 75, "reason": "Goodwill"}),
            &admin,
        )
        .await;

        let res = app.get_with_token(routes::ADMIN_ANALYTICS, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["users"]["total"], 2);
        assert_eq!(res.body["users"]["by_role"]["member"], 1);
        assert_eq!(res.body["contests_by_status"]["open"], 1);
        assert_eq!(res.body["contests_by_status"]["draft"], 1);
        assert_eq!(res.body["applications_by_status"]["pending"], 1);
        assert_eq!(res.body["points"]["adjusted"], 75);
        assert_eq!(res.body["points"]["outstanding"], 75);
    }

    #[tokio::test]
    async fn members_cannot_view_analytics() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;

        let res = app.get_with_token(routes::ADMIN_ANALYTICS, &member).await;
        assert_eq!(res.status, 403);
    }
}
