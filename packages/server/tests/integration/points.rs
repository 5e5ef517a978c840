use serde_json::json;

use crate::common::{TestApp, VALID_SIGNATURE, routes};

fn points_event(id: &str, user_id: i32) -> serde_json::Value {
    json!({
        "id": id,
        "event_type": "checkout.session.completed",
        "event": {
            "type": "points_purchased",
            "user_id": user_id,
            "package_id": "starter",
            "points": 500,
            "session_id": "cs_points_1",
        },
    })
}

mod purchases {
    use super::*;

    #[tokio::test]
    async fn packages_come_from_configuration() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;

        let res = app.get_with_token(routes::POINTS_PACKAGES, &member).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body[0]["id"], "starter");
        assert_eq!(res.body[0]["points"], 500);
    }

    #[tokio::test]
    async fn purchase_returns_a_checkout_session() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;

        let res = app
            .post_with_token(routes::POINTS_PURCHASE, &json!({"package_id": "starter"}), &member)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["checkout_url"].as_str().unwrap().starts_with("https://"));

        let unknown = app
            .post_with_token(routes::POINTS_PURCHASE, &json!({"package_id": "mega"}), &member)
            .await;
        assert_eq!(unknown.status, 400);
        assert!(unknown.body["fields"]["package_id"].is_string());
    }
}

mod webhooks {
    use super::*;

    #[tokio::test]
    async fn completed_checkout_credits_points_exactly_once() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;
        let user_id = app.user_id("ada@example.com").await;
        let event = points_event("evt_1", user_id);

        let first = app.post_webhook(&event, VALID_SIGNATURE).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["duplicate"], false);

        let second = app.post_webhook(&event, VALID_SIGNATURE).await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["duplicate"], true);

        let balance = app.get_with_token(routes::POINTS_BALANCE, &member).await;
        assert_eq!(balance.body["balance"], 500);

        let history = app
            .get_with_token(&format!("{}?kind=purchased", routes::POINTS_TRANSACTIONS), &member)
            .await;
        assert_eq!(history.body["pagination"]["total"], 1);
        assert_eq!(history.body["data"][0]["balance_after"], 500);

        let unread = app.get_with_token(routes::UNREAD_COUNT, &member).await;
        assert_eq!(unread.body["count"], 1);
    }

    #[tokio::test]
    async fn bad_signatures_are_rejected() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;
        let user_id = app.user_id("ada@example.com").await;

        let res = app.post_webhook(&points_event("evt_1", user_id), "forged").await;
        assert_eq!(res.status, 400);

        let balance = app.get_with_token(routes::POINTS_BALANCE, &member).await;
        assert_eq!(balance.body["balance"], 0);
    }

    #[tokio::test]
    async fn subscription_events_update_the_membership() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;
        let user_id = app.user_id("ada@example.com").await;

        let checkout = app
            .post_with_token(routes::SUBSCRIPTION_CHECKOUT, &json!({"tier": "pro"}), &member)
            .await;
        assert_eq!(checkout.status, 200, "{}", checkout.text);

        let started = json!({
            "id": "evt_sub_1",
            "event_type": "checkout.session.completed",
            "event": {
                "type": "subscription_started",
                "user_id": user_id,
                "customer_id": format!("cus_test_{user_id}"),
                "subscription_id": "sub_1",
            },
        });
        assert_eq!(app.post_webhook(&started, VALID_SIGNATURE).await.status, 200);

        let changed = json!({
            "id": "evt_sub_2",
            "event_type": "customer.subscription.updated",
            "event": {
                "type": "subscription_changed",
                "customer_id": format!("cus_test_{user_id}"),
                "subscription_id": "sub_1",
                "status": "active",
                "tier": "pro",
            },
        });
        assert_eq!(app.post_webhook(&changed, VALID_SIGNATURE).await.status, 200);

        let sub = app.get_with_token(routes::SUBSCRIPTION, &member).await;
        assert_eq!(sub.body["tier"], "pro");
        assert_eq!(sub.body["active"], true);

        let again = app
            .post_with_token(routes::SUBSCRIPTION_CHECKOUT, &json!({"tier": "creator"}), &member)
            .await;
        assert_eq!(again.status, 409);

        let cancel = app
            .post_with_token(routes::SUBSCRIPTION_CANCEL, &json!({}), &member)
            .await;
        assert_eq!(cancel.status, 200);

        let canceled = json!({
            "id": "evt_sub_3",
            "event_type": "customer.subscription.deleted",
            "event": {
                "type": "subscription_changed",
                "customer_id": format!("cus_test_{user_id}"),
                "subscription_id": "sub_1",
                "status": "canceled",
                "tier": null,
            },
        });
        assert_eq!(app.post_webhook(&canceled, VALID_SIGNATURE).await.status, 200);

        let sub = app.get_with_token(routes::SUBSCRIPTION, &member).await;
        assert_eq!(sub.body["tier"], "free");
        assert_eq!(sub.body["status"], "canceled");
        assert_eq!(sub.body["active"], false);
    }

    #[tokio::test]
    async fn free_tier_cannot_be_checked_out() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;

        let res = app
            .post_with_token(routes::SUBSCRIPTION_CHECKOUT, &json!({"tier": "free"}), &member)
            .await;
        assert_eq!(res.status, 400);

        let cancel = app
            .post_with_token(routes::SUBSCRIPTION_CANCEL, &json!({}), &member)
            .await;
        assert_eq!(cancel.status, 404);
    }
}
