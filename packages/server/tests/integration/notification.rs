use serde_json::json;

use crate::common::{TestApp, routes};

/// Give ada `n` notifications through admin point adjustments.
async fn notified_member(app: &TestApp, n: i64) -> String {
    let admin = app.create_bass_admin().await;
    let member = app.create_member("ada@example.com").await;
    let user_id = app.user_id("ada@example.com").await;
    for i in 1..=n {
        let res = app
            .post_with_token(
                routes::ADMIN_ADJUST_POINTS,
                &json!({"user_id": user_id, "amount": i, "reason": "Thanks"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }
    member
}

#[tokio::test]
async fn notifications_are_listed_newest_first() {
    let app = TestApp::spawn().await;
    let member = notified_member(&app, 2).await;

    let res = app.get_with_token(routes::NOTIFICATIONS, &member).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["pagination"]["total"], 2);
    let first = res.body["data"][0]["id"].as_i64().unwrap();
    let second = res.body["data"][1]["id"].as_i64().unwrap();
    assert!(first > second);
}

#[tokio::test]
async fn marking_read_updates_the_unread_count() {
    let app = TestApp::spawn().await;
    let member = notified_member(&app, 3).await;

    let unread = app.get_with_token(routes::UNREAD_COUNT, &member).await;
    assert_eq!(unread.body["count"], 3);

    let list = app.get_with_token(routes::NOTIFICATIONS, &member).await;
    let id = list.body["data"][0]["id"].as_i64().unwrap() as i32;
    let res = app
        .post_with_token(&routes::notification_read(id), &json!({}), &member)
        .await;
    assert_eq!(res.status, 200);
    assert!(res.body["read_at"].is_string());

    let unread_only = app
        .get_with_token(&format!("{}?unread_only=true", routes::NOTIFICATIONS), &member)
        .await;
    assert_eq!(unread_only.body["pagination"]["total"], 2);

    let res = app.post_with_token(routes::READ_ALL, &json!({}), &member).await;
    assert_eq!(res.body["updated"], 2);

    let unread = app.get_with_token(routes::UNREAD_COUNT, &member).await;
    assert_eq!(unread.body["count"], 0);
}

#[tokio::test]
async fn other_users_notifications_are_not_found() {
    let app = TestApp::spawn().await;
    let member = notified_member(&app, 1).await;
    let other = app.create_member("grace@example.com").await;

    let list = app.get_with_token(routes::NOTIFICATIONS, &member).await;
    let id = list.body["data"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .post_with_token(&routes::notification_read(id), &json!({}), &other)
        .await;
    assert_eq!(res.status, 404);
}
