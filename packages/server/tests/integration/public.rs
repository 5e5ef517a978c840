use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn public_contests_skip_drafts_without_authentication() {
    let app = TestApp::spawn().await;
    let admin = app.create_brand_admin().await;
    app.create_draft_contest(&admin, "Secret", None).await;
    app.create_open_contest(&admin, "Summer Reel").await;

    let res = app.get_without_token(routes::PUBLIC_CONTESTS).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 1);
    assert_eq!(res.body["data"][0]["title"], "Summer Reel");
    assert!(res.body["data"][0].get("created_by").is_none());
}

#[tokio::test]
async fn public_contests_accept_out_of_range_pages() {
    let app = TestApp::spawn().await;
    let admin = app.create_brand_admin().await;
    app.create_open_contest(&admin, "Summer Reel").await;

    let res = app
        .get_without_token(&format!(
            "{}?page=1000000000000000000&per_page=100",
            routes::PUBLIC_CONTESTS
        ))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 1);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn public_giveaways_are_listed() {
    let app = TestApp::spawn().await;
    let admin = app.create_brand_admin().await;
    app.create_active_giveaway(&admin, 10, Some(100)).await;

    let res = app.get_without_token(routes::PUBLIC_GIVEAWAYS).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["data"][0]["entry_cost"], 10);
    assert_eq!(res.body["data"][0]["status"], "active");
}

#[tokio::test]
async fn contact_form_forwards_to_the_inbox() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::CONTACT,
            &json!({
                "name": "Grace Hopper",
                "email": "grace@example.com",
                "subject": "Commercial shoot",
                "message": "Are you free in March?",
            }),
        )
        .await;
    assert_eq!(res.status, 202, "{}", res.text);

    let mail = app.wait_for_mail("hello@studio.test", "Commercial shoot").await;
    assert!(mail.body_text.unwrap().contains("Are you free in March?"));
}

#[tokio::test]
async fn contact_form_validates_fields() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(
            routes::CONTACT,
            &json!({"name": "", "email": "nope", "subject": "Hi", "message": ""}),
        )
        .await;

    assert_eq!(res.status, 400);
    assert!(res.body["fields"]["name"].is_string());
    assert!(res.body["fields"]["email"].is_string());
    assert!(res.body["fields"]["message"].is_string());
}
