use serde_json::json;

use crate::common::{TestApp, routes};

mod entries {
    use super::*;

    #[tokio::test]
    async fn entering_spends_points_and_records_the_entry() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        app.set_balance("ada@example.com", 50).await;
        let id = app.create_active_giveaway(&admin, 30, None).await;

        let res = app.post_with_token(&routes::giveaway_enter(id), &json!({}), &member).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["entry_number"], 1);
        assert_eq!(res.body["points_spent"], 30);

        let balance = app.get_with_token(routes::POINTS_BALANCE, &member).await;
        assert_eq!(balance.body["balance"], 20);

        let history = app.get_with_token(routes::POINTS_TRANSACTIONS, &member).await;
        assert_eq!(history.body["data"][0]["kind"], "spent");
        assert_eq!(history.body["data"][0]["amount"], -30);
        assert_eq!(history.body["data"][0]["reference_type"], "giveaway");

        let again = app.post_with_token(&routes::giveaway_enter(id), &json!({}), &member).await;
        assert_eq!(again.status, 409);

        let mine = app.get_with_token(&routes::giveaway_entry(id), &member).await;
        assert_eq!(mine.status, 200);
        assert_eq!(mine.body["status"], "entered");
    }

    #[tokio::test]
    async fn entering_without_enough_points_fails_and_changes_nothing() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        app.set_balance("ada@example.com", 10).await;
        let id = app.create_active_giveaway(&admin, 30, None).await;

        let res = app.post_with_token(&routes::giveaway_enter(id), &json!({}), &member).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "INSUFFICIENT_POINTS");

        let giveaway = app.get_with_token(&routes::giveaway(id), &member).await;
        assert_eq!(giveaway.body["entry_count"], 0);
        let balance = app.get_with_token(routes::POINTS_BALANCE, &member).await;
        assert_eq!(balance.body["balance"], 10);
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let ada = app.create_member("ada@example.com").await;
        let grace = app.create_member("grace@example.com").await;
        let id = app.create_active_giveaway(&admin, 0, Some(1)).await;

        let first = app.post_with_token(&routes::giveaway_enter(id), &json!({}), &ada).await;
        assert_eq!(first.status, 201);
        let second = app.post_with_token(&routes::giveaway_enter(id), &json!({}), &grace).await;
        assert_eq!(second.status, 400);
        assert_eq!(second.code(), "CAPACITY_REACHED");
    }

    #[tokio::test]
    async fn ended_giveaways_refuse_entries() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_active_giveaway(&admin, 0, None).await;
        app.end_giveaway(id).await;

        let res = app.post_with_token(&routes::giveaway_enter(id), &json!({}), &member).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "DEADLINE_PASSED");
    }

    #[tokio::test]
    async fn giveaways_with_entries_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_active_giveaway(&admin, 0, None).await;
        app.post_with_token(&routes::giveaway_enter(id), &json!({}), &member).await;

        let res = app.delete_with_token(&routes::giveaway(id), &admin).await;
        assert_eq!(res.status, 409);

        let empty = app.create_active_giveaway(&admin, 0, None).await;
        let res = app.delete_with_token(&routes::giveaway(empty), &admin).await;
        assert_eq!(res.status, 204);
    }
}

mod drawing {
    use super::*;

    /// Ended giveaway with one free entry per email; returns the giveaway id.
    async fn ended_giveaway_with_entrants(app: &TestApp, admin: &str, emails: &[&str]) -> i32 {
        let id = app.create_active_giveaway(admin, 0, None).await;
        for email in emails {
            let token = app.create_member(email).await;
            let res = app.post_with_token(&routes::giveaway_enter(id), &json!({}), &token).await;
            assert_eq!(res.status, 201, "{}", res.text);
        }
        app.end_giveaway(id).await;
        id
    }

    #[tokio::test]
    async fn draw_picks_distinct_winners_and_completes_the_giveaway() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let id = ended_giveaway_with_entrants(
            &app,
            &admin,
            &["a@example.com", "b@example.com", "c@example.com"],
        )
        .await;

        let res = app
            .post_with_token(&routes::giveaway_draw(id), &json!({"count": 2}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["giveaway"]["status"], "completed");
        let winners = res.body["winners"].as_array().unwrap();
        assert_eq!(winners.len(), 2);
        assert_ne!(winners[0]["user_id"], winners[1]["user_id"]);
        assert!(winners.iter().all(|w| w["claim_status"] == "pending"));

        let again = app
            .post_with_token(&routes::giveaway_draw(id), &json!({"count": 1}), &admin)
            .await;
        assert_eq!(again.status, 409);

        let listed = app.get_with_token(&routes::giveaway_winners(id), &admin).await;
        assert_eq!(listed.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn draw_never_exceeds_eligible_entries() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let id =
            ended_giveaway_with_entrants(&app, &admin, &["a@example.com", "b@example.com"]).await;
        let excluded = app.user_id("a@example.com").await;

        let res = app
            .post_with_token(
                &routes::giveaway_draw(id),
                &json!({"count": 2, "exclude_user_ids": [excluded]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["count"].is_string());

        let res = app
            .post_with_token(
                &routes::giveaway_draw(id),
                &json!({"count": 1, "exclude_user_ids": [excluded]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_ne!(res.body["winners"][0]["user_id"], excluded);
    }

    #[tokio::test]
    async fn draw_waits_for_the_end_date() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let id = app.create_active_giveaway(&admin, 0, None).await;

        let res = app
            .post_with_token(&routes::giveaway_draw(id), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn members_cannot_draw() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_active_giveaway(&admin, 0, None).await;

        let res = app
            .post_with_token(&routes::giveaway_draw(id), &json!({}), &member)
            .await;
        assert_eq!(res.status, 403);
    }
}

mod claims {
    use super::*;

    /// Draw ada as the only winner; returns (giveaway, winner id, ada's token).
    async fn ada_wins(app: &TestApp, admin: &str) -> (i32, i32, String) {
        let id = app.create_active_giveaway(admin, 0, None).await;
        let ada = app.create_member("ada@example.com").await;
        app.post_with_token(&routes::giveaway_enter(id), &json!({}), &ada).await;
        app.end_giveaway(id).await;

        let res = app
            .post_with_token(&routes::giveaway_draw(id), &json!({"count": 1}), admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["winners"][0]["display_name"], "Member");
        let winner = res.body["winners"][0]["id"].as_i64().unwrap() as i32;
        (id, winner, ada)
    }

    #[tokio::test]
    async fn winner_claims_and_admin_fulfils() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let (id, winner, ada) = ada_wins(&app, &admin).await;
        app.wait_for_mail("ada@example.com", "You won").await;

        let early = app
            .post_with_token(&routes::winner_fulfil(id, winner), &json!({}), &admin)
            .await;
        assert_eq!(early.status, 409);

        let claimed = app
            .post_with_token(&routes::winner_claim(id, winner), &json!({}), &ada)
            .await;
        assert_eq!(claimed.status, 200, "{}", claimed.text);
        assert_eq!(claimed.body["claim_status"], "claimed");

        let fulfilled = app
            .post_with_token(&routes::winner_fulfil(id, winner), &json!({}), &admin)
            .await;
        assert_eq!(fulfilled.status, 200);
        assert_eq!(fulfilled.body["claim_status"], "fulfilled");
    }

    #[tokio::test]
    async fn only_the_winner_can_claim() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let (id, winner, _) = ada_wins(&app, &admin).await;
        let grace = app.create_member("grace@example.com").await;

        let res = app
            .post_with_token(&routes::winner_claim(id, winner), &json!({}), &grace)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn late_claims_expire_the_prize() {
        use sea_orm::{ActiveModelTrait, EntityTrait, Set};
        use server::entity::giveaway_winner;

        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let (id, winner, ada) = ada_wins(&app, &admin).await;

        let model = giveaway_winner::Entity::find_by_id(winner)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: giveaway_winner::ActiveModel = model.into();
        active.claim_deadline = Set(chrono::Utc::now() - chrono::Duration::hours(1));
        active.update(&app.db).await.unwrap();

        let res = app
            .post_with_token(&routes::winner_claim(id, winner), &json!({}), &ada)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "DEADLINE_PASSED");

        let winners = app.get_with_token(&routes::giveaway_winners(id), &admin).await;
        assert_eq!(winners.body[0]["claim_status"], "expired");
    }
}
