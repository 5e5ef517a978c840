use serde_json::json;

use crate::common::{TestApp, WINNER_BONUS, routes};

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn members_cannot_create_contests() {
        let app = TestApp::spawn().await;
        let member = app.create_member("ada@example.com").await;

        let now = chrono::Utc::now();
        let res = app
            .post_with_token(
                routes::CONTESTS,
                &json!({
                    "title": "Spot",
                    "description": "",
                    "prize": "Camera",
                    "start_date": now,
                    "application_deadline": now + chrono::Duration::days(1),
                    "submission_deadline": now + chrono::Duration::days(2),
                    "end_date": now + chrono::Duration::days(3),
                }),
                &member,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn dates_must_be_strictly_increasing() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;

        let now = chrono::Utc::now();
        let res = app
            .post_with_token(
                routes::CONTESTS,
                &json!({
                    "title": "Spot",
                    "description": "",
                    "prize": "Camera",
                    "start_date": now,
                    "application_deadline": now + chrono::Duration::days(5),
                    "submission_deadline": now + chrono::Duration::days(2),
                    "end_date": now + chrono::Duration::days(1),
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["submission_deadline"].is_string());
        assert!(res.body["fields"]["end_date"].is_string());
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_members() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let draft = app.create_draft_contest(&admin, "Draft", None).await;
        let open = app.create_open_contest(&admin, "Open").await;

        let res = app.get_with_token(&routes::contest(draft), &member).await;
        assert_eq!(res.status, 404);

        let list = app.get_with_token(routes::CONTESTS, &member).await;
        assert_eq!(list.status, 200);
        let ids: Vec<i64> = list.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![open as i64]);

        let admin_list = app.get_with_token(routes::CONTESTS, &admin).await;
        assert_eq!(admin_list.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn status_moves_one_step_at_a_time() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let id = app.create_draft_contest(&admin, "Spot", None).await;

        let skip = app
            .post_with_token(&routes::contest_status(id), &json!({"status": "judging"}), &admin)
            .await;
        assert_eq!(skip.status, 400);
        assert_eq!(skip.code(), "INVALID_TRANSITION");

        let res = app.transition(id, "open", &admin).await;
        assert_eq!(res.body["status"], "open");

        let back = app
            .post_with_token(&routes::contest_status(id), &json!({"status": "draft"}), &admin)
            .await;
        assert_eq!(back.code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn only_drafts_can_be_deleted() {
        let app = TestApp::spawn().await;
        let admin = app.create_bass_admin().await;
        let draft = app.create_draft_contest(&admin, "Draft", None).await;
        let open = app.create_open_contest(&admin, "Open").await;

        let res = app.delete_with_token(&routes::contest(open), &admin).await;
        assert_eq!(res.status, 409);

        let res = app.delete_with_token(&routes::contest(draft), &admin).await;
        assert_eq!(res.status, 204);
        let res = app.get_with_token(&routes::contest(draft), &admin).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn update_rechecks_dates_against_stored_values() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let id = app.create_draft_contest(&admin, "Spot", None).await;

        let res = app
            .patch_with_token(
                &routes::contest(id),
                &json!({"end_date": chrono::Utc::now()}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["end_date"].is_string());

        let res = app
            .patch_with_token(&routes::contest(id), &json!({"title": "Renamed"}), &admin)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Renamed");
    }
}

mod applications {
    use super::*;

    #[tokio::test]
    async fn member_can_apply_once() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;

        app.apply(id, &member).await;

        let again = app
            .post_with_token(&routes::contest_apply(id), &json!({}), &member)
            .await;
        assert_eq!(again.status, 409);

        let mine = app.get_with_token(&routes::contest_application(id), &member).await;
        assert_eq!(mine.status, 200);
        assert_eq!(mine.body["status"], "pending");

        let contest = app.get_with_token(&routes::contest(id), &member).await;
        assert_eq!(contest.body["application_count"], 1);
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let first = app.create_member("ada@example.com").await;
        let second = app.create_member("grace@example.com").await;
        let id = app.create_draft_contest(&admin, "Small", Some(1)).await;
        app.transition(id, "open", &admin).await;

        app.apply(id, &first).await;
        let res = app
            .post_with_token(&routes::contest_apply(id), &json!({}), &second)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "CAPACITY_REACHED");
    }

    #[tokio::test]
    async fn closed_contests_do_not_accept_applications() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;
        app.transition(id, "closed", &admin).await;

        let res = app
            .post_with_token(&routes::contest_apply(id), &json!({}), &member)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn applying_after_the_deadline_fails() {
        use sea_orm::{ActiveModelTrait, EntityTrait, Set};
        use server::entity::contest;

        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;

        let model = contest::Entity::find_by_id(id).one(&app.db).await.unwrap().unwrap();
        let now = chrono::Utc::now();
        let mut active: contest::ActiveModel = model.into();
        active.start_date = Set(now - chrono::Duration::days(2));
        active.application_deadline = Set(now - chrono::Duration::days(1));
        active.update(&app.db).await.unwrap();

        let res = app
            .post_with_token(&routes::contest_apply(id), &json!({}), &member)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "DEADLINE_PASSED");
    }

    #[tokio::test]
    async fn review_notifies_and_emails_the_applicant() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;
        let application_id = app.apply(id, &member).await;

        let list = app
            .get_with_token(&routes::contest_applications(id), &admin)
            .await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body["data"][0]["applicant_email"], "ada@example.com");

        let forbidden = app
            .get_with_token(&routes::contest_applications(id), &member)
            .await;
        assert_eq!(forbidden.status, 403);

        app.review(id, application_id, "approved", &admin).await;
        app.wait_for_mail("ada@example.com", "Spot").await;

        let again = app
            .post_with_token(
                &routes::application_review(id, application_id),
                &json!({"status": "rejected"}),
                &admin,
            )
            .await;
        assert_eq!(again.status, 409);

        let unread = app.get_with_token(routes::UNREAD_COUNT, &member).await;
        assert_eq!(unread.body["count"], 1);
    }
}

mod submissions {
    use super::*;

    #[tokio::test]
    async fn submitting_requires_an_approved_application() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;

        let res = app
            .submit_entry(id, "My cut", "cut.mp4", b"frames".to_vec(), &member)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");

        let application_id = app.apply(id, &member).await;
        let res = app
            .submit_entry(id, "My cut", "cut.mp4", b"frames".to_vec(), &member)
            .await;
        assert_eq!(res.status, 400, "pending application must not allow submitting");

        app.review(id, application_id, "approved", &admin).await;
        let res = app
            .submit_entry(id, "My cut", "cut.mp4", b"frames".to_vec(), &member)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_name"], "cut.mp4");
        assert_eq!(res.body["file_size"], 6);
        assert_eq!(res.body["content_type"], "video/mp4");
        assert_eq!(res.body["status"], "submitted");

        let again = app
            .submit_entry(id, "Second cut", "cut2.mp4", b"more".to_vec(), &member)
            .await;
        assert_eq!(again.status, 409);
    }

    #[tokio::test]
    async fn failed_submission_leaves_no_stored_file() {
        use sea_orm::ConnectionTrait;

        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;
        let application_id = app.apply(id, &member).await;
        app.review(id, application_id, "approved", &admin).await;

        app.db
            .execute_unprepared(
                r#"CREATE FUNCTION freeze_submission_count() RETURNS trigger AS $$
                BEGIN
                    IF NEW.submission_count <> OLD.submission_count THEN
                        RAISE EXCEPTION 'submission_count is frozen';
                    END IF;
                    RETURN NEW;
                END $$ LANGUAGE plpgsql"#,
            )
            .await
            .unwrap();
        app.db
            .execute_unprepared(
                "CREATE TRIGGER freeze_submission_count BEFORE UPDATE ON contest \
                 FOR EACH ROW EXECUTE FUNCTION freeze_submission_count()",
            )
            .await
            .unwrap();

        let res = app
            .submit_entry(id, "My cut", "cut.mp4", b"frames".to_vec(), &member)
            .await;
        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.code(), "INTERNAL_ERROR");
        assert_eq!(app.stored_file_count(), 0);

        let mine = app
            .get_with_token(&routes::contest_submission(id), &member)
            .await;
        assert_eq!(mine.status, 404);
    }

    #[tokio::test]
    async fn owner_and_judges_can_download_the_file() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let other = app.create_member("grace@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;
        let application_id = app.apply(id, &member).await;
        app.review(id, application_id, "approved", &admin).await;

        let submission = app
            .submit_entry(id, "My cut", "cut.mp4", b"frames".to_vec(), &member)
            .await
            .id();

        let res = app
            .get_with_token(&routes::submission_file(id, submission), &member)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.text, "frames");
        let disposition = res.headers["content-disposition"].to_str().unwrap();
        assert!(disposition.contains("cut.mp4"));

        let res = app
            .get_with_token(&routes::submission_file(id, submission), &admin)
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .get_with_token(&routes::submission_file(id, submission), &other)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn members_only_list_their_own_submissions() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let ada = app.create_member("ada@example.com").await;
        let grace = app.create_member("grace@example.com").await;
        let id = app.create_open_contest(&admin, "Spot").await;
        for token in [&ada, &grace] {
            let application_id = app.apply(id, token).await;
            app.review(id, application_id, "approved", &admin).await;
            let res = app
                .submit_entry(id, "Cut", "cut.mov", b"frames".to_vec(), token)
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let mine = app.get_with_token(&routes::contest_submissions(id), &ada).await;
        assert_eq!(mine.body["pagination"]["total"], 1);

        let all = app.get_with_token(&routes::contest_submissions(id), &admin).await;
        assert_eq!(all.body["pagination"]["total"], 2);
    }
}

mod judging {
    use super::*;

    /// Open contest with one approved submission from ada; returns (contest, submission).
    async fn contest_with_submission(app: &TestApp, admin: &str, member: &str) -> (i32, i32) {
        let id = app.create_open_contest(admin, "Spot").await;
        let application_id = app.apply(id, member).await;
        app.review(id, application_id, "approved", admin).await;
        let submission = app
            .submit_entry(id, "My cut", "cut.mp4", b"frames".to_vec(), member)
            .await
            .id();
        (id, submission)
    }

    #[tokio::test]
    async fn judging_only_happens_in_the_judging_phase() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let (id, submission) = contest_with_submission(&app, &admin, &member).await;
        let body = json!({"judgements": [{"submission_id": submission, "status": "approved", "score": 90}]});

        let early = app.post_with_token(&routes::contest_judge(id), &body, &admin).await;
        assert_eq!(early.status, 400);

        app.transition(id, "closed", &admin).await;
        app.transition(id, "judging", &admin).await;

        let res = app.post_with_token(&routes::contest_judge(id), &body, &admin).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body[0]["score"], 90);
        assert_eq!(res.body[0]["status"], "approved");

        let forbidden = app.post_with_token(&routes::contest_judge(id), &body, &member).await;
        assert_eq!(forbidden.status, 403);
    }

    #[tokio::test]
    async fn completing_with_a_winner_awards_the_bonus() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let (id, submission) = contest_with_submission(&app, &admin, &member).await;
        app.transition(id, "closed", &admin).await;
        app.transition(id, "judging", &admin).await;

        let res = app
            .post_with_token(
                &routes::contest_status(id),
                &json!({"status": "completed", "winner_submission_id": submission}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["winner_submission_id"], submission);

        let balance = app.get_with_token(routes::POINTS_BALANCE, &member).await;
        assert_eq!(balance.body["balance"], WINNER_BONUS);

        let mine = app.get_with_token(&routes::contest_submission(id), &member).await;
        assert_eq!(mine.body["status"], "approved");

        app.wait_for_mail("ada@example.com", "Your entry won Spot").await;
    }

    #[tokio::test]
    async fn winner_is_only_accepted_when_completing() {
        let app = TestApp::spawn().await;
        let admin = app.create_brand_admin().await;
        let member = app.create_member("ada@example.com").await;
        let (id, submission) = contest_with_submission(&app, &admin, &member).await;

        let res = app
            .post_with_token(
                &routes::contest_status(id),
                &json!({"status": "closed", "winner_submission_id": submission}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["winner_submission_id"].is_string());
    }
}
