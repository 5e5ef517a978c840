use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::state::AppState;

/// Multipart framing on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/contests", contest_routes(config))
        .nest("/giveaways", giveaway_routes())
        .nest("/points", points_routes())
        .nest("/subscription", subscription_routes())
        .nest("/notifications", notification_routes())
        .nest("/admin", admin_routes())
        .nest("/public", public_routes())
        .nest("/webhooks", webhook_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::auth::*;

    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(me, update_me))
        .routes(routes!(verify_email))
        .routes(routes!(resend_verification))
        .routes(routes!(forgot_password))
        .routes(routes!(reset_password))
}

fn contest_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    use crate::handlers::application::*;
    use crate::handlers::contest::*;
    use crate::handlers::submission::*;

    let upload_limit = usize::try_from(config.storage.max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    let uploads = OpenApiRouter::new()
        .routes(routes!(submit_to_contest))
        .layer(DefaultBodyLimit::max(upload_limit));

    OpenApiRouter::new()
        .routes(routes!(list_contests, create_contest))
        .routes(routes!(get_contest, update_contest, delete_contest))
        .routes(routes!(transition_contest))
        .routes(routes!(apply_to_contest))
        .routes(routes!(get_my_application))
        .routes(routes!(list_applications))
        .routes(routes!(review_application))
        .routes(routes!(get_my_submission))
        .routes(routes!(list_submissions))
        .routes(routes!(download_submission_file))
        .routes(routes!(judge_submissions))
        .merge(uploads)
}

fn giveaway_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::giveaway::*;

    OpenApiRouter::new()
        .routes(routes!(list_giveaways, create_giveaway))
        .routes(routes!(get_giveaway, update_giveaway, delete_giveaway))
        .routes(routes!(enter_giveaway))
        .routes(routes!(get_my_entry))
        .routes(routes!(list_entries))
        .routes(routes!(draw_giveaway_winners))
        .routes(routes!(list_winners))
        .routes(routes!(claim_prize))
        .routes(routes!(fulfil_prize))
}

fn points_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::points::*;

    OpenApiRouter::new()
        .routes(routes!(get_balance))
        .routes(routes!(list_transactions))
        .routes(routes!(list_packages))
        .routes(routes!(purchase_points))
}

fn subscription_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::subscription::*;

    OpenApiRouter::new()
        .routes(routes!(get_subscription))
        .routes(routes!(create_subscription_checkout))
        .routes(routes!(cancel_subscription))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::notification::*;

    OpenApiRouter::new()
        .routes(routes!(list_notifications))
        .routes(routes!(unread_count))
        .routes(routes!(mark_read))
        .routes(routes!(mark_all_read))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::admin::*;
    use crate::handlers::analytics::*;

    OpenApiRouter::new()
        .routes(routes!(list_users))
        .routes(routes!(get_user, update_user))
        .routes(routes!(adjust_points))
        .routes(routes!(get_analytics))
}

fn public_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::public::*;

    OpenApiRouter::new()
        .routes(routes!(public_contests))
        .routes(routes!(public_giveaways))
        .routes(routes!(contact))
}

fn webhook_routes() -> OpenApiRouter<AppState> {
    use crate::handlers::webhook::*;

    OpenApiRouter::new().routes(routes!(payment_webhook))
}
