use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use common::ContestStatus;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{contest, giveaway};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::mail::{self, templates};
use crate::models::public::*;
use crate::models::shared::{MessageResponse, PageQuery, Pagination, page_bounds};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/contests",
    tag = "Public",
    operation_id = "listPublicContests",
    summary = "Published contests",
    description = "Every contest except drafts, most recent start date first. No authentication.",
    params(PageQuery),
    responses(
        (status = 200, description = "Contests", body = PublicContestList),
    ),
)]
#[instrument(skip(state, query))]
pub async fn public_contests(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PublicContestList>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let select = contest::Entity::find().filter(contest::Column::Status.ne(ContestStatus::Draft));
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .select_only()
        .columns([
            contest::Column::Id,
            contest::Column::Title,
            contest::Column::Description,
            contest::Column::Prize,
            contest::Column::Status,
            contest::Column::StartDate,
            contest::Column::ApplicationDeadline,
            contest::Column::SubmissionDeadline,
            contest::Column::EndDate,
            contest::Column::MaxParticipants,
            contest::Column::ApplicationCount,
        ])
        .order_by_desc(contest::Column::StartDate)
        .order_by_desc(contest::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .into_model::<PublicContest>()
        .all(&state.db)
        .await?;

    Ok(Json(PublicContestList { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/giveaways",
    tag = "Public",
    operation_id = "listPublicGiveaways",
    summary = "Giveaways",
    description = "All giveaways, latest end date first. No authentication.",
    params(PageQuery),
    responses(
        (status = 200, description = "Giveaways", body = PublicGiveawayList),
    ),
)]
#[instrument(skip(state, query))]
pub async fn public_giveaways(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PublicGiveawayList>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let select = giveaway::Entity::find();
    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .select_only()
        .columns([
            giveaway::Column::Id,
            giveaway::Column::Title,
            giveaway::Column::Description,
            giveaway::Column::PrizeDescription,
            giveaway::Column::PrizeValueCents,
            giveaway::Column::EntryCost,
            giveaway::Column::MaxEntries,
            giveaway::Column::EntryCount,
            giveaway::Column::StartDate,
            giveaway::Column::EndDate,
            giveaway::Column::Status,
        ])
        .order_by_desc(giveaway::Column::EndDate)
        .order_by_desc(giveaway::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .into_model::<PublicGiveaway>()
        .all(&state.db)
        .await?;

    Ok(Json(PublicGiveawayList { data, pagination }))
}

#[utoipa::path(
    post,
    path = "/contact",
    tag = "Public",
    operation_id = "submitContactForm",
    summary = "Send a message to the studio",
    description = "Forwards the message to the studio inbox. Delivery is best effort.",
    request_body = ContactRequest,
    responses(
        (status = 202, description = "Message accepted", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn contact(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    validate_contact(&payload)?;

    mail::send_in_background(
        &state.mailer,
        templates::contact_form(
            &state.config.mail.contact_inbox,
            payload.name.trim(),
            payload.email.trim(),
            payload.subject.trim(),
            payload.message.trim(),
        ),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("Thanks, we'll be in touch.")),
    ))
}
