use std::collections::{HashMap, HashSet};

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::giveaway::{claim_deadline, draw_winners};
use common::{ClaimStatus, EntryStatus, GiveawayStatus, TransactionKind};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{giveaway, giveaway_entry, giveaway_winner, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::mail::{self, templates};
use crate::models::giveaway::*;
use crate::models::shared::{FieldErrors, PageQuery, Pagination, page_bounds, parse_filter};
use crate::state::AppState;
use crate::utils::giveaway::{find_giveaway, find_giveaway_for_update};
use crate::utils::ledger::{self, LedgerEntry};
use crate::utils::notify::{self, Notice};

const ALREADY_ENTERED: &str = "You have already entered this giveaway";

async fn display_names<C: ConnectionTrait>(
    db: &C,
    user_ids: Vec<i32>,
) -> Result<HashMap<i32, user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect())
}

fn winner_response(m: giveaway_winner::Model, users: &HashMap<i32, user::Model>) -> WinnerResponse {
    let name = users
        .get(&m.user_id)
        .map(|u| u.display_name.clone())
        .unwrap_or_default();
    WinnerResponse::new(m, name)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Giveaways",
    operation_id = "createGiveaway",
    summary = "Create a giveaway",
    description = "Creates a giveaway in `upcoming` status. Requires `giveaway:manage` permission.",
    request_body = CreateGiveawayRequest,
    responses(
        (status = 201, description = "Giveaway created", body = GiveawayResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_giveaway(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGiveawayRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("giveaway:manage")?;
    validate_create_giveaway(&payload)?;

    let now = Utc::now();
    let model = giveaway::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        prize_description: Set(payload.prize_description.trim().to_string()),
        prize_value_cents: Set(payload.prize_value_cents),
        entry_cost: Set(payload.entry_cost),
        max_entries: Set(payload.max_entries),
        entry_count: Set(0),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        status: Set(GiveawayStatus::Upcoming),
        drawn_at: Set(None),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(giveaway_id = model.id, "Giveaway created");
    Ok((StatusCode::CREATED, Json(GiveawayResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Giveaways",
    operation_id = "listGiveaways",
    summary = "List giveaways",
    description = "Returns giveaways newest first, optionally filtered by status.",
    params(GiveawayListQuery),
    responses(
        (status = 200, description = "Giveaways", body = GiveawayListResponse),
        (status = 400, description = "Invalid status filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_giveaways(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<GiveawayListQuery>,
) -> Result<Json<GiveawayListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = giveaway::Entity::find();
    if let Some(status) = parse_filter::<GiveawayStatus>(query.status.as_deref(), "status")? {
        select = select.filter(giveaway::Column::Status.eq(status));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_desc(giveaway::Column::CreatedAt)
        .order_by_desc(giveaway::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(GiveawayResponse::from)
        .collect();

    Ok(Json(GiveawayListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Giveaways",
    operation_id = "getGiveaway",
    summary = "Get a giveaway by ID",
    params(("id" = i32, Path, description = "Giveaway ID")),
    responses(
        (status = 200, description = "Giveaway details", body = GiveawayResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Giveaway not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_giveaway(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GiveawayResponse>, AppError> {
    Ok(Json(find_giveaway(&state.db, id).await?.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Giveaways",
    operation_id = "updateGiveaway",
    summary = "Update a giveaway",
    description = "Partially updates a giveaway. Requires `giveaway:manage` permission. Completed giveaways can't be edited, and the date window is re-checked against stored values.",
    params(("id" = i32, Path, description = "Giveaway ID")),
    request_body = UpdateGiveawayRequest,
    responses(
        (status = 200, description = "Giveaway updated", body = GiveawayResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Giveaway not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Giveaway already completed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_giveaway(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateGiveawayRequest>,
) -> Result<Json<GiveawayResponse>, AppError> {
    auth_user.require_permission("giveaway:manage")?;
    validate_update_giveaway(&payload)?;

    if payload == UpdateGiveawayRequest::default() {
        return Ok(Json(find_giveaway(&state.db, id).await?.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_giveaway_for_update(&txn, id).await?;
    if existing.status == GiveawayStatus::Completed {
        return Err(AppError::Conflict(
            "Completed giveaways can't be edited".into(),
        ));
    }

    let mut errors = FieldErrors::new();
    let start = payload.start_date.unwrap_or(existing.start_date);
    let end = payload.end_date.unwrap_or(existing.end_date);
    errors.check(end > start, "end_date", "must be after start_date");
    if let Some(Some(max)) = payload.max_entries {
        errors.check(
            max >= existing.entry_count,
            "max_entries",
            "must not be below the current number of entries",
        );
    }
    errors.into_result()?;

    let mut active: giveaway::ActiveModel = existing.into();
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(ref prize) = payload.prize_description {
        active.prize_description = Set(prize.trim().to_string());
    }
    if let Some(value) = payload.prize_value_cents {
        active.prize_value_cents = Set(value);
    }
    if let Some(cost) = payload.entry_cost {
        active.entry_cost = Set(cost);
    }
    if let Some(max) = payload.max_entries {
        active.max_entries = Set(max);
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Giveaways",
    operation_id = "deleteGiveaway",
    summary = "Delete a giveaway without entries",
    description = "Requires `giveaway:manage` permission. Giveaways that already have entries answer 409.",
    params(("id" = i32, Path, description = "Giveaway ID")),
    responses(
        (status = 204, description = "Giveaway deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Giveaway not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Giveaway has entries (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_giveaway(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("giveaway:manage")?;

    let txn = state.db.begin().await?;
    let existing = find_giveaway_for_update(&txn, id).await?;
    if existing.entry_count > 0 {
        return Err(AppError::Conflict(format!(
            "Giveaway has {} entries and can't be deleted",
            existing.entry_count
        )));
    }
    giveaway::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/enter",
    tag = "Giveaway Entries",
    operation_id = "enterGiveaway",
    summary = "Enter a giveaway",
    description = "Creates the current user's entry, spending the giveaway's entry cost in points in the same transaction. \
        Requires `giveaway:enter` permission. The giveaway must be `active` and inside its date window.",
    params(("id" = i32, Path, description = "Giveaway ID")),
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Not open (VALIDATION_ERROR), ended (DEADLINE_PASSED), full (CAPACITY_REACHED) or too few points (INSUFFICIENT_POINTS)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Giveaway not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already entered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(giveaway_id = id, user_id = auth_user.user_id))]
pub async fn enter_giveaway(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("giveaway:enter")?;

    let txn = state.db.begin().await?;
    let existing = find_giveaway_for_update(&txn, id).await?;

    let now = Utc::now();
    if existing.status != GiveawayStatus::Active || now < existing.start_date {
        return Err(AppError::Validation(
            "This giveaway is not accepting entries".into(),
        ));
    }
    if now > existing.end_date {
        return Err(AppError::DeadlinePassed("This giveaway has ended".into()));
    }
    if let Some(max) = existing.max_entries
        && existing.entry_count >= max
    {
        return Err(AppError::CapacityReached(format!(
            "This giveaway is full ({max} entries)"
        )));
    }

    let already = giveaway_entry::Entity::find()
        .filter(giveaway_entry::Column::GiveawayId.eq(id))
        .filter(giveaway_entry::Column::UserId.eq(auth_user.user_id))
        .one(&txn)
        .await?;
    if already.is_some() {
        return Err(AppError::Conflict(ALREADY_ENTERED.into()));
    }

    if existing.entry_cost > 0 {
        ledger::record(
            &txn,
            auth_user.user_id,
            LedgerEntry::new(
                TransactionKind::Spent,
                -i64::from(existing.entry_cost),
                format!("Entry to {}", existing.title),
            )
            .referencing("giveaway", id),
        )
        .await?;
    }

    let entry_number = existing.entry_count + 1;
    let entry = giveaway_entry::ActiveModel {
        giveaway_id: Set(id),
        user_id: Set(auth_user.user_id),
        entry_number: Set(entry_number),
        status: Set(EntryStatus::Entered),
        points_spent: Set(existing.entry_cost),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::unique_violation(e, ALREADY_ENTERED))?;

    let mut active: giveaway::ActiveModel = existing.into();
    active.entry_count = Set(entry_number);
    active.update(&txn).await?;

    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(EntryResponse::from(entry))))
}

#[utoipa::path(
    get,
    path = "/{id}/entry",
    tag = "Giveaway Entries",
    operation_id = "getMyEntry",
    summary = "Get the current user's entry",
    params(("id" = i32, Path, description = "Giveaway ID")),
    responses(
        (status = 200, description = "Entry", body = EntryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Giveaway or entry not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(giveaway_id = id, user_id = auth_user.user_id))]
pub async fn get_my_entry(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EntryResponse>, AppError> {
    find_giveaway(&state.db, id).await?;

    let entry = giveaway_entry::Entity::find()
        .filter(giveaway_entry::Column::GiveawayId.eq(id))
        .filter(giveaway_entry::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not entered this giveaway".into()))?;

    Ok(Json(entry.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/entries",
    tag = "Giveaway Entries",
    operation_id = "listEntries",
    summary = "List a giveaway's entries",
    description = "Returns entries in entry order. Requires `giveaway:manage` permission.",
    params(("id" = i32, Path, description = "Giveaway ID"), PageQuery),
    responses(
        (status = 200, description = "Entries", body = EntryListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Giveaway not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(giveaway_id = id))]
pub async fn list_entries(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Json<EntryListResponse>, AppError> {
    auth_user.require_permission("giveaway:manage")?;
    find_giveaway(&state.db, id).await?;

    let (page, per_page) = page_bounds(query.page, query.per_page);
    let select = giveaway_entry::Entity::find().filter(giveaway_entry::Column::GiveawayId.eq(id));

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_asc(giveaway_entry::Column::EntryNumber)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(EntryResponse::from)
        .collect();

    Ok(Json(EntryListResponse { data, pagination }))
}

#[utoipa::path(
    post,
    path = "/{id}/draw",
    tag = "Giveaway Winners",
    operation_id = "drawWinners",
    summary = "Draw the giveaway's winners",
    description = "Picks `count` distinct winners uniformly at random from entries still `entered`, skipping `exclude_user_ids`. \
        Requires `giveaway:draw` permission. Runs once per giveaway and only after its end date. \
        Winners get a claim deadline, an in-app notification and an email; the giveaway becomes `completed`.",
    params(("id" = i32, Path, description = "Giveaway ID")),
    request_body = DrawRequest,
    responses(
        (status = 200, description = "Winners drawn", body = DrawResponse),
        (status = 400, description = "Too early or not enough entries (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Giveaway not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Winners already drawn (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(giveaway_id = id, count = payload.count))]
pub async fn draw_giveaway_winners(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<DrawRequest>,
) -> Result<Json<DrawResponse>, AppError> {
    auth_user.require_permission("giveaway:draw")?;
    validate_draw(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_giveaway_for_update(&txn, id).await?;

    if existing.drawn_at.is_some() || existing.status == GiveawayStatus::Completed {
        return Err(AppError::Conflict(
            "Winners have already been drawn for this giveaway".into(),
        ));
    }
    let now = Utc::now();
    if now < existing.end_date {
        return Err(AppError::Validation(
            "Winners can only be drawn after the giveaway ends".into(),
        ));
    }

    let excluded: HashSet<i32> = payload.exclude_user_ids.iter().copied().collect();
    let eligible: Vec<giveaway_entry::Model> = giveaway_entry::Entity::find()
        .filter(giveaway_entry::Column::GiveawayId.eq(id))
        .filter(giveaway_entry::Column::Status.eq(EntryStatus::Entered))
        .order_by_asc(giveaway_entry::Column::EntryNumber)
        .all(&txn)
        .await?
        .into_iter()
        .filter(|e| !excluded.contains(&e.user_id))
        .collect();

    let picked = {
        let mut rng = rand::rng();
        draw_winners(&eligible, payload.count as usize, &mut rng)
    }
    .map_err(|e| AppError::field("count", e.to_string()))?;

    let deadline = claim_deadline(now, state.config.rewards.claim_window_days);
    let mut winners = Vec::with_capacity(picked.len());
    for entry in &picked {
        let winner = giveaway_winner::ActiveModel {
            giveaway_id: Set(id),
            entry_id: Set(entry.id),
            user_id: Set(entry.user_id),
            claim_status: Set(ClaimStatus::Pending),
            claim_deadline: Set(deadline),
            claimed_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        notify::push(
            &txn,
            entry.user_id,
            Notice {
                kind: notify::GIVEAWAY_WON,
                title: format!("You won {}!", existing.title),
                body: format!(
                    "Claim your prize ({}) before {}.",
                    existing.prize_description,
                    deadline.format("%B %-d, %Y")
                ),
                link: Some(format!("/giveaways/{id}")),
            },
        )
        .await?;
        winners.push(winner);
    }

    giveaway_entry::Entity::update_many()
        .col_expr(giveaway_entry::Column::Status, Expr::value(EntryStatus::Won))
        .filter(giveaway_entry::Column::Id.is_in(picked.iter().map(|e| e.id)))
        .exec(&txn)
        .await?;

    let mut active: giveaway::ActiveModel = existing.into();
    active.status = Set(GiveawayStatus::Completed);
    active.drawn_at = Set(Some(now));
    active.updated_at = Set(now);
    let model = active.update(&txn).await?;

    let users = display_names(&txn, winners.iter().map(|w| w.user_id).collect()).await?;
    txn.commit().await?;
    tracing::info!(giveaway_id = id, winners = winners.len(), "Giveaway drawn");

    let link = format!("{}/giveaways/{id}", state.config.server.public_url);
    for winner in &winners {
        if let Some(u) = users.get(&winner.user_id) {
            mail::send_in_background(
                &state.mailer,
                templates::giveaway_won(
                    &u.email,
                    &u.display_name,
                    &model.title,
                    &model.prize_description,
                    winner.claim_deadline,
                    &link,
                ),
            );
        }
    }

    Ok(Json(DrawResponse {
        winners: winners
            .into_iter()
            .map(|w| winner_response(w, &users))
            .collect(),
        giveaway: model.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/winners",
    tag = "Giveaway Winners",
    operation_id = "listWinners",
    summary = "List a giveaway's winners",
    params(("id" = i32, Path, description = "Giveaway ID")),
    responses(
        (status = 200, description = "Winners", body = Vec<WinnerResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Giveaway not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(giveaway_id = id))]
pub async fn list_winners(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<WinnerResponse>>, AppError> {
    find_giveaway(&state.db, id).await?;

    let winners = giveaway_winner::Entity::find()
        .filter(giveaway_winner::Column::GiveawayId.eq(id))
        .order_by_asc(giveaway_winner::Column::Id)
        .all(&state.db)
        .await?;
    let users = display_names(&state.db, winners.iter().map(|w| w.user_id).collect()).await?;

    Ok(Json(
        winners
            .into_iter()
            .map(|w| winner_response(w, &users))
            .collect(),
    ))
}

async fn find_winner_for_update(
    txn: &DatabaseTransaction,
    giveaway_id: i32,
    winner_id: i32,
) -> Result<giveaway_winner::Model, AppError> {
    giveaway_winner::Entity::find_by_id(winner_id)
        .filter(giveaway_winner::Column::GiveawayId.eq(giveaway_id))
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Winner not found".into()))
}

#[utoipa::path(
    post,
    path = "/{id}/winners/{winner_id}/claim",
    tag = "Giveaway Winners",
    operation_id = "claimPrize",
    summary = "Claim a won prize",
    description = "Only the winning user can claim, and only before the claim deadline. A late claim marks the win `expired`.",
    params(
        ("id" = i32, Path, description = "Giveaway ID"),
        ("winner_id" = i32, Path, description = "Winner ID"),
    ),
    responses(
        (status = 200, description = "Prize claimed", body = WinnerResponse),
        (status = 400, description = "Claim deadline passed (DEADLINE_PASSED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Winner not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already claimed or expired (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(giveaway_id = id, winner_id))]
pub async fn claim_prize(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, winner_id)): Path<(i32, i32)>,
) -> Result<Json<WinnerResponse>, AppError> {
    let txn = state.db.begin().await?;
    let winner = find_winner_for_update(&txn, id, winner_id).await?;
    if winner.user_id != auth_user.user_id {
        return Err(AppError::NotFound("Winner not found".into()));
    }
    if winner.claim_status != ClaimStatus::Pending {
        return Err(AppError::Conflict(format!(
            "This prize is already {}",
            winner.claim_status
        )));
    }

    let now = Utc::now();
    let late = now > winner.claim_deadline;
    let mut active: giveaway_winner::ActiveModel = winner.into();
    if late {
        active.claim_status = Set(ClaimStatus::Expired);
        active.update(&txn).await?;
        txn.commit().await?;
        return Err(AppError::DeadlinePassed(
            "The claim deadline for this prize has passed".into(),
        ));
    }

    active.claim_status = Set(ClaimStatus::Claimed);
    active.claimed_at = Set(Some(now));
    let model = active.update(&txn).await?;
    txn.commit().await?;

    let users = display_names(&state.db, vec![model.user_id]).await?;
    Ok(Json(winner_response(model, &users)))
}

#[utoipa::path(
    post,
    path = "/{id}/winners/{winner_id}/fulfil",
    tag = "Giveaway Winners",
    operation_id = "fulfilPrize",
    summary = "Mark a claimed prize as delivered",
    description = "Requires `giveaway:manage` permission. Only claimed prizes can be fulfilled.",
    params(
        ("id" = i32, Path, description = "Giveaway ID"),
        ("winner_id" = i32, Path, description = "Winner ID"),
    ),
    responses(
        (status = 200, description = "Prize fulfilled", body = WinnerResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Winner not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Prize not claimed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(giveaway_id = id, winner_id))]
pub async fn fulfil_prize(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, winner_id)): Path<(i32, i32)>,
) -> Result<Json<WinnerResponse>, AppError> {
    auth_user.require_permission("giveaway:manage")?;

    let txn = state.db.begin().await?;
    let winner = find_winner_for_update(&txn, id, winner_id).await?;
    if winner.claim_status != ClaimStatus::Claimed {
        return Err(AppError::Conflict(format!(
            "Only claimed prizes can be fulfilled (this one is {})",
            winner.claim_status
        )));
    }

    let mut active: giveaway_winner::ActiveModel = winner.into();
    active.claim_status = Set(ClaimStatus::Fulfilled);
    let model = active.update(&txn).await?;
    txn.commit().await?;

    let users = display_names(&state.db, vec![model.user_id]).await?;
    Ok(Json(winner_response(model, &users)))
}
