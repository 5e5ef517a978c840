use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ContestStatus, SubmissionStatus, TransactionKind};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, LockType};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{contest, contest_submission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::mail::{self, templates};
use crate::models::contest::*;
use crate::models::shared::{FieldErrors, Pagination, escape_like, page_bounds, parse_filter};
use crate::state::AppState;
use crate::utils::contest::{check_contest_visible, find_contest, find_contest_for_update};
use crate::utils::ledger::{self, LedgerEntry};
use crate::utils::notify::{self, Notice};

#[utoipa::path(
    post,
    path = "/",
    tag = "Contests",
    operation_id = "createContest",
    summary = "Create a new contest",
    description = "Creates a contest in `draft` status. Requires `contest:create` permission. Dates must satisfy start < application deadline < submission deadline < end.",
    request_body = CreateContestRequest,
    responses(
        (status = 201, description = "Contest created", body = ContestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateContestRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("contest:create")?;
    validate_create_contest(&payload)?;

    let now = chrono::Utc::now();
    let new_contest = contest::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        prize: Set(payload.prize.trim().to_string()),
        status: Set(ContestStatus::Draft),
        start_date: Set(payload.start_date),
        application_deadline: Set(payload.application_deadline),
        submission_deadline: Set(payload.submission_deadline),
        end_date: Set(payload.end_date),
        max_participants: Set(payload.max_participants),
        application_count: Set(0),
        submission_count: Set(0),
        winner_submission_id: Set(None),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_contest.insert(&state.db).await?;
    tracing::info!(contest_id = model.id, "Contest created");

    Ok((StatusCode::CREATED, Json(ContestResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Contests",
    operation_id = "listContests",
    summary = "List contests with pagination and search",
    description = "Returns a paginated list of contests. Users without `contest:manage` never see drafts. Supports sorting by `created_at`, `start_date`, `application_deadline`, or `title`.",
    params(ContestListQuery),
    responses(
        (status = 200, description = "List of contests", body = ContestListResponse),
        (status = 400, description = "Invalid filter or sort (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_contests(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ContestListQuery>,
) -> Result<Json<ContestListResponse>, AppError> {
    let (page, per_page) = page_bounds(query.page, query.per_page);

    let mut select = contest::Entity::find();

    if !auth_user.has_permission("contest:manage") {
        select = select.filter(contest::Column::Status.ne(ContestStatus::Draft));
    }

    if let Some(status) = parse_filter::<ContestStatus>(query.status.as_deref(), "status")? {
        select = select.filter(contest::Column::Status.eq(status));
    }

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(contest::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };
    let sort_column = match query.sort_by.as_deref().unwrap_or("created_at") {
        "created_at" => contest::Column::CreatedAt,
        "start_date" => contest::Column::StartDate,
        "application_deadline" => contest::Column::ApplicationDeadline,
        "title" => contest::Column::Title,
        _ => {
            return Err(AppError::field(
                "sort_by",
                "must be one of: created_at, start_date, application_deadline, title",
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by(sort_column, sort_order)
        .order_by_desc(contest::Column::Id)
        .select_only()
        .column(contest::Column::Id)
        .column(contest::Column::Title)
        .column(contest::Column::Prize)
        .column(contest::Column::Status)
        .column(contest::Column::StartDate)
        .column(contest::Column::ApplicationDeadline)
        .column(contest::Column::SubmissionDeadline)
        .column(contest::Column::EndDate)
        .column(contest::Column::MaxParticipants)
        .column(contest::Column::ApplicationCount)
        .column(contest::Column::CreatedAt)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .into_model::<ContestListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(ContestListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Contests",
    operation_id = "getContest",
    summary = "Get a contest by ID",
    description = "Returns the full details of a contest. Drafts answer 404 unless the caller has `contest:manage`.",
    params(("id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Contest details", body = ContestResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ContestResponse>, AppError> {
    let model = find_contest(&state.db, id).await?;
    check_contest_visible(&auth_user, &model)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Contests",
    operation_id = "updateContest",
    summary = "Update an existing contest",
    description = "Partially updates a contest using PATCH semantics. Requires `contest:manage` permission. An empty payload returns the current resource unchanged. Date ordering is re-checked against the stored values of any dates not in the payload.",
    params(("id" = i32, Path, description = "Contest ID")),
    request_body = UpdateContestRequest,
    responses(
        (status = 200, description = "Contest updated", body = ContestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateContestRequest>,
) -> Result<Json<ContestResponse>, AppError> {
    auth_user.require_permission("contest:manage")?;
    validate_update_contest(&payload)?;

    if payload == UpdateContestRequest::default() {
        let existing = find_contest(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_contest_for_update(&txn, id).await?;

    let mut errors = FieldErrors::new();
    ContestDates {
        start_date: payload.start_date.unwrap_or(existing.start_date),
        application_deadline: payload
            .application_deadline
            .unwrap_or(existing.application_deadline),
        submission_deadline: payload
            .submission_deadline
            .unwrap_or(existing.submission_deadline),
        end_date: payload.end_date.unwrap_or(existing.end_date),
    }
    .validate(&mut errors);
    if let Some(Some(max)) = payload.max_participants {
        errors.check(
            max >= existing.application_count,
            "max_participants",
            "must not be below the current number of applications",
        );
    }
    errors.into_result()?;

    let mut active: contest::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(ref prize) = payload.prize {
        active.prize = Set(prize.trim().to_string());
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(deadline) = payload.application_deadline {
        active.application_deadline = Set(deadline);
    }
    if let Some(deadline) = payload.submission_deadline {
        active.submission_deadline = Set(deadline);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(max) = payload.max_participants {
        active.max_participants = Set(max);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Contests",
    operation_id = "deleteContest",
    summary = "Delete a draft contest",
    description = "Permanently deletes a contest. Requires `contest:delete` permission. Only drafts can be deleted; published contests answer 409.",
    params(("id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 204, description = "Contest deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Contest is not a draft (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("contest:delete")?;

    let txn = state.db.begin().await?;
    let existing = find_contest_for_update(&txn, id).await?;
    if existing.status != ContestStatus::Draft {
        return Err(AppError::Conflict(
            "Only draft contests can be deleted".into(),
        ));
    }

    contest::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(contest_id = id, "Contest deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/status",
    tag = "Contests",
    operation_id = "transitionContest",
    summary = "Advance a contest to its next status",
    description = "Moves a contest one step along draft → open → closed → judging → completed. Requires `contest:manage` permission. When completing, `winner_submission_id` crowns a submission: it is approved, the winner is notified and the configured winner bonus is credited.",
    params(("id" = i32, Path, description = "Contest ID")),
    request_body = TransitionContestRequest,
    responses(
        (status = 200, description = "Contest updated", body = ContestResponse),
        (status = 400, description = "Not the next status (INVALID_TRANSITION) or bad winner (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, target = %payload.status))]
pub async fn transition_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TransitionContestRequest>,
) -> Result<Json<ContestResponse>, AppError> {
    auth_user.require_permission("contest:manage")?;

    if payload.winner_submission_id.is_some() && payload.status != ContestStatus::Completed {
        return Err(AppError::field(
            "winner_submission_id",
            "can only be set when completing a contest",
        ));
    }

    let txn = state.db.begin().await?;
    let existing = find_contest_for_update(&txn, id).await?;

    if !existing.status.can_transition_to(payload.status) {
        let expected = existing
            .status
            .next()
            .map(|s| format!("; the next status is '{s}'"))
            .unwrap_or_default();
        return Err(AppError::InvalidTransition(format!(
            "Cannot move a contest from '{}' to '{}'{expected}",
            existing.status, payload.status
        )));
    }

    let winner = match payload.winner_submission_id {
        Some(submission_id) => {
            let submission = contest_submission::Entity::find_by_id(submission_id)
                .filter(contest_submission::Column::ContestId.eq(id))
                .lock(LockType::Update)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    AppError::field("winner_submission_id", "is not a submission to this contest")
                })?;
            if submission.status == SubmissionStatus::Rejected {
                return Err(AppError::field(
                    "winner_submission_id",
                    "refers to a rejected submission",
                ));
            }
            Some(submission)
        }
        None => None,
    };

    let now = chrono::Utc::now();
    let contest_title = existing.title.clone();
    let contest_prize = existing.prize.clone();
    let mut active: contest::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(now);

    let winner_user_id = if let Some(submission) = winner {
        let winner_user_id = submission.user_id;
        active.winner_submission_id = Set(Some(submission.id));

        let mut won: contest_submission::ActiveModel = submission.into();
        won.status = Set(SubmissionStatus::Approved);
        won.updated_at = Set(now);
        won.update(&txn).await?;

        notify::push(
            &txn,
            winner_user_id,
            Notice {
                kind: notify::CONTEST_WON,
                title: format!("You won {contest_title}!"),
                body: format!("Your submission won. Prize: {contest_prize}"),
                link: Some(format!("/contests/{id}")),
            },
        )
        .await?;

        let bonus = state.config.rewards.contest_winner_bonus;
        if bonus > 0 {
            ledger::record(
                &txn,
                winner_user_id,
                LedgerEntry::new(
                    TransactionKind::Earned,
                    bonus,
                    format!("Winner of {contest_title}"),
                )
                .referencing("contest", id),
            )
            .await?;
        }
        Some(winner_user_id)
    } else {
        None
    };

    let model = active.update(&txn).await?;
    let winner = match winner_user_id {
        Some(user_id) => user::Entity::find_by_id(user_id).one(&txn).await?,
        None => None,
    };
    txn.commit().await?;

    tracing::info!(contest_id = id, status = %model.status, "Contest status changed");

    if let Some(winner) = winner {
        mail::send_in_background(
            &state.mailer,
            templates::contest_won(&winner.email, &winner.display_name, &model.title, &model.prize),
        );
    }

    Ok(Json(model.into()))
}
