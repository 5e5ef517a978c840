use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{ApplicationStatus, ContestStatus};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{contest_application, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::mail::{self, templates};
use crate::models::application::*;
use crate::models::shared::{Pagination, page_bounds, parse_filter};
use crate::state::AppState;
use crate::utils::contest::{check_contest_visible, find_contest, find_contest_for_update};
use crate::utils::notify::{self, Notice};

const ALREADY_APPLIED: &str = "You have already applied to this contest";

#[utoipa::path(
    post,
    path = "/{id}/apply",
    tag = "Contest Applications",
    operation_id = "applyToContest",
    summary = "Apply to a contest",
    description = "Creates a pending application for the current user. Requires `contest:apply` permission. The contest must be `open`, the current time must fall between its start date and application deadline, and the contest must have room left.",
    params(("id" = i32, Path, description = "Contest ID")),
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Contest not open (VALIDATION_ERROR), deadline passed (DEADLINE_PASSED) or full (CAPACITY_REACHED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already applied (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(contest_id = id, user_id = auth_user.user_id))]
pub async fn apply_to_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ApplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("contest:apply")?;
    validate_apply(&payload)?;

    let txn = state.db.begin().await?;
    let contest = find_contest_for_update(&txn, id).await?;
    check_contest_visible(&auth_user, &contest)?;

    let now = chrono::Utc::now();
    if contest.status != ContestStatus::Open {
        return Err(AppError::Validation(format!(
            "Contest is {} and not accepting applications",
            contest.status
        )));
    }
    if now < contest.start_date {
        return Err(AppError::Validation(
            "Applications have not opened yet".into(),
        ));
    }
    if now > contest.application_deadline {
        return Err(AppError::DeadlinePassed(
            "The application deadline has passed".into(),
        ));
    }
    if let Some(max) = contest.max_participants
        && contest.application_count >= max
    {
        return Err(AppError::CapacityReached(format!(
            "This contest is full ({max} participants)"
        )));
    }

    let existing = contest_application::Entity::find()
        .filter(contest_application::Column::ContestId.eq(id))
        .filter(contest_application::Column::UserId.eq(auth_user.user_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(ALREADY_APPLIED.into()));
    }

    let application = contest_application::ActiveModel {
        contest_id: Set(id),
        user_id: Set(auth_user.user_id),
        status: Set(ApplicationStatus::Pending),
        responses: Set(payload.responses),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::unique_violation(e, ALREADY_APPLIED))?;

    let application_count = contest.application_count + 1;
    let mut active: crate::entity::contest::ActiveModel = contest.into();
    active.application_count = Set(application_count);
    active.update(&txn).await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse::from(application)),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/application",
    tag = "Contest Applications",
    operation_id = "getMyApplication",
    summary = "Get the current user's application",
    params(("id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Application", body = ApplicationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Contest or application not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(contest_id = id, user_id = auth_user.user_id))]
pub async fn get_my_application(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let contest = find_contest(&state.db, id).await?;
    check_contest_visible(&auth_user, &contest)?;

    let application = contest_application::Entity::find()
        .filter(contest_application::Column::ContestId.eq(id))
        .filter(contest_application::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not applied to this contest".into()))?;

    Ok(Json(application.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/applications",
    tag = "Contest Applications",
    operation_id = "listApplications",
    summary = "List a contest's applications",
    description = "Returns applications oldest first, with the applicant's email and display name. Requires `contest:manage` permission.",
    params(("id" = i32, Path, description = "Contest ID"), ApplicationListQuery),
    responses(
        (status = 200, description = "Applications", body = ApplicationListResponse),
        (status = 400, description = "Invalid status filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(contest_id = id))]
pub async fn list_applications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<ApplicationListResponse>, AppError> {
    auth_user.require_permission("contest:manage")?;
    find_contest(&state.db, id).await?;

    let (page, per_page) = page_bounds(query.page, query.per_page);
    let mut select =
        contest_application::Entity::find().filter(contest_application::Column::ContestId.eq(id));
    if let Some(status) = parse_filter::<ApplicationStatus>(query.status.as_deref(), "status")? {
        select = select.filter(contest_application::Column::Status.eq(status));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let applications = select
        .order_by_asc(contest_application::Column::CreatedAt)
        .order_by_asc(contest_application::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let user_ids: Vec<i32> = applications.iter().map(|a| a.user_id).collect();
    let applicants: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let data = applications
        .into_iter()
        .map(|a| {
            let (applicant_email, applicant_name) = applicants
                .get(&a.user_id)
                .map(|u| (u.email.clone(), u.display_name.clone()))
                .unwrap_or_default();
            ApplicationListItem {
                application: a.into(),
                applicant_email,
                applicant_name,
            }
        })
        .collect();

    Ok(Json(ApplicationListResponse { data, pagination }))
}

#[utoipa::path(
    post,
    path = "/{id}/applications/{application_id}/review",
    tag = "Contest Applications",
    operation_id = "reviewApplication",
    summary = "Approve or reject an application",
    description = "Records the decision and reviewer, notifies the applicant in-app and emails them. Requires `contest:manage` permission. Only pending applications can be reviewed.",
    params(
        ("id" = i32, Path, description = "Contest ID"),
        ("application_id" = i32, Path, description = "Application ID"),
    ),
    request_body = ReviewApplicationRequest,
    responses(
        (status = 200, description = "Application reviewed", body = ApplicationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest or application not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already reviewed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(contest_id = id, application_id))]
pub async fn review_application(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, application_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<ReviewApplicationRequest>,
) -> Result<Json<ApplicationResponse>, AppError> {
    auth_user.require_permission("contest:manage")?;
    validate_review(&payload)?;

    let contest = find_contest(&state.db, id).await?;

    let txn = state.db.begin().await?;
    let application = contest_application::Entity::find_by_id(application_id)
        .filter(contest_application::Column::ContestId.eq(id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".into()))?;

    if application.status != ApplicationStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Application was already {}",
            application.status
        )));
    }

    let now = chrono::Utc::now();
    let notes = payload
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let mut active: contest_application::ActiveModel = application.into();
    active.status = Set(payload.status);
    active.reviewed_by = Set(Some(auth_user.user_id));
    active.reviewed_at = Set(Some(now));
    active.review_notes = Set(notes.clone());
    active.updated_at = Set(now);
    let application = active.update(&txn).await?;

    let approved = application.status == ApplicationStatus::Approved;
    notify::push(
        &txn,
        application.user_id,
        Notice {
            kind: notify::APPLICATION_REVIEWED,
            title: if approved {
                format!("You're in: {}", contest.title)
            } else {
                format!("Update on your application to {}", contest.title)
            },
            body: if approved {
                "Your application was approved. You can now submit your entry.".into()
            } else {
                "Your application was not accepted this time.".into()
            },
            link: Some(format!("/contests/{id}")),
        },
    )
    .await?;

    let applicant = user::Entity::find_by_id(application.user_id)
        .one(&txn)
        .await?;
    txn.commit().await?;

    if let Some(applicant) = applicant {
        mail::send_in_background(
            &state.mailer,
            templates::application_decision(
                &applicant.email,
                &applicant.display_name,
                &contest.title,
                approved,
                notes.as_deref(),
                &format!("{}/contests/{id}", state.config.server.public_url),
            ),
        );
    }

    Ok(Json(application.into()))
}
