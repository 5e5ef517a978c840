use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::Json;
use axum::response::{IntoResponse, Response};
use common::storage::ObjectKey;
use common::{ApplicationStatus, ContestStatus, SubmissionStatus};
use sea_orm::sea_query::{LockType, NullOrdering};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{contest, contest_application, contest_submission};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::shared::{Pagination, page_bounds, parse_filter, title_ok};
use crate::models::submission::*;
use crate::state::AppState;
use crate::utils::contest::{check_contest_visible, find_contest, find_contest_for_update};
use crate::utils::notify::{self, Notice};

const ALREADY_SUBMITTED: &str = "You have already submitted to this contest";

/// Fields collected from the submit form.
#[derive(Default)]
struct SubmitParts {
    title: Option<String>,
    description: Option<String>,
    file_name: Option<String>,
    data: Option<Vec<u8>>,
}

/// Insert the submission and bump the contest counter, committing `txn`.
async fn persist_submission(
    txn: DatabaseTransaction,
    contest: contest::Model,
    row: contest_submission::ActiveModel,
) -> Result<contest_submission::Model, AppError> {
    let submission = row
        .insert(&txn)
        .await
        .map_err(|e| AppError::unique_violation(e, ALREADY_SUBMITTED))?;

    let submission_count = contest.submission_count + 1;
    let mut active: contest::ActiveModel = contest.into();
    active.submission_count = Set(submission_count);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(submission)
}

async fn read_submit_form(mut multipart: Multipart, max_size: u64) -> Result<SubmitParts, AppError> {
    let mut parts = SubmitParts::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                parts.file_name = field.file_name().map(|s| s.to_string());
                let mut data = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
                {
                    if (data.len() + chunk.len()) as u64 > max_size {
                        return Err(AppError::field(
                            "file",
                            format!("File exceeds maximum size of {max_size} bytes"),
                        ));
                    }
                    data.extend_from_slice(&chunk);
                }
                parts.data = Some(data);
            }
            Some("title") => {
                parts.title = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read title: {e}"))
                })?);
            }
            Some("description") => {
                parts.description = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read description: {e}"))
                })?);
            }
            _ => {}
        }
    }

    Ok(parts)
}

#[utoipa::path(
    post,
    path = "/{id}/submit",
    tag = "Contest Submissions",
    operation_id = "submitToContest",
    summary = "Upload a contest submission",
    description = "Uploads the current user's entry as `multipart/form-data` with `title`, optional `description` and `file`. \
        Requires an approved application; the contest must be `open` and before its submission deadline. One submission per user.",
    params(("id" = i32, Path, description = "Contest ID")),
    request_body(content_type = "multipart/form-data", content = SubmitForm),
    responses(
        (status = 201, description = "Submission stored", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR) or deadline passed (DEADLINE_PASSED)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already submitted (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(contest_id = id, user_id = auth_user.user_id))]
pub async fn submit_to_contest(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("contest:apply")?;

    let contest = find_contest(&state.db, id).await?;
    check_contest_visible(&auth_user, &contest)?;

    let parts = read_submit_form(multipart, state.media.max_size()).await?;
    let title = parts.title.map(|t| t.trim().to_string()).unwrap_or_default();
    if !title_ok(&title) {
        return Err(AppError::field("title", "Title must be 1-256 characters"));
    }
    let data = parts
        .data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::field("file", "A non-empty file is required"))?;
    let file_name = parts
        .file_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AppError::field("file", "File field must have a filename"))?;
    let description = parts
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let txn = state.db.begin().await?;
    let contest = find_contest_for_update(&txn, id).await?;

    let now = chrono::Utc::now();
    if contest.status != ContestStatus::Open {
        return Err(AppError::Validation(format!(
            "Contest is {} and not accepting submissions",
            contest.status
        )));
    }
    if now > contest.submission_deadline {
        return Err(AppError::DeadlinePassed(
            "The submission deadline has passed".into(),
        ));
    }

    let application = contest_application::Entity::find()
        .filter(contest_application::Column::ContestId.eq(id))
        .filter(contest_application::Column::UserId.eq(auth_user.user_id))
        .one(&txn)
        .await?
        .filter(|a| a.status == ApplicationStatus::Approved)
        .ok_or_else(|| {
            AppError::Validation("An approved application is required to submit".into())
        })?;

    let existing = contest_submission::Entity::find()
        .filter(contest_submission::Column::ContestId.eq(id))
        .filter(contest_submission::Column::UserId.eq(auth_user.user_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(ALREADY_SUBMITTED.into()));
    }

    let content_type = mime_guess::from_path(&file_name)
        .first()
        .map(|m| m.to_string());
    let key = ObjectKey::for_upload(&["submissions", &id.to_string()], &file_name)?;
    let stored = state.media.put(&key, &data, content_type.as_deref()).await?;

    let row = contest_submission::ActiveModel {
        contest_id: Set(id),
        user_id: Set(auth_user.user_id),
        application_id: Set(application.id),
        title: Set(title),
        description: Set(description),
        media_key: Set(stored.key.as_str().to_string()),
        file_name: Set(file_name),
        content_type: Set(content_type),
        file_size: Set(stored.size as i64),
        sha256: Set(stored.sha256),
        status: Set(SubmissionStatus::Submitted),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let submission = match persist_submission(txn, contest, row).await {
        Ok(submission) => submission,
        Err(e) => {
            if let Err(cleanup) = state.media.delete(&key).await {
                tracing::warn!(key = %key, "Failed to remove orphaned upload: {cleanup}");
            }
            return Err(e);
        }
    };

    tracing::info!(submission_id = submission.id, size = submission.file_size, "Submission stored");

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from(submission))))
}

#[utoipa::path(
    get,
    path = "/{id}/submission",
    tag = "Contest Submissions",
    operation_id = "getMySubmission",
    summary = "Get the current user's submission",
    params(("id" = i32, Path, description = "Contest ID")),
    responses(
        (status = 200, description = "Submission", body = SubmissionResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Contest or submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(contest_id = id, user_id = auth_user.user_id))]
pub async fn get_my_submission(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let contest = find_contest(&state.db, id).await?;
    check_contest_visible(&auth_user, &contest)?;

    let submission = contest_submission::Entity::find()
        .filter(contest_submission::Column::ContestId.eq(id))
        .filter(contest_submission::Column::UserId.eq(auth_user.user_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("You have not submitted to this contest".into()))?;

    Ok(Json(submission.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions",
    tag = "Contest Submissions",
    operation_id = "listSubmissions",
    summary = "List a contest's submissions",
    description = "Users with `contest:judge` see every submission, highest score first; everyone else only sees their own.",
    params(("id" = i32, Path, description = "Contest ID"), SubmissionListQuery),
    responses(
        (status = 200, description = "Submissions", body = SubmissionListResponse),
        (status = 400, description = "Invalid status filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Contest not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(contest_id = id))]
pub async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<SubmissionListResponse>, AppError> {
    let contest = find_contest(&state.db, id).await?;
    check_contest_visible(&auth_user, &contest)?;

    let (page, per_page) = page_bounds(query.page, query.per_page);
    let mut select =
        contest_submission::Entity::find().filter(contest_submission::Column::ContestId.eq(id));
    if !auth_user.has_permission("contest:judge") {
        select = select.filter(contest_submission::Column::UserId.eq(auth_user.user_id));
    }
    if let Some(status) = parse_filter::<SubmissionStatus>(query.status.as_deref(), "status")? {
        select = select.filter(contest_submission::Column::Status.eq(status));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_with_nulls(contest_submission::Column::Score, Order::Desc, NullOrdering::Last)
        .order_by_asc(contest_submission::Column::CreatedAt)
        .order_by_asc(contest_submission::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(SubmissionResponse::from)
        .collect();

    Ok(Json(SubmissionListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{id}/submissions/{submission_id}/file",
    tag = "Contest Submissions",
    operation_id = "downloadSubmissionFile",
    summary = "Download a submission's media file",
    description = "Streams the uploaded file. Allowed for the submitter and for users with `contest:judge`.",
    params(
        ("id" = i32, Path, description = "Contest ID"),
        ("submission_id" = i32, Path, description = "Submission ID"),
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Submission not found or not accessible (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(contest_id = id, submission_id))]
pub async fn download_submission_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, submission_id)): Path<(i32, i32)>,
) -> Result<Response, AppError> {
    let submission = contest_submission::Entity::find_by_id(submission_id)
        .filter(contest_submission::Column::ContestId.eq(id))
        .one(&state.db)
        .await?
        .filter(|s| s.user_id == auth_user.user_id || auth_user.has_permission("contest:judge"))
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    let key = ObjectKey::new(submission.media_key.as_str())?;
    let bytes = state.media.get(&key).await?;

    let content_type = submission
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, bytes.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&submission.file_name),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    post,
    path = "/{id}/judge",
    tag = "Contest Submissions",
    operation_id = "judgeSubmissions",
    summary = "Score and decide submissions in bulk",
    description = "Applies up to 100 judgements at once. Requires `contest:judge` permission and a contest in `judging`. \
        All judgements are applied or none are; submitters are notified of approvals and rejections.",
    params(("id" = i32, Path, description = "Contest ID")),
    request_body = JudgeRequest,
    responses(
        (status = 200, description = "Updated submissions", body = Vec<SubmissionResponse>),
        (status = 400, description = "Validation error or contest not in judging (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Contest or submission not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(contest_id = id, count = payload.judgements.len()))]
pub async fn judge_submissions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<JudgeRequest>,
) -> Result<Json<Vec<SubmissionResponse>>, AppError> {
    auth_user.require_permission("contest:judge")?;
    validate_judge_request(&payload)?;

    let txn = state.db.begin().await?;
    let contest = find_contest_for_update(&txn, id).await?;
    if contest.status != ContestStatus::Judging {
        return Err(AppError::Validation(format!(
            "Submissions can only be judged while the contest is judging (currently {})",
            contest.status
        )));
    }

    let ids: Vec<i32> = payload.judgements.iter().map(|j| j.submission_id).collect();
    let mut submissions: HashMap<i32, contest_submission::Model> =
        contest_submission::Entity::find()
            .filter(contest_submission::Column::ContestId.eq(id))
            .filter(contest_submission::Column::Id.is_in(ids))
            .lock(LockType::Update)
            .all(&txn)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

    let now = chrono::Utc::now();
    let mut updated = Vec::with_capacity(payload.judgements.len());
    for judgement in payload.judgements {
        let submission = submissions.remove(&judgement.submission_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Submission {} not found in this contest",
                judgement.submission_id
            ))
        })?;

        let mut active: contest_submission::ActiveModel = submission.into();
        active.status = Set(judgement.status);
        if judgement.score.is_some() {
            active.score = Set(judgement.score);
        }
        if let Some(notes) = judgement.notes {
            active.judge_notes = Set(Some(notes.trim().to_string()).filter(|n| !n.is_empty()));
        }
        active.judged_by = Set(Some(auth_user.user_id));
        active.judged_at = Set(Some(now));
        active.updated_at = Set(now);
        let model = active.update(&txn).await?;

        if model.status != SubmissionStatus::UnderReview {
            notify::push(
                &txn,
                model.user_id,
                Notice {
                    kind: notify::SUBMISSION_JUDGED,
                    title: format!("Your submission to {} was judged", contest.title),
                    body: format!("Status: {}", model.status),
                    link: Some(format!("/contests/{id}")),
                },
            )
            .await?;
        }
        updated.push(SubmissionResponse::from(model));
    }

    txn.commit().await?;
    tracing::info!(count = updated.len(), "Submissions judged");

    Ok(Json(updated))
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
