use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{Duration, Utc};
use common::{SubscriptionStatus, SubscriptionTier, TransactionKind};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{role, role_permission, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::mail::{self, templates};
use crate::models::auth::*;
use crate::models::shared::{MessageResponse, normalize_email};
use crate::state::AppState;
use crate::utils::ledger::{self, LedgerEntry};
use crate::utils::{hash, jwt, token};

async fn permissions_for<C: ConnectionTrait>(db: &C, role: &str) -> Result<Vec<String>, AppError> {
    let role_perms = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role))
        .all(db)
        .await?;
    Ok(role_perms.into_iter().map(|rp| rp.permission).collect())
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

fn verification_link(state: &AppState, token: &str) -> String {
    format!("{}/verify-email?token={token}", state.config.server.public_url)
}

fn reset_link(state: &AppState, token: &str) -> String {
    format!("{}/reset-password?token={token}", state.config.server.public_url)
}

fn hash_password(password: &str) -> Result<String, AppError> {
    hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Create an account",
    description = "Creates a `member` account and emails a verification link. The email address is case-insensitive and must be unused.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = normalize_email(&payload.email);
    let password = hash_password(&payload.password)?;
    let verification = token::generate();
    let now = Utc::now();

    let new_user = user::ActiveModel {
        email: Set(email),
        password: Set(password),
        display_name: Set(payload.display_name.trim().to_string()),
        role: Set(role::DEFAULT_ROLE.to_string()),
        points_balance: Set(0),
        subscription_tier: Set(SubscriptionTier::Free),
        subscription_status: Set(SubscriptionStatus::Inactive),
        verification_token_hash: Set(Some(token::hash_token(&verification))),
        verification_expires_at: Set(Some(
            now + Duration::hours(state.config.auth.verification_ttl_hours),
        )),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailTaken,
        _ => AppError::from(e),
    })?;

    mail::send_in_background(
        &state.mailer,
        templates::email_verification(
            &user.email,
            &user.display_name,
            &verification_link(&state, &verification),
        ),
    );

    Ok((StatusCode::CREATED, Json(RegisterResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Exchanges email and password for a JWT bearer token carrying the user's role and permissions.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let permissions = permissions_for(&state.db, &user.role).await?;

    let token = jwt::sign(
        user.id,
        &user.email,
        &user.role,
        permissions.clone(),
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        email: user.email,
        role: user.role,
        permissions,
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getMe",
    summary = "Current user's profile",
    responses(
        (status = 200, description = "Profile", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MeResponse>, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    let permissions = permissions_for(&state.db, &user.role).await?;
    Ok(Json(MeResponse::new(user, permissions)))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Auth",
    operation_id = "updateMe",
    summary = "Update the current user's profile",
    description = "Changes the display name and/or password. Setting `new_password` requires the correct `current_password`.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = MeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<MeResponse>, AppError> {
    validate_update_profile(&payload)?;

    let existing = find_user(&state.db, auth_user.user_id).await?;
    let permissions = permissions_for(&state.db, &existing.role).await?;
    if payload == UpdateProfileRequest::default() {
        return Ok(Json(MeResponse::new(existing, permissions)));
    }

    if let (Some(current), Some(_)) = (&payload.current_password, &payload.new_password) {
        let ok = hash::verify_password(current, &existing.password)
            .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
        if !ok {
            return Err(AppError::field("current_password", "is incorrect"));
        }
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(ref name) = payload.display_name {
        active.display_name = Set(name.trim().to_string());
    }
    if let Some(ref new_password) = payload.new_password {
        active.password = Set(hash_password(new_password)?);
        // A pending reset link must not undo this change.
        active.reset_token_hash = Set(None);
        active.reset_expires_at = Set(None);
    }
    active.updated_at = Set(Utc::now());
    let user = active.update(&state.db).await?;

    Ok(Json(MeResponse::new(user, permissions)))
}

#[utoipa::path(
    post,
    path = "/verify-email",
    tag = "Auth",
    operation_id = "verifyEmail",
    summary = "Confirm an email address",
    description = "Consumes the token from the verification email. The first verification credits the configured signup bonus.",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Unknown token (VALIDATION_ERROR) or expired token (TOKEN_EXPIRED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let token_hash = token::hash_token(payload.token.trim());

    let txn = state.db.begin().await?;
    // Concurrent uses of one token serialise here; the loser re-reads a cleared hash.
    let user = user::Entity::find()
        .filter(user::Column::VerificationTokenHash.eq(token_hash))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::field("token", "is invalid or has already been used"))?;

    let now = Utc::now();
    if user.verification_expires_at.is_none_or(|exp| exp < now) {
        return Err(AppError::TokenExpired);
    }

    let user_id = user.id;
    let first_verification = user.email_verified_at.is_none();
    let mut active: user::ActiveModel = user.into();
    active.email_verified_at = Set(Some(now));
    active.verification_token_hash = Set(None);
    active.verification_expires_at = Set(None);
    active.updated_at = Set(now);
    active.update(&txn).await?;

    let bonus = state.config.rewards.signup_bonus;
    if first_verification && bonus > 0 {
        ledger::record(
            &txn,
            user_id,
            LedgerEntry::new(TransactionKind::Earned, bonus, "Welcome bonus for verifying your email"),
        )
        .await?;
    }

    txn.commit().await?;
    Ok(Json(MessageResponse::new("Email verified")))
}

#[utoipa::path(
    post,
    path = "/resend-verification",
    tag = "Auth",
    operation_id = "resendVerification",
    summary = "Send a new verification email",
    description = "Replaces any outstanding verification token with a new one.",
    responses(
        (status = 202, description = "Email queued", body = MessageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Already verified (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn resend_verification(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&state.db, auth_user.user_id).await?;
    if user.email_verified_at.is_some() {
        return Err(AppError::Conflict("Email is already verified".into()));
    }

    let verification = token::generate();
    let now = Utc::now();
    let mut active: user::ActiveModel = user.into();
    active.verification_token_hash = Set(Some(token::hash_token(&verification)));
    active.verification_expires_at = Set(Some(
        now + Duration::hours(state.config.auth.verification_ttl_hours),
    ));
    active.updated_at = Set(now);
    let user = active.update(&state.db).await?;

    mail::send_in_background(
        &state.mailer,
        templates::email_verification(
            &user.email,
            &user.display_name,
            &verification_link(&state, &verification),
        ),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("Verification email sent")),
    ))
}

#[utoipa::path(
    post,
    path = "/forgot-password",
    tag = "Auth",
    operation_id = "forgotPassword",
    summary = "Request a password reset email",
    description = "Always answers 202 so the endpoint can't be used to discover registered addresses.",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Request accepted", body = MessageResponse),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let accepted = (
        StatusCode::ACCEPTED,
        Json(MessageResponse::new(
            "If an account exists for that address, we've sent a reset link.",
        )),
    );

    let Some(user) = user::Entity::find()
        .filter(user::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
    else {
        tracing::debug!("Password reset requested for unknown address");
        return Ok(accepted);
    };

    let reset = token::generate();
    let ttl_minutes = state.config.auth.reset_ttl_minutes;
    let now = Utc::now();
    let mut active: user::ActiveModel = user.into();
    active.reset_token_hash = Set(Some(token::hash_token(&reset)));
    active.reset_expires_at = Set(Some(now + Duration::minutes(ttl_minutes)));
    active.updated_at = Set(now);
    let user = active.update(&state.db).await?;

    mail::send_in_background(
        &state.mailer,
        templates::password_reset(
            &user.email,
            &user.display_name,
            &reset_link(&state, &reset),
            ttl_minutes,
        ),
    );

    Ok(accepted)
}

#[utoipa::path(
    post,
    path = "/reset-password",
    tag = "Auth",
    operation_id = "resetPassword",
    summary = "Set a new password using a reset token",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Unknown token (VALIDATION_ERROR) or expired token (TOKEN_EXPIRED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_reset_password(&payload)?;

    let password = hash_password(&payload.new_password)?;

    let txn = state.db.begin().await?;
    let user = user::Entity::find()
        .filter(user::Column::ResetTokenHash.eq(token::hash_token(payload.token.trim())))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::field("token", "is invalid or has already been used"))?;

    let now = Utc::now();
    if user.reset_expires_at.is_none_or(|exp| exp < now) {
        return Err(AppError::TokenExpired);
    }

    let mut active: user::ActiveModel = user.into();
    active.password = Set(password);
    active.reset_token_hash = Set(None);
    active.reset_expires_at = Set(None);
    active.updated_at = Set(now);
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(MessageResponse::new("Password updated")))
}
