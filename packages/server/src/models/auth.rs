use chrono::{DateTime, Utc};
use common::{SubscriptionStatus, SubscriptionTier};
use serde::{Deserialize, Serialize};

use super::shared::{FieldErrors, email_ok, password_ok};
use crate::error::AppError;

fn display_name_ok(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().count() <= 64
}

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Email address; becomes the login name. Case-insensitive.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Name shown on submissions and winner lists (1-64 characters).
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.check(email_ok(&payload.email), "email", "Must be a valid email address");
    errors.check(
        password_ok(&payload.password),
        "password",
        "Password must be 8-128 characters",
    );
    errors.check(
        display_name_ok(&payload.display_name),
        "display_name",
        "Display name must be 1-64 characters",
    );
    errors.into_result()
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful registration response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
}

impl From<crate::entity::user::Model> for RegisterResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = 42)]
    pub user_id: i32,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "member")]
    pub role: String,
    #[schema(example = json!(["contest:apply", "giveaway:enter"]))]
    pub permissions: Vec<String>,
}

/// The current user's full profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    #[schema(example = "member")]
    pub role: String,
    #[schema(example = json!(["contest:apply", "giveaway:enter"]))]
    pub permissions: Vec<String>,
    #[schema(example = 1200)]
    pub points_balance: i64,
    pub subscription_tier: SubscriptionTier,
    pub subscription_status: SubscriptionStatus,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl MeResponse {
    pub fn new(user: crate::entity::user::Model, permissions: Vec<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            permissions,
            points_balance: user.points_balance,
            subscription_tier: user.subscription_tier,
            subscription_status: user.subscription_status,
            email_verified: user.email_verified_at.is_some(),
            created_at: user.created_at,
        }
    }
}

/// Profile update. Changing the password requires the current one.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    #[schema(example = "Ada L.")]
    pub display_name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref name) = payload.display_name {
        errors.check(display_name_ok(name), "display_name", "Display name must be 1-64 characters");
    }
    if let Some(ref new_password) = payload.new_password {
        errors.check(password_ok(new_password), "new_password", "Password must be 8-128 characters");
        errors.check(
            payload.current_password.is_some(),
            "current_password",
            "Current password is required to set a new one",
        );
    }
    errors.into_result()
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct VerifyEmailRequest {
    /// Token from the verification link.
    pub token: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    /// Token from the reset link.
    pub token: String,
    #[schema(example = "n3w_s3cure_P@ss!")]
    pub new_password: String,
}

pub fn validate_reset_password(payload: &ResetPasswordRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.check(!payload.token.trim().is_empty(), "token", "Token must not be empty");
    errors.check(
        password_ok(&payload.new_password),
        "new_password",
        "Password must be 8-128 characters",
    );
    errors.into_result()
}
