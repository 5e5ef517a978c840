use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::points::LedgerError;
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::payments::PaymentError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `CONFLICT`, `EMAIL_TAKEN`, `DEADLINE_PASSED`, `CAPACITY_REACHED`,
    /// `INSUFFICIENT_POINTS`, `INVALID_TRANSITION`, `TOKEN_EXPIRED`,
    /// `PAYMENTS_DISABLED`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 1-256 characters")]
    pub message: String,
    /// Per-field messages for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = json!({"end_date": "must be after submission_deadline"}))]
    pub fields: Option<BTreeMap<String, String>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Validation failure tied to named request fields.
    InvalidFields(BTreeMap<String, String>),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    EmailTaken,
    DeadlinePassed(String),
    CapacityReached(String),
    InsufficientPoints { balance: i64, required: i64 },
    InvalidTransition(String),
    /// A one-time email token (verification, password reset) has expired.
    TokenExpired,
    PaymentsDisabled,
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-field validation failure.
    pub fn field(name: &str, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.to_string(), message.into());
        AppError::InvalidFields(fields)
    }

    /// `CONFLICT` with `message` for a unique-index violation, otherwise
    /// the usual database error mapping.
    pub fn unique_violation(err: DbErr, message: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.into()),
            _ => err.into(),
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let (status, code, message, fields) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::InvalidFields(fields) => {
                let message = fields
                    .iter()
                    .map(|(field, msg)| format!("{field}: {msg}"))
                    .collect::<Vec<_>>()
                    .join("; ");
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    message,
                    Some(fields),
                )
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid email or password".into(),
                None,
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "An account with this email already exists".into(),
                None,
            ),
            AppError::DeadlinePassed(msg) => {
                (StatusCode::BAD_REQUEST, "DEADLINE_PASSED", msg, None)
            }
            AppError::CapacityReached(msg) => {
                (StatusCode::BAD_REQUEST, "CAPACITY_REACHED", msg, None)
            }
            AppError::InsufficientPoints { balance, required } => (
                StatusCode::BAD_REQUEST,
                "INSUFFICIENT_POINTS",
                format!("Insufficient points: balance is {balance}, {required} required"),
                None,
            ),
            AppError::InvalidTransition(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_TRANSITION", msg, None)
            }
            AppError::TokenExpired => (
                StatusCode::BAD_REQUEST,
                "TOKEN_EXPIRED",
                "This link has expired; request a new one".into(),
                None,
            ),
            AppError::PaymentsDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "PAYMENTS_DISABLED",
                "Payments are not available".into(),
                None,
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        };

        (
            status,
            ErrorBody {
                code,
                message,
                fields,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => {
                tracing::warn!("Stored object missing: {key}");
                AppError::NotFound("File not found".into())
            }
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::field("file", format!("File exceeds the {limit} byte limit"))
            }
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance { balance, required } => {
                AppError::InsufficientPoints { balance, required }
            }
            LedgerError::InvalidAmount { .. } => AppError::field("amount", err.to_string()),
            LedgerError::Overflow => AppError::Internal(err.to_string()),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Disabled => AppError::PaymentsDisabled,
            PaymentError::InvalidSignature(detail) => {
                tracing::warn!("Rejected payment webhook: {detail}");
                AppError::Validation("Invalid webhook signature".into())
            }
            PaymentError::NotConfigured(what) => {
                tracing::warn!("Payment option not configured: {what}");
                AppError::Validation(format!("{what} is not available"))
            }
            PaymentError::Provider(detail) => AppError::Internal(detail),
        }
    }
}
