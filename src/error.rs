//! Application error taxonomy.
//!
//! Authentication failures, authorization denials, and state-machine
//! violations are distinct kinds and map to distinct HTTP statuses, because
//! callers react differently to each (retry with other credentials, abandon,
//! or resubmit with corrected input).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    // Authentication failures - the caller is not who they claim to be.
    #[error("Invalid or expired credential")]
    InvalidCredential,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Account is suspended")]
    AccountSuspended,

    // Authorization denials - the caller is known but not permitted.
    #[error("Insufficient role for this operation")]
    InsufficientRole,

    #[error("Operation is restricted to the resource owner")]
    OwnershipRequired,

    #[error("Access denied")]
    AccessDenied,

    // State-machine violations - the request conflicts with current state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("A non-empty rejection reason is required")]
    MissingRejectionReason,

    #[error("A pending invitation already exists for this email")]
    DuplicateInvitation,

    #[error("Invalid submission policy: {0}")]
    InvalidPolicy(String),

    /// Not a pure failure: reporting it means the record was just forced into
    /// its `expired` terminal state (lazy expiry).
    #[error("Invitation has expired")]
    InvitationExpired,

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    invitation_status: Option<&'static str>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredential | AppError::AccountNotFound | AppError::AccountSuspended => {
                StatusCode::UNAUTHORIZED
            }
            AppError::InsufficientRole | AppError::OwnershipRequired | AppError::AccessDenied => {
                StatusCode::FORBIDDEN
            }
            AppError::InvalidTransition(_) | AppError::DuplicateInvitation => StatusCode::CONFLICT,
            AppError::InvitationExpired => StatusCode::GONE,
            AppError::MissingRejectionReason
            | AppError::InvalidPolicy(_)
            | AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        // Server-side detail stays in the logs; the wire message is generic.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        // Lazy expiry carries a successful side effect: tell the caller the
        // record's new terminal state even though the action did not apply.
        let invitation_status = match self {
            AppError::InvitationExpired => Some("expired"),
            _ => None,
        };

        let body = ErrorBody {
            error: message,
            invitation_status,
        };

        (status, Json(body)).into_response()
    }
}
