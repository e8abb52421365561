//! Error type returned by HTTP handlers.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::actions::ActionError;
use crate::auth::services::AuthError;
use crate::inbox::InboxError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InboxError> for AppError {
    fn from(e: InboxError) -> Self {
        let message = e.to_string();
        match e {
            InboxError::EmptyTitle => AppError::Validation(message),
            InboxError::NotFound(_) => AppError::NotFound(message),
            InboxError::AlreadyClarified(_) => AppError::Conflict(message),
            InboxError::Action(inner) => inner.into(),
            InboxError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

impl From<ActionError> for AppError {
    fn from(e: ActionError) -> Self {
        let message = e.to_string();
        match e {
            ActionError::EmptyTitle => AppError::Validation(message),
            ActionError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::UserAlreadyExists { .. }) | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::Auth(AuthError::InvalidCredentials) | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Auth(AuthError::Internal(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a client. Internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = json!({ "error": self.client_message() });
        (status, Json(body)).into_response()
    }
}
