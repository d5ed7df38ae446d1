use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use evite_shared::error::EviteError;
use log::error;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("{message}")]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }

    pub fn bad_request(message: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: String) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: String) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: String) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_server_error(message: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<EviteError> for AppError {
    fn from(err: EviteError) -> Self {
        match err {
            EviteError::NotFound(what) => AppError::not_found(format!("Not found: {}", what)),
            EviteError::DuplicateGuest(email) => {
                AppError::conflict(format!("A guest with email {} is already invited", email))
            }
            EviteError::SaveFailed { .. } | EviteError::DeletionFailed { .. } => {
                error!("Storage failure: {}", err);
                AppError::internal_server_error(
                    "Could not save your changes. Please try again.".into(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "message": self.message })),
        )
            .into_response()
    }
}
