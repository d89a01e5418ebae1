use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pinboard_review::ReviewError;
use pinboard_types::api::ErrorResponse;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Review(ReviewError::Validation(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Review(ReviewError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Review(ReviewError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::Review(ReviewError::Unauthorized) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Review(ReviewError::Storage(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Review(ReviewError::Unauthorized) => "Unauthorized".to_string(),
            Self::Review(ReviewError::Storage(_)) | Self::Internal(_) => {
                error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
            other => {
                if status == StatusCode::CONFLICT {
                    warn!("Transition conflict surfaced to client: {}", other);
                }
                other.to_string()
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
