use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Annotation, Image, ImageDetail, TransitionOutcome, Version};

// -- Images --

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    #[serde(flatten)]
    pub image: Image,
    pub url: String,
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        let url = image.url();
        Self { image, url }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageDetailResponse {
    #[serde(flatten)]
    pub image: Image,
    pub url: String,
    pub comments: Vec<Annotation>,
    pub versions: Vec<Version>,
}

impl From<ImageDetail> for ImageDetailResponse {
    fn from(detail: ImageDetail) -> Self {
        let url = detail.image.url();
        Self {
            image: detail.image,
            url,
            comments: detail.annotations,
            versions: detail.versions,
        }
    }
}

// -- Comments --

/// Body of a pin request. Every field is optional on the wire so that a
/// missing coordinate is reported as a validation failure, not a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCommentRequest {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub comment: Option<String>,
    pub author: Option<String>,
}

// -- Workflow --

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: TransitionOutcome,
}

// -- Admin --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AuthCheckResponse {
    pub authenticated: bool,
}

// -- Generic --

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
