use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use pinboard_review::Access;
use pinboard_types::api::{CreateCommentRequest, SuccessResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, parse_id, unknown_image};

/// POST /api/images/{id}/comments: drop a pin at natural image coordinates.
pub async fn create_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<CreateCommentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let image_id = parse_id(&raw_id).ok_or_else(|| unknown_image(&raw_id))?;

    let annotation = blocking(move || {
        state.review.annotate(
            image_id,
            req.x,
            req.y,
            req.comment.as_deref().unwrap_or_default(),
            req.author.as_deref(),
        )
    })
    .await?;

    Ok((StatusCode::CREATED, Json(annotation)))
}

/// DELETE /api/comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(access): Extension<Access>,
) -> Result<impl IntoResponse, ApiError> {
    access.require()?;
    if let Some(id) = parse_id(&raw_id) {
        blocking(move || state.review.delete_annotation(access, id)).await?;
    }
    Ok(Json(SuccessResponse::ok()))
}
