use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use pinboard_review::{ReviewError, parse_transition_target};
use pinboard_types::api::{UpdateStatusRequest, UpdateStatusResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, parse_id, unknown_image};

/// POST /api/images/{id}/status: approve or request changes.
pub async fn update_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateStatusRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let image_id = parse_id(&raw_id).ok_or_else(|| unknown_image(&raw_id))?;
    let target = match req.status.as_deref() {
        Some(raw) => parse_transition_target(raw)?,
        None => return Err(ReviewError::validation("invalid status").into()),
    };

    let outcome = blocking(move || {
        state
            .review
            .transition_status(image_id, target, req.note.as_deref())
    })
    .await?;

    Ok(Json(UpdateStatusResponse {
        success: true,
        outcome,
    }))
}
