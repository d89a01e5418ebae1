use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use pinboard_review::Access;
use pinboard_types::api::{ImageDetailResponse, ImageResponse, SuccessResponse};
use tracing::{info, warn};

use crate::auth::AppState;
use crate::{blocking, parse_id, unknown_image};
use crate::error::ApiError;
use crate::storage::{ImageFormat, MAX_UPLOAD_SIZE};

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "image";

/// POST /api/upload: multipart upload of one PNG or JPEG under `image`.
pub async fn upload(
    State(state): State<AppState>,
    Extension(access): Extension<Access>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    // Refuse before touching the disk.
    access.require()?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((original_name, content_type, data));
        break;
    }

    let (original_name, content_type, data) =
        upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;

    if data.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".into()));
    }
    if data.len() > MAX_UPLOAD_SIZE {
        return Err(ApiError::PayloadTooLarge("File exceeds the 10 MB limit".into()));
    }
    let format = ImageFormat::detect(&original_name, content_type.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Only PNG and JPG images are allowed".into()))?;

    let filename = state.storage.save(format, &data).await?;

    let app = state.clone();
    let blob = filename.clone();
    let name = original_name.clone();
    let created = blocking(move || app.review.create_image(access, &blob, &name)).await;

    let image = match created {
        Ok(image) => image,
        Err(e) => {
            // No record points at the blob; drop it.
            if let Err(cleanup) = state.storage.delete(&filename).await {
                warn!("Failed to remove orphaned blob {}: {}", filename, cleanup);
            }
            return Err(e);
        }
    };

    info!(
        "Uploaded {} as {} ({} bytes)",
        original_name,
        image.filename,
        data.len()
    );
    Ok((StatusCode::CREATED, Json(ImageResponse::from(image))))
}

/// GET /api/images
pub async fn list_images(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let images = blocking(move || state.review.list_images()).await?;
    let body: Vec<ImageResponse> = images.into_iter().map(ImageResponse::from).collect();
    Ok(Json(body))
}

/// GET /api/images/{id}
pub async fn get_image(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&raw_id).ok_or_else(|| unknown_image(&raw_id))?;
    let detail = blocking(move || state.review.get_image(id)).await?;
    Ok(Json(ImageDetailResponse::from(detail)))
}

/// DELETE /api/images/{id}
pub async fn delete_image(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Extension(access): Extension<Access>,
) -> Result<impl IntoResponse, ApiError> {
    access.require()?;
    // Nothing stored can answer to a non-UUID id, so it is already gone.
    let Some(id) = parse_id(&raw_id) else {
        return Ok(Json(SuccessResponse::ok()));
    };

    let app = state.clone();
    let removed = blocking(move || app.review.delete_image(access, id)).await?;

    if let Some(image) = removed {
        if let Err(e) = state.storage.delete(&image.filename).await {
            warn!("Image {} deleted but blob {} remains: {}", id, image.filename, e);
        }
    }

    Ok(Json(SuccessResponse::ok()))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File exceeds the 10 MB limit".into())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
