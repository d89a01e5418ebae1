pub mod auth;
pub mod comments;
pub mod error;
pub mod images;
pub mod middleware;
pub mod status;
pub mod storage;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use pinboard_review::ReviewError;
use tower_http::services::ServeDir;
use tracing::{debug, error};
use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::storage::MAX_UPLOAD_SIZE;

/// Room for multipart framing around a maximum-size file.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_SIZE + 64 * 1024;

/// The review API plus `/uploads` blob serving.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/upload", post(images::upload))
        .route("/images", get(images::list_images))
        .route("/images/{id}", get(images::get_image).delete(images::delete_image))
        .route("/images/{id}/comments", post(comments::create_comment))
        .route("/images/{id}/status", post(status::update_status))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/admin/login", post(auth::login))
        .route("/admin/check", get(auth::check))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(from_fn_with_state(state.clone(), middleware::resolve_access))
        .with_state(state.clone());

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(state.storage.dir()))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run a blocking store operation off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ReviewError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed: {}", e))
        })?
        .map_err(ApiError::from)
}

/// Path ids are opaque; text that is not a UUID names no stored record.
pub(crate) fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

/// Lookup failure for a path id that cannot name any image.
pub(crate) fn unknown_image(raw: &str) -> ApiError {
    debug!("Path id {:?} is not a UUID", raw);
    ApiError::Review(ReviewError::NotFound {
        entity: "image",
        id: Uuid::nil(),
    })
}
