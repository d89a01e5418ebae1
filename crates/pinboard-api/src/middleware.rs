use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use pinboard_review::Access;
use tracing::debug;

use crate::auth::AppState;

/// Resolve the caller's [`Access`] from an `Authorization: Bearer` header
/// and attach it to the request. Never rejects; gated operations refuse
/// `Access::Denied` themselves.
pub async fn resolve_access(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer.as_ref().ok().map(|TypedHeader(auth)| auth.token());
    let access: Access = state.admin.access_for(token);

    if token.is_some() && !access.is_granted() {
        debug!("Bearer token rejected for {} {}", req.method(), req.uri().path());
    }

    req.extensions_mut().insert(access);
    next.run(req).await
}
