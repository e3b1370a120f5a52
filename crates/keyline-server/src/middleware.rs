use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;

use crate::error::ApiError;
use crate::state::AppState;

/// Pull the token out of `Authorization: Bearer <token>`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Guard for the admin routes. A no-op when no admin token is configured.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.admin_token {
        let presented = extract_bearer_token(request.headers());
        if presented != Some(expected.expose_secret()) {
            tracing::warn!(path = %request.uri().path(), "admin request rejected");
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}
