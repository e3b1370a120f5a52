mod admin;
mod public;

pub use admin::{GenerateRequest, GenerateResponse, ListQuery, MarkUsedRequest};
pub use public::{ActivateRequest, ActivateResponse, ResetRequest, ResetResponse};

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::require_admin;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health))
        .route("/api/license/activate", post(public::activate))
        .route("/api/daily-reset", post(public::daily_reset))
        .merge(
            Router::new()
                .route(
                    "/api/admin/licenses",
                    post(admin::generate).get(admin::list),
                )
                .route(
                    "/api/admin/licenses/{key}/deactivate",
                    post(admin::deactivate),
                )
                .route("/api/admin/licenses/{key}/use", post(admin::mark_used))
                .layer(middleware::from_fn_with_state(state, require_admin)),
        )
}
