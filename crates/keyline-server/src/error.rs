use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use keyline_core::CoreError;

/// Every failure a handler can return. Bodies are always `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// `public` goes to the caller; `detail` only to the log.
    #[error("{public}: {detail}")]
    Internal { public: &'static str, detail: String },
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    message: &'a str,
}

impl ApiError {
    /// Map a service error. Store failures become a generic `public`
    /// message; their detail stays server-side.
    pub fn from_core(err: CoreError, public: &'static str) -> Self {
        match err {
            CoreError::Validation { message }
            | CoreError::NotFound { message }
            | CoreError::Disabled { message } => Self::BadRequest(message),
            CoreError::Server(e) => Self::Internal {
                public,
                detail: e.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Internal { public, detail } => {
                tracing::error!("{public}: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, *public)
            }
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
