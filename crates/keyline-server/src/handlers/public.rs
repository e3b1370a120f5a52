use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use keyline_core::{Plan, ResetOutcome};

use crate::error::{ApiError, Result};
use crate::extractors::Json;
use crate::state::AppState;

const ACTIVATION_FAILED: &str = "Server error during activation";
const RESET_FAILED: &str = "Server error during reset";

/// Pull a required string field out of a loosely-typed body. Non-string
/// values count as missing.
fn required_str<'a>(value: Option<&'a Value>, message: &str) -> Result<&'a str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest(message.into()))
}

// ── Health ──────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ── Activation ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    #[serde(default, rename = "licenseKey")]
    pub license_key: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateResponse {
    pub message: &'static str,
    pub license_id: String,
}

pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ActivateRequest>,
) -> Result<axum::Json<ActivateResponse>> {
    let key = required_str(req.license_key.as_ref(), "License key is required")?;

    let outcome = state
        .activation
        .activate(key)
        .await
        .map_err(|e| ApiError::from_core(e, ACTIVATION_FAILED))?;

    Ok(axum::Json(ActivateResponse {
        message: "License activated successfully",
        license_id: outcome.license_id,
    }))
}

// ── Daily reset ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default, rename = "userId")]
    pub user_id: Option<Value>,
}

/// Counters are only present when a branch fired.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_used: Option<i64>,
}

impl From<&ResetOutcome> for ResetResponse {
    fn from(outcome: &ResetOutcome) -> Self {
        let message = outcome.message();
        match *outcome {
            ResetOutcome::Expired {
                plan,
                messages_limit,
                messages_used,
                ..
            } => Self {
                message,
                plan: Some(plan),
                messages_limit: Some(messages_limit),
                messages_used: Some(messages_used),
            },
            ResetOutcome::DailyReset {
                messages_used,
                messages_limit,
                ..
            } => Self {
                message,
                plan: None,
                messages_limit: Some(messages_limit),
                messages_used: Some(messages_used),
            },
            ResetOutcome::NoOp => Self {
                message,
                plan: None,
                messages_limit: None,
                messages_used: None,
            },
        }
    }
}

pub async fn daily_reset(
    State(state): State<AppState>,
    Json(req): Json<ResetRequest>,
) -> Result<axum::Json<ResetResponse>> {
    let user_id = required_str(req.user_id.as_ref(), "User ID is required")?;

    let outcome = state
        .quota
        .reset_if_needed(user_id)
        .await
        .map_err(|e| ApiError::from_core(e, RESET_FAILED))?;

    Ok(axum::Json(ResetResponse::from(&outcome)))
}
