use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use keyline_core::{LicenseRecord, Plan};

use crate::error::{ApiError, Result};
use crate::extractors::{Json, Query};
use crate::state::AppState;

const ADMIN_FAILED: &str = "Server error while updating licenses";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub plan: Plan,
    pub issuer_id: String,
    pub validity_days: i64,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub key: String,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, axum::Json<GenerateResponse>)> {
    let key = state
        .licenses
        .generate(req.plan, &req.issuer_id, req.validity_days)
        .await
        .map_err(|e| ApiError::from_core(e, ADMIN_FAILED))?;
    Ok((StatusCode::CREATED, axum::Json(GenerateResponse { key })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub issuer_id: String,
}

pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<axum::Json<Vec<LicenseRecord>>> {
    let records = state
        .licenses
        .list_by_issuer(&q.issuer_id)
        .await
        .map_err(|e| ApiError::from_core(e, ADMIN_FAILED))?;
    Ok(axum::Json(records))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    state
        .licenses
        .deactivate(&key)
        .await
        .map_err(|e| ApiError::from_core(e, ADMIN_FAILED))?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkUsedRequest {
    pub user_id: String,
}

pub async fn mark_used(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<MarkUsedRequest>,
) -> Result<StatusCode> {
    state
        .licenses
        .mark_used(&key, &req.user_id)
        .await
        .map_err(|e| ApiError::from_core(e, ADMIN_FAILED))?;
    Ok(StatusCode::NO_CONTENT)
}
