//! Generic key/value settings endpoints with a sensitive-key blocklist.

use super::{AppState, parse_body};
use crate::error::{ApiError, ApiResult};
use crate::glean::SENSITIVE_KEYS;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{Value, json};

fn reject_sensitive(key: &str) -> ApiResult<()> {
    if SENSITIVE_KEYS.contains(&key) {
        return Err(ApiError::sensitive_key());
    }
    Ok(())
}

/// GET /api/settings/{key} — stored value or null.
pub async fn get_by_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    reject_sensitive(&key)?;

    let value = state.store().get_setting(&key)?;
    Ok(Json(json!({ "value": value })))
}

/// PUT /api/settings/{key} — upsert a string value.
pub async fn put_by_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
    bytes: Bytes,
) -> ApiResult<Json<Value>> {
    reject_sensitive(&key)?;

    let body = parse_body(&bytes)?;
    let value = body
        .get("value")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Validation("value is required".into()))?;

    state.store().put_setting(&key, value)?;
    Ok(Json(json!({ "key": key, "value": value })))
}
