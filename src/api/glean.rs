//! Glean integration endpoints: masked config read, config upsert, search.

use super::{AppState, parse_body};
use crate::error::{ApiError, ApiResult};
use crate::glean::{
    DEFAULT_LOOKBACK_DAYS, GleanError, GleanResult, SETTING_API_TOKEN, SETTING_INSTANCE,
    SETTING_USER_NAME, mask_token,
};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

impl From<GleanError> for ApiError {
    fn from(err: GleanError) -> Self {
        match err {
            GleanError::NotConfigured => ApiError::Validation(err.to_string()),
            GleanError::Unreachable(_) => ApiError::unreachable_upstream("Glean"),
            GleanError::UpstreamStatus { status, body } => {
                ApiError::upstream_status("Glean", status, body)
            }
        }
    }
}

/// GET /api/glean/config — instance, user name and a masked token. The raw
/// token never leaves the server.
pub async fn get_config(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let instance = state.store().get_setting(SETTING_INSTANCE)?;
    let user_name = state.store().get_setting(SETTING_USER_NAME)?;
    let token = state.store().get_setting(SETTING_API_TOKEN)?;

    Ok(Json(json!({
        "instance": instance,
        "userName": user_name,
        "maskedToken": mask_token(token.as_deref()),
    })))
}

/// POST /api/glean/config — upsert configuration. Instance is required;
/// token and user name are only overwritten when a non-blank value is
/// supplied, so a blank token field leaves the stored token intact.
pub async fn put_config(State(state): State<AppState>, bytes: Bytes) -> ApiResult<Json<Value>> {
    let body = parse_body(&bytes)?;

    let instance = body
        .get("instance")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("instance is required".into()))?;
    state.store().put_setting(SETTING_INSTANCE, instance)?;

    if let Some(token) = body.get("token").and_then(Value::as_str) {
        let token = token.trim();
        if !token.is_empty() {
            state.store().put_setting(SETTING_API_TOKEN, token)?;
        }
    }
    if let Some(user_name) = body.get("userName").and_then(Value::as_str) {
        let user_name = user_name.trim();
        if !user_name.is_empty() {
            state.store().put_setting(SETTING_USER_NAME, user_name)?;
        }
    }

    Ok(Json(json!({ "ok": true })))
}

/// POST /api/glean/search — search the last N days of Slack messages for
/// action items. Requires instance and token to be configured; otherwise
/// fails with a configuration error before any outbound call.
pub async fn search(
    State(state): State<AppState>,
    bytes: Bytes,
) -> ApiResult<Json<Vec<GleanResult>>> {
    let body = parse_body(&bytes).unwrap_or(Value::Null);
    let days = body
        .get("days")
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_LOOKBACK_DAYS);

    let instance = state.store().get_setting(SETTING_INSTANCE)?;
    let token = state.store().get_setting(SETTING_API_TOKEN)?;
    let user_name = state.store().get_setting(SETTING_USER_NAME)?;

    let (Some(instance), Some(token)) = (instance, token) else {
        return Err(GleanError::NotConfigured.into());
    };

    let results = state
        .glean()
        .search(&instance, &token, user_name.as_deref(), days)
        .await?;

    Ok(Json(results))
}
