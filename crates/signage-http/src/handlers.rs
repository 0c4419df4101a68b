use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use signage_core::DistributionGateway;

use crate::response::ApiError;

/// State shared by every gateway route
#[derive(Clone, Debug)]
pub struct AppState {
    pub gateway: DistributionGateway,
}

/// `GET /signage/configs`
pub async fn list_configs(State(state): State<AppState>) -> Result<Response, ApiError> {
    let devices = state.gateway.list().await?;
    Ok(no_store(Json(devices)))
}

/// `GET /signage/config/{device_id}`
pub async fn fetch_config(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.gateway.fetch(&device_id).await?;
    Ok(no_store(Json(record)))
}

/// `PUT /signage/config` and `PUT /signage/configs`
///
/// The body is parsed by hand so that a malformed document gets the same JSON
/// error shape as every other failure.
pub async fn upsert_config(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload: Value = serde_json::from_slice(&body).map_err(ApiError::invalid_payload)?;
    let record = state.gateway.upsert(&payload).await?;
    Ok(no_store(Json(record)))
}

/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}

// Polled configuration must never be served from an intermediate cache.
fn no_store(body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
