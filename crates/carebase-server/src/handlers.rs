use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
};
use carebase_api::{ApiError, ApiResponse};
use carebase_core::ResourceRecord;
use carebase_storage::RecordStore;
use serde::Serialize;
use serde_json::Value;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub subscribers: usize,
}

pub async fn root() -> &'static str {
    "Hello, World!"
}

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let subscribers = state
        .notifier
        .as_ref()
        .map(|n| n.subscriber_count())
        .unwrap_or(0);
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            backend: state.service.store().backend_name(),
            subscribers,
        }),
    )
}

pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ResourceRecord>>, ApiError> {
    let records = state.service.list_resources().await?;
    Ok(ApiResponse::ok(records))
}

pub async fn create_resource(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<ApiResponse<ResourceRecord>, ApiError> {
    let body = body.map_err(body_rejection)?;
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))?;
    let record = state.service.create_resource(payload).await?;
    Ok(ApiResponse::created(record))
}

pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {method} {}", uri.path()))
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::method_not_allowed(format!("{method} is not supported on {}", uri.path()))
}

fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(rejection.body_text())
    } else {
        ApiError::bad_request(format!("Unreadable request body: {}", rejection.body_text()))
    }
}
