use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;

use super::protocol::{
    ENDPOINT_GET_KEY_INTERNAL, ENDPOINT_HEALTH, ENDPOINT_PUT_KEY_INTERNAL, GetKeyInternalArg,
    GetKeyInternalRet, HealthResponse, PutKeyInternalArg, PutKeyInternalRet,
};
use super::service::WorkerService;
use crate::error::ErrorKind;

/// HTTP surface of a worker.
pub fn router(service: Arc<WorkerService>) -> Router {
    Router::new()
        .route(ENDPOINT_PUT_KEY_INTERNAL, post(handle_put_key_internal))
        .route(ENDPOINT_GET_KEY_INTERNAL, post(handle_get_key_internal))
        .route(ENDPOINT_HEALTH, get(handle_health))
        .layer(Extension(service))
}

pub async fn handle_put_key_internal(
    Extension(service): Extension<Arc<WorkerService>>,
    Json(req): Json<PutKeyInternalArg>,
) -> (StatusCode, Json<PutKeyInternalRet>) {
    tracing::info!(
        "Received RPC PutKeyInternal request_id:{} for key: {}",
        req.req_id,
        req.key
    );

    match tokio::task::spawn_blocking(move || service.put_key_internal(req)).await {
        Ok(ret) => (StatusCode::OK, Json(ret)),
        Err(e) => {
            tracing::error!("PutKeyInternal task failed: {}", e);
            (
                StatusCode::OK,
                Json(PutKeyInternalRet::failed(
                    ErrorKind::BackendError,
                    "storage task aborted",
                )),
            )
        }
    }
}

pub async fn handle_get_key_internal(
    Extension(service): Extension<Arc<WorkerService>>,
    Json(req): Json<GetKeyInternalArg>,
) -> (StatusCode, Json<GetKeyInternalRet>) {
    tracing::info!(
        "Received RPC GetKeyInternal request_id:{} for key: {}",
        req.req_id,
        req.key
    );

    match tokio::task::spawn_blocking(move || service.get_key_internal(req)).await {
        Ok(ret) => (StatusCode::OK, Json(ret)),
        Err(e) => {
            tracing::error!("GetKeyInternal task failed: {}", e);
            (
                StatusCode::OK,
                Json(GetKeyInternalRet::failed(
                    ErrorKind::BackendError,
                    "storage task aborted",
                )),
            )
        }
    }
}

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        role: "worker".to_string(),
    })
}
