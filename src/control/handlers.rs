use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;

use super::dispatcher::Dispatcher;
use super::protocol::{ENDPOINT_GET_KEY, ENDPOINT_PUT_KEY, GetKeyArg, GetKeyRet, PutKeyArg, PutKeyRet};
use crate::storage::protocol::{ENDPOINT_HEALTH, HealthResponse};

/// HTTP surface of the control manager.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(ENDPOINT_PUT_KEY, post(handle_put_key))
        .route(ENDPOINT_GET_KEY, post(handle_get_key))
        .route(ENDPOINT_HEALTH, get(handle_health))
        .layer(Extension(dispatcher))
}

pub async fn handle_put_key(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Json(req): Json<PutKeyArg>,
) -> Json<PutKeyRet> {
    tracing::info!("Received PutKey request for key: {}", req.key);
    Json(dispatcher.handle_put(&req.key, &req.value).await)
}

pub async fn handle_get_key(
    Extension(dispatcher): Extension<Arc<Dispatcher>>,
    Json(req): Json<GetKeyArg>,
) -> Json<GetKeyRet> {
    tracing::info!("Received GetKey request for key: {}", req.key);
    Json(dispatcher.handle_get(&req.key).await)
}

pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        role: "control-manager".to_string(),
    })
}
