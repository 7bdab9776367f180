use super::pool::WorkerPool;
use super::protocol::{GetKeyRet, PutKeyRet};
use crate::error::{ErrorEnvelope, ErrorKind};
use crate::routing::ShardRouter;
use crate::storage::protocol::{GetKeyInternalArg, PutKeyInternalArg};
use crate::types::WorkerId;

use std::time::Duration;
use uuid::Uuid;

const CLIENT_NOT_INITIALIZED: &str = "rpc client not initialized";

/// Validates client requests, routes them to the owning worker and
/// classifies the outcome. Nothing is retried: a timed-out Put has an
/// unknown outcome and may still have been applied by the worker.
pub struct Dispatcher {
    router: ShardRouter,
    pool: WorkerPool,
    rpc_timeout: Duration,
}

impl Dispatcher {
    pub fn new(router: ShardRouter, pool: WorkerPool, rpc_timeout: Duration) -> Self {
        Self {
            router,
            pool,
            rpc_timeout,
        }
    }

    pub fn router(&self) -> &ShardRouter {
        &self.router
    }

    pub async fn handle_put(&self, key: &str, value: &str) -> PutKeyRet {
        if key.is_empty() {
            return PutKeyRet::failed(invalid_argument("key must not be empty"));
        }
        if value.is_empty() {
            return PutKeyRet::failed(invalid_argument("value must not be empty"));
        }

        let route = self.router.route(key);
        let Some(client) = self.pool.client(route.worker) else {
            tracing::error!("RPC client not initialized: {}", route.worker);
            return PutKeyRet::failed(ErrorEnvelope::new(
                ErrorKind::InternalError,
                CLIENT_NOT_INITIALIZED,
            ));
        };

        let req = PutKeyInternalArg {
            req_id: Uuid::new_v4().to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };
        tracing::info!(
            "Call PutKeyInternal request_id: {} for {} (shard {})",
            req.req_id,
            route.worker,
            route.shard
        );

        match client.put_key_internal(&req, self.rpc_timeout).await {
            Ok(ret) if ret.success => PutKeyRet::ok(),
            Ok(ret) => {
                tracing::warn!(
                    "PutKeyInternal request_id: {} failed on {}: {}",
                    req.req_id,
                    route.worker,
                    ret.error_details
                );
                PutKeyRet::failed(ErrorEnvelope::new(
                    ErrorKind::BackendError,
                    ret.error_details,
                ))
            }
            Err(e) => {
                tracing::error!(
                    "No response for PutKeyInternal request_id: {} from {}: {}",
                    req.req_id,
                    route.worker,
                    e
                );
                PutKeyRet::failed(unavailable(&route.worker))
            }
        }
    }

    pub async fn handle_get(&self, key: &str) -> GetKeyRet {
        if key.is_empty() {
            return GetKeyRet::failed(invalid_argument("key must not be empty"));
        }

        let route = self.router.route(key);
        let Some(client) = self.pool.client(route.worker) else {
            tracing::error!("RPC client not initialized: {}", route.worker);
            return GetKeyRet::failed(ErrorEnvelope::new(
                ErrorKind::InternalError,
                CLIENT_NOT_INITIALIZED,
            ));
        };

        let req = GetKeyInternalArg {
            req_id: Uuid::new_v4().to_string(),
            key: key.to_string(),
        };
        tracing::info!(
            "Call GetKeyInternal request_id: {} for {} (shard {})",
            req.req_id,
            route.worker,
            route.shard
        );

        match client.get_key_internal(&req, self.rpc_timeout).await {
            Ok(ret) if ret.success => match ret.kv_object {
                Some(record) => GetKeyRet::found(record.value),
                None => {
                    tracing::error!(
                        "GetKeyInternal request_id: {} succeeded without a record",
                        req.req_id
                    );
                    GetKeyRet::failed(ErrorEnvelope::new(
                        ErrorKind::BackendError,
                        "worker returned no record",
                    ))
                }
            },
            Ok(ret) => {
                // Workers that do not classify failures are treated as not-found.
                let kind = match ret.error_kind {
                    Some(ErrorKind::BackendError) => ErrorKind::BackendError,
                    _ => ErrorKind::NotFound,
                };
                GetKeyRet::failed(ErrorEnvelope::new(kind, ret.error_details))
            }
            Err(e) => {
                tracing::error!(
                    "No response for GetKeyInternal request_id: {} from {}: {}",
                    req.req_id,
                    route.worker,
                    e
                );
                GetKeyRet::failed(unavailable(&route.worker))
            }
        }
    }
}

fn invalid_argument(details: &str) -> ErrorEnvelope {
    ErrorEnvelope::new(ErrorKind::InvalidArgument, details)
}

/// Transport failures are reported generically; the underlying error is only logged.
fn unavailable(worker: &WorkerId) -> ErrorEnvelope {
    ErrorEnvelope::new(ErrorKind::InternalError, format!("{} unavailable", worker))
}
