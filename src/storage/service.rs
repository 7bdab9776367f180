//! Worker-side request handling: stamps writes with an oracle timestamp and
//! turns storage results into internal protocol responses.

use super::protocol::*;
use super::store::WorkerStore;
use crate::error::{ErrorKind, StoreError};
use crate::oracle::OracleClock;

use std::sync::Arc;

pub struct WorkerService {
    clock: Arc<OracleClock>,
    store: Arc<WorkerStore>,
}

impl WorkerService {
    pub fn new(clock: Arc<OracleClock>, store: Arc<WorkerStore>) -> Arc<Self> {
        Arc::new(Self { clock, store })
    }

    pub fn clock(&self) -> &OracleClock {
        &self.clock
    }

    pub fn store(&self) -> &WorkerStore {
        &self.store
    }

    /// Blocking: performs checkpoint and record file I/O.
    pub fn put_key_internal(&self, req: PutKeyInternalArg) -> PutKeyInternalRet {
        if let Err(e) = WorkerStore::check_key(&req.key) {
            tracing::error!("PutKeyInternal request_id:{} rejected: {}", req.req_id, e);
            return PutKeyInternalRet::failed(e.kind(), e.to_string());
        }

        let shard = self.store.shard_for(&req.key);

        // The timestamp must be durable before the value write may happen.
        let timestamp = match self.clock.issue(shard) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::error!("PutKeyInternal request_id:{}: {}", req.req_id, e);
                return PutKeyInternalRet::failed(e.kind(), e.to_string());
            }
        };
        tracing::info!(
            "Generated oracle timestamp for shard:{} timestamp:{}",
            shard,
            timestamp
        );

        match self.store.put(&req.key, &req.value, timestamp) {
            Ok(()) => {
                tracing::info!(
                    "Key {} written for request_id:{} with db_modified_ts {}",
                    req.key,
                    req.req_id,
                    timestamp
                );
                PutKeyInternalRet::ok()
            }
            Err(e) => {
                tracing::error!("PutKeyInternal request_id:{} failed: {}", req.req_id, e);
                PutKeyInternalRet::failed(e.kind(), e.to_string())
            }
        }
    }

    /// Blocking: reads the record file. A key that can never be stored
    /// reads as not found.
    pub fn get_key_internal(&self, req: GetKeyInternalArg) -> GetKeyInternalRet {
        match self.store.get(&req.key) {
            Ok(record) => {
                tracing::info!(
                    "Key {} read for request_id:{} (db_modified_ts {})",
                    req.key,
                    req.req_id,
                    record.db_modified_ts
                );
                GetKeyInternalRet::found(record)
            }
            Err(e @ StoreError::InvalidKey { .. }) => {
                tracing::warn!("GetKeyInternal request_id:{}: {}", req.req_id, e);
                GetKeyInternalRet::failed(ErrorKind::NotFound, e.to_string())
            }
            Err(e) => {
                tracing::warn!("GetKeyInternal request_id:{}: {}", req.req_id, e);
                GetKeyInternalRet::failed(e.kind(), e.to_string())
            }
        }
    }
}
