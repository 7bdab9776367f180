//! Identifiers and the durable record shared by the control manager and workers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed partition of the key space, `0..shard_count`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardId(pub u32);

/// Index of a worker process, `0..worker_count`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u32);

/// Per-shard logical write clock value. Approximates unix seconds but is
/// only guaranteed to be strictly increasing per shard.
pub type OracleTimestamp = i64;

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// The unit written to disk for every key: the latest value and the
/// oracle timestamp assigned to the write that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub value: String,
    pub db_modified_ts: OracleTimestamp,
}
