//! Error taxonomy
//!
//! `ErrorKind` / `ErrorEnvelope` travel on the wire with every client-facing
//! result. `StoreError` is the worker-local failure type produced by the
//! storage engine and the oracle clock; it is classified into an
//! `ErrorKind` before it leaves the worker.

use crate::types::ShardId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ErrorKind {
    #[default]
    #[serde(rename = "kNoError")]
    NoError,
    /// Malformed client input, rejected before dispatch.
    #[serde(rename = "kInvalidArgument")]
    InvalidArgument,
    /// Key absent on the responsible worker.
    #[serde(rename = "kNotFound")]
    NotFound,
    /// The worker's storage layer failed (including oracle checkpoints).
    #[serde(rename = "kBackendError")]
    BackendError,
    /// Transport failure or missing remote-call handle.
    #[serde(rename = "kInternalError")]
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ErrorEnvelope {
    pub kind: ErrorKind,
    pub details: String,
}

impl ErrorEnvelope {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn new(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.kind == ErrorKind::NoError
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("key {key:?} is not a valid file name")]
    InvalidKey { key: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record in {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist oracle timestamp for shard {shard}: {source}")]
    Checkpoint {
        shard: ShardId,
        #[source]
        source: std::io::Error,
    },

    #[error("oracle timestamps exhausted for shard {shard}")]
    ClockExhausted { shard: ShardId },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::BackendError,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("shard count must be greater than zero")]
    ZeroShards,
    #[error("worker count must be greater than zero")]
    ZeroWorkers,
}
