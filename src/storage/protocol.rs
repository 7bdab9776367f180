//! Worker Network Protocol
//!
//! Endpoints and DTOs for control-manager-to-worker calls. Every call is a
//! JSON `POST`; the worker always answers `200 OK` and reports the outcome
//! in the body. Anything else is treated as a transport failure by the caller.

use crate::error::ErrorKind;
use crate::types::StoredRecord;
use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Store a key on the worker owning its shard.
pub const ENDPOINT_PUT_KEY_INTERNAL: &str = "/internal/put_key";
/// Read a key from the worker owning its shard.
pub const ENDPOINT_GET_KEY_INTERNAL: &str = "/internal/get_key";
/// Liveness probe, served by workers and the control manager.
pub const ENDPOINT_HEALTH: &str = "/health";

// --- Data Transfer Objects ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutKeyInternalArg {
    /// Request id generated by the control manager, for log correlation.
    pub req_id: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PutKeyInternalRet {
    pub success: bool,
    #[serde(default)]
    pub error_details: String,
    /// Classification of a failure. Older workers omit it.
    #[serde(default)]
    pub error_kind: Option<ErrorKind>,
}

impl PutKeyInternalRet {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_details: String::new(),
            error_kind: None,
        }
    }

    pub fn failed(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            success: false,
            error_details: details.into(),
            error_kind: Some(kind),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetKeyInternalArg {
    pub req_id: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetKeyInternalRet {
    pub success: bool,
    #[serde(default)]
    pub error_details: String,
    #[serde(default)]
    pub error_kind: Option<ErrorKind>,
    /// The stored record, present only on success.
    #[serde(default)]
    pub kv_object: Option<StoredRecord>,
}

impl GetKeyInternalRet {
    pub fn found(record: StoredRecord) -> Self {
        Self {
            success: true,
            error_details: String::new(),
            error_kind: None,
            kv_object: Some(record),
        }
    }

    pub fn failed(kind: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            success: false,
            error_details: details.into(),
            error_kind: Some(kind),
            kv_object: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub role: String,
}
