//! Client-facing Protocol
//!
//! Endpoints and DTOs served by the control manager. Like the worker
//! protocol, every call answers `200 OK` and the outcome is carried in the
//! `ErrorEnvelope`.

use crate::error::ErrorEnvelope;
use serde::{Deserialize, Serialize};

/// Public endpoint for client write requests.
pub const ENDPOINT_PUT_KEY: &str = "/put_key";
/// Public endpoint for client read requests.
pub const ENDPOINT_GET_KEY: &str = "/get_key";

/// Absent fields decode as empty strings so they fail validation with an
/// invalid-argument result instead of a decoding rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutKeyArg {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PutKeyRet {
    pub success: bool,
    pub error: ErrorEnvelope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetKeyArg {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GetKeyRet {
    /// Empty unless `success` is true.
    pub value: String,
    pub success: bool,
    pub error: ErrorEnvelope,
}

impl PutKeyRet {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: ErrorEnvelope::ok(),
        }
    }

    pub fn failed(error: ErrorEnvelope) -> Self {
        Self {
            success: false,
            error,
        }
    }
}

impl GetKeyRet {
    pub fn found(value: String) -> Self {
        Self {
            value,
            success: true,
            error: ErrorEnvelope::ok(),
        }
    }

    pub fn failed(error: ErrorEnvelope) -> Self {
        Self {
            value: String::new(),
            success: false,
            error,
        }
    }
}
