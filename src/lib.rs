//! Sharded Key-Value Store Library
//!
//! A leader-elected control manager routes every key to the worker that
//! owns its shard; each worker keeps its keys on local disk, one file per
//! key, stamped with a per-shard oracle timestamp.
//!
//! ## Architecture Modules
//! - **`routing`**: FNV-1a key → shard → worker placement, a pure function of
//!   the cluster constants.
//! - **`oracle`**: the per-shard monotonic write clock with durable checkpoints.
//! - **`storage`**: the worker side. Single-key-per-file storage engine plus
//!   the internal RPC surface the control manager calls.
//! - **`control`**: the control manager. Validation, dispatch with bounded
//!   deadlines, error classification and the leader election gate.
//! - **`client`**: typed client for the public API.

pub mod client;
pub mod config;
pub mod control;
pub mod error;
pub mod oracle;
pub mod routing;
pub mod storage;
pub mod types;
