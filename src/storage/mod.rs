//! Worker Storage Module
//!
//! Durable single-key-per-file storage on each worker, and the service that
//! exposes it to the control manager.
//!
//! ## Core Concepts
//! - **Layout**: `<mount_root>/<shard_id>/<key>` holds a JSON `StoredRecord`.
//! - **Placement**: the worker recomputes the shard from the key itself.
//! - **Ordering**: every Put is stamped with the shard's next oracle timestamp,
//!   checkpointed before the value is written. A failed checkpoint aborts the Put.
//! - **Access**: `WorkerService` runs the blocking file I/O; `handlers` puts it on HTTP.

pub mod handlers;
pub mod protocol;
pub mod service;
pub mod store;

pub use service::WorkerService;
pub use store::WorkerStore;
