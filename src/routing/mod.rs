//! Key Placement
//!
//! Maps a key to the shard that owns it and a shard to the worker that
//! stores it. Placement is a pure function of two cluster-wide constants:
//!
//! - **Shard**: `fnv1a_32(key) % shard_count`
//! - **Worker**: `shard % worker_count`
//!
//! No placement table is persisted anywhere. Changing either constant
//! reassigns ownership of existing data without migrating it.

pub mod router;

pub use router::{Route, ShardRouter};
