//! Oracle Timestamps
//!
//! A per-shard logical write clock. Every write to a shard is stamped with
//! a value that is strictly greater than any value previously issued for
//! that shard, even when the wall clock stalls or moves backwards.
//!
//! ## Durability
//! Each issued value is checkpointed to `<checkpoint_root>/<shard_id>`
//! before the write it stamps may proceed. On startup the directory is
//! scanned and every shard resumes strictly above its checkpoint. Values
//! lost to a failed checkpoint leave gaps; they are never reissued.

pub mod clock;

pub use clock::{OracleClock, SystemTimeSource, TimeSource};
