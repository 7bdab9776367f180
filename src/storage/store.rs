use crate::error::StoreError;
use crate::routing::ShardRouter;
use crate::types::{OracleTimestamp, ShardId, StoredRecord};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Disk-backed store holding one file per key under its shard directory:
/// `<mount_root>/<shard_id>/<key>`.
///
/// Writes truncate and overwrite the file in place. A crash in the middle
/// of a write can leave a partial record, which later reads report as a
/// corrupt record (backend error).
pub struct WorkerStore {
    mount_root: PathBuf,
    router: ShardRouter,
}

impl WorkerStore {
    pub fn new(mount_root: impl Into<PathBuf>, router: ShardRouter) -> Self {
        Self {
            mount_root: mount_root.into(),
            router,
        }
    }

    /// The shard is always recomputed from the key, never taken from the caller.
    pub fn shard_for(&self, key: &str) -> ShardId {
        self.router.shard_for(key)
    }

    /// Keys are used verbatim as file names, so they must be a single
    /// normal path component.
    pub fn check_key(key: &str) -> Result<(), StoreError> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn shard_dir(&self, shard: ShardId) -> PathBuf {
        self.mount_root.join(shard.to_string())
    }

    pub fn record_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        Self::check_key(key)?;
        Ok(self.shard_dir(self.shard_for(key)).join(key))
    }

    pub fn put(
        &self,
        key: &str,
        value: &str,
        timestamp: OracleTimestamp,
    ) -> Result<(), StoreError> {
        let path = self.record_path(key)?;
        let dir = self.shard_dir(self.shard_for(key));

        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let record = StoredRecord {
            value: value.to_string(),
            db_modified_ts: timestamp,
        };
        let encoded = serde_json::to_vec(&record).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        file.write_all(&encoded)
            .map_err(|e| StoreError::io(&path, e))?;

        tracing::debug!(
            "Key {} written to {} with db_modified_ts {}",
            key,
            path.display(),
            timestamp
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<StoredRecord, StoreError> {
        let path = self.record_path(key)?;

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                });
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt { path, source })
    }
}
