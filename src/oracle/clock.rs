use crate::error::StoreError;
use crate::types::{OracleTimestamp, ShardId};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock seconds.
pub trait TimeSource: Send + Sync {
    fn now_seconds(&self) -> i64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_seconds(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default()
    }
}

pub struct OracleClock {
    /// Last issued timestamp per shard. Absent until the first write.
    issued: DashMap<ShardId, OracleTimestamp>,
    /// Highest timestamp written to each shard's checkpoint file. The mutex
    /// also serializes checkpoint writes for the shard.
    durable: DashMap<ShardId, Arc<Mutex<OracleTimestamp>>>,
    checkpoint_root: PathBuf,
    time: Arc<dyn TimeSource>,
}

impl OracleClock {
    /// Opens the clock, seeding every shard that has a checkpoint file.
    pub fn open(checkpoint_root: impl Into<PathBuf>) -> Self {
        Self::with_time_source(checkpoint_root, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(
        checkpoint_root: impl Into<PathBuf>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        let clock = Self {
            issued: DashMap::new(),
            durable: DashMap::new(),
            checkpoint_root: checkpoint_root.into(),
            time,
        };
        clock.recover();
        clock
    }

    fn recover(&self) {
        let entries = match fs::read_dir(&self.checkpoint_root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::info!(
                    "No oracle checkpoints readable at {} ({}), assuming first boot",
                    self.checkpoint_root.display(),
                    e
                );
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let Some(shard) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.parse::<u32>().ok())
                .map(ShardId)
            else {
                tracing::warn!("Skipping unexpected checkpoint file {}", path.display());
                continue;
            };

            let timestamp = match fs::read_to_string(&path) {
                Ok(content) => match content.trim().parse::<OracleTimestamp>() {
                    Ok(ts) => ts,
                    Err(e) => {
                        tracing::warn!(
                            "Invalid oracle checkpoint for shard {}: {}",
                            shard,
                            e
                        );
                        continue;
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };

            tracing::info!("Recovered oracle timestamp {} for shard {}", timestamp, shard);
            self.issued.insert(shard, timestamp);
            self.durable
                .insert(shard, Arc::new(Mutex::new(timestamp)));
        }
    }

    /// Issues the next timestamp for `shard` without persisting it.
    ///
    /// Fails once the shard has issued `i64::MAX`; the counter is left untouched.
    pub fn next(&self, shard: ShardId) -> Result<OracleTimestamp, StoreError> {
        let now = self.time.now_seconds();

        match self.issued.entry(shard) {
            Entry::Occupied(mut entry) => {
                let next = now
                    .max(*entry.get())
                    .checked_add(1)
                    .ok_or(StoreError::ClockExhausted { shard })?;
                entry.insert(next);
                Ok(next)
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Ok(now)
            }
        }
    }

    /// Durably records `timestamp` as issued for `shard`.
    ///
    /// A timestamp at or below the one already on disk is covered by it and
    /// is not rewritten, so the file for a shard never moves backwards.
    pub fn checkpoint(&self, shard: ShardId, timestamp: OracleTimestamp) -> Result<(), StoreError> {
        let slot = self
            .durable
            .entry(shard)
            .or_insert_with(|| Arc::new(Mutex::new(OracleTimestamp::MIN)))
            .clone();
        let mut persisted = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if timestamp <= *persisted {
            tracing::debug!(
                "Shard {} checkpoint {} already covers {}",
                shard,
                *persisted,
                timestamp
            );
            return Ok(());
        }

        fs::create_dir_all(&self.checkpoint_root)
            .and_then(|_| fs::write(self.checkpoint_path(shard), timestamp.to_string()))
            .map_err(|source| StoreError::Checkpoint { shard, source })?;

        *persisted = timestamp;
        Ok(())
    }

    /// Issues and checkpoints a timestamp. On failure the caller must not
    /// perform the write the timestamp was meant for.
    pub fn issue(&self, shard: ShardId) -> Result<OracleTimestamp, StoreError> {
        let timestamp = self.next(shard)?;
        self.checkpoint(shard, timestamp)?;
        Ok(timestamp)
    }

    pub fn last_issued(&self, shard: ShardId) -> Option<OracleTimestamp> {
        self.issued.get(&shard).map(|entry| *entry.value())
    }

    pub fn checkpoint_path(&self, shard: ShardId) -> PathBuf {
        self.checkpoint_root.join(shard.to_string())
    }
}
