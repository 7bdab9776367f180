//! Leader election seam
//!
//! The control manager only consumes a blocking `campaign` primitive: it
//! returns once this process is the single leader. The distributed lock
//! behind it lives outside this crate. `Leadership` carries an epoch and a
//! revocation signal so the server can stop accepting requests when the
//! lock is lost.

use anyhow::Result;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};

pub trait LeaderElection: Send + Sync {
    /// Blocks until `candidate_id` holds exclusive leadership.
    fn campaign(&self, candidate_id: &str) -> impl Future<Output = Result<Leadership>> + Send;
}

pub struct Leadership {
    candidate_id: String,
    epoch: u64,
    revoked: watch::Receiver<bool>,
    _seat: Option<OwnedSemaphorePermit>,
}

impl Leadership {
    pub fn candidate_id(&self) -> &str {
        &self.candidate_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_revoked(&self) -> bool {
        *self.revoked.borrow()
    }

    /// Resolves once leadership is lost. Never resolves if nothing can revoke it.
    pub async fn revoked(&mut self) {
        if self.revoked.wait_for(|revoked| *revoked).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Single control manager deployment: leadership is granted immediately
/// and never revoked.
pub struct StandaloneElection;

impl LeaderElection for StandaloneElection {
    async fn campaign(&self, candidate_id: &str) -> Result<Leadership> {
        let (_never, revoked) = watch::channel(false);
        tracing::info!("Standalone deployment, {} is leader", candidate_id);
        Ok(Leadership {
            candidate_id: candidate_id.to_string(),
            epoch: 1,
            revoked,
            _seat: None,
        })
    }
}

/// In-process election among candidates sharing one instance. The seat is
/// released when the winning `Leadership` is dropped.
pub struct LocalElection {
    seat: Arc<Semaphore>,
    epoch: AtomicU64,
    current: Mutex<Option<watch::Sender<bool>>>,
}

impl LocalElection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            seat: Arc::new(Semaphore::new(1)),
            epoch: AtomicU64::new(0),
            current: Mutex::new(None),
        })
    }

    /// Signals the current leader that it lost leadership.
    pub fn revoke(&self) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(sender) => sender.send(true).is_ok(),
            None => false,
        }
    }
}

impl LeaderElection for LocalElection {
    async fn campaign(&self, candidate_id: &str) -> Result<Leadership> {
        tracing::info!("{} campaigning for leadership", candidate_id);
        let seat = self.seat.clone().acquire_owned().await?;

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, revoked) = watch::channel(false);
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(sender);

        tracing::info!("Leader elected: {} (epoch {})", candidate_id, epoch);
        Ok(Leadership {
            candidate_id: candidate_id.to_string(),
            epoch,
            revoked,
            _seat: Some(seat),
        })
    }
}
