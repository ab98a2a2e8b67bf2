//! Cancellation-aware permit pool.
//!
//! Limits how many probes hit the source and target systems at once. The
//! orchestrator uses the same type to bound the number of running checks.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Pool errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("acquire cancelled")]
    Cancelled,

    #[error("pool closed")]
    Closed,
}

/// A bounded set of permits shared between checks.
#[derive(Clone, Debug)]
pub struct ProbePool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl ProbePool {
    /// Create a pool with `capacity` permits (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a permit, giving up as soon as `cancel` fires.
    pub async fn acquire(
        &self,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, PoolError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PoolError::Cancelled),
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| PoolError::Closed)
            }
        }
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fail all current and future acquires with `PoolError::Closed`.
    pub fn close(&self) {
        self.permits.close();
    }
}
