//! Exclusive lease shared by the reconciliation sweeps.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use homevault_core::error::AppError;
use homevault_core::result::AppResult;

/// Admits one reconciliation sweep at a time.
///
/// Clones share the same lease. Ordinary node operations never take it.
#[derive(Debug, Clone, Default)]
pub struct ScanLease {
    lock: Arc<Mutex<()>>,
}

/// Held for the duration of a sweep; dropping it releases the lease.
#[derive(Debug)]
pub struct ScanGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ScanLease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lease without waiting. Fails `Conflict` while another sweep
    /// holds it.
    pub fn try_acquire(&self, sweep: &str) -> AppResult<ScanGuard> {
        Arc::clone(&self.lock)
            .try_lock_owned()
            .map(|guard| ScanGuard { _guard: guard })
            .map_err(|_| AppError::conflict(format!("A scan is already running, {sweep} skipped")))
    }

    /// Whether a sweep currently holds the lease.
    pub fn is_held(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
