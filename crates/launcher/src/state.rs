//! Shared server state and the single-job session slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use routebridge_engine::config::JobConfig;
use tokio_util::sync::CancellationToken;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The job template every remote session is started from.
    pub config: Arc<JobConfig>,
    /// Guard ensuring at most one routing job per process.
    pub slot: SessionSlot,
    /// Master cancellation token; cancelled during shutdown.
    pub cancel: CancellationToken,
}

/// At-most-one-job guard.
///
/// Clones share the same slot. `try_acquire` hands out an RAII permit;
/// the slot frees itself when the permit drops, whichever way the job
/// ends.
#[derive(Debug, Clone, Default)]
pub struct SessionSlot {
    busy: Arc<AtomicBool>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` if a job is already running.
    pub fn try_acquire(&self) -> Option<SessionPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of slot ownership for one running job.
pub struct SessionPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for SessionPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
