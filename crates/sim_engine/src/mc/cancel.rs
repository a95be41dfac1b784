//! Cooperative cancellation for long-running simulations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::SimError;

/// Shared cancellation flag.
///
/// Clones share the same flag. Kernels poll it between π partitions (and
/// periodically inside them) and between GBM time steps; a run that is never
/// cancelled produces exactly the output of the non-cancellable entry point.
///
/// # Examples
///
/// ```rust
/// use sim_engine::mc::{CancellationToken, SimError};
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(token.check().is_ok());
///
/// handle.cancel();
/// assert_eq!(token.check(), Err(SimError::Cancelled));
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every simulation observing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Err(SimError::Cancelled)` once cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<(), SimError> {
        if self.is_cancelled() {
            Err(SimError::Cancelled)
        } else {
            Ok(())
        }
    }
}
