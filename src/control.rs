use flock_common::Factors;
use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable handle a controller thread uses to change rule weights.
///
/// Requests are only picked up by the simulation at the start of a tick, so a step never
/// sees a half-written set of weights. The last request before a tick wins.
#[derive(Debug, Clone, Default)]
pub struct FactorControl {
    pending: Arc<Mutex<Option<Factors>>>,
}

impl FactorControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `factors` to replace the current weights at the next tick boundary.
    pub fn request(&self, factors: Factors) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        *pending = Some(factors);
    }

    /// Removes and returns the queued weights, if any.
    pub fn take(&self) -> Option<Factors> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
