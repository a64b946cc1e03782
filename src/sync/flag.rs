//! One-shot resync request shared between the command surface and the
//! reconciler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Request for a `Sync` packet on the next connected tick.
#[derive(Debug, Clone, Default)]
pub struct SyncFlag(Arc<AtomicBool>);

impl SyncFlag {
    /// Unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a resync. Repeated requests before the next tick collapse.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume a pending request.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Whether a request is pending.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
