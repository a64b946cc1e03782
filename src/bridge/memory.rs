//! In-memory bridge for tests and dry runs.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::{BridgeError, DeliverySink, ProgressSource};

#[derive(Debug, Default)]
struct Inner {
    progress: Vec<String>,
    delivery: Vec<String>,
    delivery_writes: usize,
    fail_reads: bool,
    fail_writes: bool,
}

/// Both bridge files held in memory.
///
/// Clones share the same contents, so a test can keep one handle while the
/// reconciler owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryBridgeStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryBridgeStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the progress tokens, as the game rewriting `ap_out.json`.
    pub fn set_progress<I, S>(&self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().progress = tokens.into_iter().map(Into::into).collect();
    }

    /// Append one progress token.
    pub fn push_progress(&self, token: impl Into<String>) {
        self.lock().progress.push(token.into());
    }

    /// Current delivered tokens.
    pub fn delivery(&self) -> Vec<String> {
        self.lock().delivery.clone()
    }

    /// Number of successful delivery writes.
    pub fn delivery_writes(&self) -> usize {
        self.lock().delivery_writes
    }

    /// Make reads fail until cleared.
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make writes fail until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }
}

impl ProgressSource for MemoryBridgeStore {
    fn read_progress(&self) -> Result<Vec<String>, BridgeError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(BridgeError::io(
                "memory://ap_out.json",
                io::Error::new(io::ErrorKind::PermissionDenied, "injected read failure"),
            ));
        }
        Ok(inner.progress.clone())
    }
}

impl DeliverySink for MemoryBridgeStore {
    fn write_delivery(&self, tokens: &[String]) -> Result<(), BridgeError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(BridgeError::io(
                "memory://ap_in.json",
                io::Error::new(io::ErrorKind::PermissionDenied, "injected write failure"),
            ));
        }
        inner.delivery = tokens.to_vec();
        inner.delivery_writes += 1;
        Ok(())
    }
}
