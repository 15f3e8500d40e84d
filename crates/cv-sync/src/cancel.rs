//! Cooperative cancellation shared across every suspension point the sync
//! engine's stages await on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Grace deadline before pending (not-yet-started) units are dropped after
/// a cancellation request. In-flight units (one file / one batch) are let
/// to finish regardless of this deadline; it only bounds how long we wait
/// for the *next* unit to start before giving up.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(5);
