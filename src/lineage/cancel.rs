//! Stopping a lineage walk from outside
//!
//! The parallel runner hands each child's walker a token and trips it when
//! that child's deadline passes. The walker looks at the token before it
//! resolves the next ancestor, so a tripped walk ends with
//! `StitchError::Cancelled` at the next step boundary. Walks never persist
//! anything, which makes abandoning one free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag between a runner and the walk it may abandon.
///
/// Clones observe the same flag. Loading a parent cube is not interrupted;
/// the walk notices at its next step.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    tripped: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the walk should stop before its next ancestor.
    pub fn is_cancelled(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    /// Ask the walk to stop. Idempotent.
    pub fn cancel(&self) {
        self.tripped.store(true, Ordering::Release);
    }
}
