//! Progress reporting for batch feature generation.
//!
//! [`generate`](crate::generate) calls into a [`ProgressCallback`] from
//! worker threads, so implementations must be `Send + Sync`. A rendering
//! backend lives in the CLI; library callers and tests use
//! [`null_progress`].

use std::sync::Arc;

/// Receives progress updates while transactions are processed.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of transactions to process.
    fn set_total(&self, total: u64);

    /// Records `delta` more processed transactions.
    fn inc(&self, delta: u64);

    /// Updates the status message.
    fn set_message(&self, msg: String);

    /// Marks the run complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
