//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! real-time events as the driver works through the batch.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a database record, or a terminal progress
//! bar — without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so it works correctly when files
//! are converted concurrently.

use std::sync::Arc;

/// Called by the batch driver as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. When `concurrency > 1`, the per-file methods may be
/// called concurrently from different workers; implementations must protect
/// shared mutable state themselves.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after enumeration, before any task starts.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called when a worker picks up a file.
    fn on_file_start(&self, file_name: &str, total_files: usize) {
        let _ = (file_name, total_files);
    }

    /// Called when a file's PDF has been written.
    fn on_file_done(&self, file_name: &str, total_files: usize) {
        let _ = (file_name, total_files);
    }

    /// Called when a file is skipped (unsupported or up-to-date).
    fn on_file_skipped(&self, file_name: &str, total_files: usize, reason: &str) {
        let _ = (file_name, total_files, reason);
    }

    /// Called when a task reaches its terminal `Failed` state.
    fn on_file_error(&self, file_name: &str, total_files: usize, error: String) {
        let _ = (file_name, total_files, error);
    }

    /// Called once after every task has reached a terminal state.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        dones: AtomicUsize,
        skips: AtomicUsize,
        errors: AtomicUsize,
        completed_successes: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_file_start(&self, _file: &str, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_done(&self, _file: &str, _total: usize) {
            self.dones.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_skipped(&self, _file: &str, _total: usize, _reason: &str) {
            self.skips.fetch_add(1, Ordering::SeqCst);
        }
        fn on_file_error(&self, _file: &str, _total: usize, _error: String) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.completed_successes.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_file_start("a.docx", 3);
        cb.on_file_done("a.docx", 3);
        cb.on_file_skipped("notes.txt", 3, "unsupported");
        cb.on_file_error("b.pptx", 3, "HTTP 400".to_string());
        cb.on_batch_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            dones: AtomicUsize::new(0),
            skips: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            completed_successes: AtomicUsize::new(0),
        };

        tracker.on_file_start("a.docx", 3);
        tracker.on_file_done("a.docx", 3);
        tracker.on_file_start("b.pptx", 3);
        tracker.on_file_error("b.pptx", 3, "export failed".into());
        tracker.on_file_skipped("notes.txt", 3, "unsupported");
        tracker.on_batch_complete(3, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.dones.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.skips.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completed_successes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopProgressCallback>();

        let cb: Arc<dyn BatchProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
    }
}
