//! Progress traits for run events.
//!
//! Two seams, two audiences:
//!
//! * [`ProgressSink`] — consumed by the transformation collaborator. It only
//!   sees integer percentages; the service emits them as upload bytes move and
//!   when the response lands.
//! * [`RunCallback`] — produced for the presentation adapter. It sees the
//!   whole run lifecycle (start, ticks, terminal result) and can drive a
//!   progress bar, a toast, or a log line without the library knowing which.
//!
//! Callbacks were chosen over channels for the same reason as elsewhere in
//! this codebase: the caller can forward events anywhere — a terminal bar, a
//! broadcast channel, a UI handle — and the library stays ignorant of the
//! host's event loop. Both traits are `Send + Sync`; implementations must
//! guard their own shared state.

use crate::metrics::SizeComparison;
use crate::operation::OperationKind;
use std::sync::Arc;

/// Receives raw progress percentages (0–100) from the collaborator.
///
/// Values for a given run are non-decreasing; the workflow layer additionally
/// clamps them and tags them with the run's sequence number before they reach
/// controller state.
pub trait ProgressSink: Send + Sync {
    fn progress(&self, percent: u8);
}

/// Run lifecycle events for the presentation adapter.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RunCallback: Send + Sync {
    /// A run was accepted and dispatched.
    fn on_run_start(&self, operation: OperationKind, file_count: usize, input_bytes: u64) {
        let _ = (operation, file_count, input_bytes);
    }

    /// Progress tick, 0–100, non-decreasing within a run.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// The run completed; the artifact and its size comparison are available.
    fn on_run_complete(&self, output_bytes: u64, comparison: SizeComparison) {
        let _ = (output_bytes, comparison);
    }

    /// The run failed. `message` is the human-readable error, shown verbatim.
    fn on_run_error(&self, message: &str) {
        let _ = message;
    }
}

/// No-op callback, the default when the caller does not need events.
pub struct NoopRunCallback;

impl RunCallback for NoopRunCallback {}

/// Shared-callback alias used throughout the workflow layer.
pub type SharedRunCallback = Arc<dyn RunCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        ticks: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        last_output: AtomicU64,
    }

    impl RunCallback for TrackingCallback {
        fn on_run_start(&self, _op: OperationKind, _files: usize, _bytes: u64) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }
        fn on_progress(&self, _percent: u8) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }
        fn on_run_complete(&self, output_bytes: u64, _c: SizeComparison) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.last_output.store(output_bytes, Ordering::SeqCst);
        }
        fn on_run_error(&self, _message: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopRunCallback;
        cb.on_run_start(OperationKind::Compress, 1, 5_000_000);
        cb.on_progress(50);
        cb.on_run_complete(3_000_000, metrics::compare(5_000_000, 3_000_000));
        cb.on_run_error("boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let t = TrackingCallback {
            starts: AtomicUsize::new(0),
            ticks: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            last_output: AtomicU64::new(0),
        };
        t.on_run_start(OperationKind::Merge, 2, 1000);
        t.on_progress(10);
        t.on_progress(90);
        t.on_run_complete(800, metrics::compare(1000, 800));
        assert_eq!(t.starts.load(Ordering::SeqCst), 1);
        assert_eq!(t.ticks.load(Ordering::SeqCst), 2);
        assert_eq!(t.completes.load(Ordering::SeqCst), 1);
        assert_eq!(t.errors.load(Ordering::SeqCst), 0);
        assert_eq!(t.last_output.load(Ordering::SeqCst), 800);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: SharedRunCallback = Arc::new(NoopRunCallback);
        cb.on_progress(100);
    }
}
