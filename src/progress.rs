//! Progress-callback trait for per-stage export events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ExportConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages.
//!
//! The export runs on tokio's blocking pool, so callbacks fire from a
//! thread other than the caller's. The trait is `Send + Sync` for that
//! reason.
//!
//! # Example
//!
//! ```rust
//! use cv_export::{ExportConfig, ExportProgressCallback, Stage};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct StageLog(Mutex<Vec<Stage>>);
//!
//! impl ExportProgressCallback for StageLog {
//!     fn on_stage_complete(&self, stage: Stage) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(Arc::new(StageLog::default()))
//!     .build()
//!     .unwrap();
//! ```

use crate::pipeline::Stage;
use std::sync::Arc;

/// Called by the export pipeline as it processes each stage.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExportProgressCallback: Send + Sync {
    /// Called once before preflight.
    ///
    /// # Arguments
    /// * `total_stages`: number of stages a successful run passes through
    fn on_export_start(&self, total_stages: usize) {
        let _ = total_stages;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes without aborting the run.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a best-effort stage hit a problem it worked around.
    ///
    /// # Arguments
    /// * `stage`: the remediation stage
    /// * `message`: human-readable description
    fn on_stage_warning(&self, stage: Stage, message: &str) {
        let _ = (stage, message);
    }

    /// Called when a gating stage fails and the run is about to tear down.
    fn on_stage_failed(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called once after a successful run.
    ///
    /// # Arguments
    /// * `pdf_bytes`: size of the written document
    fn on_export_complete(&self, pdf_bytes: u64) {
        let _ = pdf_bytes;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started: Mutex<Vec<Stage>>,
        completed: Mutex<Vec<Stage>>,
        warnings: AtomicUsize,
        failed: Mutex<Option<Stage>>,
    }

    impl ExportProgressCallback for TrackingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.started.lock().unwrap().push(stage);
        }

        fn on_stage_complete(&self, stage: Stage) {
            self.completed.lock().unwrap().push(stage);
        }

        fn on_stage_warning(&self, _stage: Stage, _message: &str) {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }

        fn on_stage_failed(&self, stage: Stage, _error: &str) {
            *self.failed.lock().unwrap() = Some(stage);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_export_start(13);
        cb.on_stage_start(Stage::Preflight);
        cb.on_stage_complete(Stage::Preflight);
        cb.on_stage_warning(Stage::CompletenessProbe, "placeholder");
        cb.on_stage_failed(Stage::Load, "timeout");
        cb.on_export_complete(48_000);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_stage_start(Stage::Preflight);
        tracker.on_stage_complete(Stage::Preflight);
        tracker.on_stage_start(Stage::ContentCheck);
        tracker.on_stage_failed(Stage::ContentCheck, "too small");
        tracker.on_stage_warning(Stage::StyleProbe, "no styles");

        assert_eq!(
            *tracker.started.lock().unwrap(),
            vec![Stage::Preflight, Stage::ContentCheck]
        );
        assert_eq!(*tracker.completed.lock().unwrap(), vec![Stage::Preflight]);
        assert_eq!(tracker.warnings.load(Ordering::SeqCst), 1);
        assert_eq!(*tracker.failed.lock().unwrap(), Some(Stage::ContentCheck));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Export);
        cb.on_stage_complete(Stage::Export);
    }
}
