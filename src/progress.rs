//! Progress-callback trait for extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to be told
//! when images are loaded, when the model request goes out, and how it ends.
//!
//! # Example
//!
//! ```rust
//! use scan2table::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl ExtractionProgressCallback for Log {
//!     fn on_request_start(&self, image_count: usize) {
//!         eprintln!("sending {image_count} images…");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(Log) as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the extraction pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_image_loaded` may be called concurrently and in
/// any order, since image reads are awaited together.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any image is read.
    fn on_load_start(&self, image_count: usize) {
        let _ = image_count;
    }

    /// Called after each image has been read into memory.
    ///
    /// # Arguments
    /// * `name`: file name or URL of the image
    /// * `bytes`: size of the payload
    fn on_image_loaded(&self, name: &str, bytes: usize) {
        let _ = (name, bytes);
    }

    /// Called just before the model request is sent.
    fn on_request_start(&self, image_count: usize) {
        let _ = image_count;
    }

    /// Called when the model returned usable text.
    fn on_complete(&self, markdown_len: usize, duration_ms: u64) {
        let _ = (markdown_len, duration_ms);
    }

    /// Called when the run failed at any stage.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        loaded: AtomicUsize,
        requests: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_image_loaded(&self, _name: &str, _bytes: usize) {
            self.loaded.fetch_add(1, Ordering::SeqCst);
        }

        fn on_request_start(&self, _image_count: usize) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn on_complete(&self, _markdown_len: usize, _duration_ms: u64) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_load_start(2);
        cb.on_image_loaded("a.png", 10);
        cb.on_request_start(2);
        cb.on_complete(100, 5);
        cb.on_error("boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_image_loaded("a.png", 1);
        tracker.on_image_loaded("b.png", 2);
        tracker.on_request_start(2);
        tracker.on_error("LLM API error: quota");

        assert_eq!(tracker.loaded.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.requests.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_request_start(1);
    }
}
