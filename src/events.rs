//! Callback trait for client status and lifecycle events.
//!
//! Inject an [`Arc<dyn ClientEventCallback>`] via
//! [`crate::config::ClientConfigBuilder::event_callback`] to mirror the
//! client's progress in a status line, a spinner, or a test recorder.
//!
//! # Example
//!
//! ```rust
//! use pdf2html_client::{ClientConfig, ClientEventCallback};
//! use std::sync::{Arc, Mutex};
//!
//! struct StatusLine {
//!     text: Mutex<String>,
//! }
//!
//! impl ClientEventCallback for StatusLine {
//!     fn on_status(&self, status: &str) {
//!         *self.text.lock().unwrap() = status.to_string();
//!     }
//! }
//!
//! let line = Arc::new(StatusLine { text: Mutex::new(String::new()) });
//!
//! let config = ClientConfig::builder()
//!     .event_callback(line as Arc<dyn ClientEventCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::config::RenderMode;
use std::path::Path;
use std::sync::Arc;

/// Status text shown while the PDF is being sent.
pub fn uploading_status(file_name: &str) -> String {
    format!("Uploading PDF file: {file_name}...")
}

/// Status text shown once the endpoint has answered.
pub const RECEIVED_STATUS: &str = "Received response from server!";

/// Called by the client as an upload moves through its lifecycle.
///
/// Implementations must be `Send + Sync`: a client may be shared between
/// tasks, so two uploads can report concurrently. All methods default to
/// no-ops.
pub trait ClientEventCallback: Send + Sync {
    /// The human-readable status line changed.
    fn on_status(&self, status: &str) {
        let _ = status;
    }

    /// An upload was started.
    ///
    /// # Arguments
    /// * `ticket`   : fence id of the upload
    /// * `file_name`: name of the submitted file
    fn on_upload_start(&self, ticket: u64, file_name: &str) {
        let _ = (ticket, file_name);
    }

    /// A response was accepted and stored.
    fn on_response_received(&self, ticket: u64, chunk_count: usize) {
        let _ = (ticket, chunk_count);
    }

    /// An upload ended without updating the stored chunks.
    fn on_upload_failed(&self, ticket: u64, error: &str) {
        let _ = (ticket, error);
    }

    /// The chunks were handed to the browsing host.
    fn on_render_complete(&self, mode: RenderMode, contexts_opened: usize) {
        let _ = (mode, contexts_opened);
    }

    /// A chunk was saved to disk.
    fn on_download_saved(&self, index: usize, path: &Path) {
        let _ = (index, path);
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopEventCallback;

impl ClientEventCallback for NoopEventCallback {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type EventCallback = Arc<dyn ClientEventCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        statuses: Mutex<Vec<String>>,
        received: Mutex<Vec<(u64, usize)>>,
    }

    impl ClientEventCallback for Recorder {
        fn on_status(&self, status: &str) {
            self.statuses.lock().unwrap().push(status.to_string());
        }

        fn on_response_received(&self, ticket: u64, chunk_count: usize) {
            self.received.lock().unwrap().push((ticket, chunk_count));
        }
    }

    #[test]
    fn status_texts() {
        assert_eq!(uploading_status("a.pdf"), "Uploading PDF file: a.pdf...");
        assert_eq!(RECEIVED_STATUS, "Received response from server!");
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopEventCallback;
        cb.on_status("x");
        cb.on_upload_start(1, "a.pdf");
        cb.on_response_received(1, 3);
        cb.on_upload_failed(2, "boom");
        cb.on_render_complete(RenderMode::MultiTab, 3);
        cb.on_download_saved(0, Path::new("pdf_part_0.html"));
    }

    #[test]
    fn recorder_sees_overridden_events_only() {
        let rec = Recorder::default();
        rec.on_status("Uploading PDF file: x.pdf...");
        rec.on_upload_start(1, "x.pdf");
        rec.on_response_received(1, 4);
        rec.on_status(RECEIVED_STATUS);

        assert_eq!(rec.statuses.lock().unwrap().len(), 2);
        assert_eq!(*rec.received.lock().unwrap(), vec![(1, 4)]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: EventCallback = Arc::new(NoopEventCallback);
        cb.on_status("ok");
    }
}
