//! Error types for the pdf2html-client library.
//!
//! A single error enum covers every way a client operation can fail. Upload
//! failures all end the same way: they are logged at the client boundary,
//! the stored chunks stay as they were, and the user resubmits by hand.
//! [`Pdf2HtmlError::failure_class`] sorts them into the three classes the
//! client distinguishes (transport, HTTP status, malformed payload) so
//! callers and tests can still tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2html-client library.
#[derive(Debug, Error)]
pub enum Pdf2HtmlError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Upload errors ─────────────────────────────────────────────────────
    /// The request never produced a response (DNS, TLS, connection reset).
    #[error("Failed to reach '{url}': {reason}\nCheck your internet connection.")]
    Transport { url: String, reason: String },

    /// The endpoint did not answer within the configured timeout.
    #[error("Upload to '{url}' timed out after {secs}s\nIncrease --timeout.")]
    Timeout { url: String, secs: u64 },

    /// The endpoint answered with a non-2xx status.
    #[error("Conversion endpoint '{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The body was not JSON or did not carry `html_documents`.
    #[error("Malformed conversion response: {detail}")]
    MalformedResponse { detail: String },

    /// The endpoint answered with its `{"error": "..."}` payload.
    #[error("Conversion endpoint reported an error: {message}")]
    ServerReported { message: String },

    // ── Resubmission fencing ──────────────────────────────────────────────
    /// Another upload is still pending and the policy rejects overlap.
    #[error("Upload #{pending} is still in flight; wait for it to finish")]
    UploadInFlight { pending: u64 },

    /// A newer upload was started before this one completed; its response
    /// was discarded.
    #[error("Response for upload #{ticket} discarded: upload #{latest} superseded it")]
    Superseded { ticket: u64, latest: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staged document could not be opened in a browser.
    #[error("Failed to open browser: {0}")]
    BrowserLaunch(#[from] browser_launch::LaunchError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The three ways an upload can fail once the request has been built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFailureClass {
    /// Network or transport failure, including timeouts.
    Transport,
    /// The endpoint answered with a non-success status.
    HttpStatus,
    /// The payload was unusable (not JSON, missing fields, server error body).
    MalformedResponse,
}

impl Pdf2HtmlError {
    /// Classify an upload failure. Returns `None` for errors that are not
    /// produced by the network round trip.
    pub fn failure_class(&self) -> Option<UploadFailureClass> {
        match self {
            Pdf2HtmlError::Transport { .. } | Pdf2HtmlError::Timeout { .. } => {
                Some(UploadFailureClass::Transport)
            }
            Pdf2HtmlError::HttpStatus { .. } => Some(UploadFailureClass::HttpStatus),
            Pdf2HtmlError::MalformedResponse { .. } | Pdf2HtmlError::ServerReported { .. } => {
                Some(UploadFailureClass::MalformedResponse)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display() {
        let e = Pdf2HtmlError::HttpStatus {
            url: "https://example.com/pdf2html".into(),
            status: 502,
        };
        let msg = e.to_string();
        assert!(msg.contains("502"), "got: {msg}");
        assert!(msg.contains("example.com"), "got: {msg}");
    }

    #[test]
    fn superseded_display() {
        let e = Pdf2HtmlError::Superseded { ticket: 1, latest: 2 };
        let msg = e.to_string();
        assert!(msg.contains("#1"), "got: {msg}");
        assert!(msg.contains("#2"), "got: {msg}");
    }

    #[test]
    fn timeout_display() {
        let e = Pdf2HtmlError::Timeout {
            url: "http://localhost".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn upload_errors_are_classified() {
        let transport = Pdf2HtmlError::Transport {
            url: "u".into(),
            reason: "reset".into(),
        };
        let status = Pdf2HtmlError::HttpStatus {
            url: "u".into(),
            status: 500,
        };
        let malformed = Pdf2HtmlError::MalformedResponse {
            detail: "missing field".into(),
        };
        let reported = Pdf2HtmlError::ServerReported {
            message: "bad pdf".into(),
        };
        assert_eq!(transport.failure_class(), Some(UploadFailureClass::Transport));
        assert_eq!(status.failure_class(), Some(UploadFailureClass::HttpStatus));
        assert_eq!(
            malformed.failure_class(),
            Some(UploadFailureClass::MalformedResponse)
        );
        assert_eq!(
            reported.failure_class(),
            Some(UploadFailureClass::MalformedResponse)
        );
    }

    #[test]
    fn local_errors_have_no_upload_class() {
        let e = Pdf2HtmlError::InvalidConfig("x".into());
        assert_eq!(e.failure_class(), None);
        let e = Pdf2HtmlError::UploadInFlight { pending: 3 };
        assert_eq!(e.failure_class(), None);
    }
}
