//! Upload stage: post one PDF as multipart form data and decode the reply.
//!
//! The endpoint expects a single file field and answers with JSON of the
//! form `{"html_documents": ["<html>…", …]}`, one string per page-chunk. When
//! conversion fails server-side it still answers 200 but with
//! `{"error": "<message>"}`, which is surfaced as
//! [`Pdf2HtmlError::ServerReported`].
//!
//! No validation of file type or size happens here; the endpoint is the
//! judge of what it can convert.

use crate::config::ClientConfig;
use crate::error::Pdf2HtmlError;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// The file being submitted. Lives only for the duration of one upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file into a request, keeping its base name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Pdf2HtmlError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| read_error(path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(Self { file_name, bytes })
    }
}

fn read_error(path: &Path, e: std::io::Error) -> Pdf2HtmlError {
    let path = PathBuf::from(path);
    match e.kind() {
        std::io::ErrorKind::NotFound => Pdf2HtmlError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => Pdf2HtmlError::PermissionDenied { path },
        _ => Pdf2HtmlError::ReadFailed { path, source: e },
    }
}

/// The ordered HTML documents returned for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionResponse {
    pub html_documents: Vec<String>,
}

#[derive(Deserialize)]
struct WireResponse {
    html_documents: Option<Vec<String>>,
    error: Option<String>,
}

/// Decode a response body.
pub fn parse_response(body: &str) -> Result<ConversionResponse, Pdf2HtmlError> {
    let wire: WireResponse =
        serde_json::from_str(body).map_err(|e| Pdf2HtmlError::MalformedResponse {
            detail: format!("invalid JSON: {e}"),
        })?;

    match (wire.html_documents, wire.error) {
        (Some(html_documents), _) => Ok(ConversionResponse { html_documents }),
        (None, Some(message)) => Err(Pdf2HtmlError::ServerReported { message }),
        (None, None) => Err(Pdf2HtmlError::MalformedResponse {
            detail: "missing field `html_documents`".into(),
        }),
    }
}

/// Build the HTTP client used for every upload of one converter client.
pub fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, Pdf2HtmlError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!("pdf2html-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Pdf2HtmlError::Internal(format!("HTTP client: {e}")))
}

/// The multipart body: exactly one file part named after `form_field`.
pub fn build_form(config: &ClientConfig, request: UploadRequest) -> Result<Form, Pdf2HtmlError> {
    let part = Part::bytes(request.bytes)
        .file_name(request.file_name)
        .mime_str("application/pdf")
        .map_err(|e| Pdf2HtmlError::Internal(format!("multipart: {e}")))?;
    Ok(Form::new().part(config.form_field.clone(), part))
}

/// POST `request` to the configured endpoint and decode the reply.
pub async fn post_pdf(
    http: &reqwest::Client,
    config: &ClientConfig,
    request: UploadRequest,
) -> Result<ConversionResponse, Pdf2HtmlError> {
    let url = config.request_url();
    info!(
        "Posting '{}' ({} bytes) to {}",
        request.file_name,
        request.bytes.len(),
        url
    );

    let form = build_form(config, request)?;
    let transport_error = |e: reqwest::Error| {
        if e.is_timeout() {
            Pdf2HtmlError::Timeout {
                url: url.clone(),
                secs: config.request_timeout_secs,
            }
        } else {
            Pdf2HtmlError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            }
        }
    };

    let response = http
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(Pdf2HtmlError::HttpStatus {
            url: url.clone(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(transport_error)?;
    debug!("Received {} bytes from {}", body.len(), url);
    parse_response(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_list_in_order() {
        let r = parse_response(r#"{"html_documents": ["<p>1</p>", "<p>2</p>"]}"#).unwrap();
        assert_eq!(r.html_documents, vec!["<p>1</p>", "<p>2</p>"]);
    }

    #[test]
    fn empty_list_is_valid() {
        let r = parse_response(r#"{"html_documents": []}"#).unwrap();
        assert!(r.html_documents.is_empty());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let r = parse_response(r#"{"html_documents": ["x"], "pages": 3}"#).unwrap();
        assert_eq!(r.html_documents.len(), 1);
    }

    #[test]
    fn server_error_payload() {
        let err = parse_response(r#"{"error": "EOF marker not found"}"#).unwrap_err();
        match err {
            Pdf2HtmlError::ServerReported { message } => {
                assert_eq!(message, "EOF marker not found")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_documents_is_malformed() {
        let err = parse_response(r#"{"status": "ok"}"#).unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::MalformedResponse { .. }));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_response("<html>Internal Server Error</html>").unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn non_string_documents_are_malformed() {
        let err = parse_response(r#"{"html_documents": [1, 2]}"#).unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = UploadRequest::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2HtmlError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn from_path_keeps_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let req = UploadRequest::from_path(&path).await.unwrap();
        assert_eq!(req.file_name, "report.pdf");
        assert_eq!(req.bytes, b"%PDF-1.4");
    }
}
