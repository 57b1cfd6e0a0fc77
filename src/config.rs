//! Configuration types for the conversion client.
//!
//! Every knob lives in [`ClientConfig`], built via [`ClientConfigBuilder`].
//! The builder validates the endpoint and the multi-tab cap once, so the
//! client itself never has to re-check them.

use crate::error::Pdf2HtmlError;
use crate::events::EventCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The public conversion endpoint the client talks to by default.
pub const DEFAULT_ENDPOINT: &str = "https://panecaldoaldo.pythonanywhere.com/pdf2html";

/// Multipart field name the endpoint reads the PDF from.
pub const DEFAULT_FORM_FIELD: &str = "pdf";

/// Configuration for a [`crate::client::ConverterClient`].
///
/// # Example
/// ```rust
/// use pdf2html_client::{ClientConfig, RenderMode};
///
/// let config = ClientConfig::builder()
///     .render_mode(RenderMode::MultiTab)
///     .max_tabs(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tabs, 8);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Conversion endpoint URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Name of the multipart field carrying the PDF. Default: `pdf`.
    pub form_field: String,

    /// Ask the endpoint for its single-document conversion. Default: false.
    ///
    /// Sent as the `simple=true` query parameter. The endpoint then returns
    /// one HTML document for the whole PDF instead of one per 10-page chunk.
    pub simple_conversion: bool,

    /// Whole-request timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Rendering strategy used after upload and by [`render`]. Default: single tab.
    ///
    /// [`render`]: crate::client::ConverterClient::render
    pub render_mode: RenderMode,

    /// Upper bound on browsing contexts opened in multi-tab mode. Default: 20.
    ///
    /// A response with more chunks than this is rendered in single-tab mode
    /// instead.
    pub max_tabs: usize,

    /// How quote characters are escaped before a chunk is inlined into a
    /// frame. Default: [`QuoteEscaping::Legacy`].
    pub quote_escaping: QuoteEscaping,

    /// What happens when an upload is submitted while another is pending.
    /// Default: [`UploadPolicy::LatestRequestWins`].
    pub upload_policy: UploadPolicy,

    /// Render immediately after a successful upload. Default: true.
    pub auto_render: bool,

    /// Directory that `pdf_part_<i>.html` downloads are written to. Default: `.`.
    pub download_dir: PathBuf,

    /// Receives status and lifecycle events. Default: none.
    pub event_callback: Option<EventCallback>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            form_field: DEFAULT_FORM_FIELD.to_string(),
            simple_conversion: false,
            request_timeout_secs: 120,
            render_mode: RenderMode::default(),
            max_tabs: 20,
            quote_escaping: QuoteEscaping::default(),
            upload_policy: UploadPolicy::default(),
            auto_render: true,
            download_dir: PathBuf::from("."),
            event_callback: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("form_field", &self.form_field)
            .field("simple_conversion", &self.simple_conversion)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("render_mode", &self.render_mode)
            .field("max_tabs", &self.max_tabs)
            .field("quote_escaping", &self.quote_escaping)
            .field("upload_policy", &self.upload_policy)
            .field("auto_render", &self.auto_render)
            .field("download_dir", &self.download_dir)
            .field(
                "event_callback",
                &self.event_callback.as_ref().map(|_| "<dyn ClientEventCallback>"),
            )
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// The URL actually posted to, including the `simple` flag when set.
    pub fn request_url(&self) -> String {
        if !self.simple_conversion {
            return self.endpoint.clone();
        }
        let sep = if self.endpoint.contains('?') { '&' } else { '?' };
        format!("{}{}simple=true", self.endpoint, sep)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn form_field(mut self, name: impl Into<String>) -> Self {
        self.config.form_field = name.into();
        self
    }

    pub fn simple_conversion(mut self, v: bool) -> Self {
        self.config.simple_conversion = v;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn render_mode(mut self, mode: RenderMode) -> Self {
        self.config.render_mode = mode;
        self
    }

    pub fn max_tabs(mut self, n: usize) -> Self {
        self.config.max_tabs = n;
        self
    }

    pub fn quote_escaping(mut self, escaping: QuoteEscaping) -> Self {
        self.config.quote_escaping = escaping;
        self
    }

    pub fn upload_policy(mut self, policy: UploadPolicy) -> Self {
        self.config.upload_policy = policy;
        self
    }

    pub fn auto_render(mut self, v: bool) -> Self {
        self.config.auto_render = v;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    pub fn event_callback(mut self, cb: EventCallback) -> Self {
        self.config.event_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, Pdf2HtmlError> {
        let c = &self.config;
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(Pdf2HtmlError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if c.form_field.trim().is_empty() {
            return Err(Pdf2HtmlError::InvalidConfig(
                "form field name must not be empty".into(),
            ));
        }
        if c.max_tabs == 0 {
            return Err(Pdf2HtmlError::InvalidConfig("max_tabs must be ≥ 1".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(Pdf2HtmlError::InvalidConfig(
                "request timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the received chunks are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// One browsing context holding one inline frame per chunk. (default)
    #[default]
    SingleTab,
    /// One browsing context per chunk, raw HTML written top-level.
    MultiTab,
}

impl RenderMode {
    /// The other mode; used by the interactive toggle.
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::SingleTab => RenderMode::MultiTab,
            RenderMode::MultiTab => RenderMode::SingleTab,
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::SingleTab => f.write_str("single-tab"),
            RenderMode::MultiTab => f.write_str("multi-tab"),
        }
    }
}

/// Quote escaping applied to a chunk before it is inlined into a frame.
///
/// | Variant  | `"`      | `'`      |
/// |----------|----------|----------|
/// | Legacy   | `&quot;` | `&quot;` |
/// | Distinct | `&quot;` | `&#39;`  |
///
/// `Legacy` stays the default because documents already produced by the
/// client render with both quotes turned into `&quot;`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuoteEscaping {
    #[default]
    Legacy,
    Distinct,
}

/// Resolution of overlapping uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UploadPolicy {
    /// Every submission is sent; only the most recently *started* one may
    /// replace the stored chunks. (default)
    ///
    /// An older submission is discarded as
    /// [`Superseded`](crate::Pdf2HtmlError::Superseded) even when it
    /// succeeds and the newer one later fails, in which case the store keeps
    /// whatever it held before both.
    #[default]
    LatestRequestWins,
    /// A submission made while another is pending fails immediately.
    RejectWhilePending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_page_form() {
        let c = ClientConfig::default();
        assert_eq!(c.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(c.form_field, "pdf");
        assert_eq!(c.render_mode, RenderMode::SingleTab);
        assert_eq!(c.quote_escaping, QuoteEscaping::Legacy);
        assert!(c.auto_render);
    }

    #[test]
    fn request_url_adds_simple_flag() {
        let c = ClientConfig::builder()
            .endpoint("http://localhost:8080/pdf2html")
            .simple_conversion(true)
            .build()
            .unwrap();
        assert_eq!(c.request_url(), "http://localhost:8080/pdf2html?simple=true");

        let c = ClientConfig::builder()
            .endpoint("http://localhost/convert?v=2")
            .simple_conversion(true)
            .build()
            .unwrap();
        assert_eq!(c.request_url(), "http://localhost/convert?v=2&simple=true");
    }

    #[test]
    fn request_url_without_simple_is_endpoint() {
        let c = ClientConfig::default();
        assert_eq!(c.request_url(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn build_rejects_non_http_endpoint() {
        let err = ClientConfig::builder()
            .endpoint("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp://example.com"));
    }

    #[test]
    fn build_rejects_zero_max_tabs() {
        assert!(ClientConfig::builder().max_tabs(0).build().is_err());
    }

    #[test]
    fn build_rejects_blank_form_field() {
        assert!(ClientConfig::builder().form_field("  ").build().is_err());
    }

    #[test]
    fn render_mode_toggles() {
        assert_eq!(RenderMode::SingleTab.toggled(), RenderMode::MultiTab);
        assert_eq!(RenderMode::MultiTab.toggled().to_string(), "single-tab");
    }
}
