//! # pdf2html-client
//!
//! Upload a PDF to a PDF-to-HTML conversion endpoint and view what comes
//! back.
//!
//! The endpoint answers with an ordered list of HTML documents, one per
//! fixed-size group of pages. This crate keeps that list in memory and
//! offers two ways to look at it plus a way to save each part:
//!
//! * **single tab**: one browser document with every part stacked in its
//!   own borderless, full-viewport frame (`data:` URI sourced);
//! * **multi tab**: one browser document per part, raw HTML, capped by
//!   `max_tabs`;
//! * **download**: `pdf_part_<i>.html` files holding each part verbatim.
//!
//! ## Flow
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Upload   multipart POST, field `pdf`          (pipeline::upload)
//!  ├─ 2. Store    replace the chunk list wholesale     (state)
//!  ├─ 3. Controls one download control per chunk       (download)
//!  └─ 4. Render   single tab (frames) or multi tab     (render, pipeline::escape)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2html_client::{ClientConfig, ConverterClient, SystemBrowserHost, UploadRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ConverterClient::new(ClientConfig::default())?;
//!     let mut browser = SystemBrowserHost::new();
//!
//!     let request = UploadRequest::from_path("document.pdf").await?;
//!     let (outcome, _) = client.submit_and_render(request, &mut browser).await?;
//!     eprintln!("{} parts received", outcome.chunk_count);
//!
//!     // "Try again": re-render without another upload.
//!     client.render(&mut browser)?;
//!     client.download(0)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2html` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod download;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod render;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{convert_to_dir, ConverterClient, UploadOutcome};
pub use config::{ClientConfig, ClientConfigBuilder, QuoteEscaping, RenderMode, UploadPolicy};
pub use download::{part_file_name, DownloadControl, DownloadPanel};
pub use error::{Pdf2HtmlError, UploadFailureClass};
pub use events::{ClientEventCallback, EventCallback, NoopEventCallback};
pub use pipeline::upload::{ConversionResponse, UploadRequest};
pub use render::{BrowsingHost, RenderOptions, RenderReport, SystemBrowserHost};
pub use state::{ChunkStore, UploadTicket};
