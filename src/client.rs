//! The converter client: upload, store, render, download.
//!
//! [`ConverterClient`] owns the one [`ChunkStore`] of a session and is its
//! only writer. All methods take `&self`, so a client can sit behind an
//! `Arc` and be driven from several tasks; overlapping uploads are then
//! resolved by the store's ticket fence instead of by whichever response
//! lands last.
//!
//! Failures never leave partial state behind: an upload that errors for
//! any reason is logged, reported to the event callback, and leaves both
//! the stored chunks and the download controls exactly as they were.

use crate::config::{ClientConfig, RenderMode};
use crate::download::{DownloadControl, DownloadPanel};
use crate::error::Pdf2HtmlError;
use crate::events::{uploading_status, EventCallback, RECEIVED_STATUS};
use crate::pipeline::upload::{self, UploadRequest};
use crate::render::{self, BrowsingHost, RenderOptions, RenderReport};
use crate::state::{ChunkStore, UploadTicket};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Summary of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub ticket: u64,
    pub file_name: String,
    pub chunk_count: usize,
    pub duration_ms: u64,
}

/// Client for one PDF-to-HTML conversion endpoint.
pub struct ConverterClient {
    config: ClientConfig,
    http: reqwest::Client,
    store: ChunkStore,
    panel: Mutex<DownloadPanel>,
}

impl ConverterClient {
    pub fn new(config: ClientConfig) -> Result<Self, Pdf2HtmlError> {
        Self::with_store(config, ChunkStore::new())
    }

    /// Build a client on top of an existing store, e.g. to keep a session's
    /// chunks while switching endpoints. Controls are created for whatever
    /// the store already holds, and uploads are fenced against every other
    /// client sharing it.
    pub fn with_store(config: ClientConfig, store: ChunkStore) -> Result<Self, Pdf2HtmlError> {
        let http = upload::build_http_client(&config)?;
        let mut panel = DownloadPanel::new();
        panel.regenerate(&store);
        Ok(Self {
            config,
            http,
            store,
            panel: Mutex::new(panel),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Read handle onto the stored chunks.
    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    fn panel(&self) -> MutexGuard<'_, DownloadPanel> {
        self.panel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn callback(&self) -> Option<&EventCallback> {
        self.config.event_callback.as_ref()
    }

    /// The download controls for the current upload.
    pub fn controls(&self) -> Vec<DownloadControl> {
        self.panel().controls().to_vec()
    }

    pub fn control(&self, index: usize) -> Option<DownloadControl> {
        self.panel().get(index).cloned()
    }

    // ── Upload ───────────────────────────────────────────────────────────

    /// Send `request` and, if it is still the newest upload when the reply
    /// arrives, replace the stored chunks and regenerate the controls.
    pub async fn submit(&self, request: UploadRequest) -> Result<UploadOutcome, Pdf2HtmlError> {
        let start = Instant::now();
        let file_name = request.file_name.clone();

        let ticket = match self.store.begin_upload(self.config.upload_policy) {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!("Upload of '{}' refused: {}", file_name, e);
                if let Some(cb) = self.callback() {
                    cb.on_upload_failed(0, &e.to_string());
                }
                return Err(e);
            }
        };

        let status = uploading_status(&file_name);
        info!("{}", status);
        if let Some(cb) = self.callback() {
            cb.on_upload_start(ticket.id(), &file_name);
            cb.on_status(&status);
        }

        let response = match upload::post_pdf(&self.http, &self.config, request).await {
            Ok(response) => response,
            Err(e) => {
                self.store.abandon(ticket);
                return Err(self.fail(ticket, e));
            }
        };

        info!("{}", RECEIVED_STATUS);
        if let Some(cb) = self.callback() {
            cb.on_status(RECEIVED_STATUS);
        }

        let chunk_count = response.html_documents.len();
        if let Err(e) = self.store.commit(ticket, response.html_documents) {
            return Err(self.fail(ticket, e));
        }
        self.panel().regenerate(&self.store);

        if let Some(cb) = self.callback() {
            cb.on_response_received(ticket.id(), chunk_count);
        }

        let outcome = UploadOutcome {
            ticket: ticket.id(),
            file_name,
            chunk_count,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            "Upload #{} stored {} parts in {}ms",
            outcome.ticket, outcome.chunk_count, outcome.duration_ms
        );
        Ok(outcome)
    }

    fn fail(&self, ticket: UploadTicket, e: Pdf2HtmlError) -> Pdf2HtmlError {
        match e {
            Pdf2HtmlError::Superseded { .. } => warn!("{}", e),
            _ => error!("Upload #{} failed: {}", ticket.id(), e),
        }
        if let Some(cb) = self.callback() {
            cb.on_upload_failed(ticket.id(), &e.to_string());
        }
        e
    }

    /// [`submit`](Self::submit), then render with the configured mode when
    /// `auto_render` is on.
    pub async fn submit_and_render(
        &self,
        request: UploadRequest,
        host: &mut dyn BrowsingHost,
    ) -> Result<(UploadOutcome, Option<RenderReport>), Pdf2HtmlError> {
        let outcome = self.submit(request).await?;
        let report = if self.config.auto_render {
            Some(self.render(host)?)
        } else {
            None
        };
        Ok((outcome, report))
    }

    // ── Render ───────────────────────────────────────────────────────────

    /// Render the stored chunks with the configured mode. Never touches the
    /// network; safe to call any number of times.
    pub fn render(&self, host: &mut dyn BrowsingHost) -> Result<RenderReport, Pdf2HtmlError> {
        self.render_with(self.config.render_mode, host)
    }

    /// Render the stored chunks with an explicit mode.
    pub fn render_with(
        &self,
        mode: RenderMode,
        host: &mut dyn BrowsingHost,
    ) -> Result<RenderReport, Pdf2HtmlError> {
        let chunks = self.store.snapshot();
        let report = render::render_chunks(&chunks, mode, &RenderOptions::from(&self.config), host)
            .inspect_err(|e| error!("Rendering failed: {}", e))?;
        if let Some(cb) = self.callback() {
            cb.on_render_complete(report.mode, report.contexts_opened);
        }
        Ok(report)
    }

    // ── Download ─────────────────────────────────────────────────────────

    /// Activate control `index`, saving into the configured download dir.
    ///
    /// `Ok(None)` when there is no such control or its chunk is gone.
    pub fn download(&self, index: usize) -> Result<Option<PathBuf>, Pdf2HtmlError> {
        let Some(control) = self.control(index) else {
            debug!("No download control for part {}", index);
            return Ok(None);
        };
        self.activate(&control, &self.config.download_dir)
    }

    /// Activate every control in order.
    pub fn download_all(&self) -> Result<Vec<PathBuf>, Pdf2HtmlError> {
        let mut saved = Vec::new();
        for control in self.controls() {
            if let Some(path) = self.activate(&control, &self.config.download_dir)? {
                saved.push(path);
            }
        }
        Ok(saved)
    }

    fn activate(&self, control: &DownloadControl, dir: &Path) -> Result<Option<PathBuf>, Pdf2HtmlError> {
        let saved = control
            .activate(dir)
            .inspect_err(|e| error!("Download of part {} failed: {}", control.index(), e))?;
        if let (Some(path), Some(cb)) = (&saved, self.callback()) {
            cb.on_download_saved(control.index(), path);
        }
        Ok(saved)
    }
}

/// Upload the PDF at `input` and save every returned part into `dir`.
///
/// A one-shot helper for callers that want files, not browser windows.
pub async fn convert_to_dir(
    input: impl AsRef<Path>,
    dir: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<Vec<PathBuf>, Pdf2HtmlError> {
    let mut config = config.clone();
    config.download_dir = dir.as_ref().to_path_buf();
    let client = ConverterClient::new(config)?;
    let request = UploadRequest::from_path(input).await?;
    client.submit(request).await?;
    client.download_all()
}
