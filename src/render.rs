//! Rendering dispatcher: hand the stored chunks to a browsing host.
//!
//! Two mutually exclusive strategies, picked per call:
//!
//! * **Multi-tab**: one browsing context per chunk, raw HTML written
//!   top-level in index order. The chunk is trusted as a full document, so
//!   its scripts and styles run as usual.
//! * **Single-tab**: one browsing context holding one `data:`-sourced
//!   frame per chunk. Quote-sensitive markup inside the chunk is neutralised
//!   by the escaping in [`crate::pipeline::escape`].
//!
//! Multi-tab mode is capped by [`RenderOptions::max_tabs`]. A response with
//! more chunks than the cap is rendered single-tab instead, so a pathological
//! reply cannot open hundreds of windows.
//!
//! Rendering never touches the network and never mutates its input.

use crate::config::{ClientConfig, QuoteEscaping, RenderMode};
use crate::error::Pdf2HtmlError;
use crate::pipeline::escape;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Somewhere HTML documents can be opened.
pub trait BrowsingHost {
    /// Open a new top-level browsing context and write `html` into it.
    fn open_document(&mut self, html: &str) -> Result<(), Pdf2HtmlError>;
}

/// The subset of [`ClientConfig`] the dispatcher needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub max_tabs: usize,
    pub quote_escaping: QuoteEscaping,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for RenderOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            max_tabs: config.max_tabs,
            quote_escaping: config.quote_escaping,
        }
    }
}

/// What a render call actually did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Mode asked for by the caller.
    pub requested: RenderMode,
    /// Mode used; differs from `requested` only after a tab-cap fallback.
    pub mode: RenderMode,
    pub contexts_opened: usize,
    /// Inline frames written (single-tab only).
    pub frames: usize,
    pub fell_back: bool,
}

/// Present `chunks` through `host` using `mode`.
pub fn render_chunks<S: AsRef<str>>(
    chunks: &[S],
    mode: RenderMode,
    options: &RenderOptions,
    host: &mut dyn BrowsingHost,
) -> Result<RenderReport, Pdf2HtmlError> {
    let fell_back = mode == RenderMode::MultiTab && chunks.len() > options.max_tabs;
    if fell_back {
        warn!(
            "{} chunks exceed the {}-tab limit; rendering in a single tab instead",
            chunks.len(),
            options.max_tabs
        );
    }

    let report = if mode == RenderMode::MultiTab && !fell_back {
        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Opening tab for part {}", i);
            host.open_document(chunk.as_ref())?;
        }
        RenderReport {
            requested: mode,
            mode: RenderMode::MultiTab,
            contexts_opened: chunks.len(),
            frames: 0,
            fell_back: false,
        }
    } else {
        let document = escape::frame_document(chunks, options.quote_escaping);
        host.open_document(&document)?;
        RenderReport {
            requested: mode,
            mode: RenderMode::SingleTab,
            contexts_opened: 1,
            frames: chunks.len(),
            fell_back,
        }
    };

    info!(
        "Rendered {} parts in {} mode ({} browsing contexts)",
        chunks.len(),
        report.mode,
        report.contexts_opened
    );
    Ok(report)
}

// ── System browser host ──────────────────────────────────────────────────

/// Staged documents untouched for longer than this are removed when a
/// [`SystemBrowserHost`] is created.
pub const STAGING_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

const STAGED_PREFIX: &str = "pdf2html-";
const STAGED_SUFFIX: &str = ".html";

/// `pdf2html-<sha256 prefix>.html`: identical documents share one file.
fn staged_name(html: &str) -> String {
    use std::fmt::Write as _;

    let digest = Sha256::digest(html.as_bytes());
    let mut name = String::with_capacity(STAGED_PREFIX.len() + 16 + STAGED_SUFFIX.len());
    name.push_str(STAGED_PREFIX);
    for byte in digest.iter().take(8) {
        let _ = write!(&mut name, "{byte:02x}");
    }
    name.push_str(STAGED_SUFFIX);
    name
}

/// Remove staged documents in `dir` last written more than `max_age` ago.
///
/// Only `pdf2html-*.html` files are considered. Returns how many were
/// removed; entries that cannot be inspected or removed are skipped.
pub fn prune_staged(dir: &Path, max_age: Duration) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !(name.starts_with(STAGED_PREFIX) && name.ends_with(STAGED_SUFFIX)) {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > max_age);
        if !stale {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => debug!("Could not prune {}: {}", entry.path().display(), e),
        }
    }

    if removed > 0 {
        info!("Pruned {} stale staged documents from {}", removed, dir.display());
    }
    removed
}

/// Writes each document to the staging directory and opens it in the
/// platform browser.
///
/// Staged files outlive the process, since the browser may load them after
/// we exit. They are named by content, so re-rendering the same document
/// rewrites one file, and files older than [`STAGING_RETENTION`] are pruned
/// whenever a host is created.
#[derive(Debug)]
pub struct SystemBrowserHost {
    staging_dir: PathBuf,
    launch: bool,
    opened: Vec<PathBuf>,
}

impl Default for SystemBrowserHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBrowserHost {
    pub fn new() -> Self {
        Self::with_staging_dir(browser_launch::staging_dir())
    }

    pub fn with_staging_dir(dir: impl Into<PathBuf>) -> Self {
        let staging_dir = dir.into();
        prune_staged(&staging_dir, STAGING_RETENTION);
        Self {
            staging_dir,
            launch: true,
            opened: Vec::new(),
        }
    }

    /// Only stage files, do not start a browser.
    pub fn launch(mut self, launch: bool) -> Self {
        self.launch = launch;
        self
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Every staged document so far, in open order.
    pub fn opened(&self) -> &[PathBuf] {
        &self.opened
    }

    fn stage(&self, html: &str) -> Result<PathBuf, Pdf2HtmlError> {
        let target = self.staging_dir.join(staged_name(html));
        let write_failed = |source: std::io::Error| Pdf2HtmlError::OutputWriteFailed {
            path: target.clone(),
            source,
        };
        std::fs::create_dir_all(&self.staging_dir).map_err(write_failed)?;

        let mut file = tempfile::NamedTempFile::new_in(&self.staging_dir).map_err(write_failed)?;
        file.write_all(html.as_bytes()).map_err(write_failed)?;
        file.persist(&target).map_err(|e| write_failed(e.error))?;
        Ok(target)
    }
}

impl BrowsingHost for SystemBrowserHost {
    fn open_document(&mut self, html: &str) -> Result<(), Pdf2HtmlError> {
        let path = self.stage(html)?;
        debug!("Staged {} bytes at {}", html.len(), path.display());
        if self.launch {
            browser_launch::open_path(&path)?;
        }
        self.opened.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        documents: Vec<String>,
    }

    impl BrowsingHost for Recorder {
        fn open_document(&mut self, html: &str) -> Result<(), Pdf2HtmlError> {
            self.documents.push(html.to_string());
            Ok(())
        }
    }

    struct Failing;

    impl BrowsingHost for Failing {
        fn open_document(&mut self, _html: &str) -> Result<(), Pdf2HtmlError> {
            Err(Pdf2HtmlError::Internal("popup blocked".into()))
        }
    }

    fn opts(max_tabs: usize) -> RenderOptions {
        RenderOptions {
            max_tabs,
            quote_escaping: QuoteEscaping::Legacy,
        }
    }

    #[test]
    fn multi_tab_writes_raw_chunks_in_order() {
        let chunks = ["<p class=\"a\">0</p>", "<p>'1'</p>", "<p>2</p>"];
        let mut host = Recorder::default();
        let report = render_chunks(&chunks, RenderMode::MultiTab, &opts(10), &mut host).unwrap();

        assert_eq!(host.documents, chunks);
        assert_eq!(report.contexts_opened, 3);
        assert!(!report.fell_back);
    }

    #[test]
    fn single_tab_opens_one_context_with_n_frames() {
        let chunks = ["<p>0</p>", "<p>1</p>"];
        let mut host = Recorder::default();
        let report = render_chunks(&chunks, RenderMode::SingleTab, &opts(10), &mut host).unwrap();

        assert_eq!(host.documents.len(), 1);
        assert_eq!(host.documents[0].matches("<iframe").count(), 2);
        assert_eq!(report.frames, 2);
        assert_eq!(report.contexts_opened, 1);
    }

    #[test]
    fn single_tab_with_no_chunks_still_opens_a_context() {
        let chunks: [&str; 0] = [];
        let mut host = Recorder::default();
        let report = render_chunks(&chunks, RenderMode::SingleTab, &opts(10), &mut host).unwrap();
        assert_eq!(host.documents, vec![String::new()]);
        assert_eq!(report.frames, 0);
    }

    #[test]
    fn multi_tab_with_no_chunks_opens_nothing() {
        let chunks: [&str; 0] = [];
        let mut host = Recorder::default();
        let report = render_chunks(&chunks, RenderMode::MultiTab, &opts(10), &mut host).unwrap();
        assert!(host.documents.is_empty());
        assert_eq!(report.contexts_opened, 0);
    }

    #[test]
    fn multi_tab_over_cap_falls_back_to_single_tab() {
        let chunks = vec!["<p>x</p>"; 5];
        let mut host = Recorder::default();
        let report = render_chunks(&chunks, RenderMode::MultiTab, &opts(4), &mut host).unwrap();

        assert_eq!(host.documents.len(), 1);
        assert!(report.fell_back);
        assert_eq!(report.requested, RenderMode::MultiTab);
        assert_eq!(report.mode, RenderMode::SingleTab);
        assert_eq!(report.frames, 5);
    }

    #[test]
    fn multi_tab_at_cap_is_allowed() {
        let chunks = vec!["<p>x</p>"; 4];
        let mut host = Recorder::default();
        let report = render_chunks(&chunks, RenderMode::MultiTab, &opts(4), &mut host).unwrap();
        assert_eq!(report.contexts_opened, 4);
    }

    #[test]
    fn host_errors_propagate() {
        let err = render_chunks(&["x"], RenderMode::SingleTab, &opts(4), &mut Failing).unwrap_err();
        assert!(err.to_string().contains("popup blocked"));
    }

    #[test]
    fn system_host_stages_without_launching() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemBrowserHost::with_staging_dir(dir.path().join("staging")).launch(false);
        host.open_document("<h1>one</h1>").unwrap();
        host.open_document("<h1>two</h1>").unwrap();

        assert_eq!(host.opened().len(), 2);
        let first = std::fs::read_to_string(&host.opened()[0]).unwrap();
        assert_eq!(first, "<h1>one</h1>");
        assert!(host.opened()[1]
            .extension()
            .is_some_and(|e| e == "html"));
    }

    fn staged_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn repeated_renders_reuse_one_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SystemBrowserHost::with_staging_dir(dir.path()).launch(false);
        let chunks = ["<p>a</p>", "<p>b</p>"];

        for _ in 0..50 {
            render_chunks(&chunks, RenderMode::SingleTab, &opts(4), &mut host).unwrap();
        }

        assert_eq!(host.opened().len(), 50);
        let names = staged_files(dir.path());
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("pdf2html-") && names[0].ends_with(".html"));
    }

    #[test]
    fn distinct_documents_get_distinct_files() {
        assert_ne!(staged_name("<p>a</p>"), staged_name("<p>b</p>"));
        assert_eq!(staged_name("<p>a</p>"), staged_name("<p>a</p>"));
        assert_eq!(staged_name("").len(), "pdf2html-".len() + 16 + ".html".len());
    }

    #[test]
    fn stale_staged_files_are_pruned_on_create() {
        let dir = tempfile::tempdir().unwrap();
        let two_days_ago = SystemTime::now() - Duration::from_secs(48 * 60 * 60);
        for name in ["pdf2html-stale.html", "notes.txt"] {
            let path = dir.path().join(name);
            std::fs::write(&path, "old").unwrap();
            std::fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(two_days_ago)
                .unwrap();
        }
        std::fs::write(dir.path().join("pdf2html-fresh.html"), "new").unwrap();

        let _host = SystemBrowserHost::with_staging_dir(dir.path()).launch(false);

        assert_eq!(staged_files(dir.path()), vec!["notes.txt", "pdf2html-fresh.html"]);
    }

    #[test]
    fn pruning_a_missing_dir_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(prune_staged(&dir.path().join("absent"), Duration::ZERO), 0);
    }
}
