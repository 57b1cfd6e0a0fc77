//! CLI binary for pdf2html-client.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`, uploads one PDF, renders it in the browser and optionally
//! saves the parts.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2html_client::config::DEFAULT_ENDPOINT;
use pdf2html_client::{
    ClientConfig, ClientEventCallback, ConversionResponse, ConverterClient, EventCallback,
    QuoteEscaping, RenderMode, RenderReport, SystemBrowserHost, UploadOutcome, UploadRequest,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI status callback using indicatif ──────────────────────────────────────

/// Spinner standing in for the page's status line.
struct CliStatusCallback {
    bar: ProgressBar,
}

impl CliStatusCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ClientEventCallback for CliStatusCallback {
    fn on_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    fn on_response_received(&self, _ticket: u64, chunk_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} parts received",
            green("✔"),
            bold(&chunk_count.to_string())
        );
    }

    fn on_upload_failed(&self, _ticket: u64, _error: &str) {
        // The error itself is reported by main.
        self.bar.finish_and_clear();
    }

    fn on_download_saved(&self, index: usize, path: &Path) {
        eprintln!(
            "  {} Part {:>3}  {}",
            green("✓"),
            index,
            dim(&path.display().to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload and view all parts stacked in one browser tab
  pdf2html document.pdf

  # One browser tab per part
  pdf2html --multiple-tabs document.pdf

  # Save every part as pdf_part_<i>.html without opening a browser
  pdf2html --no-open --download all --download-dir out/ document.pdf

  # Single-document conversion on the server side
  pdf2html --simple document.pdf

  # Plain INFO log lines instead of the spinner
  pdf2html --no-progress document.pdf

  # Keep the session open: re-render, toggle tabs, download parts
  pdf2html --interactive document.pdf

INTERACTIVE COMMANDS:
  r            render again (no new upload)
  t            toggle single-tab / multi-tab, then render
  l            list download controls
  d <i>|all    download part <i> (or every part)
  q            quit

ENVIRONMENT VARIABLES:
  PDF2HTML_ENDPOINT       Conversion endpoint URL
  PDF2HTML_BROWSER        Browser command line (default: platform opener)
  PDF2HTML_STAGING_DIR    Where rendered documents are written before opening
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Upload a PDF for HTML conversion and view the result.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2html",
    version,
    about = "Upload a PDF for HTML conversion and view the parts in your browser",
    long_about = "Upload a PDF to a PDF-to-HTML conversion endpoint. The endpoint answers with \
one HTML document per group of pages; pdf2html opens them in a single tab (stacked frames) or \
one tab per part, and can save each part as pdf_part_<i>.html.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to upload.
    input: PathBuf,

    /// Conversion endpoint URL.
    #[arg(long, env = "PDF2HTML_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Ask the endpoint for a single-document conversion.
    #[arg(long, env = "PDF2HTML_SIMPLE")]
    simple: bool,

    /// Open one browser tab per part instead of stacking frames in one tab.
    #[arg(long, env = "PDF2HTML_MULTIPLE_TABS")]
    multiple_tabs: bool,

    /// Most tabs multi-tab mode may open before falling back to one tab.
    #[arg(long, env = "PDF2HTML_MAX_TABS", default_value_t = 20,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_tabs: u64,

    /// Entity used for single quotes inside frames: legacy (&quot;) or distinct (&#39;).
    #[arg(long, env = "PDF2HTML_QUOTE_ENTITY", value_enum, default_value = "legacy")]
    quote_entity: QuoteArg,

    /// Directory for pdf_part_<i>.html downloads.
    #[arg(long, env = "PDF2HTML_DOWNLOAD_DIR", default_value = ".")]
    download_dir: PathBuf,

    /// Parts to download after upload: all, 3, or 0,2,5.
    #[arg(long, env = "PDF2HTML_DOWNLOAD")]
    download: Option<String>,

    /// Disable the status spinner (shows INFO logs instead).
    #[arg(long, env = "PDF2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// Stage rendered documents but do not launch a browser.
    #[arg(long, env = "PDF2HTML_NO_OPEN")]
    no_open: bool,

    /// Directory rendered documents are staged in.
    #[arg(long, env = "PDF2HTML_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Upload timeout in seconds.
    #[arg(long, env = "PDF2HTML_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Print a JSON report (upload, render, files, parts) to stdout.
    #[arg(long, env = "PDF2HTML_JSON")]
    json: bool,

    /// Keep a prompt open to re-render, toggle mode and download parts.
    #[arg(short, long)]
    interactive: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2HTML_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum QuoteArg {
    Legacy,
    Distinct,
}

impl From<QuoteArg> for QuoteEscaping {
    fn from(v: QuoteArg) -> Self {
        match v {
            QuoteArg::Legacy => QuoteEscaping::Legacy,
            QuoteArg::Distinct => QuoteEscaping::Distinct,
        }
    }
}

/// Which parts `--download` / `d` selects.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PartSelection {
    All,
    Indices(Vec<usize>),
}

#[derive(Serialize)]
struct JsonReport<'a> {
    upload: &'a UploadOutcome,
    render: Option<&'a RenderReport>,
    staged: &'a [PathBuf],
    downloads: &'a [PathBuf],
    response: ConversionResponse,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_status = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = log_filter(cli.verbose, cli.quiet, show_status);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let callback: Option<EventCallback> = if show_status {
        Some(CliStatusCallback::new() as Arc<dyn ClientEventCallback>)
    } else {
        None
    };
    let config = build_config(&cli, callback)?;
    let client = ConverterClient::new(config).context("Failed to create client")?;

    let mut host = match cli.staging_dir {
        Some(ref dir) => SystemBrowserHost::with_staging_dir(dir),
        None => SystemBrowserHost::new(),
    }
    .launch(!cli.no_open);

    // ── Upload and render ────────────────────────────────────────────────
    let request = UploadRequest::from_path(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let (outcome, report) = client
        .submit_and_render(request, &mut host)
        .await
        .context("Conversion failed")?;

    if !cli.quiet && !cli.json {
        if let Some(ref r) = report {
            let note = if r.fell_back {
                format!("  (more than {} parts, stacked instead)", cli.max_tabs)
            } else {
                String::new()
            };
            eprintln!(
                "{} Rendered {} in {} mode{}",
                green("✔"),
                bold(&format!("{} parts", outcome.chunk_count)),
                r.mode,
                dim(&note)
            );
        }
        if cli.no_open {
            for path in host.opened() {
                eprintln!("  {}", dim(&path.display().to_string()));
            }
        }
    }

    // ── Downloads ────────────────────────────────────────────────────────
    let mut downloads = Vec::new();
    if let Some(ref spec) = cli.download {
        let selection = parse_parts(spec)?;
        downloads = download_parts(&client, &selection)?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&JsonReport {
            upload: &outcome,
            render: report.as_ref(),
            staged: host.opened(),
            downloads: &downloads,
            response: ConversionResponse {
                html_documents: client.store().snapshot(),
            },
        })
        .context("Failed to serialise report")?;
        println!("{json}");
    }

    if cli.interactive {
        run_prompt(&client, &mut host)?;
    }

    Ok(())
}

/// Default log filter when `RUST_LOG` is unset.
///
/// `-v` always wins. Otherwise INFO is shown only when the spinner is off,
/// since the spinner already carries the same status lines.
fn log_filter(verbose: bool, quiet: bool, show_status: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet || show_status {
        "error"
    } else {
        "info"
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, callback: Option<EventCallback>) -> Result<ClientConfig> {
    let mode = if cli.multiple_tabs {
        RenderMode::MultiTab
    } else {
        RenderMode::SingleTab
    };

    let mut builder = ClientConfig::builder()
        .endpoint(cli.endpoint.clone())
        .simple_conversion(cli.simple)
        .render_mode(mode)
        .max_tabs(usize::try_from(cli.max_tabs).unwrap_or(usize::MAX))
        .quote_escaping(cli.quote_entity.clone().into())
        .download_dir(cli.download_dir.clone())
        .request_timeout_secs(cli.timeout);

    if let Some(cb) = callback {
        builder = builder.event_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--download` / `d` arguments into a `PartSelection`.
fn parse_parts(s: &str) -> Result<PartSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PartSelection::All);
    }

    let indices = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid part number: '{}'", p.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    if indices.is_empty() {
        anyhow::bail!("No parts selected");
    }

    Ok(PartSelection::Indices(indices))
}

fn download_parts(client: &ConverterClient, selection: &PartSelection) -> Result<Vec<PathBuf>> {
    match selection {
        PartSelection::All => client.download_all().context("Download failed"),
        PartSelection::Indices(indices) => {
            let mut saved = Vec::new();
            for &i in indices {
                match client.download(i).context("Download failed")? {
                    Some(path) => saved.push(path),
                    None => eprintln!(
                        "{} No part {} (only {} received)",
                        red("✗"),
                        i,
                        client.store().len()
                    ),
                }
            }
            Ok(saved)
        }
    }
}

/// Line-oriented stand-in for the page's buttons.
fn run_prompt(client: &ConverterClient, host: &mut SystemBrowserHost) -> Result<()> {
    let mut mode = client.config().render_mode;
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        eprint!("{} ", bold(&format!("pdf2html [{mode}]>")));
        io::stderr().flush().ok();

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line.context("Failed to read from stdin")?;
        let mut words = line.split_whitespace();

        let result = match words.next() {
            None => continue,
            Some("q") | Some("quit") => return Ok(()),
            Some("r") => client.render_with(mode, host).map(|r| {
                eprintln!("{} {} browsing contexts opened", green("✔"), r.contexts_opened)
            }),
            Some("t") => {
                mode = mode.toggled();
                client.render_with(mode, host).map(|r| {
                    eprintln!("{} Switched to {} mode ({} contexts)", green("✔"), mode, r.contexts_opened)
                })
            }
            Some("l") => {
                for control in client.controls() {
                    eprintln!("  [{}] {}", control.index(), control.label());
                }
                Ok(())
            }
            Some("d") => {
                match parse_parts(words.next().unwrap_or("all")) {
                    Ok(selection) => {
                        if let Err(e) = download_parts(client, &selection) {
                            eprintln!("{} {e:#}", red("✘"));
                        }
                    }
                    Err(e) => eprintln!("{} {e:#}", red("✘")),
                }
                Ok(())
            }
            Some(other) => {
                eprintln!("{} Unknown command '{}'; try r, t, l, d <i>, q", red("✗"), other);
                Ok(())
            }
        };

        if let Err(e) = result {
            eprintln!("{} {}", red("✘"), e);
        }
    }
}
