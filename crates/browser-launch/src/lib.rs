//! # browser-launch
//!
//! Open local HTML documents in the user's browser without caring which
//! platform we are on.
//!
//! ## How it works
//!
//! On each call to [`open_path`]:
//!
//! 1. Checks `PDF2HTML_BROWSER` for an explicit browser command.
//! 2. Otherwise picks the platform opener (`open`, `xdg-open`, `cmd /C start`).
//! 3. Spawns it detached with the document path as the last argument.
//!
//! Documents are usually written to [`staging_dir`] first, so they outlive
//! the process that produced them and the browser can still read them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use browser_launch::{open_path, staging_dir};
//!
//! let dir = staging_dir();
//! std::fs::create_dir_all(&dir).unwrap();
//! let page = dir.join("hello.html");
//! std::fs::write(&page, "<h1>hello</h1>").unwrap();
//! open_path(&page).expect("no browser available");
//! ```
//!
//! ## Platform support
//!
//! | OS                         | Opener             |
//! |----------------------------|--------------------|
//! | macOS                      | `open`             |
//! | Linux / *BSD               | `xdg-open`         |
//! | Windows                    | `cmd /C start ""`  |
//!
//! ## Environment variable overrides
//!
//! - `PDF2HTML_BROWSER`: browser command line, e.g. `firefox --new-tab`.
//! - `PDF2HTML_STAGING_DIR`: override the default staging directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable holding an explicit browser command line.
pub const BROWSER_ENV: &str = "PDF2HTML_BROWSER";

/// Environment variable overriding [`staging_dir`].
pub const STAGING_DIR_ENV: &str = "PDF2HTML_STAGING_DIR";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by browser-launch operations.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// No opener is known for the current OS.
    #[error("Unsupported platform: {os}\nSet {BROWSER_ENV} to a browser command.")]
    UnsupportedPlatform { os: String },

    /// `PDF2HTML_BROWSER` is set but contains no program name.
    #[error("{BROWSER_ENV} is set but empty")]
    EmptyOverride,

    /// The opener process could not be started.
    #[error("Failed to launch '{program}' for '{path}': {source}")]
    Spawn {
        program: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── Opener resolution ────────────────────────────────────────────────────────

/// A program plus leading arguments; the document path is appended last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    pub program: String,
    pub args: Vec<String>,
}

impl Opener {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Parse a whitespace-separated command line such as `firefox --new-tab`.
    pub fn parse(command_line: &str) -> Result<Self, LaunchError> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next().ok_or(LaunchError::EmptyOverride)?;
        Ok(Self {
            program: program.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }

    /// Build the command that opens `path`.
    pub fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(path);
        cmd
    }
}

fn detect_opener(os: &str) -> Result<Opener, LaunchError> {
    match os {
        "macos" => Ok(Opener::new("open", &[])),
        "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => {
            Ok(Opener::new("xdg-open", &[]))
        }
        // `start` treats the first quoted argument as a window title.
        "windows" => Ok(Opener::new("cmd", &["/C", "start", ""])),
        os => Err(LaunchError::UnsupportedPlatform { os: os.to_string() }),
    }
}

/// Resolve the opener for this machine, honouring `PDF2HTML_BROWSER`.
pub fn resolve_opener() -> Result<Opener, LaunchError> {
    match std::env::var(BROWSER_ENV) {
        Ok(value) => Opener::parse(&value),
        Err(_) => detect_opener(std::env::consts::OS),
    }
}

// ── Staging directory ────────────────────────────────────────────────────────

/// Returns the directory where documents are staged before opening.
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/pdf2html/staging/`
/// - **Linux**: `~/.cache/pdf2html/staging/`
/// - **Windows**: `%LOCALAPPDATA%\pdf2html\staging\`
///
/// Override by setting `PDF2HTML_STAGING_DIR`.
pub fn staging_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var(STAGING_DIR_ENV) {
        return PathBuf::from(override_dir);
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdf2html").join("staging")
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Open `path` in the browser.
///
/// Returns as soon as the opener has started, not when the browser window
/// closes. The opener is waited on from a background thread.
pub fn open_path(path: &Path) -> Result<(), LaunchError> {
    let opener = resolve_opener()?;
    open_with(&opener, path)
}

/// Open `path` with an explicit opener.
pub fn open_with(opener: &Opener, path: &Path) -> Result<(), LaunchError> {
    let mut child = opener
        .command(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            program: opener.program.clone(),
            path: path.to_path_buf(),
            source,
        })?;

    // The opener must be waited on or it stays a zombie until we exit.
    let _ = std::thread::Builder::new()
        .name("browser-launch-reaper".into())
        .spawn(move || {
            let _ = child.wait();
        });
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platforms_have_openers() {
        for os in ["macos", "linux", "windows", "freebsd"] {
            detect_opener(os).expect("platform should be supported");
        }
        assert_eq!(detect_opener("linux").unwrap().program, "xdg-open");
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = detect_opener("plan9").unwrap_err();
        assert!(err.to_string().contains("plan9"));
    }

    #[test]
    fn windows_opener_passes_empty_title() {
        let opener = detect_opener("windows").unwrap();
        assert_eq!(opener.args, vec!["/C", "start", ""]);
    }

    #[test]
    fn override_command_line_is_split() {
        let opener = Opener::parse("firefox  --new-tab").unwrap();
        assert_eq!(opener.program, "firefox");
        assert_eq!(opener.args, vec!["--new-tab"]);
    }

    #[test]
    fn empty_override_is_an_error() {
        assert!(matches!(
            Opener::parse("   "),
            Err(LaunchError::EmptyOverride)
        ));
    }

    #[test]
    fn command_appends_path_last() {
        let opener = Opener::parse("browser -a -b").unwrap();
        let cmd = opener.command(Path::new("/tmp/page.html"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-a", "-b", "/tmp/page.html"]);
    }

    #[test]
    fn staging_dir_default_and_override() {
        let d1 = staging_dir();
        let d2 = staging_dir();
        assert_eq!(d1, d2);
        assert!(d1.to_str().unwrap().contains("pdf2html"));

        std::env::set_var(STAGING_DIR_ENV, "/tmp/test_pdf2html_staging");
        let d = staging_dir();
        std::env::remove_var(STAGING_DIR_ENV);
        assert_eq!(d, PathBuf::from("/tmp/test_pdf2html_staging"));
    }

    #[test]
    fn spawn_failure_names_program() {
        let opener = Opener::parse("definitely-not-a-real-browser-binary").unwrap();
        let err = open_with(&opener, Path::new("/tmp/x.html")).unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-browser-binary"));
    }

    /// Zombie processes named `comm` whose parent is this test process.
    #[cfg(target_os = "linux")]
    fn zombie_children(comm: &str) -> usize {
        let me = std::process::id().to_string();
        let Ok(entries) = std::fs::read_dir("/proc") else {
            return 0;
        };
        entries
            .flatten()
            .filter_map(|e| std::fs::read_to_string(e.path().join("stat")).ok())
            .filter(|stat| {
                // "<pid> (<comm>) <state> <ppid> ..."; comm may hold spaces.
                let Some((head, rest)) = stat.rsplit_once(')') else {
                    return false;
                };
                let name = head.split_once('(').map(|(_, n)| n);
                let mut fields = rest.split_whitespace();
                let state = fields.next();
                let ppid = fields.next();
                name == Some(comm) && state == Some("Z") && ppid == Some(me.as_str())
            })
            .count()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn finished_openers_are_reaped() {
        use std::time::{Duration, Instant};

        let opener = Opener::parse("true").unwrap();
        for _ in 0..5 {
            open_with(&opener, Path::new("/tmp/page.html")).unwrap();
        }

        // Give every opener time to exit, then wait for the reapers.
        std::thread::sleep(Duration::from_millis(200));
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let zombies = zombie_children("true");
            if zombies == 0 {
                break;
            }
            assert!(Instant::now() < deadline, "{zombies} openers left as zombies");
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}
