//! Per-chunk download controls.
//!
//! A [`DownloadControl`] only remembers its index and a handle onto the
//! [`ChunkStore`]. The chunk is looked up when the control is activated, so
//! a control always saves what is stored *now*, not what was stored when
//! the control was made.
//!
//! Saving goes through a [`tempfile::NamedTempFile`] in the target
//! directory which is then persisted under its final name. If any step
//! fails, the temp file is dropped and removed, so nothing half-written is
//! ever left behind.

use crate::error::Pdf2HtmlError;
use crate::state::ChunkStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name a chunk is saved under: `pdf_part_<index>.html`.
pub fn part_file_name(index: usize) -> String {
    format!("pdf_part_{index}.html")
}

/// Write `content` to `dir/pdf_part_<index>.html`, replacing any earlier copy.
pub fn save_part(dir: &Path, index: usize, content: &str) -> Result<PathBuf, Pdf2HtmlError> {
    let target = dir.join(part_file_name(index));
    let write_failed = |source: std::io::Error| Pdf2HtmlError::OutputWriteFailed {
        path: target.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_failed)?;
    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
    staged.write_all(content.as_bytes()).map_err(write_failed)?;
    staged.flush().map_err(write_failed)?;
    staged.persist(&target).map_err(|e| write_failed(e.error))?;

    info!("Saved part {} → {}", index, target.display());
    Ok(target)
}

/// A "Download part N" button.
#[derive(Debug, Clone)]
pub struct DownloadControl {
    index: usize,
    store: ChunkStore,
}

impl DownloadControl {
    pub(crate) fn new(index: usize, store: ChunkStore) -> Self {
        Self { index, store }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn label(&self) -> String {
        format!("Download part {}", self.index)
    }

    pub fn file_name(&self) -> String {
        part_file_name(self.index)
    }

    /// Save the current value of this control's chunk into `dir`.
    ///
    /// Returns `Ok(None)` without touching the file system when the stored
    /// list no longer reaches this index.
    pub fn activate(&self, dir: &Path) -> Result<Option<PathBuf>, Pdf2HtmlError> {
        match self.store.get(self.index) {
            Some(content) => save_part(dir, self.index, &content).map(Some),
            None => {
                debug!(
                    "Part {} no longer exists ({} stored); ignoring",
                    self.index,
                    self.store.len()
                );
                Ok(None)
            }
        }
    }
}

/// The set of controls for the current upload.
#[derive(Debug, Default, Clone)]
pub struct DownloadPanel {
    controls: Vec<DownloadControl>,
}

impl DownloadPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every control and create one per stored chunk.
    pub fn regenerate(&mut self, store: &ChunkStore) {
        self.controls = (0..store.len())
            .map(|i| DownloadControl::new(i, store.clone()))
            .collect();
    }

    pub fn controls(&self) -> &[DownloadControl] {
        &self.controls
    }

    pub fn get(&self, index: usize) -> Option<&DownloadControl> {
        self.controls.get(index)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}
