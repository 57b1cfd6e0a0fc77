//! The in-memory chunk slot and its upload fence.
//!
//! [`ChunkStore`] is a cheap, cloneable handle onto one slot. The
//! [`crate::client::ConverterClient`] is the only writer; download controls
//! and the renderer keep clones and read whatever is current at the moment
//! they run.
//!
//! The slot starts empty. Each accepted upload replaces its contents
//! wholesale, and nothing is ever appended.
//!
//! Overlapping uploads are fenced by ticket. Every upload takes a
//! monotonically increasing [`UploadTicket`] before it hits the network, and
//! only the newest ticket may commit. Under
//! [`UploadPolicy::RejectWhilePending`] a second ticket is refused while one
//! is open.

use crate::config::UploadPolicy;
use crate::error::Pdf2HtmlError;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Fence id handed out by [`ChunkStore::begin_upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadTicket(u64);

impl UploadTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Slot {
    chunks: Vec<String>,
    /// Number of successful commits so far.
    generation: u64,
    /// Last ticket id handed out.
    issued: u64,
    /// Tickets that have begun but neither committed nor been abandoned.
    open: Vec<u64>,
}

/// Shared handle onto the chunk slot.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    slot: Arc<RwLock<Slot>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A writer never leaves the slot half-updated, so a poisoned lock still
    // holds consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Readers ──────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.read().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().chunks.is_empty()
    }

    /// Current value of chunk `index`, or `None` if the list is shorter.
    pub fn get(&self, index: usize) -> Option<String> {
        self.read().chunks.get(index).cloned()
    }

    /// Copy of every chunk, in index order.
    pub fn snapshot(&self) -> Vec<String> {
        self.read().chunks.clone()
    }

    /// How many uploads have been committed; 0 for a fresh store.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Whether any upload is between `begin_upload` and commit/abandon.
    pub fn has_pending(&self) -> bool {
        !self.read().open.is_empty()
    }

    // ── Writers (client only) ────────────────────────────────────────────

    pub(crate) fn begin_upload(&self, policy: UploadPolicy) -> Result<UploadTicket, Pdf2HtmlError> {
        let mut slot = self.write();
        if policy == UploadPolicy::RejectWhilePending {
            if let Some(&pending) = slot.open.last() {
                return Err(Pdf2HtmlError::UploadInFlight { pending });
            }
        }
        slot.issued += 1;
        let id = slot.issued;
        slot.open.push(id);
        debug!("Upload #{} started ({} open)", id, slot.open.len());
        Ok(UploadTicket(id))
    }

    /// Replace the chunks with `chunks` if `ticket` is still the newest.
    ///
    /// The ticket is closed either way.
    pub(crate) fn commit(&self, ticket: UploadTicket, chunks: Vec<String>) -> Result<(), Pdf2HtmlError> {
        let mut slot = self.write();
        slot.open.retain(|&id| id != ticket.0);
        if ticket.0 != slot.issued {
            return Err(Pdf2HtmlError::Superseded {
                ticket: ticket.0,
                latest: slot.issued,
            });
        }
        slot.chunks = chunks;
        slot.generation += 1;
        debug!(
            "Upload #{} committed {} chunks (generation {})",
            ticket.0,
            slot.chunks.len(),
            slot.generation
        );
        Ok(())
    }

    /// Close `ticket` without touching the chunks.
    pub(crate) fn abandon(&self, ticket: UploadTicket) {
        self.write().open.retain(|&id| id != ticket.0);
    }
}
