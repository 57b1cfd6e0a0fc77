//! Pipeline stages between a local PDF and a rendered document.
//!
//! ```text
//! upload ──▶ (chunk store) ──▶ escape ──▶ browsing host
//! (POST)                       (frames)
//! ```
//!
//! 1. [`upload`]: build the multipart body, post it, decode the JSON reply;
//!    the only stage with network I/O
//! 2. [`escape`]: quote-escape a chunk and wrap it in a `data:` URI frame;
//!    only used by single-tab rendering

pub mod escape;
pub mod upload;
