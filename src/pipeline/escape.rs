//! Escape stage: turn a chunk into an inline frame.
//!
//! Everything here is a pure function of its input. Stored chunks are never
//! rewritten, so rendering the same chunks twice produces the same bytes.

use crate::config::QuoteEscaping;
use std::borrow::Cow;

/// Prefix of every frame source produced by [`data_uri`].
pub const DATA_URI_PREFIX: &str = "data:text/html;charset=utf-8,";

/// Replace quote characters with HTML entities.
///
/// `"` always becomes `&quot;`. `'` becomes `&quot;` under
/// [`QuoteEscaping::Legacy`] and `&#39;` under [`QuoteEscaping::Distinct`].
/// Returns the input unchanged (and unallocated) when it holds no quotes.
pub fn escape_quotes(chunk: &str, escaping: QuoteEscaping) -> Cow<'_, str> {
    if !chunk.contains(['"', '\'']) {
        return Cow::Borrowed(chunk);
    }

    let single = match escaping {
        QuoteEscaping::Legacy => "&quot;",
        QuoteEscaping::Distinct => "&#39;",
    };

    let mut out = String::with_capacity(chunk.len() + chunk.len() / 8);
    for ch in chunk.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str(single),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Percent-encode `html` into a `data:` URI.
pub fn data_uri(html: &str) -> String {
    format!("{DATA_URI_PREFIX}{}", urlencoding::encode(html))
}

/// One borderless, full-viewport, scrollable frame sourcing `chunk`.
pub fn frame_markup(chunk: &str, escaping: QuoteEscaping) -> String {
    let escaped = escape_quotes(chunk, escaping);
    format!(
        "<iframe width='100vw' height='100vh' style='border: none;' scrolling='yes' src='{}'></iframe>",
        data_uri(&escaped)
    )
}

/// All chunks as consecutive frames, in index order.
pub fn frame_document<S: AsRef<str>>(chunks: &[S], escaping: QuoteEscaping) -> String {
    chunks
        .iter()
        .map(|c| frame_markup(c.as_ref(), escaping))
        .collect()
}
