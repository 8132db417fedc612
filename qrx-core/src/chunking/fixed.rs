//! Fixed-size splitting of a file's encoded text into symbol-sized chunks.

use crate::error::{QrxError, Result};

/// Split `text` into slices of at most `max_chars` characters, in order.
///
/// The last slice may be shorter. Empty input yields one empty slice so a
/// zero-byte file still travels as a single chunk.
pub fn split(text: &str, max_chars: usize) -> Result<Vec<&str>> {
    if max_chars == 0 {
        return Err(QrxError::InvalidChunkSize(max_chars));
    }
    if text.is_empty() {
        return Ok(vec![""]);
    }

    let mut out = Vec::with_capacity(chunk_count(text.len(), max_chars));
    let mut start = 0usize;
    let mut seen = 0usize;
    for (off, _) in text.char_indices() {
        if seen == max_chars {
            out.push(&text[start..off]);
            start = off;
            seen = 0;
        }
        seen += 1;
    }
    out.push(&text[start..]);
    Ok(out)
}

/// Number of chunks `split` produces for a text of `len` characters.
pub fn chunk_count(len: usize, max_chars: usize) -> usize {
    if len == 0 { 1 } else { len.div_ceil(max_chars) }
}
