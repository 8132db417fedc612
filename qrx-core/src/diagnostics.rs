use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive run of chunk indices. Gaps are reported as runs so a bogus
/// `total` costs one entry, not one per index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub first: u32,
    pub last: u32,
}

impl IndexRange {
    pub fn single(index: u32) -> Self {
        Self {
            first: index,
            last: index,
        }
    }

    /// Number of indices in the run.
    pub fn count(&self) -> u64 {
        u64::from(self.last) - u64::from(self.first) + 1
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Gaps in `1..=total` not covered by `present`, which must be ascending.
pub fn missing_ranges(total: u32, present: impl IntoIterator<Item = u32>) -> Vec<IndexRange> {
    let mut out = Vec::new();
    let mut next: u64 = 1;
    for i in present {
        let i = u64::from(i);
        if i > u64::from(total) {
            break;
        }
        if i > next {
            out.push(IndexRange {
                first: next as u32,
                last: (i - 1) as u32,
            });
        }
        next = next.max(i + 1);
    }
    if next <= u64::from(total) {
        out.push(IndexRange {
            first: next as u32,
            last: total,
        });
    }
    out
}

/// Renders runs as `[2, 5-9]`.
pub fn format_ranges(ranges: &[IndexRange]) -> String {
    let parts: Vec<String> = ranges.iter().map(IndexRange::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// A chunk- or file-scoped problem found while decoding. Never aborts the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// Image file could not be read or decoded as an image.
    UnreadableImage { source_id: String, reason: String },

    /// Image decoded but no symbol was found in it.
    NoSymbol { source_id: String },

    MalformedPayload { source_id: String, reason: String },

    /// Same path/index seen again; `kept_source` names the value that survives.
    DuplicateChunk {
        path: String,
        index: u32,
        source_id: String,
        previous_source: String,
        kept_source: String,
    },

    /// Duplicate with different data under the strict policy; the file is abandoned.
    ConflictingDuplicate {
        path: String,
        index: u32,
        source_id: String,
        previous_source: String,
    },

    /// Chunks of one path disagree on `total`. `adopted` is `None` when the file was abandoned.
    InconsistentTotal {
        path: String,
        totals: Vec<u32>,
        adopted: Option<u32>,
    },

    MissingChunk {
        path: String,
        total: u32,
        missing: Vec<IndexRange>,
    },

    /// Concatenated data is not valid base64; the file is abandoned.
    DecodeFailure { path: String, reason: String },

    /// Reconstructed bytes could not be written (unsafe path or I/O error).
    WriteFailure { path: String, reason: String },
}

impl Diagnostic {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::UnreadableImage { .. } => "unreadable-image",
            Diagnostic::NoSymbol { .. } => "no-symbol",
            Diagnostic::MalformedPayload { .. } => "malformed-payload",
            Diagnostic::DuplicateChunk { .. } => "duplicate-chunk",
            Diagnostic::ConflictingDuplicate { .. } => "conflicting-duplicate",
            Diagnostic::InconsistentTotal { .. } => "inconsistent-total",
            Diagnostic::MissingChunk { .. } => "missing-chunk",
            Diagnostic::DecodeFailure { .. } => "decode-failure",
            Diagnostic::WriteFailure { .. } => "write-failure",
        }
    }

    /// Logical file path the diagnostic is about, if it concerns one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Diagnostic::DuplicateChunk { path, .. }
            | Diagnostic::ConflictingDuplicate { path, .. }
            | Diagnostic::InconsistentTotal { path, .. }
            | Diagnostic::MissingChunk { path, .. }
            | Diagnostic::DecodeFailure { path, .. }
            | Diagnostic::WriteFailure { path, .. } => Some(path),
            Diagnostic::UnreadableImage { .. }
            | Diagnostic::NoSymbol { .. }
            | Diagnostic::MalformedPayload { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnreadableImage { source_id, reason } => {
                write!(f, "{source_id}: unreadable image: {reason}")
            }
            Diagnostic::NoSymbol { source_id } => write!(f, "{source_id}: no symbol found"),
            Diagnostic::MalformedPayload { source_id, reason } => {
                write!(f, "{source_id}: malformed payload: {reason}")
            }
            Diagnostic::DuplicateChunk {
                path,
                index,
                source_id,
                previous_source,
                kept_source,
            } => write!(
                f,
                "{path}: duplicate chunk {index} ({previous_source}, {source_id}); kept {kept_source}"
            ),
            Diagnostic::ConflictingDuplicate {
                path,
                index,
                source_id,
                previous_source,
            } => write!(
                f,
                "{path}: chunk {index} differs between {previous_source} and {source_id}; file abandoned"
            ),
            Diagnostic::InconsistentTotal {
                path,
                totals,
                adopted,
            } => match adopted {
                Some(t) => write!(f, "{path}: inconsistent totals {totals:?}; using {t}"),
                None => write!(f, "{path}: inconsistent totals {totals:?}; file abandoned"),
            },
            Diagnostic::MissingChunk {
                path,
                total,
                missing,
            } => write!(
                f,
                "{path}: missing {} of {total} chunks: {}",
                missing.iter().map(IndexRange::count).sum::<u64>(),
                format_ranges(missing)
            ),
            Diagnostic::DecodeFailure { path, reason } => {
                write!(f, "{path}: base64 decode failed: {reason}; file abandoned")
            }
            Diagnostic::WriteFailure { path, reason } => write!(f, "{path}: write failed: {reason}"),
        }
    }
}
