use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    /// A renderer or scanner this build cannot provide. Raised once, before any work.
    #[error("capability unavailable: {0}")]
    Capability(String),

    #[error("render failed for {path} chunk {index}: {reason}")]
    Render {
        path: String,
        index: u32,
        reason: String,
    },

    #[error("unsafe path: {0}")]
    UnsafePath(String),

    #[error("path contains the payload delimiter: {0}")]
    DelimiterInPath(String),

    #[error("chunk size must be at least 1, got {0}")]
    InvalidChunkSize(usize),

    #[error("invalid exclude pattern: {0}")]
    Pattern(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, QrxError>;
