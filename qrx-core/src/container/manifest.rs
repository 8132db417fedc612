use crate::symbol::EcLevel;
use serde::{Deserialize, Serialize};

pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub size: u64,
    pub blake3: String, // hex digest of the original bytes
    pub total: u32,
    pub artifacts: Vec<String>,
}

/// A file the encoder had to give up on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub path: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub created: i64,
    pub tool: String,
    pub chunk_size: usize,
    pub ec_level: EcLevel,
}

/// Written next to the rendered images for the sending operator; decode never reads it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub files: Vec<FileEntry>,
    pub failed: Vec<FailedEntry>,
    pub meta: Meta,
}
