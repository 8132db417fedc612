use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeStats {
    pub files: u64,
    pub failed_files: u64,
    pub symbols: u64,
    pub logical_bytes: u64,
    pub image_bytes: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeStats {
    pub images: u64,
    pub payloads: u64,
    pub chunks_accepted: u64,
    pub files_written: u64,
    pub files_abandoned: u64,
    pub bytes_written: u64,
}
