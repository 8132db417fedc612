use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::policy::DecodePolicy;
use crate::read::reconstruct::{ReconstructedFile, Reconstructor};
use crate::read::scan::scan_dir;
use crate::stats::DecodeStats;
use crate::symbol::SymbolScanner;
use crate::util::sanitize::safe_join;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    pub policy: DecodePolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFile {
    pub path: String,
    pub size: u64,
    pub blake3: String,
    pub complete: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DecodeReport {
    pub files: Vec<DecodedFile>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: DecodeStats,
}

impl DecodeReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Write reconstructed files under `dest`, creating parents.
///
/// Each file is independent: a path that would escape `dest` or an I/O error
/// becomes a `write-failure` diagnostic and the rest are still written.
pub fn write_files(
    dest: &Path,
    files: &[ReconstructedFile],
) -> Result<(Vec<DecodedFile>, Vec<Diagnostic>)> {
    fs::create_dir_all(dest)?;
    let mut written = Vec::new();
    let mut diags = Vec::new();
    for f in files {
        match write_one(dest, f) {
            Ok(()) => {
                info!("write: {} ({} bytes)", f.path, f.bytes.len());
                written.push(DecodedFile {
                    path: f.path.clone(),
                    size: f.bytes.len() as u64,
                    blake3: hex::encode(blake3::hash(&f.bytes).as_bytes()),
                    complete: f.complete,
                });
            }
            Err(e) => {
                let d = Diagnostic::WriteFailure {
                    path: f.path.clone(),
                    reason: e.to_string(),
                };
                warn!("{d}");
                diags.push(d);
            }
        }
    }
    Ok((written, diags))
}

fn write_one(dest: &Path, f: &ReconstructedFile) -> Result<()> {
    let outp = safe_join(dest, &f.path)?;
    if let Some(parent) = outp.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&outp, &f.bytes)?;
    Ok(())
}

pub struct Decoder {
    scanner: Arc<dyn SymbolScanner>,
    opts: DecodeOptions,
}

impl Decoder {
    pub fn new(scanner: Arc<dyn SymbolScanner>, opts: DecodeOptions) -> Self {
        Self { scanner, opts }
    }

    /// Scan every image in `input`, reconstruct, and write results to `output`.
    pub fn decode_dir(&self, input: &Path, output: &Path) -> Result<DecodeReport> {
        let scanned = scan_dir(self.scanner.as_ref(), input)?;
        info!(
            "decode: {} payloads from {} images",
            scanned.payloads.len(),
            scanned.images
        );

        let mut rc = Reconstructor::new(self.opts.policy);
        for p in &scanned.payloads {
            rc.push(&p.source_id, &p.text);
        }
        let rec = rc.finish();

        let (files, write_diags) = write_files(output, &rec.files)?;

        let mut diagnostics = scanned.diagnostics;
        diagnostics.extend(rec.diagnostics);
        diagnostics.extend(write_diags);

        let stats = DecodeStats {
            images: scanned.images,
            payloads: rec.payloads,
            chunks_accepted: rec.accepted,
            files_written: files.len() as u64,
            files_abandoned: rec.abandoned + (rec.files.len() - files.len()) as u64,
            bytes_written: files.iter().map(|f| f.size).sum(),
        };
        Ok(DecodeReport {
            files,
            diagnostics,
            stats,
        })
    }
}
