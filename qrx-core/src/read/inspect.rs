use crate::diagnostics::{Diagnostic, IndexRange};
use crate::error::Result;
use crate::policy::DecodePolicy;
use crate::read::reconstruct::Reconstructor;
use crate::read::scan::scan_dir;
use crate::symbol::SymbolScanner;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Collection state of one logical path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCoverage {
    pub path: String,
    /// Distinct declared totals; more than one means the chunks disagree.
    pub totals: Vec<u32>,
    pub present: Vec<u32>,
    /// Gaps against the largest declared total.
    pub missing: Vec<IndexRange>,
    pub duplicates: u32,
    pub conflicted: bool,
}

impl PathCoverage {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.totals.len() == 1 && !self.conflicted
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InspectReport {
    pub images: u64,
    pub payloads: u64,
    pub paths: Vec<PathCoverage>,
    /// Scan- and payload-level problems only; nothing is resolved.
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan `input` and report per-path coverage without decoding or writing anything.
pub fn inspect(
    scanner: &dyn SymbolScanner,
    input: &Path,
    policy: DecodePolicy,
) -> Result<InspectReport> {
    let scanned = scan_dir(scanner, input)?;
    let mut rc = Reconstructor::new(policy);
    for p in &scanned.payloads {
        rc.push(&p.source_id, &p.text);
    }

    let mut diagnostics = scanned.diagnostics;
    diagnostics.extend_from_slice(rc.diagnostics());
    Ok(InspectReport {
        images: scanned.images,
        payloads: scanned.payloads.len() as u64,
        paths: rc.coverage(),
        diagnostics,
    })
}
