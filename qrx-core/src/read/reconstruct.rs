//! Regroups scanned payloads by path and reassembles each file.
//!
//! Inputs arrive in any order, possibly duplicated, possibly incomplete.
//! Grouping is sequential because input order decides duplicate resolution;
//! the per-path resolve step shares nothing and runs in parallel. Every failure
//! is chunk- or file-scoped and ends up in the diagnostic list.

use crate::diagnostics::{Diagnostic, IndexRange, missing_ranges};
use crate::payload;
use crate::policy::{DecodePolicy, DuplicatePolicy, TotalPolicy};
use crate::read::inspect::PathCoverage;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
struct Slot {
    total: u32,
    data: String,
    source_id: String,
}

/// Chunks seen so far for one path, keyed by index.
#[derive(Clone, Debug, Default)]
struct Entry {
    chunks: BTreeMap<u32, Slot>,
    duplicates: u32,
    conflicted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconstructedFile {
    pub path: String,
    pub bytes: Vec<u8>,
    /// False when chunks were missing or the total had to be guessed.
    pub complete: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Reconstruction {
    /// Sorted by path.
    pub files: Vec<ReconstructedFile>,
    pub diagnostics: Vec<Diagnostic>,
    pub payloads: u64,
    pub accepted: u64,
    pub abandoned: u64,
}

pub struct Reconstructor {
    policy: DecodePolicy,
    entries: BTreeMap<String, Entry>,
    diagnostics: Vec<Diagnostic>,
    payloads: u64,
    accepted: u64,
}

impl Reconstructor {
    pub fn new(policy: DecodePolicy) -> Self {
        Self {
            policy,
            entries: BTreeMap::new(),
            diagnostics: Vec::new(),
            payloads: 0,
            accepted: 0,
        }
    }

    fn record(&mut self, d: Diagnostic) {
        warn!("{d}");
        self.diagnostics.push(d);
    }

    /// Feed one scanned payload text.
    pub fn push(&mut self, source_id: &str, text: &str) {
        self.payloads += 1;
        let chunk = match payload::parse(text) {
            Ok(c) => c,
            Err(e) => {
                self.record(Diagnostic::MalformedPayload {
                    source_id: source_id.to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };
        debug!(
            "chunk: {} {}/{} from {}",
            chunk.path, chunk.index, chunk.total, source_id
        );
        self.accepted += 1;

        let policy = self.policy.duplicates;
        let slot = Slot {
            total: chunk.total,
            data: chunk.data,
            source_id: source_id.to_string(),
        };
        let entry = self.entries.entry(chunk.path.clone()).or_default();
        let Some(prev) = entry.chunks.get(&chunk.index) else {
            entry.chunks.insert(chunk.index, slot);
            return;
        };

        let previous_source = prev.source_id.clone();
        let same = prev.data == slot.data && prev.total == slot.total;
        entry.duplicates += 1;
        let diag = match policy {
            DuplicatePolicy::Strict if !same => {
                entry.conflicted = true;
                Diagnostic::ConflictingDuplicate {
                    path: chunk.path,
                    index: chunk.index,
                    source_id: slot.source_id,
                    previous_source,
                }
            }
            DuplicatePolicy::Strict | DuplicatePolicy::FirstWins => Diagnostic::DuplicateChunk {
                path: chunk.path,
                index: chunk.index,
                source_id: slot.source_id,
                kept_source: previous_source.clone(),
                previous_source,
            },
            DuplicatePolicy::LastWins => {
                let d = Diagnostic::DuplicateChunk {
                    path: chunk.path,
                    index: chunk.index,
                    source_id: slot.source_id.clone(),
                    kept_source: slot.source_id.clone(),
                    previous_source,
                };
                entry.chunks.insert(chunk.index, slot);
                d
            }
        };
        self.record(diag);
    }

    /// Diagnostics recorded while ingesting, before any path is resolved.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// What has been collected so far for each path, without resolving anything.
    pub fn coverage(&self) -> Vec<PathCoverage> {
        self.entries
            .iter()
            .map(|(p, e)| {
                let totals: BTreeSet<u32> = e.chunks.values().map(|s| s.total).collect();
                let total = totals.iter().next_back().copied().unwrap_or(1);
                PathCoverage {
                    path: p.clone(),
                    totals: totals.into_iter().collect(),
                    present: e.chunks.keys().copied().collect(),
                    missing: missing_ranges(total, e.chunks.keys().copied()),
                    duplicates: e.duplicates,
                    conflicted: e.conflicted,
                }
            })
            .collect()
    }

    /// Resolve every path and hand back the files plus the full diagnostic log.
    pub fn finish(self) -> Reconstruction {
        let policy = self.policy;
        let entries: Vec<(String, Entry)> = self.entries.into_iter().collect();
        let resolved: Vec<(Option<ReconstructedFile>, Vec<Diagnostic>)> = entries
            .into_par_iter()
            .map(|(path, entry)| resolve(path, entry, policy))
            .collect();

        let mut out = Reconstruction {
            diagnostics: self.diagnostics,
            payloads: self.payloads,
            accepted: self.accepted,
            ..Default::default()
        };
        for (file, diags) in resolved {
            for d in &diags {
                warn!("{d}");
            }
            out.diagnostics.extend(diags);
            match file {
                Some(f) => out.files.push(f),
                None => out.abandoned += 1,
            }
        }
        out
    }
}

fn resolve(
    path: String,
    entry: Entry,
    policy: DecodePolicy,
) -> (Option<ReconstructedFile>, Vec<Diagnostic>) {
    let mut diags = Vec::new();
    if entry.conflicted {
        // Already reported at ingest.
        return (None, diags);
    }

    let totals: BTreeSet<u32> = entry.chunks.values().map(|s| s.total).collect();
    let mut complete = true;
    // Entries only exist once a chunk was inserted, so there is at least one total.
    let max_total = totals.iter().next_back().copied().unwrap_or(1);
    let total = if totals.len() > 1 {
        complete = false;
        match policy.totals {
            TotalPolicy::MaxObserved => {
                diags.push(Diagnostic::InconsistentTotal {
                    path: path.clone(),
                    totals: totals.iter().copied().collect(),
                    adopted: Some(max_total),
                });
                max_total
            }
            TotalPolicy::Strict => {
                diags.push(Diagnostic::InconsistentTotal {
                    path,
                    totals: totals.into_iter().collect(),
                    adopted: None,
                });
                return (None, diags);
            }
        }
    } else {
        max_total
    };

    let missing = missing_ranges(total, entry.chunks.keys().copied());
    if !missing.is_empty() {
        complete = false;
        diags.push(Diagnostic::MissingChunk {
            path: path.clone(),
            total,
            missing,
        });
    }

    let text: String = entry.chunks.values().map(|s| s.data.as_str()).collect();
    match STANDARD.decode(text.as_bytes()) {
        Ok(bytes) => {
            info!("reconstruct: {} ({} bytes, complete={})", path, bytes.len(), complete);
            (
                Some(ReconstructedFile {
                    path,
                    bytes,
                    complete,
                }),
                diags,
            )
        }
        Err(e) => {
            diags.push(Diagnostic::DecodeFailure {
                path,
                reason: e.to_string(),
            });
            (None, diags)
        }
    }
}

/// One-shot form: feed `(source_id, text)` pairs in order, then resolve.
pub fn reconstruct<I, S, T>(inputs: I, policy: DecodePolicy) -> Reconstruction
where
    I: IntoIterator<Item = (S, T)>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let mut r = Reconstructor::new(policy);
    for (source_id, text) in inputs {
        r.push(source_id.as_ref(), text.as_ref());
    }
    r.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(inputs: &[(&str, &str)], policy: DecodePolicy) -> Reconstruction {
        reconstruct(inputs.iter().copied(), policy)
    }

    #[test]
    fn reassembles_out_of_order_chunks() {
        // "hello world!" -> aGVsbG8gd29ybGQh
        let r = run(
            &[("2", "f|2|2|d29ybGQh"), ("1", "f|1|2|aGVsbG8g")],
            DecodePolicy::default(),
        );
        assert!(r.diagnostics.is_empty());
        assert_eq!(r.files.len(), 1);
        assert_eq!(r.files[0].bytes, b"hello world!");
        assert!(r.files[0].complete);
    }

    #[test]
    fn malformed_payload_is_isolated() {
        let r = run(
            &[("x", "garbage"), ("1", "f|1|1|aGk=")],
            DecodePolicy::default(),
        );
        assert_eq!(r.diagnostics.len(), 1);
        assert_eq!(r.diagnostics[0].kind(), "malformed-payload");
        assert_eq!(r.files[0].bytes, b"hi");
        assert_eq!(r.payloads, 2);
        assert_eq!(r.accepted, 1);
    }

    #[test]
    fn later_duplicate_wins_by_default() {
        let r = run(
            &[("a", "f|1|1|aGk="), ("b", "f|1|1|eW8=")],
            DecodePolicy::default(),
        );
        assert_eq!(r.files[0].bytes, b"yo");
        assert!(matches!(
            &r.diagnostics[..],
            [Diagnostic::DuplicateChunk { kept_source, .. }] if kept_source == "b"
        ));
    }

    #[test]
    fn first_wins_keeps_earlier_value() {
        let policy = DecodePolicy {
            duplicates: DuplicatePolicy::FirstWins,
            ..Default::default()
        };
        let r = run(&[("a", "f|1|1|aGk="), ("b", "f|1|1|eW8=")], policy);
        assert_eq!(r.files[0].bytes, b"hi");
        assert_eq!(r.diagnostics[0].kind(), "duplicate-chunk");
    }

    #[test]
    fn strict_abandons_conflicting_duplicates_only() {
        let r = run(
            &[
                ("a", "f|1|1|aGk="),
                ("b", "f|1|1|eW8="),
                ("c", "g|1|1|aGk="),
                ("d", "g|1|1|aGk="),
            ],
            DecodePolicy::strict(),
        );
        let kinds: Vec<_> = r.diagnostics.iter().map(|d| d.kind()).collect();
        assert_eq!(kinds, vec!["conflicting-duplicate", "duplicate-chunk"]);
        assert_eq!(r.files.len(), 1);
        assert_eq!(r.files[0].path, "g");
        assert_eq!(r.abandoned, 1);
    }

    #[test]
    fn inconsistent_totals_adopt_the_maximum() {
        let r = run(
            &[("1", "f|1|2|aGVsbG8g"), ("2", "f|2|3|d29ybGQh")],
            DecodePolicy::default(),
        );
        let kinds: Vec<_> = r.diagnostics.iter().map(|d| d.kind()).collect();
        assert_eq!(kinds, vec!["inconsistent-total", "missing-chunk"]);
        assert!(matches!(
            &r.diagnostics[1],
            Diagnostic::MissingChunk { total: 3, missing, .. } if missing == &vec![IndexRange::single(3)]
        ));
        assert_eq!(r.files[0].bytes, b"hello world!");
        assert!(!r.files[0].complete);
    }

    #[test]
    fn strict_totals_abandon_the_file() {
        let r = run(
            &[("1", "f|1|2|aGVsbG8g"), ("2", "f|2|3|d29ybGQh")],
            DecodePolicy::strict(),
        );
        assert!(r.files.is_empty());
        assert!(matches!(
            &r.diagnostics[..],
            [Diagnostic::InconsistentTotal { adopted: None, .. }]
        ));
    }

    #[test]
    fn missing_chunk_is_lossy_not_fatal() {
        let r = run(&[("1", "f|1|2|aGVsbG8g")], DecodePolicy::default());
        assert_eq!(r.files[0].bytes, b"hello ");
        assert!(matches!(
            &r.diagnostics[..],
            [Diagnostic::MissingChunk { missing, .. }] if missing == &vec![IndexRange::single(2)]
        ));
    }

    #[test]
    fn undecodable_base64_abandons_one_file() {
        let r = run(
            &[("1", "bad|1|1|a!!"), ("2", "ok|1|1|aGk=")],
            DecodePolicy::default(),
        );
        assert_eq!(r.files.len(), 1);
        assert_eq!(r.files[0].path, "ok");
        assert_eq!(r.diagnostics[0].kind(), "decode-failure");
        assert_eq!(r.diagnostics[0].path(), Some("bad"));
    }

    #[test]
    fn coverage_reports_present_indices() {
        let mut rc = Reconstructor::new(DecodePolicy::default());
        rc.push("a", "f|3|3|QQ==");
        rc.push("b", "f|1|3|QQ==");
        rc.push("c", "f|1|3|QQ==");
        let cov = rc.coverage();
        assert_eq!(cov.len(), 1);
        assert_eq!(cov[0].present, vec![1, 3]);
        assert_eq!(cov[0].missing, vec![IndexRange::single(2)]);
        assert_eq!(cov[0].totals, vec![3]);
        assert_eq!(cov[0].duplicates, 1);
    }

    #[test]
    fn huge_declared_total_stays_bounded() {
        let stray = format!("b.txt|1|{}|QQ==", u32::MAX);
        let r = run(
            &[("good.png", "a.txt|1|1|aGk="), ("stray.png", &stray)],
            DecodePolicy::default(),
        );
        assert_eq!(r.files.len(), 2);
        assert!(matches!(
            &r.diagnostics[..],
            [Diagnostic::MissingChunk { path, total: u32::MAX, missing }]
                if path == "b.txt"
                    && missing == &vec![IndexRange { first: 2, last: u32::MAX }]
        ));

        let mut rc = Reconstructor::new(DecodePolicy::default());
        rc.push("stray.png", &stray);
        assert_eq!(rc.coverage()[0].missing.len(), 1);
    }
}
