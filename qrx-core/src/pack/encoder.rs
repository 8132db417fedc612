use crate::chunking::fixed;
use crate::container::manifest::{FailedEntry, FileEntry, MANIFEST_NAME, Manifest, Meta};
use crate::error::{QrxError, Result};
use crate::pack::walker::{SourceFile, walk};
use crate::payload::{self, DELIMITER, EncodedChunk};
use crate::stats::EncodeStats;
use crate::symbol::{EcLevel, SymbolRenderer};
use crate::util::sanitize::{artifact_name, sanitize};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 1000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Maximum base64 characters per symbol.
    pub chunk_size: usize,
    pub ec_level: EcLevel,
    /// Glob patterns; matching files and directories are skipped.
    pub exclude: Vec<String>,
    /// When true, zero the manifest timestamp for reproducible output.
    pub deterministic: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            ec_level: EcLevel::default(),
            exclude: Vec::new(),
            deterministic: false,
        }
    }
}

/// One rendered symbol, ready to be written out.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub name: String,
    pub image: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
pub struct EncodeReport {
    pub manifest: Manifest,
    pub stats: EncodeStats,
}

/// Split a file into its ordered chunk sequence. Pure; no rendering.
pub fn chunk_file(path: &str, bytes: &[u8], chunk_size: usize) -> Result<Vec<EncodedChunk>> {
    if path.contains(DELIMITER) {
        return Err(QrxError::DelimiterInPath(path.to_string()));
    }
    let text = STANDARD.encode(bytes);
    let parts = fixed::split(&text, chunk_size)?;
    let total = u32::try_from(parts.len())
        .map_err(|_| QrxError::Format(format!("{path}: too many chunks ({})", parts.len())))?;

    Ok(parts
        .into_iter()
        .zip(1..=total)
        .map(|(data, index)| EncodedChunk {
            path: path.to_string(),
            index,
            total,
            data: data.to_string(),
        })
        .collect())
}

/// Framed payload texts for a file, in index order.
pub fn frame_file(path: &str, bytes: &[u8], chunk_size: usize) -> Result<Vec<String>> {
    Ok(chunk_file(path, bytes, chunk_size)?
        .iter()
        .map(|c| payload::frame(&c.path, c.index, c.total, &c.data))
        .collect())
}

pub struct Encoder {
    renderer: Arc<dyn SymbolRenderer>,
    opts: EncodeOptions,
}

impl Encoder {
    pub fn new(renderer: Arc<dyn SymbolRenderer>, opts: EncodeOptions) -> Result<Self> {
        if opts.chunk_size == 0 {
            return Err(QrxError::InvalidChunkSize(opts.chunk_size));
        }
        Ok(Self { renderer, opts })
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.opts
    }

    /// Render every chunk of one file. Any render failure fails the whole file.
    pub fn encode_file(&self, path: &str, bytes: &[u8]) -> Result<Vec<Artifact>> {
        let chunks = chunk_file(path, bytes, self.opts.chunk_size)?;
        let ext = self.renderer.extension();
        let mut out = Vec::with_capacity(chunks.len());
        for c in &chunks {
            let text = payload::frame(&c.path, c.index, c.total, &c.data);
            let image = self
                .renderer
                .render(&text, self.opts.ec_level)
                .map_err(|e| QrxError::Render {
                    path: path.to_string(),
                    index: c.index,
                    reason: e.to_string(),
                })?;
            let name = artifact_name(path, c.index, c.total, ext);
            debug!("render: {} ({} chars) -> {}", path, text.len(), name);
            out.push(Artifact { name, image });
        }
        Ok(out)
    }

    /// Encode every file under `src` into images in `out`, plus a manifest.
    ///
    /// Files are processed in parallel. A file that fails is recorded in the
    /// manifest's `failed` list; the rest of the run continues.
    pub fn encode_dir(&self, src: &Path, out: &Path) -> Result<EncodeReport> {
        let files = walk(src, &self.opts.exclude)?;
        fs::create_dir_all(out)?;
        info!("encode: {} files from {}", files.len(), src.display());

        let collisions = stem_collisions(&files);

        let outcomes: Vec<std::result::Result<(FileEntry, u64), FailedEntry>> = files
            .par_iter()
            .map(|f| {
                if let Some(first) = collisions.get(&f.rel) {
                    return Err(FailedEntry {
                        path: f.rel.clone(),
                        reason: format!("artifact names would collide with {first}"),
                    });
                }
                self.encode_one(f, out).map_err(|e| FailedEntry {
                    path: f.rel.clone(),
                    reason: e.to_string(),
                })
            })
            .collect();

        let mut stats = EncodeStats::default();
        let mut entries = Vec::new();
        let mut failed = Vec::new();
        for o in outcomes {
            match o {
                Ok((entry, image_bytes)) => {
                    stats.files += 1;
                    stats.symbols += entry.total as u64;
                    stats.logical_bytes += entry.size;
                    stats.image_bytes += image_bytes;
                    entries.push(entry);
                }
                Err(fe) => {
                    warn!("encode: {} failed: {}", fe.path, fe.reason);
                    stats.failed_files += 1;
                    failed.push(fe);
                }
            }
        }

        let created = if self.opts.deterministic {
            0
        } else {
            OffsetDateTime::now_utc().unix_timestamp()
        };
        let manifest = Manifest {
            files: entries,
            failed,
            meta: Meta {
                created,
                tool: concat!("qrx-core/", env!("CARGO_PKG_VERSION")).to_string(),
                chunk_size: self.opts.chunk_size,
                ec_level: self.opts.ec_level,
            },
        };
        fs::write(out.join(MANIFEST_NAME), serde_json::to_vec_pretty(&manifest)?)?;

        Ok(EncodeReport { manifest, stats })
    }

    fn encode_one(&self, f: &SourceFile, out: &Path) -> Result<(FileEntry, u64)> {
        let bytes = f.read()?;
        let artifacts = self.encode_file(&f.rel, &bytes)?;
        let mut image_bytes = 0u64;
        let mut names = Vec::with_capacity(artifacts.len());
        for a in artifacts {
            fs::write(out.join(&a.name), &a.image)?;
            image_bytes += a.image.len() as u64;
            names.push(a.name);
        }
        info!("encode: {} ({} bytes) -> {} symbols", f.rel, bytes.len(), names.len());
        Ok((
            FileEntry {
                path: f.rel.clone(),
                size: bytes.len() as u64,
                blake3: hex::encode(blake3::hash(&bytes).as_bytes()),
                total: names.len() as u32,
                artifacts: names,
            },
            image_bytes,
        ))
    }
}

/// Later files whose sanitized name matches an earlier one, mapped to that earlier path.
fn stem_collisions(files: &[SourceFile]) -> HashMap<String, String> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut out = HashMap::new();
    for f in files {
        let stem = sanitize(&f.rel);
        match seen.get(&stem) {
            Some(first) => {
                out.insert(f.rel.clone(), first.to_string());
            }
            None => {
                seen.insert(stem, &f.rel);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TextRenderer;

    impl SymbolRenderer for TextRenderer {
        fn extension(&self) -> &'static str {
            "txt"
        }
        fn render(&self, payload: &str, _level: EcLevel) -> Result<Vec<u8>> {
            if payload.len() > 64 {
                return Err(QrxError::Format("too long".into()));
            }
            Ok(payload.as_bytes().to_vec())
        }
    }

    fn encoder(chunk_size: usize) -> Encoder {
        Encoder::new(
            Arc::new(TextRenderer),
            EncodeOptions {
                chunk_size,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn chunk_count_follows_base64_length() {
        let bytes = vec![7u8; 5000];
        let chunks = chunk_file("blob.bin", &bytes, 2000).unwrap();
        let lens: Vec<_> = chunks.iter().map(|c| c.data.len()).collect();
        assert_eq!(lens, vec![2000, 2000, 2000, 668]);
        assert!(chunks.iter().all(|c| c.total == 4));
        let idx: Vec<_> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(idx, vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_file_is_one_empty_chunk() {
        let chunks = chunk_file("empty", b"", 10).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total, 1);
        assert_eq!(chunks[0].data, "");
    }

    #[test]
    fn delimiter_in_path_is_refused() {
        assert!(matches!(
            chunk_file("a|b", b"x", 10),
            Err(QrxError::DelimiterInPath(_))
        ));
    }

    #[test]
    fn encode_file_names_artifacts_in_order() {
        let arts = encoder(8).encode_file("d/f.txt", b"hello world!").unwrap();
        let names: Vec<_> = arts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["d_f.txt-chunk-1-of-2.txt", "d_f.txt-chunk-2-of-2.txt"]
        );
        assert_eq!(arts[0].image, b"d/f.txt|1|2|aGVsbG8g");
    }

    #[test]
    fn render_failure_names_the_chunk() {
        let err = encoder(100).encode_file("big", &[1u8; 200]).unwrap_err();
        assert!(matches!(err, QrxError::Render { index: 1, .. }));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(Encoder::new(Arc::new(TextRenderer), EncodeOptions {
            chunk_size: 0,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn encode_dir_isolates_failures_and_writes_manifest() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(src.path().join("small.txt"), b"hi").unwrap();
        fs::write(src.path().join("huge.bin"), vec![0u8; 300]).unwrap();

        let enc = Encoder::new(
            Arc::new(TextRenderer),
            EncodeOptions {
                chunk_size: 100,
                deterministic: true,
                ..Default::default()
            },
        )
        .unwrap();
        let report = enc.encode_dir(src.path(), out.path()).unwrap();

        assert_eq!(report.stats.files, 1);
        assert_eq!(report.stats.failed_files, 1);
        assert_eq!(report.manifest.failed[0].path, "huge.bin");
        assert_eq!(report.manifest.files[0].path, "small.txt");
        assert_eq!(report.manifest.meta.created, 0);
        assert!(out.path().join("small.txt-chunk-1-of-1.txt").exists());

        let on_disk: Manifest =
            serde_json::from_slice(&fs::read(out.path().join(MANIFEST_NAME)).unwrap()).unwrap();
        assert_eq!(on_disk, report.manifest);
    }

    #[test]
    fn colliding_sanitized_names_fail_the_later_file() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::create_dir(src.path().join("a")).unwrap();
        fs::write(src.path().join("a/b"), b"1").unwrap();
        fs::write(src.path().join("a_b"), b"2").unwrap();

        let report = encoder(100).encode_dir(src.path(), out.path()).unwrap();
        assert_eq!(report.manifest.files.len(), 1);
        assert_eq!(report.manifest.files[0].path, "a/b");
        assert_eq!(report.manifest.failed[0].path, "a_b");
    }
}
