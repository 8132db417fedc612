use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::symbol::SymbolScanner;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File extensions considered for scanning; everything else in the input dir is ignored.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// One raw symbol text and the image it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannedPayload {
    pub source_id: String,
    pub text: String,
}

#[derive(Clone, Debug, Default)]
pub struct ScanOutcome {
    pub images: u64,
    pub payloads: Vec<ScannedPayload>,
    pub diagnostics: Vec<Diagnostic>,
}

/// UTF-8 if valid, else each byte taken as one Latin-1 character.
pub fn decode_text(raw: &[u8]) -> String {
    match std::str::from_utf8(raw) {
        Ok(s) => s.to_string(),
        Err(_) => raw.iter().map(|&b| b as char).collect(),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|x| x.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Image files under `dir`, sorted, so scan order (and thus duplicate resolution) is stable.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for e in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let e = e.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        if e.file_type().is_file() && is_image(e.path()) {
            out.push(e.path().to_path_buf());
        }
    }
    Ok(out)
}

fn source_id(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Scan one image. Unreadable or empty images become diagnostics.
pub fn scan_image(
    scanner: &dyn SymbolScanner,
    id: &str,
    bytes: &[u8],
) -> (Vec<ScannedPayload>, Option<Diagnostic>) {
    let found = match scanner.scan(bytes) {
        Ok(found) => found,
        Err(e) => {
            return (
                Vec::new(),
                Some(Diagnostic::UnreadableImage {
                    source_id: id.to_string(),
                    reason: e.to_string(),
                }),
            );
        }
    };
    if found.is_empty() {
        return (
            Vec::new(),
            Some(Diagnostic::NoSymbol {
                source_id: id.to_string(),
            }),
        );
    }

    let many = found.len() > 1;
    let payloads = found
        .iter()
        .enumerate()
        .map(|(k, raw)| ScannedPayload {
            source_id: if many {
                format!("{id}#{}", k + 1)
            } else {
                id.to_string()
            },
            text: decode_text(raw),
        })
        .collect();
    (payloads, None)
}

/// Scan every image under `dir` in parallel; results keep sorted-file order.
pub fn scan_dir(scanner: &dyn SymbolScanner, dir: &Path) -> Result<ScanOutcome> {
    let images = list_images(dir)?;
    debug!("scan: {} images in {}", images.len(), dir.display());

    let per_image: Vec<(Vec<ScannedPayload>, Option<Diagnostic>)> = images
        .par_iter()
        .map(|p| {
            let id = source_id(p, dir);
            match std::fs::read(p) {
                Ok(bytes) => scan_image(scanner, &id, &bytes),
                Err(e) => (
                    Vec::new(),
                    Some(Diagnostic::UnreadableImage {
                        source_id: id,
                        reason: e.to_string(),
                    }),
                ),
            }
        })
        .collect();

    let mut out = ScanOutcome {
        images: images.len() as u64,
        ..Default::default()
    };
    for (payloads, diag) in per_image {
        out.payloads.extend(payloads);
        if let Some(d) = diag {
            warn!("{d}");
            out.diagnostics.push(d);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QrxError;

    /// Treats the file contents as newline-separated symbol texts.
    struct LineScanner;

    impl SymbolScanner for LineScanner {
        fn scan(&self, image: &[u8]) -> Result<Vec<Vec<u8>>> {
            if image.starts_with(b"BAD") {
                return Err(QrxError::Format("corrupt".into()));
            }
            Ok(image
                .split(|&b| b == b'\n')
                .filter(|l| !l.is_empty())
                .map(|l| l.to_vec())
                .collect())
        }
    }

    #[test]
    fn latin1_fallback_for_invalid_utf8() {
        assert_eq!(decode_text("héllo".as_bytes()), "héllo");
        assert_eq!(decode_text(&[0x61, 0xE9, 0x62]), "aéb");
    }

    #[test]
    fn scan_dir_orders_and_tags_sources() {
        let dir = tempfile::tempdir().unwrap();
        let r = dir.path();
        std::fs::write(r.join("b.png"), b"p|2|2|Qg==").unwrap();
        std::fs::write(r.join("a.PNG"), b"p|1|2|QQ==\nq|1|1|").unwrap();
        std::fs::write(r.join("c.jpg"), b"").unwrap();
        std::fs::write(r.join("d.png"), b"BAD").unwrap();
        std::fs::write(r.join("manifest.json"), b"{}").unwrap();

        let out = scan_dir(&LineScanner, r).unwrap();
        assert_eq!(out.images, 4);
        let ids: Vec<_> = out.payloads.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a.PNG#1", "a.PNG#2", "b.png"]);
        let kinds: Vec<_> = out.diagnostics.iter().map(|d| d.kind()).collect();
        assert_eq!(kinds, vec!["no-symbol", "unreadable-image"]);
    }
}
