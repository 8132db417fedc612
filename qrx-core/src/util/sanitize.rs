use crate::error::{QrxError, Result};
use std::path::{Component, Path, PathBuf};

/// Filesystem-safe transliteration: anything but ASCII alphanumerics, `.` and `_` becomes `_`.
pub fn sanitize(path: &str) -> String {
    path.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Decimal digit count of `n` (at least 1).
pub fn digits(n: u32) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// `<sanitized>-chunk-<index padded to digits(total)>-of-<total>.<ext>`
pub fn artifact_name(path: &str, index: u32, total: u32, ext: &str) -> String {
    format!(
        "{}-chunk-{:0width$}-of-{}.{}",
        sanitize(path),
        index,
        total,
        ext,
        width = digits(total)
    )
}

/// Join a logical relative path under `root`, refusing anything that could escape it.
pub fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    if rel.is_empty() {
        return Err(QrxError::UnsafePath(rel.to_string()));
    }
    let mut out = root.to_path_buf();
    for part in rel.split(['/', '\\']) {
        if part.is_empty() || part == "." {
            continue;
        }
        let p = Path::new(part);
        match p.components().next() {
            Some(Component::Normal(_)) if p.components().count() == 1 => out.push(part),
            _ => return Err(QrxError::UnsafePath(rel.to_string())),
        }
    }
    if rel.starts_with('/') || rel.starts_with('\\') || out == root {
        return Err(QrxError::UnsafePath(rel.to_string()));
    }
    Ok(out)
}
