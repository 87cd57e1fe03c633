//! Defenses for DCC offers.
//!
//! Bots control every field of an offer, so the filename and address are
//! treated as hostile: filenames are reduced to a bare sanitized name, the
//! destination path is confined to the output directory, and offers pointing
//! at private/loopback addresses can be refused.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

const MAX_FILENAME_LEN: usize = 255;

/// Whether an offer address is private, loopback, link-local, or otherwise
/// not a plausible public bot address.
pub fn is_private_addr(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

/// Reduce an offered filename to a safe bare name.
///
/// Strips directory components (both `/` and `\`), control characters, and
/// leading dots, and caps the length. Returns `None` when nothing usable
/// remains.
pub fn sanitize_filename(offered: &str) -> Option<String> {
    // Last path component, treating backslash as a separator too since the
    // offering side may be a Windows bot.
    let base = offered.rsplit(['/', '\\']).next().unwrap_or(offered);
    let base = Path::new(base)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(base);

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | ':'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return None;
    }
    let capped = if cleaned.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        &cleaned[..end]
    } else {
        cleaned
    };
    Some(capped.to_string())
}

/// Resolve the destination path for an offered filename inside `out_dir`.
///
/// The resolved path is guaranteed to stay within the output directory, and
/// existing files are never overwritten: a `_1`, `_2`, ... suffix is added
/// instead. Returns `None` when the filename cannot be made safe.
pub fn resolve_download_path(out_dir: &Path, offered: &str) -> Option<PathBuf> {
    let name = sanitize_filename(offered)?;

    // Compare against the canonical directory when it exists; a fresh output
    // directory has nothing to escape into yet.
    let canonical = out_dir
        .canonicalize()
        .unwrap_or_else(|_| out_dir.to_path_buf());
    if !canonical.join(&name).starts_with(&canonical) {
        return None;
    }

    let candidate = out_dir.join(&name);
    if !candidate.exists() {
        return Some(candidate);
    }

    let stem = Path::new(&name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("download");
    let ext = Path::new(&name).extension().and_then(|s| s.to_str());
    for n in 1..1000u32 {
        let alternative = match ext {
            Some(ext) => format!("{}_{}.{}", stem, n, ext),
            None => format!("{}_{}", stem, n),
        };
        let path = out_dir.join(alternative);
        if !path.exists() {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_traversal_and_control_chars() {
        assert_eq!(sanitize_filename("plain.iso"), Some("plain.iso".into()));
        assert_eq!(
            sanitize_filename("../../etc/passwd"),
            Some("passwd".into())
        );
        assert_eq!(
            sanitize_filename("..\\..\\win\\cmd.exe"),
            Some("cmd.exe".into())
        );
        assert_eq!(sanitize_filename(".bashrc"), Some("bashrc".into()));
        assert_eq!(sanitize_filename("a\x07b.txt"), Some("ab.txt".into()));
        assert_eq!(sanitize_filename("..."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(400);
        assert_eq!(sanitize_filename(&long).unwrap().len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn private_addresses_are_detected() {
        for private in ["127.0.0.1", "10.1.2.3", "192.168.1.1", "0.0.0.0", "::1"] {
            assert!(is_private_addr(&private.parse().unwrap()), "{private}");
        }
        for public in ["8.8.8.8", "203.0.113.9", "2001:4860:4860::8888"] {
            assert!(!is_private_addr(&public.parse().unwrap()), "{public}");
        }
    }

    #[test]
    fn download_path_stays_in_dir_and_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();

        let first = resolve_download_path(dir.path(), "file.bin").unwrap();
        assert_eq!(first, dir.path().join("file.bin"));

        std::fs::write(&first, b"taken").unwrap();
        let second = resolve_download_path(dir.path(), "file.bin").unwrap();
        assert_eq!(second, dir.path().join("file_1.bin"));

        let escaped = resolve_download_path(dir.path(), "../../escape.bin").unwrap();
        assert!(escaped.starts_with(dir.path()));
    }
}
