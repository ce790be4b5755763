//! Helpers for keeping file system details out of log output and for turning
//! file ids into safe file name stems.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Short deterministic hash of a path, for correlating log lines without
/// exposing the path itself.
pub fn hash_path(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Maps a file id onto a stem usable in file names. ASCII alphanumerics and
/// `-` are kept and every other byte is percent-encoded, so distinct ids
/// always give distinct stems and the stem never contains `_`.
pub fn file_stem(file_id: &str) -> String {
    if file_id.is_empty() {
        return "%".to_string();
    }

    let mut stem = String::with_capacity(file_id.len());
    for byte in file_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_redact_path_returns_filename() {
        assert_eq!(
            redact_path(Path::new("/srv/uploads/tower_block.ifc")),
            "tower_block.ifc"
        );
    }

    #[test]
    fn test_redact_path_no_filename() {
        assert_eq!(redact_path(Path::new("/")), "<unknown>");
    }

    #[test]
    fn test_hash_path_deterministic() {
        let path = PathBuf::from("/srv/uploads/a.ifc");
        assert_eq!(hash_path(&path), hash_path(&path));
        assert_eq!(hash_path(&path).len(), 16);
        assert_ne!(hash_path(&path), hash_path(Path::new("/srv/uploads/b.ifc")));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(
            file_stem("6f1c2a9e-1b2c-4d5e-8f90-123456789abc"),
            "6f1c2a9e-1b2c-4d5e-8f90-123456789abc"
        );
        assert_eq!(file_stem("../etc/passwd"), "%2E%2E%2Fetc%2Fpasswd");
        assert_eq!(file_stem("a_b"), "a%5Fb");
        assert_eq!(file_stem(""), "%");
    }

    #[test]
    fn test_file_stem_distinct_ids_stay_distinct() {
        let ids = ["a-b", "a_b", "a.b", "a/b", "a%2Fb", "a b", ""];
        let stems: std::collections::HashSet<String> = ids.iter().map(|id| file_stem(id)).collect();
        assert_eq!(stems.len(), ids.len());
    }
}
