//! Atomic write primitives
//!
//! Uses temp→rename so readers never observe a partial document

use crate::errors::{io_error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

fn temp_path_for(target_path: &Path) -> PathBuf {
    let mut name = target_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".tmp");
    target_path.with_file_name(name)
}

/// Atomically write bytes to a file
///
/// Creates missing parent directories. The temp file lives next to the
/// target so the rename never crosses filesystems.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_var_dir", e))?;
    }

    let temp_path = temp_path_for(target_path);
    fs::write(&temp_path, content).map_err(|e| io_error("write_store_temp", e))?;

    if let Err(e) = fs::rename(&temp_path, target_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("rename_store_temp", e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("x:m.json");

        atomic_write(&target, b"{}").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"{}");
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("var").join("x:m.json");

        atomic_write(&target, b"nested").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"nested");
    }

    #[test]
    fn test_last_write_wins_and_no_tmp_left() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("x:m.json");

        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"second");
        let tmp_count = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|s| s.ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(tmp_count, 0);
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        assert_eq!(
            temp_path_for(Path::new("var/x:m.json")),
            PathBuf::from("var/x:m.json.tmp")
        );
    }
}
