//! Atomic file writes for project entity files.
//!
//! Entity files are rewritten by `export` and by the ID write-back step of
//! `deploy`. An interrupted run leaves either the old or the new file, never
//! a half-written one.

use std::path::{Path, PathBuf};

/// Write `data` to `path` by writing a temporary sibling file and then
/// renaming it over the destination.
///
/// The temp file lives in the same directory as `path` so the rename stays on
/// one filesystem.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory of `path` does not exist.
/// - The temp file cannot be created or written.
/// - The rename operation fails.
pub fn atomic_write_sync(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_sibling(path);

    std::fs::write(&temp_path, data)?;

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}

/// Generate a unique temporary file path next to `path`.
fn temp_sibling(path: &Path) -> PathBuf {
    let random_suffix = fastrand::u64(..);
    let file_name = path
        .file_name()
        .map_or_else(|| "entities".to_string(), |n| n.to_string_lossy().to_string());

    path.with_file_name(format!(".{file_name}.{random_suffix:016x}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pipelines.json");

        atomic_write_sync(&path, b"[]").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seeds.json");

        atomic_write_sync(&path, b"[]").unwrap();
        atomic_write_sync(&path, b"[{}]").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{}]");
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Ingestion").join("seeds.json");

        assert!(atomic_write_sync(&path, b"[]").is_err());
    }

    #[test]
    fn test_temp_sibling_is_hidden_and_unique() {
        let path = Path::new("/tmp/project/Ingestion/seeds.json");
        let t1 = temp_sibling(path);
        let t2 = temp_sibling(path);
        assert_eq!(t1.parent(), path.parent());
        let name = t1.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".seeds.json."));
        assert!(name.ends_with(".tmp"));
        assert_ne!(t1, t2);
    }
}
