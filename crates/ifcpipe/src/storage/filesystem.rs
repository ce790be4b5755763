use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Directory-rooted file store. Writes go to a temporary sibling first and
/// are renamed into place, so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_for(filename).is_file()
    }

    /// Writes `content` to `filename`, replacing any previous version.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        self.ensure_root()?;

        let path = self.path_for(filename);
        let tmp_path = self.root.join(format!(".{}.tmp", filename));

        let write_err = |p: &Path, e| StorageError::WriteFile {
            path: p.to_path_buf(),
            source: e,
        };

        let result = std::fs::File::create(&tmp_path)
            .and_then(|mut file| {
                file.write_all(content)?;
                file.sync_all()
            })
            .map_err(|e| write_err(&tmp_path, e))
            .and_then(|_| std::fs::rename(&tmp_path, &path).map_err(|e| write_err(&path, e)));

        if result.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        result.map(|_| path)
    }

    pub fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(filename);
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }

    /// Removes `filename` if present. Missing files are not an error.
    pub fn remove(&self, filename: &str) -> Result<(), StorageError> {
        let path = self.path_for(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFile { path, source: e }),
        }
    }

    fn ensure_root(&self) -> Result<(), StorageError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| StorageError::CreateDirectory {
                path: self.root.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        let path = storage.write("a.json", b"[1,2]").unwrap();
        assert_eq!(path, temp_dir.path().join("a.json"));
        assert_eq!(storage.read("a.json").unwrap(), b"[1,2]");
        assert!(storage.exists("a.json"));
    }

    #[test]
    fn test_write_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.write("a.csv", b"first").unwrap();
        storage.write("a.csv", b"second").unwrap();
        assert_eq!(storage.read("a.csv").unwrap(), b"second");
        assert!(!temp_dir.path().join(".a.csv.tmp").exists());
    }

    #[test]
    fn test_creates_root_on_write() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("nested/dir"));
        storage.write("x", b"1").unwrap();
        assert!(storage.exists("x"));
    }

    #[test]
    fn test_read_missing_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        assert!(matches!(
            storage.read("missing"),
            Err(StorageError::ReadFile { .. })
        ));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());
        storage.remove("missing").unwrap();
    }
}
