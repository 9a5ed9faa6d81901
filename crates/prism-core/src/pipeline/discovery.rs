//! Image file enumeration for the search folder.
//!
//! Listing is non-recursive and keeps whatever order the directory
//! yields — the ranking stage re-orders by score, and its sort is
//! stable over this enumeration order.

use std::path::{Path, PathBuf};

use crate::config::ProcessingConfig;
use crate::error::SearchError;

/// Enumerates image files in a single directory.
pub struct ImageEnumerator {
    config: ProcessingConfig,
}

impl ImageEnumerator {
    /// Create a new enumerator.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List the image files directly inside `dir`.
    ///
    /// Fails with [`SearchError::DirectoryNotFound`] when the path does
    /// not exist; other filesystem errors propagate unmodified.
    /// Subdirectories and non-image files are ignored.
    pub fn enumerate(&self, dir: &Path) -> Result<Vec<PathBuf>, SearchError> {
        if !dir.exists() {
            return Err(SearchError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && self.is_supported(&path) {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Check if a file has a supported extension (case-insensitive).
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .supported_formats
                    .iter()
                    .any(|fmt| fmt.to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enumerator() -> ImageEnumerator {
        ImageEnumerator::new(ProcessingConfig::default())
    }

    #[test]
    fn test_is_supported() {
        let e = enumerator();
        assert!(e.is_supported(Path::new("test.jpg")));
        assert!(e.is_supported(Path::new("test.JPG")));
        assert!(e.is_supported(Path::new("test.jpeg")));
        assert!(e.is_supported(Path::new("test.png")));
        assert!(e.is_supported(Path::new("test.bmp")));
        assert!(e.is_supported(Path::new("test.webp")));
        assert!(e.is_supported(Path::new("test.gif")));
        assert!(!e.is_supported(Path::new("test.txt")));
        assert!(!e.is_supported(Path::new("test.pdf")));
        assert!(!e.is_supported(Path::new("no_extension")));
    }

    #[test]
    fn test_enumerate_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("b.PNG"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let files = enumerator().enumerate(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_enumerate_is_not_recursive() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("top.jpg"), b"x").unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("deep.jpg"), b"x").unwrap();

        let files = enumerator().enumerate(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("top.jpg"));
    }

    #[test]
    fn test_enumerate_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = enumerator().enumerate(dir.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_enumerate_missing_dir_is_directory_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does_not_exist");
        let err = enumerator().enumerate(&missing).unwrap_err();
        assert!(matches!(err, SearchError::DirectoryNotFound { .. }));
    }
}
