use crate::domain::ports::DocumentStore;
use crate::utils::error::{ProgressError, Result};
use std::path::{Component, Path, PathBuf};

/// Agreement documents kept as files under one directory.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    base_path: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, file: &str) -> Result<PathBuf> {
        let relative = Path::new(file);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if file.is_empty() || escapes {
            return Err(ProgressError::DocumentNotFound {
                key: file.to_string(),
            });
        }
        Ok(self.base_path.join(relative))
    }
}

impl DocumentStore for LocalDocumentStore {
    async fn load(&self, file: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(file)?;
        match tokio::fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProgressError::DocumentNotFound {
                    key: file.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_existing_document() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.json"), b"{}").unwrap();

        let store = LocalDocumentStore::new(dir.path());
        assert_eq!(store.load("a.json").await.unwrap(), b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        let err = store.load("missing.json").await.unwrap_err();
        assert!(matches!(err, ProgressError::DocumentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_root() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        assert!(store.load("../etc/passwd").await.is_err());
        assert!(store.load("/etc/passwd").await.is_err());
    }
}
