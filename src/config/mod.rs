#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// Filesystem storage rooted at `base_path`; absolute paths bypass the root.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Storage rooted at the current working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(self.resolve(dir)).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // 跟隨符號連結，和 ingest::list_fit_files 一致；斷掉的連結略過
            let is_file = matches!(tokio::fs::metadata(entry.path()).await, Ok(meta) if meta.is_file());
            if is_file {
                let path = Path::new(dir).join(entry.file_name());
                files.push(path.to_string_lossy().into_owned());
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_round_trip_and_listing() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());

        storage.write_file("raw/b.fit", b"b").await.unwrap();
        storage.write_file("raw/a.fit", b"a").await.unwrap();
        storage.write_file("raw/sub/c.fit", b"c").await.unwrap();

        let files = storage.list_files("raw").await.unwrap();
        assert_eq!(files, vec!["raw/a.fit", "raw/b.fit"]);
        assert_eq!(storage.read_file("raw/b.fit").await.unwrap(), b"b");
        assert!(storage.read_file("raw/missing.fit").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_listing_follows_symlinks_like_ingest() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        storage.write_file("archive/2024-05-01.fit", b"run").await.unwrap();
        storage.write_file("raw/local.fit", b"run").await.unwrap();

        let raw = temp_dir.path().join("raw");
        symlink(temp_dir.path().join("archive/2024-05-01.fit"), raw.join("linked.fit")).unwrap();
        symlink(temp_dir.path().join("archive/gone.fit"), raw.join("dangling.fit")).unwrap();
        symlink(temp_dir.path().join("archive"), raw.join("archive_dir")).unwrap();

        let files = storage.list_files("raw").await.unwrap();
        assert_eq!(files, vec!["raw/linked.fit", "raw/local.fit"]);

        let ingested: Vec<String> = crate::core::ingest::list_fit_files(&raw)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(ingested, vec!["linked.fit", "local.fit"]);
    }
}
