use std::path::{Path, PathBuf};

use crate::modules::media::model::DirectoryPair;

/// On-disk root of everything served under `/public`.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a `/`-separated relative path onto the disk.
    pub fn absolute(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Creates every originals/thumbnails directory. Safe to call repeatedly.
    pub async fn ensure(&self, pairs: &[&DirectoryPair]) -> std::io::Result<()> {
        for pair in pairs {
            for dir in [&pair.originals, &pair.thumbnails] {
                let path = self.absolute(dir);
                tokio::fs::create_dir_all(&path).await?;
                log::debug!("Upload directory ready: {}", path.display());
            }
        }
        Ok(())
    }
}
