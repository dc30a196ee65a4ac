use std::path::PathBuf;

use crate::api::error;
use crate::modules::media::{cleanup, layout::StorageLayout};

/// Lifecycle of the files written for one request.
///
/// `Referenced` and `Deleted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactState {
    Written,
    Derived,
    Referenced,
    Deleted,
}

/// Paths a saved document points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub original: String,
    pub thumbnail: String,
}

/// Original (and thumbnail, once derived) written during the current request.
///
/// Must end in [`UploadArtifact::commit`] or [`UploadArtifact::discard`]. Dropping an
/// unsettled artifact removes its files synchronously.
#[derive(Debug)]
pub struct UploadArtifact {
    layout: StorageLayout,
    original: String,
    thumbnail: Option<String>,
    content_type: String,
    size: usize,
    state: ArtifactState,
}

impl UploadArtifact {
    pub(crate) fn written(
        layout: StorageLayout,
        original: String,
        content_type: String,
        size: usize,
    ) -> Self {
        Self { layout, original, thumbnail: None, content_type, size, state: ArtifactState::Written }
    }

    pub(crate) fn derived(&mut self, thumbnail: String) {
        self.thumbnail = Some(thumbnail);
        self.state = ArtifactState::Derived;
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    #[cfg(test)]
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[cfg(test)]
    pub fn state(&self) -> ArtifactState {
        self.state
    }

    pub fn original_path(&self) -> PathBuf {
        self.layout.absolute(&self.original)
    }

    pub fn thumbnail_path(&self) -> Option<PathBuf> {
        self.thumbnail.as_deref().map(|t| self.layout.absolute(t))
    }

    /// The relative paths to persist; the thumbnail falls back to the original
    /// only if derivation never ran.
    pub fn stored(&self) -> StoredImage {
        StoredImage {
            original: self.original.clone(),
            thumbnail: self.thumbnail.clone().unwrap_or_else(|| self.original.clone()),
        }
    }

    /// Marks the files as owned by a saved document.
    pub fn commit(mut self) -> StoredImage {
        let stored = self.stored();
        tracing::debug!(original = %self.original, "Upload referenced by saved document");
        self.state = ArtifactState::Referenced;
        stored
    }

    /// Removes both files; used when the request fails before a save.
    pub async fn discard(mut self) {
        let outcome = cleanup::remove_pair(Some(self.original_path()), self.thumbnail_path()).await;
        tracing::info!(
            original = %self.original,
            complete = outcome.is_complete(),
            "Discarded upload after failed request"
        );
        self.state = ArtifactState::Deleted;
    }

    /// Commits on success, discards on failure, and hands the outcome back unchanged.
    pub async fn settle<T>(
        artifact: Option<Self>,
        outcome: Result<T, error::SystemError>,
    ) -> Result<T, error::SystemError> {
        match (artifact, outcome) {
            (Some(artifact), Ok(value)) => {
                artifact.commit();
                Ok(value)
            }
            (Some(artifact), Err(e)) => {
                artifact.discard().await;
                Err(e)
            }
            (None, outcome) => outcome,
        }
    }
}

impl Drop for UploadArtifact {
    fn drop(&mut self) {
        if matches!(self.state, ArtifactState::Written | ArtifactState::Derived) {
            tracing::warn!(original = %self.original, "Upload dropped before settling, removing");
            let paths = std::iter::once(self.original_path()).chain(self.thumbnail_path());
            for path in paths {
                if let Err(e) = std::fs::remove_file(&path) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload file");
                    }
                }
            }
        }
    }
}
