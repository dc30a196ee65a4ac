//! Best-effort removal of image pairs.
//!
//! Nothing here returns an error: a failed unlink is logged and the caller keeps
//! reporting whatever outcome it already had.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::modules::media::{
    layout::StorageLayout,
    model::DirectoryPair,
    path::{ImageSlot, StoredPath},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Missing,
    Failed,
    Skipped,
}

impl Removal {
    fn is_gone(self) -> bool {
        matches!(self, Removal::Removed | Removal::Missing | Removal::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRemoval {
    pub original: Removal,
    pub thumbnail: Removal,
}

impl PairRemoval {
    pub fn is_complete(&self) -> bool {
        self.original.is_gone() && self.thumbnail.is_gone()
    }
}

async fn remove_file(path: &Path) -> Removal {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed upload file");
            Removal::Removed
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Upload file already gone");
            Removal::Missing
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload file");
            Removal::Failed
        }
    }
}

async fn remove_optional(path: Option<PathBuf>) -> Removal {
    match path {
        Some(path) => remove_file(&path).await,
        None => Removal::Skipped,
    }
}

/// Deletes an original and its thumbnail together.
pub async fn remove_pair(original: Option<PathBuf>, thumbnail: Option<PathBuf>) -> PairRemoval {
    let outcome = PairRemoval {
        original: remove_optional(original.clone()).await,
        thumbnail: remove_optional(thumbnail.clone()).await,
    };

    if !outcome.is_complete() && (outcome.original.is_gone() || outcome.thumbnail.is_gone()) {
        tracing::error!(
            original = ?original,
            thumbnail = ?thumbnail,
            "Image pair only partially removed"
        );
    }

    outcome
}

fn stored_location(
    layout: &StorageLayout,
    dirs: &DirectoryPair,
    stored: Option<&str>,
    slot: ImageSlot,
) -> Option<PathBuf> {
    let stored = stored.filter(|s| !s.trim().is_empty())?;
    let path = StoredPath::classify(stored);
    if !path.is_contained() {
        tracing::warn!(stored = %stored, "Refusing to delete image outside the upload tree");
        return None;
    }
    Some(layout.absolute(&path.relative(dirs, slot)))
}

/// Deletes a pair previously referenced by a saved document, in either naming convention.
pub async fn retire_stored_pair(
    layout: &StorageLayout,
    dirs: &DirectoryPair,
    original: Option<&str>,
    thumbnail: Option<&str>,
) -> PairRemoval {
    let original = stored_location(layout, dirs, original, ImageSlot::Original);
    let thumbnail = stored_location(layout, dirs, thumbnail, ImageSlot::Thumbnail);
    remove_pair(original, thumbnail).await
}
