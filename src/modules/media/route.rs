use actix_files::Files;

use crate::modules::media::{layout::StorageLayout, path::PUBLIC_MOUNT};

/// Uploaded originals and thumbnails, served straight from the public root.
pub fn public_files(layout: &StorageLayout) -> Files {
    Files::new(PUBLIC_MOUNT, layout.root()).use_etag(true).use_last_modified(true)
}
