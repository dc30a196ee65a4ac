use crate::constants::{
    PROJECT_LOGO_FIELD, PROJECT_LOGO_MAX_SIZE, THUMBNAIL_QUALITY, USER_PHOTO_FIELD,
    USER_PHOTO_MAX_SIZE,
};

/// Relative directories (under the public root) holding one entity kind's images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryPair {
    pub originals: String,
    pub thumbnails: String,
}

impl DirectoryPair {
    pub fn for_entity(entity: &str) -> Self {
        Self {
            originals: format!("uploads/{entity}/originals"),
            thumbnails: format!("uploads/{entity}/thumbnails"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFit {
    /// Fit inside the box, keep the aspect ratio, never upscale.
    Inside { width: u32, height: u32 },
    /// Fill the exact box, cropping the overflow.
    Cover { width: u32, height: u32 },
}

#[derive(Debug, Clone)]
pub struct ThumbnailSpec {
    pub fit: ThumbnailFit,
    pub quality: u8,
    pub name_prefix: &'static str,
}

/// Everything that differs between the logo and the profile photo uploads.
#[derive(Debug, Clone)]
pub struct UploadProfile {
    pub field_name: &'static str,
    pub max_size: usize,
    pub allowed_types: &'static [&'static str],
    pub name_prefix: &'static str,
    pub thumbnail: ThumbnailSpec,
    pub directories: DirectoryPair,
}

impl UploadProfile {
    pub fn project_logo() -> Self {
        Self {
            field_name: PROJECT_LOGO_FIELD,
            max_size: PROJECT_LOGO_MAX_SIZE,
            allowed_types: &["jpeg", "jpg", "png", "gif"],
            name_prefix: "project-",
            thumbnail: ThumbnailSpec {
                fit: ThumbnailFit::Inside { width: 300, height: 300 },
                quality: THUMBNAIL_QUALITY,
                name_prefix: "thumb_",
            },
            directories: DirectoryPair::for_entity("projects"),
        }
    }

    pub fn user_photo() -> Self {
        Self {
            field_name: USER_PHOTO_FIELD,
            max_size: USER_PHOTO_MAX_SIZE,
            allowed_types: &["jpeg", "jpg", "png"],
            name_prefix: "user-",
            thumbnail: ThumbnailSpec {
                fit: ThumbnailFit::Cover { width: 200, height: 200 },
                quality: THUMBNAIL_QUALITY,
                name_prefix: "",
            },
            directories: DirectoryPair::for_entity("users"),
        }
    }

    pub fn allows(&self, kind: &str) -> bool {
        self.allowed_types.iter().any(|t| t.eq_ignore_ascii_case(kind))
    }

    pub fn allowed_list(&self) -> String {
        self.allowed_types.join(", ")
    }
}

/// A file field read out of a multipart body, not yet on disk.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_pair_for_entity() {
        let dirs = DirectoryPair::for_entity("projects");
        assert_eq!(dirs.originals, "uploads/projects/originals");
        assert_eq!(dirs.thumbnails, "uploads/projects/thumbnails");
    }

    #[test]
    fn test_profiles_allow_lists() {
        let logo = UploadProfile::project_logo();
        assert!(logo.allows("GIF"));
        assert_eq!(logo.max_size, 5 * 1024 * 1024);

        let photo = UploadProfile::user_photo();
        assert!(photo.allows("jpg"));
        assert!(!photo.allows("gif"));
        assert_eq!(photo.max_size, 3 * 1024 * 1024);
    }
}
