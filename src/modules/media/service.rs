use actix_multipart::Multipart;
use rand::Rng;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::api::error;
use crate::modules::media::{
    artifact::UploadArtifact,
    cleanup,
    error::UploadError,
    form::FormData,
    layout::StorageLayout,
    model::{IncomingFile, UploadProfile},
    path::{ImageUrls, PathResolver},
    thumbnail,
};

const NAME_ATTEMPTS: usize = 3;

/// Upload → validate → write original → derive thumbnail, for one upload profile.
#[derive(Clone)]
pub struct ImagePipeline {
    profile: Arc<UploadProfile>,
    layout: StorageLayout,
}

impl ImagePipeline {
    pub fn new(profile: UploadProfile, layout: StorageLayout) -> Self {
        Self { profile: Arc::new(profile), layout }
    }

    pub async fn read_form(&self, payload: Multipart) -> Result<FormData, error::SystemError> {
        Ok(FormData::read(payload, &self.profile).await?)
    }

    /// Checks size, extension and declared content type. Returns the lower-cased extension.
    fn validate_file(&self, file: &IncomingFile) -> Result<String, UploadError> {
        if file.bytes.len() > self.profile.max_size {
            return Err(UploadError::TooLarge { max: self.profile.max_size });
        }
        if file.bytes.is_empty() {
            return Err(UploadError::rejected("Uploaded file is empty"));
        }

        let not_allowed = || {
            UploadError::rejected(format!(
                "Only images are allowed ({})",
                self.profile.allowed_list()
            ))
        };

        let extension = Path::new(&file.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(not_allowed)?;
        if !self.profile.allows(&extension) {
            return Err(not_allowed());
        }

        let content_type = file.content_type.to_lowercase();
        let subtype = content_type.strip_prefix("image/").ok_or_else(not_allowed)?;
        if !self.profile.allows(subtype) {
            return Err(not_allowed());
        }

        Ok(extension)
    }

    /// `<prefix><millis>-<random>.<ext>`
    fn generate_filename(&self, extension: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!("{}{}-{}.{}", self.profile.name_prefix, millis, suffix, extension)
    }

    async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file =
            tokio::fs::OpenOptions::new().write(true).create_new(true).open(path).await?;
        if let Err(e) = file.write_all(bytes).await {
            drop(file);
            tokio::fs::remove_file(path).await.ok();
            return Err(e);
        }
        file.flush().await
    }

    /// Validates the file and writes it to the originals directory.
    pub async fn accept(&self, file: IncomingFile) -> Result<UploadArtifact, UploadError> {
        let extension = self.validate_file(&file)?;

        for _ in 0..NAME_ATTEMPTS {
            let relative =
                format!("{}/{}", self.profile.directories.originals, self.generate_filename(&extension));
            let path = self.layout.absolute(&relative);

            match Self::write_new(&path, &file.bytes).await {
                Ok(()) => {
                    tracing::info!(
                        original = %relative,
                        size = file.bytes.len(),
                        content_type = %file.content_type,
                        "Upload written"
                    );
                    return Ok(UploadArtifact::written(
                        self.layout.clone(),
                        relative,
                        file.content_type,
                        file.bytes.len(),
                    ));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %path.display(), "Upload name taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(UploadError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            "could not find a free upload filename",
        )))
    }

    /// Reads the written original back and writes its thumbnail next to it.
    pub async fn derive_thumbnail(&self, artifact: &mut UploadArtifact) -> Result<(), UploadError> {
        let data = tokio::fs::read(artifact.original_path()).await?;
        let spec = self.profile.thumbnail.clone();

        let rendered = tokio::task::spawn_blocking(move || thumbnail::render(&data, &spec))
            .await
            .map_err(|e| UploadError::Processing(e.to_string()))??;

        let original_name = Path::new(artifact.original())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let relative = format!(
            "{}/{}",
            self.profile.directories.thumbnails,
            thumbnail::thumbnail_name(&original_name, self.profile.thumbnail.name_prefix)
        );

        let path = self.layout.absolute(&relative);
        if let Err(e) = tokio::fs::write(&path, &rendered).await {
            tokio::fs::remove_file(&path).await.ok();
            return Err(e.into());
        }

        tracing::info!(thumbnail = %relative, bytes = rendered.len(), "Thumbnail written");
        artifact.derived(relative);
        Ok(())
    }

    /// Accept and derive. A failed derivation removes the original before the error
    /// is returned.
    pub async fn process(&self, file: IncomingFile) -> Result<UploadArtifact, error::SystemError> {
        let mut artifact = self.accept(file).await?;

        if let Err(e) = self.derive_thumbnail(&mut artifact).await {
            tracing::warn!(original = %artifact.original(), error = %e, "Thumbnail derivation failed");
            artifact.discard().await;
            let err = match e {
                UploadError::Processing(msg) => UploadError::Processing(msg),
                other => UploadError::Processing(other.to_string()),
            };
            return Err(err.into());
        }

        tracing::info!(
            original = %artifact.original(),
            content_type = %artifact.content_type(),
            size = artifact.size(),
            "Upload processed"
        );
        Ok(artifact)
    }

    pub async fn process_optional(
        &self,
        file: Option<IncomingFile>,
    ) -> Result<Option<UploadArtifact>, error::SystemError> {
        match file {
            Some(file) => Ok(Some(self.process(file).await?)),
            None => Ok(None),
        }
    }

    /// Deletes a pair a document no longer references. Call only after the document
    /// that dropped the reference has been saved.
    pub async fn retire(&self, original: Option<&str>, thumbnail: Option<&str>) {
        if original.is_none() && thumbnail.is_none() {
            return;
        }
        let outcome =
            cleanup::retire_stored_pair(&self.layout, &self.profile.directories, original, thumbnail)
                .await;
        tracing::info!(
            original = ?original,
            thumbnail = ?thumbnail,
            complete = outcome.is_complete(),
            "Retired replaced image"
        );
    }

    pub fn urls<'a>(&'a self, resolver: &'a PathResolver) -> ImageUrls<'a> {
        resolver.for_dirs(&self.profile.directories)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::modules::media::artifact::ArtifactState;
    use crate::modules::media::thumbnail::tests::encoded;
    use image::{GenericImageView, ImageFormat, RgbaImage};

    pub(crate) async fn pipeline(root: &Path, profile: UploadProfile) -> ImagePipeline {
        let layout = StorageLayout::new(root);
        layout.ensure(&[&profile.directories]).await.unwrap();
        ImagePipeline::new(profile, layout)
    }

    pub(crate) fn png_file(name: &str, width: u32, height: u32) -> IncomingFile {
        IncomingFile {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: encoded(width, height, ImageFormat::Png),
        }
    }

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    fn noisy_png(width: u32, height: u32) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        let img = RgbaImage::from_fn(width, height, |_, _| image::Rgba(rng.gen::<[u8; 4]>()));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[actix_web::test]
    async fn test_large_png_logo_gets_bounded_thumbnail() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline(tmp.path(), UploadProfile::project_logo()).await;
        let bytes = noisy_png(1100, 950);
        assert!(bytes.len() > 4_000_000 && bytes.len() <= 5 * 1024 * 1024);

        let file = IncomingFile {
            filename: "Company Logo.PNG".to_string(),
            content_type: "image/png".to_string(),
            bytes,
        };
        let artifact = pipeline.process(file).await.unwrap();

        assert_eq!(artifact.state(), ArtifactState::Derived);
        assert!(artifact.original().starts_with("uploads/projects/originals/project-"));
        assert!(artifact.original().ends_with(".png"));
        let thumb = artifact.thumbnail().unwrap().to_string();
        assert!(thumb.starts_with("uploads/projects/thumbnails/thumb_project-"));
        assert!(thumb.ends_with(".jpg"));

        let thumb_path = artifact.thumbnail_path().unwrap();
        let (w, h) = image::open(&thumb_path).unwrap().dimensions();
        assert!(w <= 300 && h <= 300);
        assert_eq!(w.max(h), 300);

        let stored = artifact.commit();
        assert!(tmp.path().join(&stored.original).exists());
        assert!(thumb_path.exists());
    }

    #[actix_web::test]
    async fn test_user_photo_thumbnail_is_square() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline(tmp.path(), UploadProfile::user_photo()).await;

        let artifact = pipeline.process(png_file("me.png", 500, 320)).await.unwrap();

        assert!(artifact.original().starts_with("uploads/users/originals/user-"));
        let thumb_path = artifact.thumbnail_path().unwrap();
        assert_eq!(image::open(&thumb_path).unwrap().dimensions(), (200, 200));
        artifact.commit();
    }

    #[actix_web::test]
    async fn test_oversized_logo_rejected_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline(tmp.path(), UploadProfile::project_logo()).await;
        let file = IncomingFile {
            filename: "big.jpeg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF; 6 * 1024 * 1024],
        };

        let err = pipeline.accept(file).await.unwrap_err();

        assert!(matches!(err, UploadError::TooLarge { .. }));
        assert_eq!(count_files(&tmp.path().join("uploads/projects/originals")), 0);
    }

    #[actix_web::test]
    async fn test_type_checked_on_extension_and_content_type() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline(tmp.path(), UploadProfile::user_photo()).await;

        let mut gif = png_file("anim.gif", 10, 10);
        gif.content_type = "image/gif".to_string();
        assert!(matches!(pipeline.accept(gif).await, Err(UploadError::Rejected(_))));

        let mut spoofed = png_file("photo.png", 10, 10);
        spoofed.content_type = "application/pdf".to_string();
        assert!(matches!(pipeline.accept(spoofed).await, Err(UploadError::Rejected(_))));

        let no_ext = png_file("photo", 10, 10);
        assert!(matches!(pipeline.accept(no_ext).await, Err(UploadError::Rejected(_))));

        assert_eq!(count_files(&tmp.path().join("uploads/users/originals")), 0);
    }

    #[actix_web::test]
    async fn test_undecodable_image_removes_original() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline(tmp.path(), UploadProfile::project_logo()).await;
        let file = IncomingFile {
            filename: "broken.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: b"not really a png".to_vec(),
        };

        let err = pipeline.process(file).await.unwrap_err();

        assert!(matches!(err, error::SystemError::Upload(UploadError::Processing(_))));
        assert_eq!(count_files(&tmp.path().join("uploads/projects/originals")), 0);
        assert_eq!(count_files(&tmp.path().join("uploads/projects/thumbnails")), 0);
    }

    #[actix_web::test]
    async fn test_filenames_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = pipeline(tmp.path(), UploadProfile::user_photo()).await;

        let a = pipeline.accept(png_file("a.png", 4, 4)).await.unwrap();
        let b = pipeline.accept(png_file("a.png", 4, 4)).await.unwrap();

        assert_ne!(a.original(), b.original());
        a.discard().await;
        b.discard().await;
        assert_eq!(count_files(&tmp.path().join("uploads/users/originals")), 0);
    }
}
