use std::borrow::Cow;

/// Failures of the image upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// File failed the allow-list, has no usable name, or arrived in an unexpected field.
    #[error("{0}")]
    Rejected(Cow<'static, str>),

    #[error("File too large (max: {max} bytes)")]
    TooLarge { max: usize },

    /// Decode, resize or encode of the thumbnail failed.
    #[error("Image processing failed: {0}")]
    Processing(String),

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn rejected(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Rejected(msg.into())
    }
}

impl From<image::ImageError> for UploadError {
    fn from(err: image::ImageError) -> Self {
        Self::Processing(err.to_string())
    }
}
