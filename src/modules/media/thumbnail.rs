use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ImageReader};
use std::io::Cursor;
use std::path::Path;

use crate::modules::media::{
    error::UploadError,
    model::{ThumbnailFit, ThumbnailSpec},
};

/// Thumbnails are always JPEG, whatever the original was.
pub fn thumbnail_name(original_name: &str, prefix: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original_name);
    format!("{prefix}{stem}.jpg")
}

/// Decodes `data`, resizes it per `spec` and re-encodes it as JPEG.
///
/// CPU-bound: call through `spawn_blocking`.
pub fn render(data: &[u8], spec: &ThumbnailSpec) -> Result<Vec<u8>, UploadError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| UploadError::Processing(e.to_string()))?
        .decode()?;

    let resized = match spec.fit {
        ThumbnailFit::Inside { width, height } => {
            if img.width() > width || img.height() > height {
                img.resize(width, height, FilterType::Lanczos3)
            } else {
                img
            }
        }
        ThumbnailFit::Cover { width, height } => {
            img.resize_to_fill(width, height, FilterType::Lanczos3)
        }
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let mut buffer = Vec::with_capacity((rgb.width() * rgb.height()) as usize);
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, spec.quality);
    encoder.encode_image(&rgb)?;

    Ok(buffer)
}
