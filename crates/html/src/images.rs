//! Loading `<img>` sources for embedding.

use deck_core::{Error, ImageFormat, Result};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// An image ready to embed, with its pixel size.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    /// Width over height; 1.0 for degenerate images.
    pub fn aspect_ratio(&self) -> f64 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// Resolve an `src` attribute against the fragment's directory.
///
/// Remote and inline (`data:`) sources are not fetched.
pub fn resolve_src(base_dir: &Path, src: &str) -> Result<PathBuf> {
    let src = src.trim();
    if src.is_empty() {
        return Err(Error::ImageError("empty image source".to_string()));
    }
    if src.contains("://") || src.starts_with("data:") || src.starts_with("//") {
        return Err(Error::ImageError(format!("unsupported image source '{}'", src)));
    }
    let path = src.strip_prefix("file:").unwrap_or(src);
    Ok(base_dir.join(path))
}

/// Read an image file, re-encoding it to PNG when the format cannot be
/// embedded as-is.
pub fn load(path: &Path) -> Result<LoadedImage> {
    let data = std::fs::read(path)
        .map_err(|e| Error::ImageError(format!("cannot read {}: {}", path.display(), e)))?;
    decode(data)
        .map_err(|e| Error::ImageError(format!("{}: {}", path.display(), e)))
}

/// Identify `data` and make it embeddable.
pub fn decode(data: Vec<u8>) -> std::result::Result<LoadedImage, image::ImageError> {
    if let Some(format) = ImageFormat::from_magic(&data) {
        let (width, height) = image::ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .into_dimensions()?;
        return Ok(LoadedImage {
            data,
            format,
            width,
            height,
        });
    }

    let decoded = image::load_from_memory(&data)?;
    let mut png = Vec::new();
    decoded.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    log::debug!(
        "Re-encoded {}x{} image to PNG ({} -> {} bytes)",
        decoded.width(),
        decoded.height(),
        data.len(),
        png.len()
    );

    Ok(LoadedImage {
        data: png,
        format: ImageFormat::Png,
        width: decoded.width(),
        height: decoded.height(),
    })
}
