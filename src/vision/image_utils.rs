// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image discovery and loading for the splitter

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::SplitError;

/// Maximum image size accepted from disk (64MB)
const MAX_IMAGE_SIZE: usize = 64 * 1024 * 1024;

/// File extensions picked up when scanning an input folder
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "gif", "png", "pgm"];

/// Custom error types for image decoding
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Check whether a path carries one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Recursively list the images below `dir`, sorted by path
///
/// # Errors
/// Returns `SplitError::Config` when `dir` is not a directory.
pub fn list_images<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, SplitError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SplitError::Config(format!(
            "input folder is not a directory: {}",
            dir.display()
        )));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported_image(path))
        .collect();
    images.sort();

    debug!("Found {} images under {}", images.len(), dir.display());
    Ok(images)
}

/// Read and decode an image file into RGB
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<(RgbImage, ImageInfo), SplitError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| SplitError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;

    decode_image_bytes(&bytes).map_err(|source| SplitError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode raw image bytes into an RGB buffer
///
/// # Returns
/// * `Ok((RgbImage, ImageInfo))` - The decoded image and metadata
/// * `Err(ImageError)` - If decoding fails
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(RgbImage, ImageInfo), ImageError> {
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img.to_rgb8(), info))
}

/// Detect image format from magic bytes
///
/// # Returns
/// * `Ok(ImageFormat)` - Detected format
/// * `Err(ImageError::UnsupportedFormat)` - If format cannot be detected
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // PGM/PPM/PBM: P1..P6
        [b'P', x, ..] if (b'1'..=b'6').contains(x) => Ok(ImageFormat::Pnm),

        _ => Err(ImageError::UnsupportedFormat),
    }
}
