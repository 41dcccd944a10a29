//! Image loading and input validation
//!
//! This module provides a single entry point for decoding note photographs
//! from disk, plus the input check every pipeline stage runs before touching
//! pixel data.
//!
//! ## Design
//!
//! Decoding goes through the `image` crate. All images are converted to an
//! OpenCV Mat in BGR order so the hue bands used by the security-thread
//! detector always see the same channel layout, whatever the source format.

use crate::error::{Result, VerificationError};
use opencv::core::{Mat, Scalar, CV_8U, CV_8UC3};
use opencv::prelude::*;
use std::path::Path;

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    /// First frame only
    Gif,
    WebP,
    Tiff,
    Bmp,
    Tga,
    /// PBM, PGM, PPM
    Pnm,
    Qoi,
}

impl ImageFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<ImageFormat> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::WebP),
            "tiff" | "tif" => Some(ImageFormat::Tiff),
            "bmp" => Some(ImageFormat::Bmp),
            "tga" => Some(ImageFormat::Tga),
            "pbm" | "pgm" | "ppm" | "pnm" => Some(ImageFormat::Pnm),
            "qoi" => Some(ImageFormat::Qoi),
            _ => None,
        }
    }

    /// Decoder the `image` crate should use for this format
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::WebP => image::ImageFormat::WebP,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Tga => image::ImageFormat::Tga,
            ImageFormat::Pnm => image::ImageFormat::Pnm,
            ImageFormat::Qoi => image::ImageFormat::Qoi,
        }
    }
}

/// Load an image from disk and convert to OpenCV Mat (BGR format)
///
/// # Errors
///
/// Returns `VerificationError::UnsupportedFormat` for unknown extensions and
/// `VerificationError::ImageLoadError` if the file cannot be opened or decoded.
/// The decoder is chosen from the extension, not sniffed from the content.
///
/// # Example
///
/// ```rust,no_run
/// use banknote_verify::image_loader::load_image;
/// use opencv::prelude::*;
/// use std::path::Path;
///
/// let mat = load_image(Path::new("note.jpg"))?;
/// println!("Loaded image: {}x{}", mat.cols(), mat.rows());
/// # Ok::<(), banknote_verify::VerificationError>(())
/// ```
pub fn load_image(path: &Path) -> Result<Mat> {
    let format = detect_format(path)?;

    let mut reader = image::ImageReader::open(path).map_err(|e| {
        VerificationError::image_load(format!("Failed to open image file: {}", path.display()), e)
    })?;
    reader.set_format(format.to_image_format());

    let img = reader.decode().map_err(|e| {
        VerificationError::image_load(format!("Failed to decode image: {}", path.display()), e)
    })?;

    mat_from_dynamic_image(&img)
}

/// Resolve the decoder for a path, rejecting unknown extensions
///
/// The error lists every accepted extension.
pub fn detect_format(path: &Path) -> Result<ImageFormat> {
    ImageFormat::from_extension(path).ok_or_else(|| VerificationError::UnsupportedFormat {
        path: path.display().to_string(),
        supported: supported_extensions().join(", "),
    })
}

/// Convert a decoded image of any pixel layout to a BGR Mat
pub fn mat_from_dynamic_image(img: &image::DynamicImage) -> Result<Mat> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();
    mat_from_rgb(rgb_img.as_raw(), width as i32, height as i32)
}

/// Convert an interleaved RGB byte buffer to an OpenCV BGR Mat
pub fn mat_from_rgb(rgb_data: &[u8], width: i32, height: i32) -> Result<Mat> {
    if width <= 0 || height <= 0 {
        return Err(VerificationError::invalid_image(format!(
            "image dimensions must be positive, got {}x{}",
            width, height
        )));
    }
    let expected = width as usize * height as usize * 3;
    if rgb_data.len() != expected {
        return Err(VerificationError::invalid_image(format!(
            "RGB buffer holds {} bytes, expected {} for {}x{}",
            rgb_data.len(),
            expected,
            width,
            height
        )));
    }

    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))
        .map_err(|e| VerificationError::opencv("BGR buffer allocation", e))?;

    let bgr = mat
        .data_bytes_mut()
        .map_err(|e| VerificationError::opencv("BGR buffer access", e))?;
    for (dst, src) in bgr.chunks_exact_mut(3).zip(rgb_data.chunks_exact(3)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }

    Ok(mat)
}

/// Write a single-channel 8-bit Mat (mask, edge or contrast map) to disk
///
/// The output format follows the file extension.
pub fn save_gray_image(mat: &Mat, path: &Path) -> Result<()> {
    if mat.channels() != 1 || mat.depth() != CV_8U {
        return Err(VerificationError::invalid_image(format!(
            "expected an 8-bit single-channel buffer, found {} channels at depth {}",
            mat.channels(),
            mat.depth()
        )));
    }

    let bytes = mat
        .data_bytes()
        .map_err(|e| VerificationError::opencv("buffer access", e))?;
    let gray = image::GrayImage::from_raw(mat.cols() as u32, mat.rows() as u32, bytes.to_vec())
        .ok_or_else(|| VerificationError::ProcessingError {
            message: format!("buffer size does not match {}x{}", mat.cols(), mat.rows()),
        })?;

    gray.save(path).map_err(|e| VerificationError::ProcessingError {
        message: format!("cannot write {}: {}", path.display(), e),
    })
}

/// Check that a raster is a non-empty 8-bit, 3-channel image of usable size
///
/// The aggregator calls this before any detector runs, so a malformed input
/// fails with `InvalidImageFormat` and never yields a partial result.
pub fn validate_note_image(image: &Mat, min_dimension: i32) -> Result<()> {
    ensure_bgr8(image)?;
    if image.rows() < min_dimension || image.cols() < min_dimension {
        return Err(VerificationError::invalid_image(format!(
            "image is {}x{}, minimum is {}x{}",
            image.cols(),
            image.rows(),
            min_dimension,
            min_dimension
        )));
    }
    Ok(())
}

/// Check the pixel layout only: non-empty, 8-bit, 3 channels
///
/// Individual stages run this so they fail cleanly when called directly.
pub fn ensure_bgr8(image: &Mat) -> Result<()> {
    if image.empty() {
        return Err(VerificationError::invalid_image("image contains no pixels"));
    }
    if image.depth() != CV_8U {
        return Err(VerificationError::invalid_image(format!(
            "expected 8-bit samples, found OpenCV depth {}",
            image.depth()
        )));
    }
    if image.channels() != 3 {
        return Err(VerificationError::invalid_image(format!(
            "expected 3 color channels (BGR), found {}",
            image.channels()
        )));
    }
    Ok(())
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &[
        "jpg", "jpeg", "png", "gif", "webp", "tiff", "tif", "bmp", "tga", "pbm", "pgm", "ppm",
        "pnm", "qoi",
    ]
}
