/// Raster derivations: thumbnail generation and size-bounded re-encoding.
///
/// Both derivations decode from memory, clamp dimensions with the same
/// fit-within rule, and re-encode as JPEG at a fixed lossy quality. They are
/// best-effort: every error here is translated into a graceful fallback by
/// the caller, never surfaced to the user.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

/// Fixed quality for all lossy re-encodes (thumbnails and uploads alike).
pub const JPEG_QUALITY: u8 = 85;

/// Why a derivation produced nothing. `NotRaster` and `Animated` are
/// deliberate skips, the codec variant is an actual decode/encode failure;
/// the caller treats all three the same way.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("not a raster image")]
    NotRaster,
    #[error("animation would be lost by re-encoding")]
    Animated,
    #[error(transparent)]
    Codec(#[from] image::ImageError),
}

/// A locally-derived preview image, held until the server confirms the
/// upload it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    /// Base64 JPEG data URL, the form the host pushes to the server.
    pub data_url: String,
}

/// Clamp `(width, height)` so neither side exceeds `max_dim`, preserving
/// aspect ratio. Only shrinks: if the longer side already fits, the input
/// dimensions come back unchanged. The shorter side rounds to nearest, so
/// the result is reproducible for a given input.
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width.max(height) <= max_dim {
        return (width, height);
    }
    if width > height {
        let scaled = (height as f64 * max_dim as f64 / width as f64).round() as u32;
        (max_dim, scaled)
    } else {
        let scaled = (width as f64 * max_dim as f64 / height as f64).round() as u32;
        (scaled, max_dim)
    }
}

/// Derive a thumbnail bounded by `max_dim`, encoded as a JPEG data URL.
///
/// Skips (with an error the caller maps to "no thumbnail"):
/// - anything whose declared type is not `image/*`
/// - GIFs, declared or sniffed, since they may be animated and a thumbnail
///   re-encode would flatten them
pub fn derive_thumbnail(
    content_type: &str,
    bytes: &[u8],
    max_dim: u32,
) -> Result<Thumbnail, RasterError> {
    let img = decode(content_type, bytes)?;
    let jpeg = encode_jpeg(&clamp(img, max_dim))?;
    Ok(Thumbnail {
        data_url: format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)),
    })
}

/// Re-encode a file for upload: clamp to `max_dim` and compress as JPEG.
/// Returns the new bytes; whether they actually replace the original is the
/// caller's decision (they only do when strictly smaller).
pub fn reencode_for_upload(
    content_type: &str,
    bytes: &[u8],
    max_dim: u32,
) -> Result<Vec<u8>, RasterError> {
    let img = decode(content_type, bytes)?;
    encode_jpeg(&clamp(img, max_dim))
}

fn decode(content_type: &str, bytes: &[u8]) -> Result<DynamicImage, RasterError> {
    if !content_type.starts_with("image/") {
        return Err(RasterError::NotRaster);
    }
    if content_type == "image/gif" {
        return Err(RasterError::Animated);
    }
    let format = image::guess_format(bytes)?;
    if format == ImageFormat::Gif {
        // mislabeled upload; trust the bytes
        return Err(RasterError::Animated);
    }
    Ok(image::load_from_memory_with_format(bytes, format)?)
}

fn clamp(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    let (target_w, target_h) = fit_within(width, height, max_dim);
    if (target_w, target_h) == (width, height) {
        img
    } else {
        img.resize_exact(target_w, target_h, FilterType::Lanczos3)
    }
}

fn encode_jpeg(img: &DynamicImage) -> Result<Vec<u8>, RasterError> {
    // JPEG has no alpha channel; flatten before encoding
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode_image(&rgb)?;
    Ok(out)
}

/// Encode a flat-colored test image in the given format.
#[cfg(test)]
pub(crate) fn sample_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    use std::io::Cursor;

    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("test image encodes");
    bytes
}
