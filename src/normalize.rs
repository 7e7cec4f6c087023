//! Crop-to-fill every thumbnail to one fixed size and format.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

use crate::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use crate::error::ThumbnailError;

/// Resize and center-crop `bytes` to exactly 640x360 and re-encode as PNG.
///
/// The image always covers the whole frame; nothing is letterboxed.
///
/// # Errors
///
/// Returns [`ThumbnailError::ImageDecode`] if `bytes` are not a decodable
/// raster image.
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
    let img = image::load_from_memory(bytes).map_err(ThumbnailError::ImageDecode)?;
    encode_png(&fill_frame(&img))
}

fn fill_frame(img: &DynamicImage) -> DynamicImage {
    if img.width() == THUMBNAIL_WIDTH && img.height() == THUMBNAIL_HEIGHT {
        return DynamicImage::ImageRgba8(img.to_rgba8());
    }
    let filled = img.resize_to_fill(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, FilterType::Triangle);
    DynamicImage::ImageRgba8(filled.to_rgba8())
}

pub(crate) fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ThumbnailError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(ThumbnailError::ImageEncode)?;
    Ok(buffer)
}
