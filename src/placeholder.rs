//! The "no thumbnail available" image, drawn locally.
//!
//! Needs no network, no browser and no font files, so it is the one stage
//! that is expected to always succeed.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::constants::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use crate::error::ThumbnailError;
use crate::normalize::encode_png;

pub const PLACEHOLDER_LABEL: &str = "no thumbnail available";

const BACKGROUND: Rgba<u8> = Rgba([240, 234, 226, 255]);
const INK: Rgba<u8> = Rgba([118, 106, 96, 255]);

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
const SCALE: u32 = 4;
const SPACING: u32 = SCALE;

/// 5x7 bitmaps, one byte per row, high bit on the left.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        'a' => [0b00000, 0b00000, 0b01110, 0b00001, 0b01111, 0b10001, 0b01111],
        'b' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b11110],
        'e' => [0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110],
        'h' => [0b10000, 0b10000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'i' => [0b00100, 0b00000, 0b01100, 0b00100, 0b00100, 0b00100, 0b01110],
        'l' => [0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'm' => [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
        'n' => [0b00000, 0b00000, 0b10110, 0b11001, 0b10001, 0b10001, 0b10001],
        'o' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        't' => [0b01000, 0b01000, 0b11100, 0b01000, 0b01000, 0b01001, 0b00110],
        'u' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b10011, 0b01101],
        'v' => [0b00000, 0b00000, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        ' ' => [0; 7],
        _ => return None,
    };
    Some(rows)
}

fn text_width(text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    chars * GLYPH_WIDTH * SCALE + (chars - 1) * SPACING
}

fn draw_text(canvas: &mut RgbaImage, text: &str, left: u32, top: u32) {
    let mut x0 = left;
    for c in text.chars() {
        if let Some(rows) = glyph(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let px = x0 + col * SCALE;
                    let py = top + row as u32 * SCALE;
                    for dy in 0..SCALE {
                        for dx in 0..SCALE {
                            if px + dx < canvas.width() && py + dy < canvas.height() {
                                canvas.put_pixel(px + dx, py + dy, INK);
                            }
                        }
                    }
                }
            }
        }
        x0 += GLYPH_WIDTH * SCALE + SPACING;
    }
}

/// Flat background with the label centered, at the final thumbnail size.
#[must_use]
pub fn placeholder_image() -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, BACKGROUND);
    let left = THUMBNAIL_WIDTH.saturating_sub(text_width(PLACEHOLDER_LABEL)) / 2;
    let top = THUMBNAIL_HEIGHT.saturating_sub(GLYPH_HEIGHT * SCALE) / 2;
    draw_text(&mut canvas, PLACEHOLDER_LABEL, left, top);
    canvas
}

/// The placeholder encoded as PNG.
///
/// # Errors
///
/// Returns [`ThumbnailError::ImageEncode`] if PNG encoding fails.
pub fn placeholder_png() -> Result<Vec<u8>, ThumbnailError> {
    encode_png(&DynamicImage::ImageRgba8(placeholder_image()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_glyphs_exist() {
        assert!(PLACEHOLDER_LABEL.chars().all(|c| glyph(c).is_some()));
        assert!(text_width(PLACEHOLDER_LABEL) < THUMBNAIL_WIDTH);
    }

    #[test]
    fn test_placeholder_dimensions_and_background() {
        let img = placeholder_image();
        assert_eq!(img.dimensions(), (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT));
        assert_eq!(*img.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*img.get_pixel(THUMBNAIL_WIDTH - 1, THUMBNAIL_HEIGHT - 1), BACKGROUND);
    }

    #[test]
    fn test_label_is_centered() {
        let img = placeholder_image();
        let inked: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == INK)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());

        let min_x = inked.iter().map(|p| p.0).min().unwrap();
        let max_x = inked.iter().map(|p| p.0).max().unwrap();
        let min_y = inked.iter().map(|p| p.1).min().unwrap();
        let max_y = inked.iter().map(|p| p.1).max().unwrap();

        let center_x = (min_x + max_x) / 2;
        let center_y = (min_y + max_y) / 2;
        assert!(center_x.abs_diff(THUMBNAIL_WIDTH / 2) <= SCALE * 2);
        assert!(center_y.abs_diff(THUMBNAIL_HEIGHT / 2) <= SCALE * 2);
    }

    #[test]
    fn test_placeholder_png_decodes() {
        let png = placeholder_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), THUMBNAIL_WIDTH);
        assert_eq!(decoded.height(), THUMBNAIL_HEIGHT);
    }
}
