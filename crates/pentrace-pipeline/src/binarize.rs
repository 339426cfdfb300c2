//! Threshold-based black/white classification.
//!
//! Produces the two-level mask consumed by the vectorizer: dark pixels
//! (the drawing) become foreground `255`, everything else background `0`.

use image::{GrayImage, Luma};

/// Foreground value in a binary bitmap.
pub const FOREGROUND: u8 = 255;

/// Background value in a binary bitmap.
pub const BACKGROUND: u8 = 0;

/// Classify every pixel of `gray` against `threshold`.
///
/// A pixel is foreground when its luma is strictly below `threshold`,
/// so `threshold = 0` yields an empty mask and `threshold = 255` marks
/// everything except pure white.
#[must_use = "returns the binary bitmap"]
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] < threshold {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Number of foreground pixels in a binary bitmap.
pub(crate) fn count_foreground(bitmap: &GrayImage) -> u64 {
    bitmap
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == FOREGROUND)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_pixels_become_foreground() {
        let gray = GrayImage::from_fn(4, 1, |x, _| Luma([[0, 127, 128, 255][x as usize]]));
        let mask = binarize(&gray, 128);
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![FOREGROUND, FOREGROUND, BACKGROUND, BACKGROUND]);
    }

    #[test]
    fn zero_threshold_yields_empty_mask() {
        let gray = GrayImage::from_pixel(5, 5, Luma([0]));
        let mask = binarize(&gray, 0);
        assert_eq!(count_foreground(&mask), 0);
    }

    #[test]
    fn dimensions_are_preserved() {
        let gray = GrayImage::new(13, 7);
        let mask = binarize(&gray, 128);
        assert_eq!(mask.dimensions(), (13, 7));
        assert_eq!(count_foreground(&mask), 13 * 7);
    }
}
