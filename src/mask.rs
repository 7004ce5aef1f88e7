//! The binary mask data model.

use image::GrayImage;
use ndarray::Array2;

/// Unique identifier for a stored mask.
pub type MaskId = String;

/// Grayscale value at or above which a pixel counts as foreground.
pub const FOREGROUND_THRESHOLD: u8 = 128;

/// Pixel value of foreground in a binary mask.
pub const FOREGROUND: u8 = 255;

/// Pixel value of background in a binary mask.
pub const BACKGROUND: u8 = 0;

/// A strictly binary mask: every pixel is exactly 0 or 255.
///
/// Construction always thresholds, so the invariant holds by the time a
/// value of this type exists. Canonicalization additionally guarantees at
/// most one connected foreground component; plain thresholded masks make no
/// such promise.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask {
    image: GrayImage,
}

impl BinaryMask {
    /// Threshold an arbitrary grayscale image into a binary mask.
    pub fn from_gray(image: &GrayImage) -> Self {
        let mut out = GrayImage::new(image.width(), image.height());
        for (dst, src) in out.pixels_mut().zip(image.pixels()) {
            dst.0[0] = if src.0[0] >= FOREGROUND_THRESHOLD {
                FOREGROUND
            } else {
                BACKGROUND
            };
        }
        Self { image: out }
    }

    /// Convert a probability map with values in [0, 1] into a binary mask.
    ///
    /// The array is indexed `(row, column)`. Probabilities are scaled to
    /// 0-255 with truncation before the usual threshold is applied, so the
    /// result matches what the same map would produce as an 8-bit grayscale
    /// image.
    pub fn from_probabilities(probabilities: &Array2<f32>) -> Self {
        let (height, width) = probabilities.dim();
        let mut image = GrayImage::new(width as u32, height as u32);
        for ((y, x), &p) in probabilities.indexed_iter() {
            // `as` saturates, so out-of-range model output stays in bounds.
            image.get_pixel_mut(x as u32, y as u32).0[0] = (p * 255.0) as u8;
        }
        Self::from_gray(&image)
    }

    /// Wrap an image that is already strictly 0/255.
    ///
    /// Used by pixel-producing stages inside the crate; the debug assertion
    /// documents the contract.
    pub(crate) fn from_raw_binary(image: GrayImage) -> Self {
        debug_assert!(
            image
                .pixels()
                .all(|p| p.0[0] == FOREGROUND || p.0[0] == BACKGROUND)
        );
        Self { image }
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Mask dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the pixel at `(x, y)` is foreground.
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] == FOREGROUND
    }

    /// Number of foreground pixels.
    pub fn foreground_area(&self) -> u64 {
        self.image
            .pixels()
            .filter(|p| p.0[0] == FOREGROUND)
            .count() as u64
    }

    /// Borrow the underlying grayscale image.
    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    /// Consume the mask, returning the underlying grayscale image.
    pub fn into_gray(self) -> GrayImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_from_gray_thresholds() {
        let mut image = GrayImage::new(3, 1);
        image.get_pixel_mut(0, 0).0[0] = 127;
        image.get_pixel_mut(1, 0).0[0] = 128;
        image.get_pixel_mut(2, 0).0[0] = 200;

        let mask = BinaryMask::from_gray(&image);
        assert!(!mask.is_foreground(0, 0));
        assert!(mask.is_foreground(1, 0));
        assert!(mask.is_foreground(2, 0));
        assert_eq!(mask.foreground_area(), 2);
    }

    #[test]
    fn test_from_probabilities_scales_and_thresholds() {
        // 128 / 255 ≈ 0.502: values just below that truncate to 127.
        let probabilities =
            Array2::from_shape_vec((1, 3), vec![0.0, 0.501, 0.9]).expect("valid shape");

        let mask = BinaryMask::from_probabilities(&probabilities);
        assert_eq!(mask.dimensions(), (3, 1));
        assert!(!mask.is_foreground(0, 0));
        assert!(!mask.is_foreground(1, 0)); // 0.501 * 255 = 127.755 -> 127
        assert!(mask.is_foreground(2, 0));
    }

    #[test]
    fn test_from_probabilities_row_column_order() {
        let mut probabilities = Array2::zeros((2, 4));
        probabilities[[1, 3]] = 1.0;

        let mask = BinaryMask::from_probabilities(&probabilities);
        assert_eq!(mask.dimensions(), (4, 2));
        assert!(mask.is_foreground(3, 1));
        assert_eq!(mask.foreground_area(), 1);
    }
}
