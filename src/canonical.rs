//! Mask canonicalization.
//!
//! Predicted masks arrive noisy: speckle, several disconnected blobs,
//! interior holes. The canonical form keeps the single largest region and
//! fills it solid, so every stored mask is one silhouette per cutout.

use ndarray::Array2;

use crate::mask::BinaryMask;
use crate::region::largest_region;

/// Reduce a mask to its single largest foreground region, holes filled.
///
/// The largest region is chosen by enclosed area (ties keep scan order) and
/// its outer boundary is re-rasterized filled, which erases smaller blobs
/// and interior holes in one pass. A mask with no foreground region at all
/// is returned unchanged. Idempotent, and never fails.
pub fn canonicalize(mask: &BinaryMask) -> BinaryMask {
    match largest_region(mask.as_gray()) {
        Some(region) => BinaryMask::from_raw_binary(region.fill(mask.width(), mask.height())),
        None => mask.clone(),
    }
}

/// Threshold a probability map and canonicalize it in one step.
///
/// This is the shape of the predictor output path: model probabilities in,
/// one solid silhouette out.
pub fn canonicalize_probabilities(probabilities: &Array2<f32>) -> BinaryMask {
    canonicalize(&BinaryMask::from_probabilities(probabilities))
}
