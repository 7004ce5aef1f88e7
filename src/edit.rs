//! Free-form polygon edits on a mask.
//!
//! The front-end lets the user lasso a region to add to or carve out of an
//! existing mask. The edit itself is pure pixel logic; single-region
//! enforcement happens when the caller saves the result back through the
//! store.

use image::GrayImage;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::mask::{BACKGROUND, BinaryMask, FOREGROUND};
use crate::region::fill_polygon;

/// Minimum number of vertices for a polygon edit to have any effect.
pub const MIN_EDIT_VERTICES: usize = 3;

/// Whether a polygon edit adds to or subtracts from the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    /// Union the polygon's fill into the mask.
    Add,
    /// Clear the polygon's fill out of the mask.
    Subtract,
}

/// Apply a polygon edit to a mask, returning the edited copy.
///
/// The polygon is rasterized into a same-size overlay with the crate's
/// polygon fill; `Add` ORs the overlay into the mask, `Subtract` ANDs its
/// complement. A polygon with fewer than [`MIN_EDIT_VERTICES`] points is a
/// no-op in either mode, and vertices outside the canvas are simply clipped
/// out of the overlay.
pub fn apply_edit(mask: &BinaryMask, polygon: &[(i32, i32)], mode: EditMode) -> BinaryMask {
    let mut overlay = GrayImage::new(mask.width(), mask.height());
    if polygon.len() >= MIN_EDIT_VERTICES {
        let points: Vec<Point<i32>> = polygon.iter().map(|&(x, y)| Point::new(x, y)).collect();
        fill_polygon(&mut overlay, &points);
    }

    let mut out = mask.as_gray().clone();
    for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
        if src.0[0] != FOREGROUND {
            continue;
        }
        dst.0[0] = match mode {
            EditMode::Add => FOREGROUND,
            EditMode::Subtract => BACKGROUND,
        };
    }
    BinaryMask::from_raw_binary(out)
}
