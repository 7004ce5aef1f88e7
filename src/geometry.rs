//! Derived display geometry for a mask.
//!
//! The front-end shows a draggable center marker and an editable outline per
//! mask; both derive from the stored pixels on demand and are never
//! persisted.

use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use serde::Serialize;

use crate::mask::{BinaryMask, FOREGROUND};
use crate::region::largest_region;

/// Douglas-Peucker tolerance for contour simplification, in pixels.
pub const SIMPLIFY_TOLERANCE: f64 = 1.0;

/// Centroid and simplified outer contour of a mask's largest region.
#[derive(Debug, Clone, Serialize)]
pub struct MaskGeometry {
    /// Area-weighted center of the region, `(x, y)`.
    pub centroid: (f32, f32),
    /// Simplified outer boundary, ordered `(x, y)` points.
    pub contour: Vec<(i32, i32)>,
}

/// Extract display geometry from a mask.
///
/// Returns `None` when the mask has no foreground region at all; callers
/// skip such masks. The centroid is the mean position of the largest
/// region's filled pixels, with the boundary's bounding-box center as a
/// guarded fallback should the region rasterize to nothing.
pub fn extract(mask: &BinaryMask) -> Option<MaskGeometry> {
    let region = largest_region(mask.as_gray())?;

    let filled = region.fill(mask.width(), mask.height());
    let mut count: u64 = 0;
    let (mut sum_x, mut sum_y) = (0u64, 0u64);
    for (x, y, pixel) in filled.enumerate_pixels() {
        if pixel.0[0] == FOREGROUND {
            count += 1;
            sum_x += u64::from(x);
            sum_y += u64::from(y);
        }
    }
    let centroid = if count > 0 {
        (
            sum_x as f32 / count as f32,
            sum_y as f32 / count as f32,
        )
    } else {
        bounding_box_center(&region.boundary)
    };

    let contour = if region.boundary.len() < 3 {
        region.boundary.iter().map(|p| (p.x, p.y)).collect()
    } else {
        approximate_polygon_dp(&region.boundary, SIMPLIFY_TOLERANCE, true)
            .into_iter()
            .map(|p| (p.x, p.y))
            .collect()
    };

    Some(MaskGeometry { centroid, contour })
}

fn bounding_box_center(points: &[Point<i32>]) -> (f32, f32) {
    let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
    let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    ((min_x + max_x) as f32 / 2.0, (min_y + max_y) as f32 / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use imageproc::drawing::draw_filled_circle_mut;

    #[test]
    fn test_empty_mask_has_no_geometry() {
        let mask = BinaryMask::from_gray(&GrayImage::new(32, 32));
        assert!(extract(&mask).is_none());
    }

    #[test]
    fn test_circle_centroid_and_simplified_contour() {
        let mut canvas = GrayImage::new(100, 100);
        draw_filled_circle_mut(&mut canvas, (50, 50), 30, Luma([FOREGROUND]));
        let mask = BinaryMask::from_gray(&canvas);

        let geometry = extract(&mask).expect("circle present");
        let (cx, cy) = geometry.centroid;
        assert!((cx - 50.0).abs() < 1.0, "cx = {cx}");
        assert!((cy - 50.0).abs() < 1.0, "cy = {cy}");

        // The raw boundary of a radius-30 circle has on the order of 200
        // points; simplification at ε = 1.0 should collapse it far below
        // that while staying a polygon.
        assert!(geometry.contour.len() >= 3);
        assert!(geometry.contour.len() < 80, "{}", geometry.contour.len());
    }

    #[test]
    fn test_geometry_comes_from_largest_region() {
        let mut canvas = GrayImage::new(60, 60);
        draw_filled_circle_mut(&mut canvas, (40, 40), 12, Luma([FOREGROUND]));
        canvas.put_pixel(2, 2, Luma([FOREGROUND]));
        let mask = BinaryMask::from_gray(&canvas);

        let geometry = extract(&mask).expect("regions present");
        let (cx, cy) = geometry.centroid;
        assert!((cx - 40.0).abs() < 1.0);
        assert!((cy - 40.0).abs() < 1.0);
    }

    #[test]
    fn test_single_pixel_mask_geometry() {
        let mut canvas = GrayImage::new(10, 10);
        canvas.put_pixel(6, 3, Luma([FOREGROUND]));
        let mask = BinaryMask::from_gray(&canvas);

        let geometry = extract(&mask).expect("pixel present");
        assert_eq!(geometry.centroid, (6.0, 3.0));
        assert_eq!(geometry.contour, vec![(6, 3)]);
    }

    #[test]
    fn test_serialized_shape() {
        let mut canvas = GrayImage::new(16, 16);
        for y in 4..8 {
            for x in 4..8 {
                canvas.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let geometry =
            extract(&BinaryMask::from_gray(&canvas)).expect("block present");

        let value = serde_json::to_value(&geometry).expect("serializable");
        assert!(value["centroid"].is_array());
        assert!(value["contour"].is_array());
        assert!(value["contour"][0].is_array());
    }
}
