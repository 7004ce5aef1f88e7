//! Shared connected-region primitive.
//!
//! Canonicalization, geometry extraction and the compositor's outline pass
//! all need "the largest foreground region" of a mask. They go through this
//! module so the area criterion and the tie-break can never diverge between
//! call sites: largest means greatest enclosed area of the outer boundary,
//! and ties keep the region traced first in scan order.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::mask::FOREGROUND;

/// The outer boundary of one externally-bounded foreground region.
///
/// Holes inside the region are not represented; only the outermost boundary
/// of each connected component matters here.
#[derive(Debug, Clone)]
pub struct Region {
    /// Ordered boundary points as traced along 8-connected neighbours.
    pub boundary: Vec<Point<i32>>,
    /// Area enclosed by the boundary, in pixels (shoelace formula).
    pub area: f64,
}

impl Region {
    /// Rasterize the filled interior of this region's outer boundary into a
    /// fresh mask of the given dimensions.
    ///
    /// Holes the original mask had inside this region come out solid: the
    /// boundary alone defines the shape.
    pub fn fill(&self, width: u32, height: u32) -> GrayImage {
        let mut out = GrayImage::new(width, height);
        fill_polygon(&mut out, &self.boundary);
        out
    }
}

/// Find the outer boundaries of all foreground regions, in scan order.
pub fn outer_regions(mask: &GrayImage) -> Vec<Region> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| {
            let area = enclosed_area(&c.points);
            Region {
                boundary: c.points,
                area,
            }
        })
        .collect()
}

/// Select the largest region by enclosed area, or `None` for an empty mask.
///
/// The strictly-greater comparison keeps the first region in scan order on
/// ties.
pub fn largest_region(mask: &GrayImage) -> Option<Region> {
    let mut best: Option<Region> = None;
    for region in outer_regions(mask) {
        match &best {
            Some(current) if region.area <= current.area => {}
            _ => best = Some(region),
        }
    }
    best
}

/// Shoelace area of a closed boundary traced through pixel centers.
fn enclosed_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..points.len() {
        let p = points[i];
        let q = points[(i + 1) % points.len()];
        twice_area += i64::from(p.x) * i64::from(q.y) - i64::from(q.x) * i64::from(p.y);
    }
    twice_area.unsigned_abs() as f64 / 2.0
}

/// Rasterize a closed polygon, boundary and interior, as foreground.
///
/// Tolerates rings that repeat the first point at the end. Degenerate inputs
/// still mark their pixels: one point plots, two points draw a segment.
/// Coordinates outside the canvas are clipped.
pub(crate) fn fill_polygon(canvas: &mut GrayImage, points: &[Point<i32>]) {
    let ring = if points.len() >= 2 && points.first() == points.last() {
        &points[..points.len() - 1]
    } else {
        points
    };
    match ring {
        [] => {}
        [p] => plot(canvas, *p),
        [p, q] => draw_line_segment_mut(
            canvas,
            (p.x as f32, p.y as f32),
            (q.x as f32, q.y as f32),
            Luma([FOREGROUND]),
        ),
        _ => draw_polygon_mut(canvas, ring, Luma([FOREGROUND])),
    }
}

fn plot(canvas: &mut GrayImage, p: Point<i32>) {
    if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
        canvas.put_pixel(p.x as u32, p.y as u32, Luma([FOREGROUND]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(canvas: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                canvas.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        let mask = GrayImage::new(16, 16);
        assert!(outer_regions(&mask).is_empty());
        assert!(largest_region(&mask).is_none());
    }

    #[test]
    fn test_single_block_area() {
        let mut mask = GrayImage::new(20, 20);
        block(&mut mask, 4, 4, 10, 10);

        let regions = outer_regions(&mask);
        assert_eq!(regions.len(), 1);
        // Boundary runs through pixel centers, so a 10x10 block encloses 9x9.
        assert!((regions[0].area - 81.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_largest_prefers_enclosed_area() {
        let mut mask = GrayImage::new(40, 40);
        block(&mut mask, 2, 2, 4, 4);
        block(&mut mask, 10, 10, 12, 12);

        let region = largest_region(&mask).expect("two regions present");
        assert!((region.area - 121.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hole_is_not_a_region() {
        // A ring: 12x12 block with its 6x6 middle cleared.
        let mut mask = GrayImage::new(20, 20);
        block(&mut mask, 2, 2, 12, 12);
        for y in 5..11 {
            for x in 5..11 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }

        let regions = outer_regions(&mask);
        assert_eq!(regions.len(), 1);
    }

    #[test]
    fn test_fill_closes_holes() {
        let mut mask = GrayImage::new(20, 20);
        block(&mut mask, 2, 2, 12, 12);
        for y in 5..11 {
            for x in 5..11 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }

        let region = largest_region(&mask).expect("ring present");
        let filled = region.fill(20, 20);
        // The hole pixels are inside the outer boundary and come out solid.
        assert_eq!(filled.get_pixel(7, 7).0[0], FOREGROUND);
        assert_eq!(filled.get_pixel(2, 2).0[0], FOREGROUND);
        assert_eq!(filled.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn test_fill_polygon_tolerates_closed_ring() {
        let mut open = GrayImage::new(10, 10);
        let mut closed = GrayImage::new(10, 10);
        let triangle = [Point::new(1, 1), Point::new(8, 1), Point::new(4, 8)];
        let ring = [triangle[0], triangle[1], triangle[2], triangle[0]];

        fill_polygon(&mut open, &triangle);
        fill_polygon(&mut closed, &ring);
        assert_eq!(open, closed);
    }

    #[test]
    fn test_single_pixel_region_fills_itself() {
        let mut mask = GrayImage::new(8, 8);
        mask.put_pixel(3, 4, Luma([FOREGROUND]));

        let region = largest_region(&mask).expect("pixel present");
        let filled = region.fill(8, 8);
        assert_eq!(filled.get_pixel(3, 4).0[0], FOREGROUND);
        assert_eq!(filled.pixels().filter(|p| p.0[0] == FOREGROUND).count(), 1);
    }
}
