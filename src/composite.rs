//! Compositing stored masks into one labeled preview.
//!
//! Every stored mask is blended into a single image at half opacity with a
//! deterministic per-mask color, then each mask's outer boundary is redrawn
//! opaque so the cutouts stay crisply separable no matter how many overlap.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::mask::{BinaryMask, FOREGROUND, MaskId};
use crate::region::largest_region;

/// Fixed palette cycled by record index.
pub const PALETTE: [Rgb<u8>; 8] = [
    Rgb([255, 0, 0]),   // red
    Rgb([0, 255, 0]),   // green
    Rgb([0, 0, 255]),   // blue
    Rgb([255, 255, 0]), // yellow
    Rgb([255, 0, 255]), // magenta
    Rgb([0, 255, 255]), // cyan
    Rgb([255, 165, 0]), // orange
    Rgb([128, 0, 128]), // purple
];

/// Opacity of each blended mask layer.
pub const LAYER_ALPHA: f32 = 0.5;

/// Stroke width of the outline pass, in pixels.
pub const OUTLINE_WIDTH: i32 = 6;

/// Output dimensions when there are no records to composite.
pub const FALLBACK_SIZE: (u32, u32) = (100, 100);

/// Color assigned to the record at the given index.
pub fn palette_color(index: usize) -> Rgb<u8> {
    PALETTE[index % PALETTE.len()]
}

/// Composite all records into one preview image.
///
/// Records blend in order with the `over` operator against a transparent
/// background, so later masks partially occlude earlier ones at overlaps.
/// Each record then gets its largest region's outer boundary stroked opaque
/// in its assigned color. With no records at all, a blank
/// [`FALLBACK_SIZE`] image comes back. Records whose dimensions differ from
/// the first record are skipped with a warning.
pub fn composite(records: &[(MaskId, BinaryMask)]) -> RgbImage {
    let Some((_, first)) = records.first() else {
        return RgbImage::new(FALLBACK_SIZE.0, FALLBACK_SIZE.1);
    };
    let (width, height) = first.dimensions();
    let row = width as usize;

    // Premultiplied RGBA accumulator over a flat row-major buffer.
    let mut acc = vec![[0.0f32; 4]; row * height as usize];
    for (index, (id, mask)) in records.iter().enumerate() {
        if mask.dimensions() != (width, height) {
            log::warn!(
                "composite: skipping mask '{}': {}x{} does not match {}x{}",
                id,
                mask.width(),
                mask.height(),
                width,
                height
            );
            continue;
        }
        let Rgb([r, g, b]) = palette_color(index);
        let layer = [
            f32::from(r) * LAYER_ALPHA,
            f32::from(g) * LAYER_ALPHA,
            f32::from(b) * LAYER_ALPHA,
            LAYER_ALPHA,
        ];
        for (x, y, pixel) in mask.as_gray().enumerate_pixels() {
            if pixel.0[0] != FOREGROUND {
                continue;
            }
            let cell = &mut acc[y as usize * row + x as usize];
            for channel in 0..4 {
                cell[channel] = layer[channel] + cell[channel] * (1.0 - LAYER_ALPHA);
            }
        }
    }

    // Flatten to RGB. Un-premultiplying makes a lone layer read back as its
    // pure color, matching straight-alpha compositing with the alpha then
    // dropped.
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let cell = acc[y as usize * row + x as usize];
        if cell[3] > 0.0 {
            pixel.0 = [
                to_channel(cell[0] / cell[3]),
                to_channel(cell[1] / cell[3]),
                to_channel(cell[2] / cell[3]),
            ];
        }
    }

    // Outline pass: crisp boundaries regardless of blend transparency.
    for (index, (_, mask)) in records.iter().enumerate() {
        if mask.dimensions() != (width, height) {
            continue;
        }
        if let Some(region) = largest_region(mask.as_gray()) {
            let color = palette_color(index);
            for point in &region.boundary {
                draw_filled_circle_mut(&mut out, (point.x, point.y), OUTLINE_WIDTH / 2, color);
            }
        }
    }

    out
}

fn to_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
