//! The segmentation predictor seam.
//!
//! The model itself is an external collaborator: something that turns an
//! image plus a box prompt into a per-pixel foreground probability map.
//! Implementations load once, get injected into the session and are reused
//! across calls; nothing in this crate holds model state globally.

use image::DynamicImage;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::MaskError;

/// A bounding-box prompt in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxPrompt {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoxPrompt {
    /// Create a prompt from two corner points.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a prompt from the wire form `[x1, y1, x2, y2]`.
    pub fn from_corners(corners: [f32; 4]) -> Self {
        let [x1, y1, x2, y2] = corners;
        Self { x1, y1, x2, y2 }
    }
}

/// An external segmentation model.
///
/// The returned array is height × width matching the input image, with
/// values in [0, 1]. Anything the model reports outside that range is
/// clamped downstream during thresholding.
pub trait Predictor: Send + Sync {
    /// Predict the foreground probability of each pixel for the object
    /// indicated by the box prompt.
    fn predict(&self, image: &DynamicImage, prompt: &BoxPrompt) -> Result<Array2<f32>, MaskError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_prompt_wire_form() {
        let prompt = BoxPrompt::from_corners([1.0, 2.0, 30.0, 40.0]);
        assert_eq!(prompt, BoxPrompt::new(1.0, 2.0, 30.0, 40.0));

        let json = serde_json::to_value(prompt).expect("serializable");
        assert_eq!(json["x1"], 1.0);
        assert_eq!(json["y2"], 40.0);
    }
}
