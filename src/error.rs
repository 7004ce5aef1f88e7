//! Error types for mask lifecycle operations.

use thiserror::Error;

/// Errors that can occur during mask storage and orchestration.
///
/// Pixel-level operations (canonicalization, edits, compositing) never fail
/// on mask content; the worst case there is an empty result. Errors come
/// from storage, decoding and the external predictor.
#[derive(Error, Debug)]
pub enum MaskError {
    /// No stored record exists under the requested id
    #[error("mask not found: {id}")]
    NotFound {
        /// The id that was requested
        id: String,
    },

    /// Stored or uploaded bytes are not a valid raster image
    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// I/O error during storage operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A request was malformed (empty payload, unusable id, ...)
    #[error("validation error: {message}")]
    Validation {
        /// Description of what was rejected
        message: String,
    },

    /// The external segmentation predictor failed
    #[error("predictor error: {message}")]
    Predict {
        /// Description passed through from the predictor
        message: String,
    },
}

impl MaskError {
    /// Create a not-found error for the given mask id.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a validation error with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a predictor error with a message.
    pub fn predict(message: impl Into<String>) -> Self {
        Self::Predict {
            message: message.into(),
        }
    }
}
