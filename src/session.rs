//! Orchestration facade over the stores and the predictor.
//!
//! One `Session` serves one interactive annotation session: it owns the
//! mask and upload stores plus the injected predictor, and exposes the
//! operation surface the front-end consumes. Single-record operations
//! propagate their first error; bulk operations isolate per-record failures
//! so one bad file never takes down a listing or a preview. A record
//! disappearing between list and read counts as one of those failures.

use std::io::Cursor;
use std::path::Path;

use image::ImageFormat;
use serde::Serialize;

use crate::canonical::canonicalize_probabilities;
use crate::composite::composite;
use crate::edit::{EditMode, apply_edit};
use crate::error::MaskError;
use crate::geometry::{MaskGeometry, extract};
use crate::mask::{BinaryMask, MaskId};
use crate::predict::{BoxPrompt, Predictor};
use crate::store::{ClearReport, MaskStore, RECORD_EXT, UploadStore};

/// URL prefix stored masks are served under.
pub const MASK_URL_PREFIX: &str = "/masks";

/// URL prefix uploaded images are served under.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// A stored record reference returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRef {
    /// Record id.
    pub id: String,
    /// Serving path for the record's bytes.
    pub url: String,
}

/// Geometry listing entry for one mask.
#[derive(Debug, Clone, Serialize)]
pub struct MaskGeometryEntry {
    /// Mask id.
    pub id: MaskId,
    /// Centroid and simplified contour.
    #[serde(flatten)]
    pub geometry: MaskGeometry,
    /// Serving path for the mask image.
    pub url: String,
}

/// The annotation session facade.
pub struct Session {
    masks: MaskStore,
    uploads: UploadStore,
    predictor: Box<dyn Predictor>,
}

impl Session {
    /// Create a session storing masks under `root/masks` and uploads under
    /// `root/uploads`.
    pub fn new(root: impl AsRef<Path>, predictor: Box<dyn Predictor>) -> Result<Self, MaskError> {
        let root = root.as_ref();
        Ok(Self {
            masks: MaskStore::new(root.join("masks"))?,
            uploads: UploadStore::new(root.join("uploads"))?,
            predictor,
        })
    }

    /// The underlying mask store.
    pub fn masks(&self) -> &MaskStore {
        &self.masks
    }

    /// The underlying upload store.
    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Persist an uploaded source image.
    pub fn upload_image(&self, bytes: &[u8]) -> Result<StoredRef, MaskError> {
        if bytes.is_empty() {
            return Err(MaskError::validation("missing image payload"));
        }
        let id = self.uploads.save(bytes)?;
        Ok(StoredRef {
            url: upload_url(&id),
            id,
        })
    }

    /// Canonicalize and persist mask bytes, overwriting any record with the
    /// same id.
    pub fn save_mask(&self, bytes: &[u8], id: Option<&str>) -> Result<StoredRef, MaskError> {
        if bytes.is_empty() {
            return Err(MaskError::validation("missing mask payload"));
        }
        let id = self.masks.save(bytes, id)?;
        Ok(StoredRef {
            url: mask_url(&id),
            id,
        })
    }

    /// Apply a polygon edit to a stored mask and persist the result.
    ///
    /// The edited mask re-enters through the save path, which enforces the
    /// single-region invariant again.
    pub fn edit_mask(
        &self,
        id: &str,
        polygon: &[(i32, i32)],
        mode: EditMode,
    ) -> Result<StoredRef, MaskError> {
        let mask = self.masks.read(id)?;
        let edited = apply_edit(&mask, polygon, mode);
        let id = self.masks.save_mask(&edited, Some(id))?;
        Ok(StoredRef {
            url: mask_url(&id),
            id,
        })
    }

    /// List all stored masks.
    pub fn list_masks(&self) -> Result<Vec<StoredRef>, MaskError> {
        Ok(self
            .masks
            .list()?
            .into_iter()
            .map(|id| StoredRef {
                url: mask_url(&id),
                id,
            })
            .collect())
    }

    /// Centroid and contour for every mask that has a foreground region.
    ///
    /// Masks with no region are skipped, as are records that fail to read.
    pub fn mask_geometry(&self) -> Result<Vec<MaskGeometryEntry>, MaskError> {
        let mut entries = Vec::new();
        for id in self.masks.list()? {
            let mask = match self.masks.read(&id) {
                Ok(mask) => mask,
                Err(e) => {
                    log::warn!("mask-geometry: skipping '{}': {}", id, e);
                    continue;
                }
            };
            if let Some(geometry) = extract(&mask) {
                entries.push(MaskGeometryEntry {
                    url: mask_url(&id),
                    geometry,
                    id,
                });
            }
        }
        Ok(entries)
    }

    /// Render the composite preview of all stored masks as PNG bytes.
    pub fn composite_preview(&self) -> Result<Vec<u8>, MaskError> {
        let mut records: Vec<(MaskId, BinaryMask)> = Vec::new();
        for id in self.masks.list()? {
            match self.masks.read(&id) {
                Ok(mask) => records.push((id, mask)),
                Err(e) => log::warn!("composite: skipping '{}': {}", id, e),
            }
        }
        let preview = composite(&records);
        let mut bytes = Vec::new();
        preview.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Delete every stored mask; best effort.
    pub fn clear_masks(&self) -> Result<ClearReport, MaskError> {
        self.masks.clear_all()
    }

    /// Delete every uploaded image; best effort.
    pub fn clear_uploads(&self) -> Result<ClearReport, MaskError> {
        self.uploads.clear_all()
    }

    /// Run the predictor on an uploaded image and return the canonical mask
    /// as PNG bytes.
    ///
    /// The mask is not saved; the client reviews it and posts it back
    /// through [`Session::save_mask`] once accepted.
    pub fn predict_mask(&self, image_id: &str, prompt: &BoxPrompt) -> Result<Vec<u8>, MaskError> {
        let image = self.uploads.read_image(image_id)?;
        let probabilities = self.predictor.predict(&image, prompt)?;
        let mask = canonicalize_probabilities(&probabilities);
        log::trace!(
            "predicted mask for upload '{}': {} px foreground",
            image_id,
            mask.foreground_area()
        );

        let mut bytes = Vec::new();
        mask.as_gray()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

fn mask_url(id: &str) -> String {
    format!("{MASK_URL_PREFIX}/{id}.{RECORD_EXT}")
}

fn upload_url(id: &str) -> String {
    format!("{UPLOAD_URL_PREFIX}/{id}.{RECORD_EXT}")
}
