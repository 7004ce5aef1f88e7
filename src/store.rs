//! Flat-file stores for mask records and uploaded source images.
//!
//! Records are plain PNG files named by id in a single directory; the store
//! re-reads storage on every operation and keeps no cache across calls, so
//! the directory itself is the only session state. Writes land in a
//! temporary sibling first and rename into place.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use uuid::Uuid;

use crate::canonical::canonicalize;
use crate::error::MaskError;
use crate::mask::{BinaryMask, MaskId};

/// File extension for stored records.
pub const RECORD_EXT: &str = "png";

/// Outcome of a best-effort bulk delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Number of records removed.
    pub removed: usize,
    /// Number of records that could not be removed.
    pub failed: usize,
}

/// Directory-backed store of canonical binary masks.
///
/// The store is the sole owner of mask bytes on disk. Every mask goes
/// through canonicalization on the way in, so stored records always hold a
/// single solid region (or nothing).
#[derive(Debug, Clone)]
pub struct MaskStore {
    root: PathBuf,
}

impl MaskStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, MaskError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory this store reads and writes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of the record for the given id.
    pub fn path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{RECORD_EXT}"))
    }

    /// Decode, canonicalize and persist mask bytes.
    ///
    /// A fresh random id is generated when none is given; an existing record
    /// under the same id is overwritten. Returns the id the record was
    /// stored under.
    pub fn save(&self, bytes: &[u8], id: Option<&str>) -> Result<MaskId, MaskError> {
        let decoded = image::load_from_memory(bytes)?;
        let mask = BinaryMask::from_gray(&decoded.to_luma8());
        self.save_mask(&mask, id)
    }

    /// Canonicalize and persist an in-memory mask.
    ///
    /// This is the direct-edit path: edited masks re-enter through here so
    /// single-region enforcement always happens on save.
    pub fn save_mask(&self, mask: &BinaryMask, id: Option<&str>) -> Result<MaskId, MaskError> {
        let id = match id {
            Some(id) => {
                validate_id(id)?;
                id.to_string()
            }
            None => Uuid::new_v4().to_string(),
        };
        let canonical = canonicalize(mask);

        let mut encoded = Vec::new();
        canonical
            .as_gray()
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
        write_atomic(&self.root, &self.path(&id), &encoded)?;

        log::debug!(
            "saved mask '{}' ({}x{}, {} px foreground)",
            id,
            canonical.width(),
            canonical.height(),
            canonical.foreground_area()
        );
        Ok(id)
    }

    /// Ids of all stored records.
    ///
    /// Sorted so downstream palette assignment stays deterministic across
    /// requests.
    pub fn list(&self) -> Result<Vec<MaskId>, MaskError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Read one record back as a binary mask.
    pub fn read(&self, id: &str) -> Result<BinaryMask, MaskError> {
        let bytes = read_record(&self.path(id), id)?;
        let decoded = image::load_from_memory(&bytes)?;
        Ok(BinaryMask::from_gray(&decoded.to_luma8()))
    }

    /// Delete every record, best effort.
    ///
    /// Individual failures are logged and counted but never abort the
    /// sweep; clearing an already-empty store succeeds.
    pub fn clear_all(&self) -> Result<ClearReport, MaskError> {
        clear_dir(&self.root)
    }
}

/// Directory-backed store of uploaded source images.
///
/// Uploads keep their original encoded bytes untouched; masks derived from
/// them live in the [`MaskStore`].
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, MaskError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory this store reads and writes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of the upload with the given id.
    pub fn path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.{RECORD_EXT}"))
    }

    /// Persist uploaded image bytes under a fresh id.
    ///
    /// The bytes must decode as a raster image; they are stored verbatim.
    pub fn save(&self, bytes: &[u8]) -> Result<String, MaskError> {
        image::load_from_memory(bytes)?;
        let id = Uuid::new_v4().to_string();
        write_atomic(&self.root, &self.path(&id), bytes)?;
        log::debug!("saved upload '{}' ({} bytes)", id, bytes.len());
        Ok(id)
    }

    /// Load an uploaded image for prediction.
    pub fn read_image(&self, id: &str) -> Result<DynamicImage, MaskError> {
        let bytes = read_record(&self.path(id), id)?;
        Ok(image::load_from_memory(&bytes)?)
    }

    /// Delete every upload, best effort.
    pub fn clear_all(&self) -> Result<ClearReport, MaskError> {
        clear_dir(&self.root)
    }
}

fn read_record(path: &Path, id: &str) -> Result<Vec<u8>, MaskError> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(MaskError::not_found(id)),
        Err(e) => Err(e.into()),
    }
}

fn write_atomic(root: &Path, path: &Path, bytes: &[u8]) -> Result<(), MaskError> {
    let tmp = root.join(format!(".{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn clear_dir(root: &Path) -> Result<ClearReport, MaskError> {
    let mut report = ClearReport::default();
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                log::warn!("clear: unreadable directory entry: {}", e);
                report.failed += 1;
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(e) => {
                log::warn!("clear: failed to remove {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }
    log::debug!(
        "cleared {}: {} removed, {} failed",
        root.display(),
        report.removed,
        report.failed
    );
    Ok(report)
}

/// Ids name files, so only filename-safe characters are allowed.
fn validate_id(id: &str) -> Result<(), MaskError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(MaskError::validation(format!("unusable mask id: {id:?}")))
    }
}
