//! Error types shared across the pipeline.
//!
//! Extraction misses are not errors: they show up as missing keys in
//! [`crate::label::ExtractedNutrients`].

use thiserror::Error;

use crate::label::NutrientKey;

/// A user-correctable problem with typed-in or extracted values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{0} is required and must be greater than zero")]
    MissingRequired(NutrientKey),
    #[error("protein, fat, fiber and moisture add up to {total:.1}% (more than 100%)")]
    TotalExceeds { total: f64 },
    #[error("values add up to more than 100% once ash is included (carbohydrates would be {carbs:.1}%)")]
    NegativeCarbs { carbs: f64 },
    #[error("energy must be greater than zero, got {0}")]
    NonPositiveEnergy(f64),
    #[error("weight must be greater than zero, got {0}")]
    NonPositiveWeight(f64),
}

/// The OCR step failed or produced nothing usable.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("could not encode image for OCR: {0}")]
    Encode(#[source] image::ImageError),
    #[error("tesseract executable not found")]
    EngineNotFound,
    #[error("OCR engine failed: {0}")]
    Engine(String),
    #[error("OCR I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no text recognized in the image")]
    EmptyText,
    #[error("no label photo attached")]
    NoPhoto,
}

impl RecognitionError {
    /// What the user can do about it.
    pub fn guidance(&self) -> &'static str {
        match self {
            RecognitionError::NoPhoto => "Take or choose a photo of the nutrition label first.",
            RecognitionError::EngineNotFound => {
                "Install Tesseract (with the eng and ita languages) or set tesseract_path in config.json. \
                 You can also enter the values manually."
            }
            _ => {
                "Try cropping to the nutrition table only, taking the photo with more light \
                 and holding the phone straight. You can also enter the values manually."
            }
        }
    }
}

/// A storage backend operation failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { key: String, needed: u64, limit: u64 },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Saving to or editing the catalog failed. Never fatal: the catalog on disk is
/// left as it was before the operation.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("could not store photo: {0}")]
    Image(#[source] StoreError),
    #[error("could not save the catalog: {0}")]
    Catalog(#[source] StoreError),
    #[error("no catalog entry at position {0}")]
    NoSuchEntry(usize),
    #[error("there is no analysis to save")]
    NothingToSave,
}

impl PersistenceError {
    /// True when the failure is the storage being full.
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            PersistenceError::Image(StoreError::QuotaExceeded { .. })
                | PersistenceError::Catalog(StoreError::QuotaExceeded { .. })
        )
    }
}
