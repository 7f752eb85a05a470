//! Application configuration.
//!
//! Loaded from config.json in the data directory. Every field has a default,
//! so a partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage limits applied to a photo before it is kept.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoLimits {
    /// Longest side in pixels; larger photos are downscaled
    pub max_side: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

/// Complete application configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Explicit path to the tesseract executable
    pub tesseract_path: Option<PathBuf>,
    /// Directory containing *.traineddata files
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract language set, e.g. "eng+ita"
    pub ocr_languages: String,
    /// Tesseract page segmentation mode
    pub page_segmentation_mode: u8,
    /// JPEG quality of the contrast-enhanced image handed to OCR
    pub ocr_jpeg_quality: u8,
    /// Front-of-pack photo limits
    pub front_photo: PhotoLimits,
    /// Nutrition label photo limits
    pub label_photo: PhotoLimits,
    /// Maximum bytes the key-value store may hold
    pub storage_quota_bytes: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            tessdata_dir: None,
            ocr_languages: "eng+ita".to_string(),
            page_segmentation_mode: 6,
            ocr_jpeg_quality: 95,
            front_photo: PhotoLimits {
                max_side: 800,
                quality: 80,
            },
            label_photo: PhotoLimits {
                max_side: 1500,
                quality: 90,
            },
            // Same order of magnitude as a browser's localStorage
            storage_quota_bytes: Some(5 * 1024 * 1024),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path` or returns defaults.
    pub fn load(path: &Path) -> Self {
        crate::log(&format!("Looking for config at: {}", path.display()));

        if !path.exists() {
            crate::log("config.json not found. Using default config.");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    config
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                    Self::default()
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
                Self::default()
            }
        }
    }
}
