//! MiaoCarb
//!
//! Estimates whether a pet food suits a diabetic cat. Nutrition label values are
//! read from a photo (OCR) or typed in, scored on a calorie-normalised basis and
//! saved to a local catalog together with the photos.

pub mod catalog;
pub mod config;
pub mod error;
pub mod label;
pub mod nutrition;
pub mod ocr;
pub mod paths;
pub mod profile;
pub mod session;
pub mod store;

pub use catalog::{Catalog, CatalogEntry};
pub use error::{InputError, PersistenceError, RecognitionError, StoreError};
pub use label::{ExtractedNutrients, NutrientExtractor, NutrientKey};
pub use nutrition::{analyze, AnalysisResult, Confidence, FoodComposition, FoodType, Score};
pub use profile::{CatProfile, Goal, NeuterStatus};
pub use session::{Session, SessionStage};

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to stderr and to the log file with timestamp.
///
/// Failures to open or write the log file are ignored.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    let log_path = paths::get_logs_dir().join("miaocarb.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
