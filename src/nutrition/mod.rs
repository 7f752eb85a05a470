//! Food scoring: composition input, derived metrics and verdict.

pub mod advice;
pub mod composition;
pub mod score;

pub use advice::{advisories, Advisory};
pub use composition::{FoodComposition, FoodType};
pub use score::{analyze, AnalysisResult, Confidence, ImageRefs, Score};
