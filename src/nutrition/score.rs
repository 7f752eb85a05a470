//! Calorie-normalised scoring of a food for a diabetic cat.
//!
//! Carbohydrates and protein are expressed as a share of metabolizable
//! energy (%ME) and per 100 kcal, then graded green / yellow / red.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::composition::{FoodComposition, FoodType};
use crate::error::InputError;

/// Modified Atwater factors (kcal per gram).
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 8.5;
const KCAL_PER_G_CARBS: f64 = 4.0;

// Grading thresholds
const CARBS_ME_GREEN: f64 = 12.0;
const CARBS_ME_YELLOW: f64 = 15.0;
const CARBS_PER_100KCAL_GREEN: f64 = 3.0;
const CARBS_PER_100KCAL_YELLOW: f64 = 5.0;
const PROTEIN_ME_GREEN: f64 = 40.0;
const PROTEIN_ME_YELLOW: f64 = 35.0;

/// Traffic-light grade. Gray means there was not enough data to grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Green,
    Yellow,
    Red,
    Gray,
}

impl Score {
    /// Short verdict title.
    pub fn title(&self) -> &'static str {
        match self {
            Score::Green => "EXCELLENT",
            Score::Yellow => "ACCEPTABLE",
            Score::Red => "NOT IDEAL",
            Score::Gray => "INSUFFICIENT DATA",
        }
    }

    /// One-line verdict explanation.
    pub fn summary(&self) -> &'static str {
        match self {
            Score::Green => "Great choice for a diabetic cat",
            Score::Yellow => "Fine, but there are better options",
            Score::Red => "Not ideal for a diabetic cat",
            Score::Gray => "More label data is needed to judge this food",
        }
    }
}

/// How much of the input was declared rather than estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Blob ids of the photos stored with a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRefs {
    pub front_image_id: Option<String>,
    pub label_image_id: Option<String>,
}

impl ImageRefs {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.front_image_id
            .iter()
            .chain(self.label_image_id.iter())
            .map(String::as_str)
    }
}

/// Result of analysing one food. Never modified once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub name: String,
    #[serde(rename = "type")]
    pub food_type: FoodType,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub moisture: f64,
    pub ash: f64,
    pub ash_estimated: bool,
    pub carbs_as_fed: f64,
    #[serde(rename = "carbsDMB")]
    pub carbs_dmb: f64,
    pub kcal_per_100g: f64,
    pub kcal_estimated: bool,
    #[serde(rename = "proteinME")]
    pub protein_me: f64,
    #[serde(rename = "fatME")]
    pub fat_me: f64,
    #[serde(rename = "carbsME")]
    pub carbs_me: f64,
    pub carbs_per_100kcal: f64,
    pub protein_per_100kcal: f64,
    pub carb_score: Score,
    pub protein_score: Score,
    pub overall_score: Score,
    pub confidence: Confidence,
    #[serde(flatten)]
    pub image_refs: ImageRefs,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// Copy of this result pointing at stored photos.
    pub fn with_images(&self, image_refs: ImageRefs) -> Self {
        Self {
            image_refs,
            ..self.clone()
        }
    }
}

/// Validates a composition and scores it.
///
/// Returns an [`InputError`] for missing required values and for inputs
/// that leave negative carbohydrates (anything adding up to more than 100%
/// once ash is included). Everything else produces a result, possibly gray
/// with low confidence.
pub fn analyze(food: &FoodComposition) -> Result<AnalysisResult, InputError> {
    food.check_values()?;

    let (ash, ash_estimated) = match food.declared_ash() {
        Some(ash) => (ash, false),
        None => (food.food_type.default_ash(), true),
    };

    let carbs_as_fed = 100.0 - (food.protein + food.fat + food.fiber + food.moisture + ash);
    if carbs_as_fed < 0.0 {
        return Err(InputError::NegativeCarbs {
            carbs: carbs_as_fed,
        });
    }

    let (kcal_per_100g, kcal_estimated) = match food.kcal_per_100g {
        Some(kcal) => (kcal, false),
        None => (
            KCAL_PER_G_PROTEIN * food.protein
                + KCAL_PER_G_FAT * food.fat
                + KCAL_PER_G_CARBS * carbs_as_fed,
            true,
        ),
    };

    let dry_matter = 100.0 - food.moisture;
    let carbs_dmb = carbs_as_fed / dry_matter * 100.0;
    let protein_me = KCAL_PER_G_PROTEIN * food.protein / kcal_per_100g * 100.0;
    let fat_me = KCAL_PER_G_FAT * food.fat / kcal_per_100g * 100.0;
    let carbs_me = KCAL_PER_G_CARBS * carbs_as_fed / kcal_per_100g * 100.0;
    let carbs_per_100kcal = carbs_as_fed / kcal_per_100g * 100.0;
    let protein_per_100kcal = food.protein / kcal_per_100g * 100.0;

    // Grading needs at least one of energy or ash from the label
    let (carb_score, protein_score) = if kcal_estimated && ash_estimated {
        (Score::Gray, Score::Gray)
    } else {
        (
            grade_carbs(carbs_me, carbs_per_100kcal),
            grade_protein(protein_me),
        )
    };

    let result = AnalysisResult {
        name: food.name.clone(),
        food_type: food.food_type,
        protein: food.protein,
        fat: food.fat,
        fiber: food.fiber,
        moisture: food.moisture,
        ash,
        ash_estimated,
        carbs_as_fed,
        carbs_dmb,
        kcal_per_100g,
        kcal_estimated,
        protein_me,
        fat_me,
        carbs_me,
        carbs_per_100kcal,
        protein_per_100kcal,
        carb_score,
        protein_score,
        overall_score: combine(carb_score, protein_score),
        confidence: confidence(kcal_estimated, ash_estimated),
        image_refs: ImageRefs::default(),
        timestamp: Utc::now(),
    };

    crate::log(&format!(
        "Analyzed '{}': carbs {:.1}%ME / {:.1}g per 100kcal ({:?}), protein {:.1}%ME ({:?}) -> {:?}, confidence {:?}",
        result.name,
        result.carbs_me,
        result.carbs_per_100kcal,
        result.carb_score,
        result.protein_me,
        result.protein_score,
        result.overall_score,
        result.confidence
    ));

    Ok(result)
}

/// Either carbohydrate metric can earn the better grade.
fn grade_carbs(carbs_me: f64, carbs_per_100kcal: f64) -> Score {
    if carbs_me <= CARBS_ME_GREEN || carbs_per_100kcal <= CARBS_PER_100KCAL_GREEN {
        Score::Green
    } else if carbs_me <= CARBS_ME_YELLOW || carbs_per_100kcal <= CARBS_PER_100KCAL_YELLOW {
        Score::Yellow
    } else {
        Score::Red
    }
}

fn grade_protein(protein_me: f64) -> Score {
    if protein_me >= PROTEIN_ME_GREEN {
        Score::Green
    } else if protein_me >= PROTEIN_ME_YELLOW {
        Score::Yellow
    } else {
        Score::Red
    }
}

/// Worst of the two grades; green only when both are green.
fn combine(carb: Score, protein: Score) -> Score {
    match (carb, protein) {
        (Score::Gray, _) | (_, Score::Gray) => Score::Gray,
        (Score::Green, Score::Green) => Score::Green,
        (Score::Red, _) | (_, Score::Red) => Score::Red,
        _ => Score::Yellow,
    }
}

fn confidence(kcal_estimated: bool, ash_estimated: bool) -> Confidence {
    match (kcal_estimated, ash_estimated) {
        (true, true) => Confidence::Low,
        (false, false) => Confidence::High,
        _ => Confidence::Medium,
    }
}
