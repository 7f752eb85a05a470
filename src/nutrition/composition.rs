use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InputError;
use crate::label::{ExtractedNutrients, NutrientKey};

/// Dry kibble or wet (canned/pouch) food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodType {
    Dry,
    Wet,
}

impl FoodType {
    /// Ash percentage assumed when the label does not declare it.
    pub fn default_ash(&self) -> f64 {
        match self {
            FoodType::Dry => 5.0,
            FoodType::Wet => 2.0,
        }
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodType::Dry => f.write_str("dry"),
            FoodType::Wet => f.write_str("wet"),
        }
    }
}

/// Label values confirmed by the user, as-fed percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodComposition {
    pub name: String,
    #[serde(rename = "type")]
    pub food_type: FoodType,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub moisture: f64,
    /// Estimated from the food type when absent
    pub ash: Option<f64>,
    /// Estimated from the macronutrients when absent
    pub kcal_per_100g: Option<f64>,
}

impl FoodComposition {
    /// Pre-fills a composition from label extraction. Required values that
    /// were not found are left at 0.0, which validation rejects until the
    /// user fills them in.
    pub fn prefill(name: &str, food_type: FoodType, extracted: &ExtractedNutrients) -> Self {
        Self {
            name: name.to_string(),
            food_type,
            protein: extracted.protein.unwrap_or(0.0),
            fat: extracted.fat.unwrap_or(0.0),
            fiber: extracted.fiber.unwrap_or(0.0),
            moisture: extracted.moisture.unwrap_or(0.0),
            ash: extracted.ash,
            kcal_per_100g: extracted.kcal_per_100g,
        }
    }

    /// Checks the values a user must provide: protein, fat, fiber and
    /// moisture must be positive and add up to at most 100%, and a declared
    /// energy value must be positive.
    pub fn validate(&self) -> Result<(), InputError> {
        self.check_values()?;

        let total = self.protein + self.fat + self.fiber + self.moisture;
        if total > 100.0 {
            return Err(InputError::TotalExceeds { total });
        }
        Ok(())
    }

    /// Per-field checks only. Totals are left to the carbohydrate
    /// calculation, which also accounts for ash.
    pub fn check_values(&self) -> Result<(), InputError> {
        let required = [
            (NutrientKey::Protein, self.protein),
            (NutrientKey::Fat, self.fat),
            (NutrientKey::Fiber, self.fiber),
            (NutrientKey::Moisture, self.moisture),
        ];
        for (key, value) in required {
            if !value.is_finite() || value <= 0.0 {
                return Err(InputError::MissingRequired(key));
            }
        }

        if let Some(kcal) = self.kcal_per_100g {
            if !kcal.is_finite() || kcal <= 0.0 {
                return Err(InputError::NonPositiveEnergy(kcal));
            }
        }
        Ok(())
    }

    /// Declared ash, if it is a usable value.
    pub fn declared_ash(&self) -> Option<f64> {
        // A blank or zero field counts as not declared
        self.ash.filter(|a| a.is_finite() && *a > 0.0)
    }
}
