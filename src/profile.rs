//! Cat profile and daily energy / portion calculation.

use serde::{Deserialize, Serialize};

use crate::error::{InputError, StoreError};
use crate::store::{get_json, set_json, KeyValueStore};

/// Store key of the single saved profile.
pub const PROFILE_KEY: &str = "catProfile";

const DEFAULT_NAME: &str = "Cat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeuterStatus {
    Neutered,
    Intact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    Maintenance,
    WeightLoss,
}

/// Resting and target daily energy, kcal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyRequirement {
    pub rer: f64,
    pub target_kcal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatProfile {
    pub name: String,
    pub current_weight: f64,
    pub ideal_weight: f64,
    pub status: NeuterStatus,
    pub goal: Goal,
    pub on_insulin: bool,
    /// Rounded to whole kcal
    pub target_kcal: f64,
    /// Rounded to whole kcal
    #[serde(rename = "RER")]
    pub rer: f64,
}

impl CatProfile {
    /// Builds a profile and computes its energy targets.
    ///
    /// An empty name becomes "Cat" and a missing ideal weight defaults to the
    /// current weight. Weights must be positive.
    pub fn new(
        name: &str,
        current_weight: f64,
        ideal_weight: Option<f64>,
        status: NeuterStatus,
        goal: Goal,
        on_insulin: bool,
    ) -> Result<Self, InputError> {
        let ideal_weight = ideal_weight.unwrap_or(current_weight);
        for weight in [current_weight, ideal_weight] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(InputError::NonPositiveWeight(weight));
            }
        }

        let name = name.trim();
        let mut profile = Self {
            name: if name.is_empty() {
                DEFAULT_NAME.to_string()
            } else {
                name.to_string()
            },
            current_weight,
            ideal_weight,
            status,
            goal,
            on_insulin,
            target_kcal: 0.0,
            rer: 0.0,
        };

        let energy = daily_energy_requirement(&profile);
        profile.rer = energy.rer.round();
        profile.target_kcal = energy.target_kcal.round();
        Ok(profile)
    }

    /// Grams of a food that meet the stored daily target.
    pub fn daily_portion(&self, kcal_per_100g: f64) -> f64 {
        grams_per_day(self.target_kcal, kcal_per_100g)
    }

    /// Loads the saved profile, if any.
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        get_json(store, PROFILE_KEY)
    }

    /// Saves this profile, replacing any previous one.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        set_json(store, PROFILE_KEY, self)?;
        crate::log(&format!(
            "Profile saved: {} ({} kg), target {} kcal/day",
            self.name, self.current_weight, self.target_kcal
        ));
        Ok(())
    }

    /// Removes the saved profile. Catalog entries are kept.
    pub fn delete(store: &dyn KeyValueStore) -> Result<(), StoreError> {
        store.remove(PROFILE_KEY)?;
        crate::log("Profile deleted");
        Ok(())
    }
}

/// RER = 70 * weight^0.75, with the ideal weight used when losing weight.
/// The target is 0.8 RER for weight loss, otherwise 1.2 RER neutered and
/// 1.4 RER intact. Values are not rounded.
pub fn daily_energy_requirement(profile: &CatProfile) -> EnergyRequirement {
    let weight = match profile.goal {
        Goal::WeightLoss => profile.ideal_weight,
        Goal::Maintenance => profile.current_weight,
    };
    let rer = 70.0 * weight.powf(0.75);

    let factor = match (profile.goal, profile.status) {
        (Goal::WeightLoss, _) => 0.8,
        (Goal::Maintenance, NeuterStatus::Neutered) => 1.2,
        (Goal::Maintenance, NeuterStatus::Intact) => 1.4,
    };

    EnergyRequirement {
        rer,
        target_kcal: factor * rer,
    }
}

pub fn grams_per_day(target_kcal: f64, kcal_per_100g: f64) -> f64 {
    target_kcal / kcal_per_100g * 100.0
}
