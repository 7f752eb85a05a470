use super::composition::FoodType;
use super::score::{AnalysisResult, Score};
use crate::profile::CatProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// Good dry food is still calorie dense
    WeighDryFood,
    ConsultVetOnInsulin,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::WeighDryFood => {
                "Dry food is calorie dense: always weigh portions, never free-feed."
            }
            Advisory::ConsultVetOnInsulin => {
                "Your cat is on insulin: consult the vet before changing diet, doses may need adjusting."
            }
        }
    }
}

/// Extra notes shown next to a verdict.
pub fn advisories(result: &AnalysisResult, profile: Option<&CatProfile>) -> Vec<Advisory> {
    let mut notes = Vec::new();
    if result.food_type == FoodType::Dry && result.overall_score == Score::Green {
        notes.push(Advisory::WeighDryFood);
    }
    if profile.is_some_and(|p| p.on_insulin) {
        notes.push(Advisory::ConsultVetOnInsulin);
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{analyze, FoodComposition};
    use crate::profile::{Goal, NeuterStatus};

    fn dry_green() -> AnalysisResult {
        analyze(&FoodComposition {
            name: "Kibble".to_string(),
            food_type: FoodType::Dry,
            protein: 50.0,
            fat: 20.0,
            fiber: 2.0,
            moisture: 8.0,
            ash: Some(9.0),
            kcal_per_100g: Some(420.0),
        })
        .unwrap()
    }

    #[test]
    fn test_dry_green_gets_weighing_note() {
        let result = dry_green();
        assert_eq!(result.overall_score, Score::Green);
        assert_eq!(advisories(&result, None), vec![Advisory::WeighDryFood]);
    }

    #[test]
    fn test_insulin_note() {
        let profile =
            CatProfile::new("Micio", 5.0, None, NeuterStatus::Neutered, Goal::Maintenance, true)
                .unwrap();
        let notes = advisories(&dry_green(), Some(&profile));
        assert_eq!(
            notes,
            vec![Advisory::WeighDryFood, Advisory::ConsultVetOnInsulin]
        );
    }

    #[test]
    fn test_wet_food_no_notes() {
        let mut result = dry_green();
        result.food_type = FoodType::Wet;
        assert!(advisories(&result, None).is_empty());
    }
}
