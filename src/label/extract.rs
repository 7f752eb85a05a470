//! Per-nutrient pattern lists applied to normalized label text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::energy::{extract_kcal_per_100g, ENERGY_PATTERN, ENERGY_WITH_BASIS_PATTERN};
use super::numeral::parse_number;
use crate::log;

/// A value a pet food label can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientKey {
    Protein,
    Fat,
    Fiber,
    Ash,
    Moisture,
    Energy,
}

impl NutrientKey {
    /// All keys, in extraction order.
    pub const ALL: [NutrientKey; 6] = [
        NutrientKey::Protein,
        NutrientKey::Fat,
        NutrientKey::Fiber,
        NutrientKey::Ash,
        NutrientKey::Moisture,
        NutrientKey::Energy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientKey::Protein => "protein",
            NutrientKey::Fat => "fat",
            NutrientKey::Fiber => "fiber",
            NutrientKey::Ash => "ash",
            NutrientKey::Moisture => "moisture",
            NutrientKey::Energy => "energy",
        }
    }
}

impl fmt::Display for NutrientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pattern hit while reading a label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientMatch {
    pub nutrient_key: NutrientKey,
    /// Captured numeral before OCR correction
    pub raw_captured_value: String,
    /// Parsed value, `None` when the numeral could not be read
    pub numeric_value: Option<f64>,
    /// Whether the value passed the plausibility range and was kept
    pub accepted: bool,
}

/// Values read from one label. Absent fields were not found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedNutrients {
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub fiber: Option<f64>,
    pub ash: Option<f64>,
    pub moisture: Option<f64>,
    pub kcal_per_100g: Option<f64>,
    /// Every pattern hit that was evaluated, in evaluation order
    pub matches: Vec<NutrientMatch>,
}

impl ExtractedNutrients {
    pub fn get(&self, key: NutrientKey) -> Option<f64> {
        match key {
            NutrientKey::Protein => self.protein,
            NutrientKey::Fat => self.fat,
            NutrientKey::Fiber => self.fiber,
            NutrientKey::Ash => self.ash,
            NutrientKey::Moisture => self.moisture,
            NutrientKey::Energy => self.kcal_per_100g,
        }
    }

    fn set(&mut self, key: NutrientKey, value: f64) {
        let slot = match key {
            NutrientKey::Protein => &mut self.protein,
            NutrientKey::Fat => &mut self.fat,
            NutrientKey::Fiber => &mut self.fiber,
            NutrientKey::Ash => &mut self.ash,
            NutrientKey::Moisture => &mut self.moisture,
            NutrientKey::Energy => &mut self.kcal_per_100g,
        };
        *slot = Some(value);
    }

    /// Number of values found.
    pub fn found_count(&self) -> usize {
        NutrientKey::ALL
            .iter()
            .filter(|k| self.get(**k).is_some())
            .count()
    }

    /// Keys the user has to fill in by hand.
    pub fn missing(&self) -> Vec<NutrientKey> {
        NutrientKey::ALL
            .into_iter()
            .filter(|k| self.get(*k).is_none())
            .collect()
    }
}

/// Ordered patterns for one nutrient plus its plausibility check.
struct NutrientRule {
    key: NutrientKey,
    patterns: Vec<Regex>,
    plausible: fn(f64) -> bool,
}

// Number, captured last
const NUM: &str = r"(\d+(?:[.,]\d+)?)";
// Optional "(min)" / "max" marker between name and value
const MIN_MAX: &str = r"(?:\s*\(?\s*(?:min(?:imum)?|max(?:imum)?)\s*\)?\s*)?";
const CRUDE_IT: &str = r"(?:\s*(?:grezz[aeio]|grezzo|grezza|grezze|grezzi))?";
const CRUDE_EN: &str = r"(?:\s*(?:crude))?";
const SEP: &str = r"\s*[:\-]?\s*";

/// `<name><suffix><min/max><sep><number>`, percent sign optional.
fn labelled(name: &str, suffix: &str) -> String {
    format!(r"(?i){name}{suffix}{MIN_MAX}{SEP}{NUM}\s*%?")
}

fn strictly_positive(v: f64) -> bool {
    v > 0.0 && v < 100.0
}

fn non_negative(v: f64) -> bool {
    (0.0..100.0).contains(&v)
}

/// Reads nutrient values out of normalized label text.
///
/// Patterns are compiled once; build one extractor and reuse it.
pub struct NutrientExtractor {
    rules: Vec<NutrientRule>,
    energy_patterns: Vec<Regex>,
}

impl NutrientExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let crude_it_en = format!("{CRUDE_IT}{CRUDE_EN}");

        // Within each list, formal names come before abbreviations and
        // garbled fallbacks. Order is significant. Word boundaries are
        // ASCII-only, so an accented letter counts as a non-word character.
        let protein = [
            labelled(
                r"(?:(?-u:\b)cp(?-u:\b)|crude\s*protein|protein(?:e)?|proteine?|proteina)",
                &crude_it_en,
            ),
            format!(r"(?i)(?-u:\b)prot\.?{SEP}{NUM}\s*%?"),
        ];

        let fat = [
            labelled(r"(?:grassi?|grasso)", CRUDE_IT),
            labelled(r"(?:oli\s*(?:e|&)\s*grassi?)", CRUDE_IT),
            labelled(r"(?:crude\s*)?oils?\s*(?:and|&)\s*fats?", ""),
            labelled(r"(?:crude\s*fat|(?-u:\b)fat(?-u:\b))", ""),
            labelled(r"(?:lipid[ie]?|lipids?)", ""),
            labelled(r"materia\s+grassa", ""),
            labelled(r"tenore.*?grassa", ""),
        ];

        let fiber = [
            labelled(r"(?:fibra|fibre)", CRUDE_IT),
            labelled(r"(?:crude\s*fib(?:er|re)s?|fib(?:er|re)s?)", ""),
            // Bare "CF" only counts with a percent sign
            format!(r"(?i)(?-u:\b)cf(?-u:\b){MIN_MAX}{SEP}{NUM}\s*%"),
            format!(r"(?i)(?-u:\b)grezz[aei]{SEP}{NUM}\s*%?"),
        ];

        let ash = [
            labelled(r"(?:ceneri|cenere)", CRUDE_IT),
            labelled(r"(?:crude\s*ash|(?-u:\b)ash(?-u:\b))", ""),
            labelled(r"(?:materia\s+inorganica|inorganic\s*matter)", ""),
            labelled(r"in[o0]rg[a@]nic[a@]", ""),
            labelled(r"mat.*?in[o0]rg.*?", ""),
            labelled(r"in.{0,3}rg.{0,10}", ""),
        ];

        let moisture = [
            labelled(r"(?:umidit[aà]|umidita)", ""),
            labelled(r"(?:tenore\s*(?:d'|di)?\s*acqua|acqua)", ""),
            labelled(r"(?:moisture|(?-u:\b)water(?-u:\b))", ""),
        ];

        let rules = vec![
            Self::rule(NutrientKey::Protein, &protein, strictly_positive)?,
            Self::rule(NutrientKey::Fat, &fat, strictly_positive)?,
            Self::rule(NutrientKey::Fiber, &fiber, non_negative)?,
            Self::rule(NutrientKey::Ash, &ash, non_negative)?,
            Self::rule(NutrientKey::Moisture, &moisture, non_negative)?,
        ];

        let energy_patterns = vec![
            Regex::new(ENERGY_PATTERN)?,
            Regex::new(ENERGY_WITH_BASIS_PATTERN)?,
        ];

        Ok(Self {
            rules,
            energy_patterns,
        })
    }

    fn rule(
        key: NutrientKey,
        sources: &[String],
        plausible: fn(f64) -> bool,
    ) -> Result<NutrientRule, regex::Error> {
        let patterns = sources
            .iter()
            .map(|s| Regex::new(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NutrientRule {
            key,
            patterns,
            plausible,
        })
    }

    /// Extracts nutrient values.
    ///
    /// Percent nutrients are read from `analysis_section`; energy from the
    /// whole `normalized` text because it is often printed outside the table.
    /// Never fails: values that cannot be found or fail the plausibility
    /// check are simply absent.
    pub fn extract(&self, normalized: &str, analysis_section: &str) -> ExtractedNutrients {
        let mut found = ExtractedNutrients::default();

        for rule in &self.rules {
            match self.first_plausible(rule, analysis_section, &mut found.matches) {
                Some(value) => {
                    log(&format!("Found {}: {}", rule.key, value));
                    found.set(rule.key, value);
                }
                None => log(&format!("NOT found: {}", rule.key)),
            }
        }

        match extract_kcal_per_100g(normalized, &self.energy_patterns) {
            Some((kcal, candidate)) => {
                log(&format!("Found energy (per 100g): {}", kcal));
                found.matches.push(NutrientMatch {
                    nutrient_key: NutrientKey::Energy,
                    raw_captured_value: candidate.matched,
                    numeric_value: Some(kcal),
                    accepted: true,
                });
                found.set(NutrientKey::Energy, kcal);
            }
            None => log("NOT found: energy"),
        }

        log(&format!(
            "Extraction complete: {} of {} values found",
            found.found_count(),
            NutrientKey::ALL.len()
        ));

        found
    }

    /// Tries the rule's patterns in declared order; the first one whose
    /// captured value parses and is plausible wins.
    fn first_plausible(
        &self,
        rule: &NutrientRule,
        text: &str,
        matches: &mut Vec<NutrientMatch>,
    ) -> Option<f64> {
        for pattern in &rule.patterns {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            // Value is always the last capture group
            let Some(captured) = caps.get(caps.len() - 1) else {
                continue;
            };

            let value = parse_number(captured.as_str());
            let accepted = value.is_some_and(rule.plausible);
            matches.push(NutrientMatch {
                nutrient_key: rule.key,
                raw_captured_value: captured.as_str().to_string(),
                numeric_value: value,
                accepted,
            });

            if accepted {
                return value;
            }
        }
        None
    }
}
