//! Energy statement parsing: "4500 kcal/kg", "1883 kJ/100g", "ME 380 kcal".

use regex::Regex;

use super::numeral::parse_number;

/// Label keywords that may precede an energy value, then value, unit and an
/// optional "/basis" or "per basis".
pub(super) const ENERGY_PATTERN: &str = r"(?i)(?:energia|energy|valore\s+energetico|caloric\s+content|metabolizzabile|metabolizable\s+energy|me)?\s*[:\-]?\s*(\d+(?:[.,]\d+)?)\s*(kcal|kj)\s*(?:/\s*(kg|100\s*g|100g)|\s+per\s+(kg|100\s*g|100g))?";

/// Value, unit and mandatory "/basis" (catches "xxxx kcal/kg me").
pub(super) const ENERGY_WITH_BASIS_PATTERN: &str =
    r"(?i)(\d+(?:[.,]\d+)?)\s*(kcal|kj)\s*/\s*(kg|100\s*g|100g)";

const KJ_PER_KCAL: f64 = 4.184;
const MIN_KCAL_PER_100G: f64 = 10.0;
const MAX_KCAL_PER_100G: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    Kcal,
    Kj,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyBasis {
    PerKg,
    Per100g,
}

/// One energy statement found in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyCandidate {
    pub raw_value: f64,
    pub unit: EnergyUnit,
    pub basis: Option<EnergyBasis>,
    pub matched: String,
}

impl EnergyCandidate {
    /// Preference score: explicit basis first, kcal over kJ, then
    /// basis-less values that sit in a typical range.
    pub fn score(&self) -> u32 {
        let mut score = 0;
        match self.basis {
            Some(EnergyBasis::Per100g) => score += 50,
            Some(EnergyBasis::PerKg) => score += 40,
            None => {
                // ~250-500 kcal/100g dry, ~2500-5000 kcal/kg
                if (50.0..=700.0).contains(&self.raw_value) {
                    score += 15;
                }
                if (1500.0..=6000.0).contains(&self.raw_value) {
                    score += 12;
                }
            }
        }
        if self.unit == EnergyUnit::Kcal {
            score += 10;
        }
        score
    }

    /// Converts to kcal per 100 g. Without a stated basis, values above 700
    /// are taken as per kg.
    pub fn kcal_per_100g(&self) -> f64 {
        let kcal = match self.unit {
            EnergyUnit::Kcal => self.raw_value,
            EnergyUnit::Kj => self.raw_value / KJ_PER_KCAL,
        };
        match self.basis {
            Some(EnergyBasis::PerKg) => kcal / 10.0,
            Some(EnergyBasis::Per100g) => kcal,
            None if kcal > 700.0 => kcal / 10.0,
            None => kcal,
        }
    }
}

fn parse_basis(raw: &str) -> Option<EnergyBasis> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.to_lowercase().as_str() {
        "kg" => Some(EnergyBasis::PerKg),
        "100g" => Some(EnergyBasis::Per100g),
        _ => None,
    }
}

/// Collects every energy statement matched by `patterns`, in pattern order
/// then text order.
pub fn find_candidates(text: &str, patterns: &[Regex]) -> Vec<EnergyCandidate> {
    let mut candidates = Vec::new();

    for pattern in patterns {
        for caps in pattern.captures_iter(text) {
            let Some(raw_value) = caps.get(1).and_then(|m| parse_number(m.as_str())) else {
                continue;
            };
            let unit = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
                Some(u) if u == "kj" => EnergyUnit::Kj,
                _ => EnergyUnit::Kcal,
            };
            let basis = caps
                .get(3)
                .or_else(|| caps.get(4))
                .and_then(|m| parse_basis(m.as_str()));

            candidates.push(EnergyCandidate {
                raw_value,
                unit,
                basis,
                matched: caps
                    .get(0)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            });
        }
    }

    candidates
}

/// Picks the best-scoring candidate; on a tie the earliest one wins.
pub fn best_candidate(candidates: &[EnergyCandidate]) -> Option<&EnergyCandidate> {
    let mut best: Option<&EnergyCandidate> = None;
    for candidate in candidates {
        if best.is_none_or(|b| candidate.score() > b.score()) {
            best = Some(candidate);
        }
    }
    best
}

/// Extracts kcal per 100 g from normalized text, rounded to one decimal.
/// Values outside 10..=800 are rejected.
pub fn extract_kcal_per_100g(text: &str, patterns: &[Regex]) -> Option<(f64, EnergyCandidate)> {
    let candidates = find_candidates(text, patterns);
    let best = best_candidate(&candidates)?;

    crate::log(&format!(
        "Energy candidate: \"{}\" -> raw={} {:?}/{:?}",
        best.matched, best.raw_value, best.unit, best.basis
    ));

    let kcal = best.kcal_per_100g();
    if !(MIN_KCAL_PER_100G..=MAX_KCAL_PER_100G).contains(&kcal) {
        return None;
    }

    Some(((kcal * 10.0).round() / 10.0, best.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<Regex> {
        vec![
            Regex::new(ENERGY_PATTERN).unwrap(),
            Regex::new(ENERGY_WITH_BASIS_PATTERN).unwrap(),
        ]
    }

    fn kcal(text: &str) -> Option<f64> {
        extract_kcal_per_100g(text, &patterns()).map(|(k, _)| k)
    }

    #[test]
    fn test_kcal_per_100g() {
        assert_eq!(kcal("energia 450 kcal/100g"), Some(450.0));
        assert_eq!(kcal("450 kcal / 100 g"), Some(450.0));
    }

    #[test]
    fn test_kcal_per_kg() {
        assert_eq!(kcal("energia metabolizzabile: 4500 kcal/kg"), Some(450.0));
        assert_eq!(kcal("4500 kcal per kg"), Some(450.0));
    }

    #[test]
    fn test_kj_per_100g() {
        let value = kcal("1883 kj/100g").unwrap();
        assert!((value - 450.0).abs() < 0.1);
    }

    #[test]
    fn test_bare_large_value_is_per_kg() {
        assert_eq!(kcal("energy 3800 kcal"), Some(380.0));
        assert_eq!(kcal("energy 95 kcal"), Some(95.0));
    }

    #[test]
    fn test_explicit_basis_preferred() {
        // Bare "80 kcal" scores 25, "/100g" scores 60
        assert_eq!(kcal("80 kcal ... 95 kcal/100g"), Some(95.0));
        // kcal/100g beats kJ/100g
        assert_eq!(kcal("1591 kj/100g 380 kcal/100g"), Some(380.0));
    }

    #[test]
    fn test_tie_keeps_earliest() {
        assert_eq!(kcal("90 kcal/100g 120 kcal/100g"), Some(90.0));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(kcal("5 kcal/100g"), None);
        assert_eq!(kcal("9000 kcal/100g"), None);
    }

    #[test]
    fn test_no_energy() {
        assert_eq!(kcal("proteine 10% grassi 5%"), None);
    }

    #[test]
    fn test_candidate_scores() {
        let c = EnergyCandidate {
            raw_value: 3800.0,
            unit: EnergyUnit::Kcal,
            basis: None,
            matched: String::new(),
        };
        assert_eq!(c.score(), 22);

        let c = EnergyCandidate {
            raw_value: 1883.0,
            unit: EnergyUnit::Kj,
            basis: Some(EnergyBasis::Per100g),
            matched: String::new(),
        };
        assert_eq!(c.score(), 50);
    }
}
