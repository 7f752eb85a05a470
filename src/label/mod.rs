//! Nutrition label reading: text cleanup, section isolation and nutrient
//! value extraction from OCR output.

pub mod energy;
pub mod extract;
pub mod normalize;
pub mod numeral;

pub use extract::{ExtractedNutrients, NutrientExtractor, NutrientKey, NutrientMatch};
pub use normalize::{extract_analysis_section, normalize};
pub use numeral::{fix_ocr_number, parse_number};

/// High-level function: raw OCR text → nutrient values.
pub fn read_label_text(extractor: &NutrientExtractor, raw_text: &str) -> ExtractedNutrients {
    let text = normalize(raw_text);
    let section = extract_analysis_section(&text);

    crate::log(&format!(
        "Label text: {} chars, analysis section: {} chars",
        text.len(),
        section.len()
    ));

    extractor.extract(&text, section)
}
