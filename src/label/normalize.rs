//! Cleanup of raw OCR text before pattern matching.

/// Headers that open the guaranteed-analysis table.
const SECTION_ANCHORS: &[&str] = &[
    "componenti analitici",
    "costituenti analitici",
    "analytical constituents",
    "guaranteed analysis",
    "typical analysis",
    "analysis:",
];

/// Headers of the sections that usually follow the analysis table.
const SECTION_STOPS: &[&str] = &[
    "additivi",
    "additives",
    "composizione",
    "composition",
    "ingredienti",
    "ingredients",
    "istruzioni",
    "feeding",
    "ration",
];

/// Normalizes raw recognized text.
///
/// Lower-cases, unifies apostrophes, undoes line-wrap hyphenation, drops
/// standalone hyphens and collapses all whitespace to single spaces.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();

    let mut text = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            '\u{2019}' | '\u{2018}' | '`' => text.push('\''),
            _ => text.push(c),
        }
    }

    let text = remove_wrap_hyphens(&text);
    let text = remove_standalone_hyphens(&text);

    // Whitespace runs (newlines and tabs included) become one space
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deletes every `-` followed by whitespace, together with that whitespace.
fn remove_wrap_hyphens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '-' && chars.peek().is_some_and(|n| n.is_whitespace()) {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            continue;
        }
        out.push(c);
    }

    out
}

/// Replaces whitespace-hyphen-whitespace with a single space.
fn remove_standalone_hyphens(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            let mut j = i;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && chars[j] == '-' {
                let mut k = j + 1;
                while k < chars.len() && chars[k].is_whitespace() {
                    k += 1;
                }
                if k > j + 1 {
                    out.push(' ');
                    i = k;
                    continue;
                }
            }
            out.extend(&chars[i..j]);
            i = j;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Returns the slice of `text` that most likely holds the analytical
/// constituents, or the whole text when no section header is found.
pub fn extract_analysis_section(text: &str) -> &str {
    let Some(start) = SECTION_ANCHORS
        .iter()
        .filter_map(|anchor| text.find(anchor))
        .min()
    else {
        return text;
    };

    // Anchors are ASCII, so start + 1 is a char boundary
    let end = SECTION_STOPS
        .iter()
        .filter_map(|stop| text[start + 1..].find(stop).map(|i| i + start + 1))
        .min()
        .unwrap_or(text.len());

    &text[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_collapses_whitespace() {
        assert_eq!(
            normalize("  Protein\t30%\n\nFAT   12 %\r\n"),
            "protein 30% fat 12 %"
        );
    }

    #[test]
    fn test_normalize_unifies_apostrophes() {
        assert_eq!(normalize("Tenore d\u{2019}acqua"), "tenore d'acqua");
        assert_eq!(normalize("d\u{2018}acqua d`acqua"), "d'acqua d'acqua");
    }

    #[test]
    fn test_normalize_joins_wrapped_words() {
        assert_eq!(normalize("Protei-\nne grezze 11%"), "proteine grezze 11%");
        assert_eq!(normalize("umi- dità 78%"), "umidità 78%");
    }

    #[test]
    fn test_normalize_keeps_inner_hyphens() {
        assert_eq!(normalize("omega-3 0,5%"), "omega-3 0,5%");
    }

    #[test]
    fn test_standalone_hyphen_removed() {
        assert_eq!(remove_standalone_hyphens("fat \t-\n 12"), "fat 12");
        assert_eq!(remove_standalone_hyphens("a -b"), "a -b");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn test_section_between_anchor_and_stop() {
        let text = "brand x composizione: pollo 60% componenti analitici: proteine 10% grassi 5% additivi: vitamina d3";
        assert_eq!(
            extract_analysis_section(text),
            "componenti analitici: proteine 10% grassi 5% "
        );
    }

    #[test]
    fn test_section_earliest_anchor_wins() {
        let text = "typical analysis protein 30% guaranteed analysis protein 40%";
        assert_eq!(extract_analysis_section(text), text);
    }

    #[test]
    fn test_section_runs_to_end_without_stop() {
        let text = "intro analytical constituents: protein 30% fat 12%";
        assert_eq!(
            extract_analysis_section(text),
            "analytical constituents: protein 30% fat 12%"
        );
    }

    #[test]
    fn test_section_falls_back_to_full_text() {
        let text = "protein 30% fat 12% ingredients: chicken";
        assert_eq!(extract_analysis_section(text), text);
    }
}
