//! OCR character-confusion correction for captured numbers.

/// Rewrites a captured numeral so common OCR confusions become digits.
///
/// `o` → `0`, `l`/`i` → `1`, `s` → `5` (any case), the first decimal comma
/// becomes a dot, then everything except ASCII digits and dots is dropped.
pub fn fix_ocr_number(raw: &str) -> String {
    let mut comma_seen = false;

    raw.chars()
        .filter_map(|c| match c {
            'o' | 'O' => Some('0'),
            'l' | 'L' | 'i' | 'I' => Some('1'),
            's' | 'S' => Some('5'),
            ',' if !comma_seen => {
                comma_seen = true;
                Some('.')
            }
            c if c.is_ascii_digit() || c == '.' => Some(c),
            _ => None,
        })
        .collect()
}

/// Corrects and parses a captured numeral. Returns `None` when no finite
/// number can be read.
///
/// Parsing reads the longest leading `digits[.digits]` prefix, so `"10.5.3"`
/// reads as `10.5`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let fixed = fix_ocr_number(raw);
    let prefix = leading_float(&fixed)?;
    prefix.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Longest prefix of `s` shaped like `\d*(\.\d*)?` that contains a digit.
fn leading_float(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            digits += 1;
        }
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }
    Some(s[..end].trim_end_matches('.'))
}
