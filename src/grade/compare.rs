#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::vocab::color_candidates;

/// Tolerance for measurement-like quantities (font sizes, spacing, widths).
pub const MEASURE_EPSILON: f64 = 0.1;
/// Tolerance for angle-like quantities and page margins in points.
pub const COARSE_EPSILON: f64 = 1.0;

/// Trimmed, case-insensitive text equality. Two absent values are equal; an
/// absent value never equals a present one.
pub fn text_equals(a: Option<&str>, b: Option<&str>) -> bool {
    text_equals_with(a, b, true)
}

/// [`text_equals`] with explicit case handling.
pub fn text_equals_with(a: Option<&str>, b: Option<&str>, ignore_case: bool) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            let (a, b) = (a.trim(), b.trim());
            if ignore_case {
                a.to_lowercase() == b.to_lowercase()
            } else {
                a == b
            }
        }
        _ => false,
    }
}

/// Case-insensitive substring test; false when either side is absent or
/// empty.
pub fn text_contains(haystack: Option<&str>, needle: Option<&str>) -> bool {
    text_contains_with(haystack, needle, true)
}

/// [`text_contains`] with explicit case handling.
pub fn text_contains_with(haystack: Option<&str>, needle: Option<&str>, ignore_case: bool) -> bool {
    match (haystack, needle) {
        (Some(h), Some(n)) if !h.is_empty() && !n.is_empty() => {
            if ignore_case {
                h.to_lowercase().contains(&n.to_lowercase())
            } else {
                h.contains(n)
            }
        }
        _ => false,
    }
}

/// Absolute-difference numeric equality.
pub fn number_equals(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon + f64::EPSILON
}

/// Colour equivalence across spellings: `#FF0000`, `ff0000`, `FFFF0000`
/// (ARGB) and named colours (`red`, `红色`) all meet when they can denote the
/// same RGB value.
pub fn color_equals(a: &str, b: &str) -> bool {
    let (ca, cb) = (color_candidates(a), color_candidates(b));
    if ca.is_empty() || cb.is_empty() {
        return text_equals(Some(a), Some(b));
    }
    ca.iter().any(|x| cb.contains(x))
}

/// Normalises text for content comparison: collapses runs of whitespace.
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
