#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{Dict, error::ScoringError};

/// Unit suffixes tolerated after a numeric parameter value.
const UNIT_SUFFIXES: &[&str] = &[
    "磅", "pt", "px", "cm", "厘米", "mm", "毫米", "字符", "%", "°", "度", "倍", "行", "号",
];

/// Guarded, typed reads over a rule's parameter bag.
///
/// Every lookup treats a missing key and a blank value the same way: not
/// found. Nothing here panics; `require*` turn absence into
/// [`ScoringError::MissingParameter`].
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    /// the underlying name/value pairs
    dict: &'a Dict,
}

impl<'a> Params<'a> {
    /// Wraps a parameter dictionary.
    pub fn new(dict: &'a Dict) -> Self {
        Self { dict }
    }

    /// The underlying dictionary.
    pub fn dict(&self) -> &'a Dict {
        self.dict
    }

    /// Trimmed value of `key` when present and not blank.
    pub fn try_get(&self, key: &str) -> Option<&'a str> {
        self.dict
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Value of `key` parsed as an integer.
    pub fn try_int(&self, key: &str) -> Option<i64> {
        self.try_get(key).and_then(|v| v.parse::<i64>().ok())
    }

    /// Value of `key` parsed as a single-precision float.
    pub fn try_float(&self, key: &str) -> Option<f32> {
        self.try_get(key).and_then(|v| v.parse::<f32>().ok())
    }

    /// Value of `key` parsed as a double-precision float.
    pub fn try_double(&self, key: &str) -> Option<f64> {
        self.try_get(key).and_then(|v| v.parse::<f64>().ok())
    }

    /// Value of `key` read as a measurement, tolerating a unit suffix such as
    /// `磅` or `pt`.
    pub fn try_number(&self, key: &str) -> Option<f64> {
        self.try_get(key).and_then(parse_number)
    }

    /// Value of `key` read as a yes/no flag.
    pub fn try_bool(&self, key: &str) -> Option<bool> {
        match self.try_get(key)?.to_lowercase().as_str() {
            "true" | "yes" | "1" | "是" | "显示" | "on" => Some(true),
            "false" | "no" | "0" | "否" | "不显示" | "隐藏" | "off" => Some(false),
            _ => None,
        }
    }

    /// Value of the first key in `keys` that is present.
    pub fn first_of(&self, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|k| self.try_get(k))
    }

    /// Like [`Params::try_get`] but absence is an error naming the key.
    pub fn require(&self, key: &str) -> Result<&'a str, ScoringError> {
        self.try_get(key).ok_or_else(|| ScoringError::missing(key))
    }

    /// Like [`Params::first_of`] but absence is an error naming every alias.
    pub fn require_any(&self, keys: &[&str]) -> Result<&'a str, ScoringError> {
        self.first_of(keys)
            .ok_or_else(|| ScoringError::missing(keys.join(" or ")))
    }

    /// Required integer parameter.
    pub fn require_int(&self, key: &str) -> Result<i64, ScoringError> {
        self.try_int(key).ok_or_else(|| ScoringError::missing(key))
    }

    /// Required measurement parameter.
    pub fn require_number(&self, key: &str) -> Result<f64, ScoringError> {
        self.try_number(key).ok_or_else(|| ScoringError::missing(key))
    }

    /// Resolves a 1-based index parameter against `count` items.
    ///
    /// Absent means "any" (`Ok(None)`); `-1` means the last item; anything
    /// else outside `1..=count` is an extraction fault. The result is
    /// 0-based.
    pub fn index(&self, key: &str, count: usize) -> Result<Option<usize>, ScoringError> {
        let Some(raw) = self.try_get(key) else {
            return Ok(None);
        };
        let n = raw
            .parse::<i64>()
            .map_err(|_| ScoringError::missing(key))?;
        resolve_index(key, n, count).map(Some)
    }

    /// Like [`Params::index`] but an absent key selects the first item.
    pub fn index_or_first(&self, key: &str, count: usize) -> Result<usize, ScoringError> {
        match self.index(key, count)? {
            Some(i) => Ok(i),
            None if count > 0 => Ok(0),
            None => Err(ScoringError::fault(format!("{key}: nothing to select"))),
        }
    }

    /// Splits a list-valued parameter (`1,2,3`, `A；B`, `A B`) into trimmed
    /// items.
    pub fn list(&self, key: &str) -> Vec<&'a str> {
        self.try_get(key).map(split_list).unwrap_or_default()
    }

    /// Integer indices carried by a list-valued parameter, resolved against
    /// `count` like [`Params::index`].
    pub fn index_list(&self, key: &str, count: usize) -> Result<Vec<usize>, ScoringError> {
        self.list(key)
            .into_iter()
            .map(|item| {
                let n = item
                    .parse::<i64>()
                    .map_err(|_| ScoringError::missing(key))?;
                resolve_index(key, n, count)
            })
            .collect()
    }
}

/// Turns a 1-based (or `-1`) index into a 0-based one.
fn resolve_index(key: &str, n: i64, count: usize) -> Result<usize, ScoringError> {
    if n == -1 && count > 0 {
        return Ok(count - 1);
    }
    if n >= 1 && (n as usize) <= count {
        return Ok(n as usize - 1);
    }
    Err(ScoringError::fault(format!(
        "{key} {n} is out of range (found {count})"
    )))
}

/// Splits a free-form list on the separators authors actually use.
pub fn split_list(value: &str) -> Vec<&str> {
    value
        .split([',', '，', ';', '；', '、', '|'])
        .flat_map(|s| s.split_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses a number that may carry a trailing unit suffix.
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<f64>() {
        return Some(n);
    }
    let end = value
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    let (number, rest) = value.split_at(end);
    let rest = rest.trim();
    if !UNIT_SUFFIXES.iter().any(|u| rest.eq_ignore_ascii_case(u)) {
        return None;
    }
    number.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict(pairs: &[(&str, &str)]) -> Dict {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn blank_values_are_not_found() {
        let d = dict(&[("A", "  "), ("B", " x ")]);
        let p = Params::new(&d);
        assert_eq!(p.try_get("A"), None);
        assert_eq!(p.try_get("B"), Some("x"));
        assert_eq!(p.try_get("C"), None);
    }

    #[test]
    fn numbers_tolerate_units() {
        assert_eq!(parse_number("1.5磅"), Some(1.5));
        assert_eq!(parse_number("12 pt"), Some(12.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("12 apples"), None);
    }

    #[test]
    fn minus_one_selects_last() {
        let d = dict(&[("ParagraphNumber", "-1"), ("Bad", "9")]);
        let p = Params::new(&d);
        assert_eq!(p.index("ParagraphNumber", 4).ok().flatten(), Some(3));
        assert!(p.index("Bad", 4).is_err());
        assert_eq!(p.index("Missing", 4).ok().flatten(), None);
    }
}
