#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Maps the free-form names question designers give operation points onto
//! canonical rule-type tags.

use crate::model::OperationPoint;

/// A keyword rule: every listed keyword must occur in the name for the tag
/// to apply.
pub type KeywordRule = (&'static [&'static str], &'static str);

/// Fallback mapping shared by every document kind.
pub const GENERIC_KEYWORDS: &[KeywordRule] = &[
    (&["Font"], "SetFont"),
    (&["Color"], "SetColor"),
    (&["Size"], "SetSize"),
    (&["Insert"], "Insert"),
    (&["Delete"], "Delete"),
];

/// First tag in `rules` whose keywords all occur in `name` (case-sensitive,
/// order matters).
pub fn match_keywords(rules: &[KeywordRule], name: &str) -> Option<&'static str> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().all(|k| name.contains(k)))
        .map(|(_, tag)| *tag)
}

/// Keyword mapping for one document kind: kind-specific rules, then the
/// generic rules, then the literal name.
pub fn map_name(kind_rules: &[KeywordRule], name: &str) -> String {
    match_keywords(kind_rules, name)
        .or_else(|| match_keywords(GENERIC_KEYWORDS, name))
        .map_or_else(|| name.to_string(), str::to_string)
}

/// Resolves the rule-type tag for an operation point.
///
/// An explicit tag wins; a display name that already is a registered tag is
/// used as is; otherwise the name goes through keyword mapping.
pub fn resolve_rule_type(
    point: &OperationPoint,
    kind_rules: &[KeywordRule],
    is_registered: impl Fn(&str) -> bool,
) -> String {
    if let Some(tag) = point.rule_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return tag.to_string();
    }
    let name = point.name.trim();
    if is_registered(name) {
        return name.to_string();
    }
    map_name(kind_rules, name)
}
