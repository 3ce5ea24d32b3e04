#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::{params::Params, results::KnowledgePointResult};
use crate::{error::ScoringError, model::OperationPoint};

/// Outcome of one rule handler: the comparison it made and whether it held.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    /// whether the document satisfies the rule
    pub passed:   bool,
    /// description of what was expected
    pub expected: String,
    /// description of what was found (empty when nothing was found)
    pub actual:   String,
    /// human-readable explanation
    pub details:  String,
}

impl Check {
    /// A comparison between an expected and an actual description.
    pub fn compare(
        passed: bool,
        subject: impl std::fmt::Display,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let (expected, actual) = (expected.into(), actual.into());
        let details = format!("{subject}: expected '{expected}', actual '{actual}'");
        Self {
            passed,
            expected,
            actual,
            details,
        }
    }

    /// The feature the rule looks for is not in the document.
    pub fn absent(subject: impl std::fmt::Display, expected: impl Into<String>) -> Self {
        Self {
            passed:   false,
            expected: expected.into(),
            actual:   String::new(),
            details:  format!("{subject}: not found"),
        }
    }

    /// A yes/no presence check.
    pub fn presence(found: bool, subject: impl std::fmt::Display) -> Self {
        Self {
            passed:   found,
            expected: "present".into(),
            actual:   if found { "present" } else { "absent" }.into(),
            details:  format!("{subject}: {}", if found { "found" } else { "not found" }),
        }
    }

    /// Passes when any observed value satisfies `matches`. The actual value
    /// is the first match, or every distinct observation when none match.
    pub fn any(
        subject: impl std::fmt::Display,
        expected: impl Into<String>,
        observed: impl IntoIterator<Item = String>,
        matches: impl Fn(&str) -> bool,
    ) -> Self {
        let observed: Vec<String> = observed.into_iter().unique().collect();
        if observed.is_empty() {
            return Self::absent(subject, expected);
        }
        match observed.iter().find(|o| matches(o)) {
            Some(hit) => Self::compare(true, subject, expected, hit.clone()),
            None => Self::compare(false, subject, expected, observed.join(", ")),
        }
    }

    /// Like [`Check::any`] for observations the caller has already judged.
    pub fn any_judged(
        subject: impl std::fmt::Display,
        expected: impl Into<String>,
        observed: impl IntoIterator<Item = (String, bool)>,
    ) -> Self {
        let observed: Vec<(String, bool)> = observed.into_iter().collect();
        if let Some((hit, _)) = observed.iter().find(|(_, ok)| *ok) {
            return Self::compare(true, subject, expected, hit.clone());
        }
        Self::any(subject, expected, observed.into_iter().map(|(s, _)| s), |_| false)
    }

    /// Combines several checks that must all hold.
    pub fn all(subject: impl std::fmt::Display, checks: Vec<Check>) -> Self {
        let passed = !checks.is_empty() && checks.iter().all(|c| c.passed);
        let join = |f: fn(&Check) -> &str| checks.iter().map(f).collect::<Vec<_>>().join("; ");
        Self {
            passed,
            expected: join(|c| c.expected.as_str()),
            actual: join(|c| c.actual.as_str()),
            details: format!("{subject}: {}", join(|c| c.details.as_str())),
        }
    }

    /// Labels the outcome as coming from a best-effort structural heuristic
    /// rather than an exact property comparison.
    pub fn heuristic(mut self) -> Self {
        self.details = format!("heuristic: {}", self.details);
        self
    }
}

/// A rule handler: validates its parameters, extracts facts from the
/// document and compares them.
pub type Handler<D> = fn(&D, Params<'_>) -> Result<Check, ScoringError>;

/// Runs `handler` (if any) for `point` and builds the verdict.
///
/// Every outcome becomes a populated [`KnowledgePointResult`]: an unknown
/// tag, a missing parameter and an extraction fault all turn into a failing
/// verdict with an error message.
pub fn dispatch<D>(
    doc: &D,
    point: &OperationPoint,
    rule_type: &str,
    handler: Option<Handler<D>>,
) -> KnowledgePointResult {
    let mut result = KnowledgePointResult::for_point(point, rule_type);
    let Some(handler) = handler else {
        result.fail(ScoringError::UnsupportedRuleType(rule_type.to_string()).to_string(), None);
        return result;
    };

    match handler(doc, Params::new(&point.parameters)) {
        Ok(check) => apply(&mut result, check),
        Err(err @ (ScoringError::MissingParameter(_) | ScoringError::UnsupportedRuleType(_))) => {
            result.fail(err.to_string(), None)
        }
        Err(err) => result.fail(format!("detection failed: {err}"), None),
    }
    result
}

/// Copies a handler's outcome onto a verdict. No partial credit: a passing
/// check earns the full score, anything else earns zero.
pub fn apply(result: &mut KnowledgePointResult, check: Check) {
    result.expected_value = check.expected;
    result.actual_value = check.actual;
    result.details = check.details;
    result.is_correct = check.passed;
    result.achieved_score = if check.passed { result.total_score } else { 0.0 };
}
