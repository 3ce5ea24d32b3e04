#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// An enum to represent the ways a single knowledge point can fail to be
/// evaluated.
///
/// Only `DocumentUnavailable` ever affects a whole batch; every other variant
/// is scoped to the rule that raised it.
#[derive(thiserror::Error, Debug)]
pub enum ScoringError {
    /// A required parameter was absent, blank, or could not be parsed.
    #[error("missing or invalid parameter: {0}")]
    MissingParameter(String),
    /// The rule-type tag has no handler for this document kind.
    #[error("unsupported knowledge point type: {0}")]
    UnsupportedRuleType(String),
    /// The document could not be opened or validated.
    #[error("cannot open document: {0}")]
    DocumentUnavailable(String),
    /// A referenced part was unreadable, or a requested index does not exist.
    #[error("{0}")]
    ExtractionFault(String),
    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl ScoringError {
    /// Shorthand for an extraction fault with a formatted message.
    pub fn fault(msg: impl Into<String>) -> Self {
        ScoringError::ExtractionFault(msg.into())
    }

    /// Shorthand for a missing parameter.
    pub fn missing(name: impl Into<String>) -> Self {
        ScoringError::MissingParameter(name.into())
    }
}

/// Result of a fact extractor: `Ok(Some(_))` when found, `Ok(None)` when the
/// document simply does not carry the feature, `Err(_)` on a genuine fault.
pub type Extracted<T> = Result<Option<T>, ScoringError>;
