#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt, path::Path};

use anyhow::{Context, Result};
use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::Dict;

/// The document kinds the engine knows how to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// word-processing documents (`.docx`)
    #[serde(alias = "word", alias = "WORD", alias = "Docx")]
    Word,
    /// spreadsheets (`.xlsx`)
    #[serde(alias = "excel", alias = "EXCEL", alias = "Xlsx")]
    Excel,
}

impl DocumentKind {
    /// File extensions (with the leading dot) this kind is scored from.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            DocumentKind::Word => &[".docx"],
            DocumentKind::Excel => &[".xlsx"],
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Word => write!(f, "Word"),
            DocumentKind::Excel => write!(f, "Excel"),
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" | "docx" => Ok(DocumentKind::Word),
            "excel" | "xlsx" => Ok(DocumentKind::Excel),
            other => anyhow::bail!("unknown document kind `{other}` (expected word or excel)"),
        }
    }
}

/// Serde default for [`OperationPoint::enabled`].
fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[builder(on(String, into))]
/// One declared, scorable rule, e.g. "cell A1 holds Hello", worth `score`.
pub struct OperationPoint {
    /// identity of the operation point
    #[builder(getter)]
    pub id:         String,
    /// display name, also the input to name-to-tag mapping
    #[builder(getter)]
    pub name:       String,
    /// which document kind the point applies to
    pub kind:       DocumentKind,
    /// points awarded when the rule holds
    #[builder(default)]
    #[serde(default)]
    pub score:      f64,
    /// named string parameters
    #[builder(default)]
    #[serde(default)]
    pub parameters: Dict,
    /// disabled points are skipped by question-level scoring
    #[builder(default = true)]
    #[serde(default = "enabled_by_default")]
    pub enabled:    bool,
    /// explicit rule-type tag, bypassing name mapping
    #[serde(default)]
    pub rule_type:  Option<String>,
}

impl OperationPoint {
    /// Adds or replaces one parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// A question and the operation points that grade it.
pub struct Question {
    /// question id
    pub id:               String,
    /// question title
    #[serde(default)]
    pub title:            String,
    /// operation points, in scoring order
    #[serde(default)]
    pub operation_points: Vec<OperationPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// The questions of one document kind within an exam.
pub struct ExamModule {
    /// module name
    #[serde(default)]
    pub name:      String,
    /// document kind of every question in the module
    pub kind:      DocumentKind,
    /// the module's questions
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
/// An exam as consumed by the scorer.
pub struct ExamModel {
    /// exam id
    #[serde(default)]
    pub id:      String,
    /// exam name
    #[serde(default)]
    pub name:    String,
    /// one module per document kind
    #[serde(default)]
    pub modules: Vec<ExamModule>,
}

impl ExamModel {
    /// Reads an exam from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read exam file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Could not parse exam file {}", path.display()))
    }

    /// The module of the given kind, if the exam has one.
    pub fn module(&self, kind: DocumentKind) -> Option<&ExamModule> {
        self.modules.iter().find(|m| m.kind == kind)
    }
}
