//! # docgrade
//!
//! A read-only conformance scorer for office documents. Given a `.docx` or
//! `.xlsx` submission and a list of declared operation points ("cell A1
//! holds Hello", "paragraph 3 uses SimHei"), it decides for each point
//! whether the document satisfies it and aggregates the scores.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Process-wide scoring configuration
pub mod config;
/// The scoring engines and the trait they share
pub mod engine;
/// The error type every rule reports through
pub mod error;
/// Spreadsheet documents and rules
pub mod excel;
/// Rule plumbing shared by every document kind: parameters, comparison,
/// verdicts, batching and aggregation
pub mod grade;
/// Exam and operation-point model
pub mod model;
/// Read-only OOXML package access
pub mod ooxml;
/// Utility functions for convenience
pub mod util;
/// Word-processing documents and rules
pub mod word;

pub use engine::{Engine, ExcelScoringEngine, ScoringEngine, WordScoringEngine, engine_for};
pub use error::ScoringError;
pub use grade::{KnowledgePointResult, ScoringResult, show_results};
pub use model::{DocumentKind, ExamModel, ExamModule, OperationPoint, Question};

/// Defined for convenience: an ordered parameter bag.
pub type Dict = std::collections::BTreeMap<String, String>;
