#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Totals, score correction, question reattachment, and the overview
/// table.
pub mod aggregate;
/// Runs a list of operation points against one open document.
pub mod batch;
/// Text, number, and colour comparison semantics.
pub mod compare;
/// Name-to-tag keyword mapping.
pub mod mapping;
/// Guarded, typed parameter reads.
pub mod params;
/// Verdict and aggregate records.
pub mod results;
/// Handler outcomes and the dispatcher that turns them into verdicts.
pub mod verdict;
/// Authoring vocabularies for enum-like parameters.
pub mod vocab;

pub use aggregate::show_results;
pub use compare::{color_equals, number_equals, text_contains, text_equals};
pub use params::Params;
pub use results::{KnowledgePointResult, ScoringResult};
pub use verdict::{Check, Handler};
