#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Dict, model::OperationPoint};

#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq)]
#[builder(on(String, into))]
/// The verdict for one operation point evaluated against one document.
pub struct KnowledgePointResult {
    /// question the operation point belongs to, attached after evaluation
    #[builder(getter)]
    pub question_id:          Option<String>,
    /// id of the evaluated operation point
    #[builder(getter)]
    pub operation_point_id:   String,
    /// id of the knowledge point (the operation point id)
    pub knowledge_point_id:   String,
    /// display name authored for the operation point
    pub knowledge_point_name: String,
    /// rule-type tag the point was dispatched on
    #[builder(getter)]
    pub knowledge_point_type: String,
    /// parameters the rule was evaluated with
    #[builder(default)]
    pub parameters:           Dict,
    /// description of the expected value
    #[builder(default)]
    pub expected_value:       String,
    /// description of the value found in the document
    #[builder(default)]
    pub actual_value:         String,
    /// whether the document satisfies the rule
    #[builder(default)]
    pub is_correct:           bool,
    /// score earned; equals `total_score` when correct, else 0
    #[builder(default)]
    pub achieved_score:       f64,
    /// score the operation point is worth
    #[builder(default)]
    pub total_score:          f64,
    /// why the rule could not be evaluated, if it could not
    pub error_message:        Option<String>,
    /// human-readable explanation
    #[builder(default)]
    pub details:              String,
}

impl KnowledgePointResult {
    /// A fresh, failing-by-default verdict carrying the point's identity,
    /// score and parameters.
    pub fn for_point(point: &OperationPoint, rule_type: &str) -> Self {
        Self::builder()
            .operation_point_id(point.id.clone())
            .knowledge_point_id(point.id.clone())
            .knowledge_point_name(point.name.clone())
            .knowledge_point_type(rule_type)
            .parameters(point.parameters.clone())
            .total_score(point.score)
            .build()
    }

    /// Marks the verdict correct and awards the full score.
    pub fn succeed(&mut self, details: Option<String>) {
        self.is_correct = true;
        self.achieved_score = self.total_score;
        if let Some(details) = details.filter(|d| !d.is_empty()) {
            self.details = details;
        }
    }

    /// Marks the verdict failed with an error; details default to the error.
    pub fn fail(&mut self, error: impl Into<String>, details: Option<String>) {
        let error = error.into();
        self.is_correct = false;
        self.achieved_score = 0.0;
        self.details = details
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| error.clone());
        self.error_message = Some(error);
    }

    /// Score string in `achieved/total` form.
    pub fn score_display(&self) -> String {
        format!("{:.2}/{:.2}", self.achieved_score, self.total_score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Aggregate over a whole document or a single question.
pub struct ScoringResult {
    /// question this result is scoped to, if any
    pub question_id:             Option<String>,
    /// title of that question
    pub question_title:          Option<String>,
    /// sum of the evaluated operation points' scores
    pub total_score:             f64,
    /// sum of the verdicts' achieved scores
    pub achieved_score:          f64,
    /// `achieved_score / total_score`, or 0 when nothing was at stake
    pub score_rate:              f64,
    /// every verdict, in operation-point order
    pub knowledge_point_results: Vec<KnowledgePointResult>,
    /// false when a top-level error was recorded
    pub is_success:              bool,
    /// top-level error, if scoring could not proceed
    pub error_message:           Option<String>,
    /// free-form details
    pub details:                 Option<String>,
    /// when scoring began
    pub start_time:              DateTime<Utc>,
    /// when scoring finished
    pub end_time:                DateTime<Utc>,
    /// wall-clock duration
    pub elapsed_milliseconds:    i64,
}

impl ScoringResult {
    /// An empty result with its start time stamped now.
    pub fn started() -> Self {
        let now = Utc::now();
        Self {
            question_id:             None,
            question_title:          None,
            total_score:             0.0,
            achieved_score:          0.0,
            score_rate:              0.0,
            knowledge_point_results: Vec::new(),
            is_success:              false,
            error_message:           None,
            details:                 None,
            start_time:              now,
            end_time:                now,
            elapsed_milliseconds:    0,
        }
    }

    /// Records a top-level error.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self
    }

    /// Whether every verdict is correct.
    pub fn all_correct(&self) -> bool {
        self.knowledge_point_results.iter().all(|r| r.is_correct)
    }
}
