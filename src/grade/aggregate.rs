#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashSet;

use chrono::Utc;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Panel, Style, Width, object::Rows},
};
use tracing::warn;

use super::results::{KnowledgePointResult, ScoringResult};

/// Restores the all-or-nothing score of every verdict: a correct verdict
/// carries its total, anything else carries 0. Each correction is logged.
pub fn normalize(results: &mut [KnowledgePointResult]) {
    for r in results.iter_mut() {
        let expected = if r.is_correct { r.total_score } else { 0.0 };
        if r.achieved_score != expected {
            warn!(
                id = %r.operation_point_id,
                rule = %r.knowledge_point_type,
                "verdict carried score {} of {}; correcting to {}",
                r.achieved_score,
                r.total_score,
                expected
            );
            r.achieved_score = expected;
        }
    }
}

/// Attaches question ids to verdicts by position: `question_ids[i]` owns the
/// `i`-th verdict. Operation-point ids may repeat across questions, so they
/// are only checked, never used as the key.
pub fn reattach_questions(results: &mut [KnowledgePointResult], question_ids: &[String]) {
    let mut seen = HashSet::new();
    for (r, q) in results.iter_mut().zip(question_ids) {
        if !seen.insert(r.operation_point_id.clone()) {
            warn!(id = %r.operation_point_id, question = %q, "operation point id is used more than once");
        }
        r.question_id = Some(q.clone());
    }
}

/// Stores the verdicts on `result` and fills in totals, rate, and timing.
pub fn finalize(mut result: ScoringResult, mut verdicts: Vec<KnowledgePointResult>) -> ScoringResult {
    normalize(&mut verdicts);
    result.total_score = verdicts.iter().map(|v| v.total_score).sum();
    result.achieved_score = verdicts.iter().map(|v| v.achieved_score).sum();
    result.score_rate = if result.total_score > 0.0 {
        result.achieved_score / result.total_score
    } else {
        0.0
    };
    result.knowledge_point_results = verdicts;
    result.is_success = result.error_message.is_none();
    result.end_time = Utc::now();
    result.elapsed_milliseconds = (result.end_time - result.start_time).num_milliseconds();
    result
}

#[derive(Tabled)]
/// One row of the grading overview table.
struct Row {
    #[tabled(rename = "Operation")]
    /// operation point name
    name:    String,
    #[tabled(rename = "Rule")]
    /// rule-type tag
    rule:    String,
    #[tabled(rename = "Score")]
    /// achieved/total
    score:   String,
    #[tabled(rename = "Details")]
    /// verdict details or error
    details: String,
}

/// Renders a result as the grading overview table.
pub fn show_results(title: &str, result: &ScoringResult) -> String {
    let rows: Vec<Row> = result
        .knowledge_point_results
        .iter()
        .map(|r| Row {
            name:    r.knowledge_point_name.clone(),
            rule:    r.knowledge_point_type.clone(),
            score:   r.score_display(),
            details: r.error_message.clone().unwrap_or_else(|| r.details.clone()),
        })
        .collect();

    let mut footer = format!("Total: {:.2}/{:.2}", result.achieved_score, result.total_score);
    if let Some(err) = &result.error_message {
        footer.push_str(&format!(" ({err})"));
    }

    Table::new(&rows)
        .with(Panel::header(title))
        .with(Panel::footer(footer))
        .with(Modify::new(Rows::new(1..)).with(Width::wrap(36).keep_words(true)))
        .with(
            Modify::new(Rows::first())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(
            Modify::new(Rows::last())
                .with(Alignment::center())
                .with(Alignment::center_vertical()),
        )
        .with(Style::modern())
        .to_string()
}
