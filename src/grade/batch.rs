#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    time::Instant,
};

use tracing::{debug, error, info, warn};

use super::results::KnowledgePointResult;
use crate::{config::ScoringConfig, model::OperationPoint};

/// Message given to every rule that was not reached within the budget.
pub const BUDGET_EXHAUSTED: &str = "scoring budget exhausted";

/// Every point fails with the same reason; used when the document itself
/// could not be opened.
pub fn fail_all(
    points: &[OperationPoint],
    rule_type_of: impl Fn(&OperationPoint) -> String,
    reason: &str,
) -> Vec<KnowledgePointResult> {
    warn!("failing {} knowledge point(s): {reason}", points.len());
    points
        .iter()
        .map(|point| {
            let mut result = KnowledgePointResult::for_point(point, &rule_type_of(point));
            result.fail(reason, None);
            result
        })
        .collect()
}

/// Evaluates `points` in order against one open document.
///
/// Each evaluation is isolated: a panic inside a rule becomes a failing
/// verdict for that rule and the loop moves on. Once the configured rule cap
/// or time budget runs out, the remaining points fail with
/// [`BUDGET_EXHAUSTED`] without being evaluated.
pub fn run<D>(
    doc: &D,
    points: &[OperationPoint],
    cfg: &ScoringConfig,
    rule_type_of: impl Fn(&OperationPoint) -> String,
    evaluate: impl Fn(&D, &OperationPoint, &str) -> KnowledgePointResult,
) -> Vec<KnowledgePointResult> {
    let started = Instant::now();
    let mut results = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let rule_type = rule_type_of(point);
        let over_cap = cfg.max_rules().is_some_and(|cap| i >= cap);
        let over_time = started.elapsed() > cfg.timeout();
        if over_cap || over_time {
            let mut result = KnowledgePointResult::for_point(point, &rule_type);
            result.fail(BUDGET_EXHAUSTED, None);
            results.push(result);
            continue;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| evaluate(doc, point, &rule_type)));
        let mut result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unexpected failure".to_string());
                error!(rule = %rule_type, id = %point.id, "rule panicked: {msg}");
                let mut result = KnowledgePointResult::for_point(point, &rule_type);
                result.fail(format!("detection failed: {msg}"), None);
                result
            }
        };

        result.operation_point_id = point.id.clone();
        result.knowledge_point_id = point.id.clone();
        result.knowledge_point_name = point.name.clone();
        result.total_score = point.score;

        if cfg.detailed_logging() {
            info!(
                rule = %rule_type,
                id = %point.id,
                correct = result.is_correct,
                "{}",
                result.details
            );
        } else {
            debug!(rule = %rule_type, correct = result.is_correct, "verdict");
        }
        results.push(result);
    }

    results
}
