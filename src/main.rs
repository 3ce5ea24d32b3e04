#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # docgrade
//! ## Introduction
//!
//! Scores `.docx` and `.xlsx` exam submissions against the operation points
//! of an exam file.
//!
//! ## Usage
//!
//! - `docgrade grade submissions/ --exam exam.json` scores every document
//!   under `submissions/` and prints one table per file.
//! - `docgrade check answer.xlsx --rule SetCellFont --param FontName=Arial`
//!   evaluates one ad hoc rule.
//! - `docgrade rules --kind excel` lists the supported rule tags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use docgrade::{
    DocumentKind, Engine, ExamModel, OperationPoint, ScoringResult,
    config::{self, ScoringConfig},
    engine_for,
    grade::aggregate::finalize,
    show_results,
    util::expand_inputs,
};
use dotenvy::dotenv;
use futures::future::join_all;
use serde::Serialize;
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Score documents against an exam
    Grade {
        /// files or directories to score
        paths:   Vec<PathBuf>,
        /// exam JSON file
        exam:    PathBuf,
        /// print JSON instead of tables
        json:    bool,
        /// per-file time budget override
        timeout: Option<u64>,
    },
    /// Evaluate one rule against one document
    Check {
        /// document to check
        path:   PathBuf,
        /// rule-type tag or display name
        rule:   String,
        /// `Key=Value` parameters
        params: Vec<String>,
        /// print JSON instead of a table
        json:   bool,
    },
    /// List the registered rule tags
    Rules {
        /// restrict the listing to one document kind
        kind: Option<DocumentKind>,
    },
}

/// One scored file, as printed with `--json`.
#[derive(Debug, Serialize)]
struct FileReport {
    /// the scored file
    path:   String,
    /// its aggregate result
    result: ScoringResult,
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    let paths = positional::<PathBuf>("PATH")
        .help("Documents to score, or directories to search for .docx/.xlsx files")
        .some("Expected at least one document or directory");
    let exam = long("exam")
        .short('e')
        .help("Exam description (JSON)")
        .argument::<PathBuf>("EXAM");
    let timeout = long("timeout")
        .help("Time budget per file, in seconds")
        .argument::<u64>("SECS")
        .optional();
    let json = long("json").help("Print results as JSON").switch();
    let grade = construct!(Cmd::Grade {
        paths,
        exam,
        json,
        timeout
    })
    .to_options()
    .command("grade")
    .help("Score documents against an exam");

    let path = positional::<PathBuf>("PATH").help("Document to check");
    let rule = long("rule")
        .short('r')
        .help("Rule-type tag, e.g. SetCellFont")
        .argument::<String>("TAG");
    let params = long("param")
        .short('p')
        .help("Rule parameter as Key=Value; repeatable")
        .argument::<String>("KEY=VALUE")
        .many();
    let json = long("json").help("Print the verdict as JSON").switch();
    let check = construct!(Cmd::Check {
        rule,
        params,
        json,
        path
    })
    .to_options()
    .command("check")
    .help("Evaluate a single rule against a document");

    let kind = long("kind")
        .short('k')
        .help("word or excel")
        .argument::<DocumentKind>("KIND")
        .optional();
    let rules = construct!(Cmd::Rules { kind })
        .to_options()
        .command("rules")
        .help("List the supported rule tags");

    let cmd = construct!([grade, check, rules]);

    cmd.to_options()
        .descr("Knowledge-point scorer for .docx and .xlsx submissions")
        .run()
}

/// Scores every input file concurrently and prints the results.
async fn grade(paths: Vec<PathBuf>, exam: PathBuf, json: bool, timeout: Option<u64>) -> Result<()> {
    let mut cfg = ScoringConfig::from_env();
    if let Some(secs) = timeout {
        cfg = cfg.with_timeout_secs(secs);
    }
    config::set(cfg);

    let exam = ExamModel::from_json_file(&exam)?;
    let files = expand_inputs(&paths, &["docx", "xlsx"])?;
    if files.is_empty() {
        anyhow::bail!("No .docx or .xlsx files found");
    }

    let jobs = files.into_iter().map(|path| {
        let exam = exam.clone();
        async move {
            let result = match engine_for(&path) {
                Some(engine) => engine.score_file_async(path.clone(), exam).await,
                None => finalize(
                    ScoringResult::started()
                        .with_error(format!("unsupported file type: {}", path.display())),
                    Vec::new(),
                ),
            };
            FileReport {
                path: path.display().to_string(),
                result,
            }
        }
    });
    let reports = join_all(jobs).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", show_results(&report.path, &report.result));
        }
        let achieved: f64 = reports.iter().map(|r| r.result.achieved_score).sum();
        let total: f64 = reports.iter().map(|r| r.result.total_score).sum();
        eprintln!(
            "{} {} file(s), {achieved:.2}/{total:.2}",
            "Scored".bright_green().bold(),
            reports.len()
        );
    }
    Ok(())
}

/// Evaluates one ad hoc rule.
fn check(path: PathBuf, rule: String, params: Vec<String>, json: bool) -> Result<()> {
    config::set(ScoringConfig::from_env());
    let engine = engine_for(&path)
        .with_context(|| format!("Unsupported file type: {}", path.display()))?;

    let mut point = OperationPoint::builder()
        .id("adhoc")
        .name(rule.as_str())
        .kind(engine.kind())
        .score(1.0)
        .build();
    for param in params {
        let (key, value) = param
            .split_once('=')
            .with_context(|| format!("Parameter `{param}` is not in Key=Value form"))?;
        point = point.with_param(key.trim(), value.trim());
    }

    let verdicts = engine.detect_knowledge_points(&path, &[point]);
    let result = finalize(ScoringResult::started(), verdicts);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", show_results(&path.display().to_string(), &result));
    }
    Ok(())
}

/// Prints the registered tags.
fn rules(kind: Option<DocumentKind>) {
    let kinds = match kind {
        Some(k) => vec![k],
        None => vec![DocumentKind::Word, DocumentKind::Excel],
    };
    for kind in kinds {
        println!("{}", kind.to_string().bright_blue().bold());
        for tag in Engine::for_kind(kind).tags() {
            println!("  {tag}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match options() {
        Cmd::Grade {
            paths,
            exam,
            json,
            timeout,
        } => grade(paths, exam, json, timeout).await?,
        Cmd::Check {
            path,
            rule,
            params,
            json,
        } => check(path, rule, params, json)?,
        Cmd::Rules { kind } => rules(kind),
    };

    Ok(())
}
