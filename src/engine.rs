#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The scoring engines: one per document kind, sharing the batch, dispatch
//! and aggregation machinery through default trait methods.

use std::{
    future::Future,
    path::{Path, PathBuf},
};

use tracing::{info, warn};

use crate::{
    config::{self, ScoringConfig},
    error::ScoringError,
    excel::{self, Workbook},
    grade::{
        Handler,
        aggregate::{finalize, reattach_questions},
        batch,
        mapping::{KeywordRule, resolve_rule_type},
        results::{KnowledgePointResult, ScoringResult},
        verdict::dispatch,
    },
    model::{DocumentKind, ExamModel, OperationPoint, Question},
    word::{self, WordDocument},
};

/// Message recorded when a file or question yields nothing to score.
pub const NO_OPERATION_POINTS: &str = "no operation points found";

/// A scorer for one document kind.
///
/// Implementors supply the document type, the tag registry and keyword
/// table, and how to open a file; everything else is shared.
pub trait ScoringEngine: Clone + Send + Sync + 'static {
    /// Opened document handle the rules read from.
    type Document: Send + Sync;

    /// The document kind this engine scores.
    fn kind(&self) -> DocumentKind;

    /// Opens `path` as this engine's document type.
    fn open(&self, path: &Path, cfg: &ScoringConfig) -> Result<Self::Document, ScoringError>;

    /// Handler registered for `tag`.
    fn handler(&self, tag: &str) -> Option<Handler<Self::Document>>;

    /// Kind-specific keyword table used to map display names to tags.
    fn keywords(&self) -> &'static [KeywordRule];

    /// File extensions (with the leading dot) this engine accepts.
    fn supported_extensions(&self) -> &'static [&'static str] {
        self.kind().extensions()
    }

    /// Whether `path` has an extension this engine accepts. Pure; the file
    /// is not touched.
    fn can_process(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = format!(".{}", ext.to_ascii_lowercase());
        self.supported_extensions().contains(&ext.as_str())
    }

    /// Tag an operation point dispatches on.
    fn resolve_rule_type(&self, point: &OperationPoint) -> String {
        resolve_rule_type(point, self.keywords(), |tag| self.handler(tag).is_some())
    }

    /// Evaluates one operation point against an open document.
    fn detect_knowledge_point(&self, doc: &Self::Document, point: &OperationPoint) -> KnowledgePointResult {
        let rule_type = self.resolve_rule_type(point);
        dispatch(doc, point, &rule_type, self.handler(&rule_type))
    }

    /// Opens `path` once and evaluates every point against it. A file that
    /// cannot be opened fails every point with the same reason.
    fn detect_knowledge_points(&self, path: &Path, points: &[OperationPoint]) -> Vec<KnowledgePointResult> {
        let cfg = config::get();
        let rule_type_of = |p: &OperationPoint| self.resolve_rule_type(p);
        let doc = if self.can_process(path) {
            self.open(path, &cfg)
        } else {
            Err(ScoringError::DocumentUnavailable(format!(
                "unsupported file type: {}",
                path.display()
            )))
        };
        match doc {
            Ok(doc) => batch::run(&doc, points, &cfg, rule_type_of, |doc, point, tag| {
                dispatch(doc, point, tag, self.handler(tag))
            }),
            Err(err) => {
                let reason = match err {
                    ScoringError::DocumentUnavailable(_) => err.to_string(),
                    other => ScoringError::DocumentUnavailable(other.to_string()).to_string(),
                };
                warn!(path = %path.display(), "{reason}");
                batch::fail_all(points, rule_type_of, &reason)
            }
        }
    }

    /// Scores a file against every enabled point of the exam module of this
    /// engine's kind, with question ids reattached.
    fn score_file(&self, path: &Path, exam: &ExamModel) -> ScoringResult {
        let result = ScoringResult::started();
        let Some(module) = exam.module(self.kind()) else {
            info!(kind = %self.kind(), "exam has no module for this kind; nothing to score");
            return finalize(result, Vec::new());
        };

        let mut question_ids = Vec::new();
        let mut points = Vec::new();
        for question in &module.questions {
            for point in self.points_of(question) {
                question_ids.push(question.id.clone());
                points.push(point.clone());
            }
        }
        if points.is_empty() {
            return finalize(result.with_error(NO_OPERATION_POINTS), Vec::new());
        }

        info!(path = %path.display(), points = points.len(), "scoring {} file", self.kind());
        let mut verdicts = self.detect_knowledge_points(path, &points);
        reattach_questions(&mut verdicts, &question_ids);
        finalize(result, verdicts)
    }

    /// Scores a file against one question's enabled points of this kind.
    fn score_question(&self, path: &Path, question: &Question) -> ScoringResult {
        let mut result = ScoringResult::started();
        result.question_id = Some(question.id.clone());
        result.question_title = Some(question.title.clone());

        let points: Vec<OperationPoint> = self.points_of(question).cloned().collect();
        if points.is_empty() {
            return finalize(result.with_error(NO_OPERATION_POINTS), Vec::new());
        }

        info!(path = %path.display(), question = %question.id, "scoring question");
        let mut verdicts = self.detect_knowledge_points(path, &points);
        for v in &mut verdicts {
            v.question_id = Some(question.id.clone());
        }
        finalize(result, verdicts)
    }

    /// Enabled points of `question` that belong to this engine's kind.
    fn points_of<'q>(&self, question: &'q Question) -> impl Iterator<Item = &'q OperationPoint> {
        let kind = self.kind();
        question
            .operation_points
            .iter()
            .filter(move |p| p.enabled && p.kind == kind)
    }

    /// [`ScoringEngine::detect_knowledge_points`] on the blocking pool.
    fn detect_knowledge_points_async(
        &self,
        path: PathBuf,
        points: Vec<OperationPoint>,
    ) -> impl Future<Output = Vec<KnowledgePointResult>> + Send {
        let engine = self.clone();
        let resolver = self.clone();
        async move {
            let fallback = points.clone();
            match tokio::task::spawn_blocking(move || engine.detect_knowledge_points(&path, &points)).await {
                Ok(results) => results,
                Err(e) => batch::fail_all(
                    &fallback,
                    |p| resolver.resolve_rule_type(p),
                    &format!("scoring task failed: {e}"),
                ),
            }
        }
    }

    /// [`ScoringEngine::score_file`] on the blocking pool.
    fn score_file_async(&self, path: PathBuf, exam: ExamModel) -> impl Future<Output = ScoringResult> + Send {
        let engine = self.clone();
        async move {
            tokio::task::spawn_blocking(move || engine.score_file(&path, &exam))
                .await
                .unwrap_or_else(|e| task_failed(&e))
        }
    }

    /// [`ScoringEngine::score_question`] on the blocking pool.
    fn score_question_async(
        &self,
        path: PathBuf,
        question: Question,
    ) -> impl Future<Output = ScoringResult> + Send {
        let engine = self.clone();
        async move {
            tokio::task::spawn_blocking(move || engine.score_question(&path, &question))
                .await
                .unwrap_or_else(|e| task_failed(&e))
        }
    }
}

/// Result for a blocking task that died before returning.
fn task_failed(e: &tokio::task::JoinError) -> ScoringResult {
    finalize(ScoringResult::started().with_error(format!("scoring task failed: {e}")), Vec::new())
}

/// Scores word-processing documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordScoringEngine;

impl ScoringEngine for WordScoringEngine {
    type Document = WordDocument;

    fn kind(&self) -> DocumentKind {
        DocumentKind::Word
    }

    fn open(&self, path: &Path, cfg: &ScoringConfig) -> Result<WordDocument, ScoringError> {
        WordDocument::open(path, cfg)
    }

    fn handler(&self, tag: &str) -> Option<Handler<WordDocument>> {
        word::rules::handler(tag)
    }

    fn keywords(&self) -> &'static [KeywordRule] {
        word::rules::WORD_KEYWORDS
    }
}

/// Scores spreadsheets.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelScoringEngine;

impl ScoringEngine for ExcelScoringEngine {
    type Document = Workbook;

    fn kind(&self) -> DocumentKind {
        DocumentKind::Excel
    }

    fn open(&self, path: &Path, cfg: &ScoringConfig) -> Result<Workbook, ScoringError> {
        Workbook::open(path, cfg)
    }

    fn handler(&self, tag: &str) -> Option<Handler<Workbook>> {
        excel::rules::handler(tag)
    }

    fn keywords(&self) -> &'static [KeywordRule] {
        excel::rules::EXCEL_KEYWORDS
    }
}

/// An engine chosen at run time from a file's extension.
#[derive(Debug, Clone, Copy)]
pub enum Engine {
    /// `.docx`
    Word(WordScoringEngine),
    /// `.xlsx`
    Excel(ExcelScoringEngine),
}

/// The engine that can process `path`, if any.
pub fn engine_for(path: &Path) -> Option<Engine> {
    if WordScoringEngine.can_process(path) {
        Some(Engine::Word(WordScoringEngine))
    } else if ExcelScoringEngine.can_process(path) {
        Some(Engine::Excel(ExcelScoringEngine))
    } else {
        None
    }
}

impl Engine {
    /// The engine for a document kind.
    pub fn for_kind(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Word => Engine::Word(WordScoringEngine),
            DocumentKind::Excel => Engine::Excel(ExcelScoringEngine),
        }
    }

    /// The document kind scored.
    pub fn kind(&self) -> DocumentKind {
        match self {
            Engine::Word(e) => e.kind(),
            Engine::Excel(e) => e.kind(),
        }
    }

    /// Tag an operation point dispatches on.
    pub fn resolve_rule_type(&self, point: &OperationPoint) -> String {
        match self {
            Engine::Word(e) => e.resolve_rule_type(point),
            Engine::Excel(e) => e.resolve_rule_type(point),
        }
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = match self {
            Engine::Word(_) => word::rules::REGISTRY.keys().copied().collect(),
            Engine::Excel(_) => excel::rules::REGISTRY.keys().copied().collect(),
        };
        tags.sort_unstable();
        tags
    }

    /// See [`ScoringEngine::detect_knowledge_points`].
    pub fn detect_knowledge_points(&self, path: &Path, points: &[OperationPoint]) -> Vec<KnowledgePointResult> {
        match self {
            Engine::Word(e) => e.detect_knowledge_points(path, points),
            Engine::Excel(e) => e.detect_knowledge_points(path, points),
        }
    }

    /// See [`ScoringEngine::score_file`].
    pub fn score_file(&self, path: &Path, exam: &ExamModel) -> ScoringResult {
        match self {
            Engine::Word(e) => e.score_file(path, exam),
            Engine::Excel(e) => e.score_file(path, exam),
        }
    }

    /// See [`ScoringEngine::score_question`].
    pub fn score_question(&self, path: &Path, question: &Question) -> ScoringResult {
        match self {
            Engine::Word(e) => e.score_question(path, question),
            Engine::Excel(e) => e.score_question(path, question),
        }
    }

    /// See [`ScoringEngine::detect_knowledge_points_async`].
    pub async fn detect_knowledge_points_async(
        self,
        path: PathBuf,
        points: Vec<OperationPoint>,
    ) -> Vec<KnowledgePointResult> {
        match self {
            Engine::Word(e) => e.detect_knowledge_points_async(path, points).await,
            Engine::Excel(e) => e.detect_knowledge_points_async(path, points).await,
        }
    }

    /// See [`ScoringEngine::score_file_async`].
    pub async fn score_file_async(self, path: PathBuf, exam: ExamModel) -> ScoringResult {
        match self {
            Engine::Word(e) => e.score_file_async(path, exam).await,
            Engine::Excel(e) => e.score_file_async(path, exam).await,
        }
    }
}
