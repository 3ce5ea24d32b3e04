mod common;

use std::collections::HashSet;

use common::{Xlsx, corrupt_file, docx, paragraph, point, sheet_data};
use docgrade::{
    DocumentKind, Engine, ExamModel, ExamModule, ExcelScoringEngine, KnowledgePointResult,
    OperationPoint, Question, ScoringEngine, ScoringResult, WordScoringEngine,
    config::ScoringConfig,
    engine::NO_OPERATION_POINTS,
    excel::rules::EXCEL_KEYWORDS,
    grade::{
        aggregate,
        batch::{self, BUDGET_EXHAUSTED},
        color_equals, number_equals, text_contains, text_equals,
    },
    word::rules::WORD_KEYWORDS,
};
use insta::assert_snapshot;

fn workbook() -> std::path::PathBuf {
    Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "Hello"), ("B1", "7")]))
        .write()
}

fn question(id: &str, points: Vec<OperationPoint>) -> Question {
    Question {
        id:               id.to_string(),
        title:            format!("Question {id}"),
        operation_points: points,
    }
}

fn excel_exam(questions: Vec<Question>) -> ExamModel {
    ExamModel {
        id:      "exam-1".into(),
        name:    "Office basics".into(),
        modules: vec![ExamModule {
            name: "Spreadsheets".into(),
            kind: DocumentKind::Excel,
            questions,
        }],
    }
}

fn assert_score_bounds(results: &[KnowledgePointResult]) {
    for r in results {
        assert!(
            r.achieved_score == 0.0 || r.achieved_score == r.total_score,
            "{} scored {}",
            r.operation_point_id,
            r.score_display()
        );
        assert_eq!(r.is_correct, r.achieved_score == r.total_score && r.total_score > 0.0);
    }
    let achieved: f64 = results.iter().map(|r| r.achieved_score).sum();
    let total: f64 = results.iter().map(|r| r.total_score).sum();
    assert!(achieved <= total);
}

#[test]
fn unknown_tag_fails_with_its_name() {
    let path = workbook();
    let results = ExcelScoringEngine.detect_knowledge_points(&path, &[point(DocumentKind::Excel, "x", "Bogus", 2.0, &[])]);
    let result = &results[0];
    assert!(!result.is_correct);
    assert_eq!(result.achieved_score, 0.0);
    assert_eq!(result.knowledge_point_type, "Bogus");
    let message = result.error_message.as_deref().expect("error message");
    assert!(message.contains("Bogus"), "{message}");
}

#[test]
fn missing_parameter_fails_with_zero() {
    let path = workbook();
    let results = ExcelScoringEngine.detect_knowledge_points(
        &path,
        &[point(DocumentKind::Excel, "x", "SetRowHeight", 2.0, &[("RowNumbers", "1")])],
    );
    let result = &results[0];
    assert!(!result.is_correct);
    assert_eq!(result.achieved_score, 0.0);
    let message = result.error_message.as_deref().expect("error message");
    assert!(message.contains("RowHeight"), "{message}");
}

#[test]
fn verdicts_keep_point_identity_and_order() {
    let path = workbook();
    let points = vec![
        point(DocumentKind::Excel, "a", "FillOrCopyCellContent", 1.0, &[("CellRange", "A1"), ("ExpectedValue", "Hello")]),
        point(DocumentKind::Excel, "b", "FillOrCopyCellContent", 2.5, &[("CellRange", "B1"), ("ExpectedValue", "7.0")]),
        point(DocumentKind::Excel, "c", "MergeCells", 4.0, &[("CellRange", "A1:B1")]),
        point(DocumentKind::Excel, "d", "Nope", 1.0, &[]),
    ];
    let results = ExcelScoringEngine.detect_knowledge_points(&path, &points);

    let ids: Vec<&str> = results.iter().map(|r| r.operation_point_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c", "d"]);
    let correct: Vec<bool> = results.iter().map(|r| r.is_correct).collect();
    assert_eq!(correct, [true, true, false, false]);
    assert_eq!(results[1].total_score, 2.5);
    assert_eq!(results[1].parameters.get("CellRange").map(String::as_str), Some("B1"));
    assert_score_bounds(&results);
}

#[test]
fn corrupt_file_fails_every_rule_alike() {
    let path = corrupt_file("broken.xlsx");
    let points: Vec<OperationPoint> = ["SetCellFont", "MergeCells", "ChartType", "FreezePanes", "Bogus"]
        .iter()
        .enumerate()
        .map(|(i, tag)| point(DocumentKind::Excel, &format!("p{i}"), tag, 1.0, &[]))
        .collect();
    let results = ExcelScoringEngine.detect_knowledge_points(&path, &points);

    assert_eq!(results.len(), 5);
    let messages: HashSet<Option<String>> = results.iter().map(|r| r.error_message.clone()).collect();
    assert_eq!(messages.len(), 1);
    let message = results[0].error_message.as_deref().expect("error message");
    assert!(message.contains("cannot open document"), "{message}");
    assert!(results.iter().all(|r| r.achieved_score == 0.0));
}

#[test]
fn missing_file_and_wrong_extension_fail_without_panicking() {
    let dir = common::temp_dir();
    let results = WordScoringEngine.detect_knowledge_points(
        &dir.join("absent.docx"),
        &[point(DocumentKind::Word, "p", "SetFont", 1.0, &[("FontName", "Arial")])],
    );
    assert!(results[0].error_message.as_deref().is_some_and(|m| m.contains("cannot open document")));

    let results = ExcelScoringEngine.detect_knowledge_points(
        &dir.join("notes.txt"),
        &[point(DocumentKind::Excel, "p", "MergeCells", 1.0, &[("CellRange", "A1:B2")])],
    );
    let message = results[0].error_message.as_deref().expect("error message");
    assert!(message.contains("unsupported file type"), "{message}");
}

#[test]
fn extension_checks_are_case_insensitive() {
    assert!(ExcelScoringEngine.can_process("Answer.XLSX".as_ref()));
    assert!(!ExcelScoringEngine.can_process("answer.docx".as_ref()));
    assert!(WordScoringEngine.can_process("report.Docx".as_ref()));
    assert!(!WordScoringEngine.can_process("report".as_ref()));
    assert!(docgrade::engine_for("sheet.csv".as_ref()).is_none());
    assert_eq!(
        docgrade::engine_for("sheet.xlsx".as_ref()).map(|e| e.kind()),
        Some(DocumentKind::Excel)
    );
}

#[test]
fn display_names_map_to_tags() {
    let excel = Engine::for_kind(DocumentKind::Excel);
    let word = Engine::for_kind(DocumentKind::Word);
    let named = |kind, name: &str| {
        OperationPoint::builder()
            .id("n")
            .name(name)
            .kind(kind)
            .build()
    };

    assert_eq!(excel.resolve_rule_type(&named(DocumentKind::Excel, "SetCellFont")), "SetCellFont");
    assert_eq!(excel.resolve_rule_type(&named(DocumentKind::Excel, "Q1 MergeCells in header")), "MergeCells");
    assert_eq!(excel.resolve_rule_type(&named(DocumentKind::Excel, "Title Font")), "SetFont");
    assert_eq!(word.resolve_rule_type(&named(DocumentKind::Word, "Change LineSpacing")), "SetLineSpacing");
    assert_eq!(word.resolve_rule_type(&named(DocumentKind::Word, "mystery")), "mystery");

    let mut explicit = named(DocumentKind::Excel, "anything at all");
    explicit.rule_type = Some("FreezePanes".into());
    assert_eq!(excel.resolve_rule_type(&explicit), "FreezePanes");
}

#[test]
fn keyword_targets_are_registered() {
    for (kind, table) in [(DocumentKind::Word, WORD_KEYWORDS), (DocumentKind::Excel, EXCEL_KEYWORDS)] {
        let tags = Engine::for_kind(kind).tags();
        for (keywords, tag) in table {
            assert!(tags.contains(tag), "{kind}: {keywords:?} maps to unregistered {tag}");
        }
    }
    let excel = Engine::for_kind(DocumentKind::Excel).tags();
    for generic in ["SetFont", "SetColor", "SetSize"] {
        assert!(excel.contains(&generic), "{generic}");
    }
}

#[test]
fn excel_tag_registry() {
    let tags = Engine::for_kind(DocumentKind::Excel).tags().join("\n");
    assert_snapshot!(tags);
}

#[test]
fn comparators_behave() {
    assert!(text_equals(Some(" Red "), Some("red")));
    assert!(text_equals(None, None));
    assert!(!text_equals(None, Some("x")));
    assert!(!text_equals(Some(""), None));
    for (a, b) in [("Sheet1", "sheet1 "), ("宋体", "黑体"), ("", "")] {
        assert_eq!(text_equals(Some(a), Some(b)), text_equals(Some(b), Some(a)), "{a} / {b}");
        assert!(text_equals(Some(a), Some(a)));
    }
    assert!(text_contains(Some("Total Sales 2024"), Some("sales")));
    assert!(!text_contains(None, Some("x")));

    assert!(number_equals(12.04, 12.0, 0.1));
    assert!(!number_equals(12.2, 12.0, 0.1));
    assert!(number_equals(-3.0, -3.0, 0.0));

    assert!(color_equals("#FF0000", "FF0000"));
    assert!(color_equals("FFFF0000", "#ff0000"));
    assert!(color_equals("red", "FF0000"));
    assert!(color_equals("红色", "#FF0000"));
    assert!(!color_equals("00FF00", "red"));
    for c in ["#123456", "blue", "auto"] {
        assert!(color_equals(c, c), "{c}");
    }
}

#[test]
fn totals_match_only_when_everything_passes() {
    let path = workbook();
    let passing = point(DocumentKind::Excel, "a", "FillOrCopyCellContent", 2.0, &[("CellRange", "A1"), ("ExpectedValue", "Hello")]);
    let failing = point(DocumentKind::Excel, "b", "MergeCells", 3.0, &[("CellRange", "A1:B1")]);

    let all_pass = ExcelScoringEngine.score_file(&path, &excel_exam(vec![question("q1", vec![passing.clone()])]));
    assert_eq!(all_pass.achieved_score, all_pass.total_score);
    assert_eq!(all_pass.score_rate, 1.0);

    let mixed = ExcelScoringEngine.score_file(&path, &excel_exam(vec![question("q1", vec![passing, failing])]));
    assert!(mixed.achieved_score < mixed.total_score);
    assert_score_bounds(&mixed.knowledge_point_results);
}

#[test]
fn overview_table_lists_every_verdict() {
    let path = workbook();
    let exam = excel_exam(vec![question("q1", vec![
        point(DocumentKind::Excel, "a", "FillOrCopyCellContent", 2.0, &[("CellRange", "A1"), ("ExpectedValue", "Hello")]),
        point(DocumentKind::Excel, "b", "Bogus", 1.0, &[]),
    ])]);
    let result = ExcelScoringEngine.score_file(&path, &exam);
    let table = docgrade::show_results("answer.xlsx", &result);

    assert!(table.contains("answer.xlsx"));
    assert!(table.contains("FillOrCopyCellContent"));
    assert!(table.contains("2.00/2.00"));
    assert!(table.contains("0.00/1.00"));
    assert!(table.contains("Total: 2.00/3.00"));
}

#[test]
fn budget_cap_fails_the_rest() {
    let cfg = ScoringConfig::default().with_max_rules(Some(2));
    let points: Vec<OperationPoint> = (0..4)
        .map(|i| point(DocumentKind::Excel, &format!("p{i}"), "Anything", 1.0, &[]))
        .collect();
    let results = batch::run(
        &(),
        &points,
        &cfg,
        |p| p.name.clone(),
        |_, p, tag| {
            let mut r = KnowledgePointResult::for_point(p, tag);
            r.succeed(None);
            r
        },
    );
    let correct: Vec<bool> = results.iter().map(|r| r.is_correct).collect();
    assert_eq!(correct, [true, true, false, false]);
    assert_eq!(results[3].error_message.as_deref(), Some(BUDGET_EXHAUSTED));
}

#[test]
fn panicking_rule_is_contained() {
    let cfg = ScoringConfig::default();
    let points = vec![
        point(DocumentKind::Excel, "boom", "Anything", 1.0, &[]),
        point(DocumentKind::Excel, "fine", "Anything", 1.0, &[]),
    ];
    let results = batch::run(
        &(),
        &points,
        &cfg,
        |p| p.name.clone(),
        |_, p, tag| {
            if p.id == "boom" {
                panic!("index out of bounds");
            }
            let mut r = KnowledgePointResult::for_point(p, tag);
            r.succeed(None);
            r
        },
    );
    assert!(!results[0].is_correct);
    assert!(results[0].error_message.as_deref().is_some_and(|m| m.starts_with("detection failed")));
    assert!(results[1].is_correct);
}

#[test]
fn score_file_reattaches_questions_and_skips_disabled() {
    let path = workbook();
    let mut disabled = point(DocumentKind::Excel, "off", "MergeCells", 9.0, &[("CellRange", "A1:B1")]);
    disabled.enabled = false;
    let exam = excel_exam(vec![
        question("q1", vec![
            point(DocumentKind::Excel, "a", "FillOrCopyCellContent", 2.0, &[("CellRange", "A1"), ("ExpectedValue", "Hello")]),
            disabled,
        ]),
        question("q2", vec![
            point(DocumentKind::Excel, "b", "MergeCells", 3.0, &[("CellRange", "A1:B1")]),
            point(DocumentKind::Word, "w", "SetFont", 5.0, &[("FontName", "Arial")]),
        ]),
    ]);

    let result = ExcelScoringEngine.score_file(&path, &exam);
    assert!(result.is_success, "{:?}", result.error_message);
    assert_eq!(result.total_score, 5.0);
    assert_eq!(result.achieved_score, 2.0);
    assert!((result.score_rate - 0.4).abs() < 1e-9);
    let questions: Vec<Option<&str>> = result
        .knowledge_point_results
        .iter()
        .map(|r| r.question_id.as_deref())
        .collect();
    assert_eq!(questions, [Some("q1"), Some("q2")]);
    assert!(result.end_time >= result.start_time);
    assert_score_bounds(&result.knowledge_point_results);
}

#[test]
fn repeated_point_ids_keep_their_own_questions() {
    let path = workbook();
    let exam = excel_exam(vec![
        question("q1", vec![point(DocumentKind::Excel, "dup", "FillOrCopyCellContent", 2.0, &[("CellRange", "A1"), ("ExpectedValue", "Hello")])]),
        question("q2", vec![point(DocumentKind::Excel, "dup", "MergeCells", 3.0, &[("CellRange", "A1:B1")])]),
    ]);

    let result = ExcelScoringEngine.score_file(&path, &exam);
    let owners: Vec<(&str, Option<&str>)> = result
        .knowledge_point_results
        .iter()
        .map(|r| (r.knowledge_point_type.as_str(), r.question_id.as_deref()))
        .collect();
    assert_eq!(owners, [("FillOrCopyCellContent", Some("q1")), ("MergeCells", Some("q2"))]);
}

#[test]
fn aggregation_restores_all_or_nothing_scores() {
    let over = point(DocumentKind::Excel, "over", "Anything", 2.0, &[]);
    let mut too_much = KnowledgePointResult::for_point(&over, "Anything");
    too_much.is_correct = true;
    too_much.achieved_score = 7.5;
    let mut unearned = KnowledgePointResult::for_point(&over, "Anything");
    unearned.achieved_score = 1.0;
    let mut unpaid = KnowledgePointResult::for_point(&over, "Anything");
    unpaid.is_correct = true;

    let result = aggregate::finalize(ScoringResult::started(), vec![too_much, unearned, unpaid]);
    let scores: Vec<f64> = result.knowledge_point_results.iter().map(|r| r.achieved_score).collect();
    assert_eq!(scores, [2.0, 0.0, 2.0]);
    assert_eq!(result.achieved_score, 4.0);
    assert_eq!(result.total_score, 6.0);
    assert_score_bounds(&result.knowledge_point_results);
}

#[test]
fn score_file_without_points_is_an_error() {
    let path = workbook();
    let result = ExcelScoringEngine.score_file(&path, &excel_exam(vec![question("q1", vec![])]));
    assert!(!result.is_success);
    assert_eq!(result.error_message.as_deref(), Some(NO_OPERATION_POINTS));
    assert_eq!(result.total_score, 0.0);
    assert_eq!(result.score_rate, 0.0);

    let word = WordScoringEngine.score_file(&path, &excel_exam(vec![]));
    assert!(word.is_success);
    assert!(word.knowledge_point_results.is_empty());
}

#[test]
fn score_question_tags_every_verdict() {
    let path = docx(&paragraph("Hello world", "", r#"<w:rFonts w:ascii="Arial" w:hAnsi="Arial"/>"#), None);
    let q = question("q7", vec![
        point(DocumentKind::Word, "f", "SetFont", 2.0, &[("FontName", "Arial")]),
        point(DocumentKind::Word, "c", "SetDocumentContent", 1.0, &[("ExpectedContent", "Goodbye")]),
    ]);
    let result = WordScoringEngine.score_question(&path, &q);
    assert_eq!(result.question_id.as_deref(), Some("q7"));
    assert_eq!(result.question_title.as_deref(), Some("Question q7"));
    assert_eq!(result.achieved_score, 2.0);
    assert_eq!(result.total_score, 3.0);
    assert!(result.knowledge_point_results.iter().all(|r| r.question_id.as_deref() == Some("q7")));

    let empty = WordScoringEngine.score_question(&path, &question("q8", vec![]));
    assert_eq!(empty.error_message.as_deref(), Some(NO_OPERATION_POINTS));
}

#[test]
fn exam_json_round_trips_through_serde() {
    let text = r#"{
        "id": "e1",
        "name": "Finals",
        "modules": [{
            "name": "Excel part",
            "kind": "excel",
            "questions": [{
                "id": "q1",
                "title": "Fill the header",
                "operation_points": [{
                    "id": "p1",
                    "name": "FillOrCopyCellContent",
                    "kind": "Excel",
                    "score": 2,
                    "parameters": {"CellRange": "A1", "ExpectedValue": "Hello"}
                }]
            }]
        }]
    }"#;
    let exam: ExamModel = serde_json::from_str(text).expect("parse exam");
    let module = exam.module(DocumentKind::Excel).expect("excel module");
    let p = &module.questions[0].operation_points[0];
    assert!(p.enabled);
    assert_eq!(p.score, 2.0);

    let result = ExcelScoringEngine.score_file(&workbook(), &exam);
    assert_eq!(result.achieved_score, 2.0);
}

#[tokio::test]
async fn async_scoring_matches_blocking() {
    let path = workbook();
    let exam = excel_exam(vec![question("q1", vec![point(
        DocumentKind::Excel,
        "a",
        "FillOrCopyCellContent",
        2.0,
        &[("CellRange", "A1"), ("ExpectedValue", "Hello")],
    )])]);

    let blocking = ExcelScoringEngine.score_file(&path, &exam);
    let awaited = ExcelScoringEngine.score_file_async(path.clone(), exam.clone()).await;
    assert_eq!(awaited.achieved_score, blocking.achieved_score);
    assert_eq!(awaited.knowledge_point_results.len(), 1);

    let engine = docgrade::engine_for(&path).expect("engine");
    let verdicts = engine
        .detect_knowledge_points_async(path.clone(), exam.modules[0].questions[0].operation_points.clone())
        .await;
    assert!(verdicts[0].is_correct);

    let q = exam.modules[0].questions[0].clone();
    let scored = ExcelScoringEngine.score_question_async(path, q).await;
    assert_eq!(scored.question_id.as_deref(), Some("q1"));
}

#[test]
fn directory_inputs_expand_to_documents() {
    let root = common::temp_dir();
    let nested = root.join("class-a").join("alice");
    std::fs::create_dir_all(&nested).expect("nested dir");
    for name in ["answer.XLSX", "report.docx", "~$report.docx", "notes.txt"] {
        std::fs::write(nested.join(name), b"x").expect("write file");
    }
    std::fs::write(root.join("top.docx"), b"x").expect("write file");
    let loose = root.join("class-a").join("loose.xlsx");

    let found = docgrade::util::expand_inputs(&[root.clone(), loose.clone()], &["docx", "xlsx"])
        .expect("expand inputs");
    let mut names: Vec<String> = found
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    names.sort();
    assert_eq!(names, ["answer.XLSX", "loose.xlsx", "report.docx", "top.docx"]);
}
