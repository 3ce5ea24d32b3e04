#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{check_runs, paragraph_subject, target_paragraphs};
use crate::{
    error::ScoringError,
    grade::{
        Check, Params,
        compare::{color_equals, number_equals, squash_whitespace, text_contains, text_equals},
        vocab::{self, FontFlags, Vocab, parse_font_size},
    },
    ooxml::{XmlNode, fmt_num, rel},
    word::WordDocument,
};

/// Built-in paragraph style names as stored in `styles.xml`, with the labels
/// a localized authoring tool shows.
const STYLE_NAMES: Vocab = &[
    ("Normal", &["正文"]),
    ("heading 1", &["标题 1", "标题1", "Heading1", "Heading 1"]),
    ("heading 2", &["标题 2", "标题2", "Heading2", "Heading 2"]),
    ("heading 3", &["标题 3", "标题3", "Heading3", "Heading 3"]),
    ("heading 4", &["标题 4", "标题4", "Heading4", "Heading 4"]),
    ("heading 5", &["标题 5", "标题5", "Heading5", "Heading 5"]),
    ("heading 6", &["标题 6", "标题6", "Heading6", "Heading 6"]),
    ("Title", &["标题"]),
    ("Subtitle", &["副标题"]),
    ("List Paragraph", &["列出段落", "列表段落"]),
    ("Quote", &["引用"]),
    ("Intense Quote", &["明显引用"]),
    ("No Spacing", &["无间隔"]),
];

/// Shortens long text for verdict descriptions.
fn preview(text: &str) -> String {
    let squashed = squash_whitespace(text);
    if squashed.chars().count() <= 60 {
        return squashed;
    }
    let head: String = squashed.chars().take(60).collect();
    format!("{head}...")
}

/// Required font size parameter, accepting named sizes.
fn require_font_size(params: &Params<'_>, key: &str) -> Result<f64, ScoringError> {
    params
        .try_get(key)
        .and_then(parse_font_size)
        .ok_or_else(|| ScoringError::missing(key))
}

/// The body contains `ExpectedContent`.
pub fn set_document_content(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["ExpectedContent", "TextContent"])?;
    let body = doc.body_text();
    let passed = text_contains(
        Some(squash_whitespace(&body).as_str()),
        Some(squash_whitespace(expected).as_str()),
    );
    Ok(Check::compare(passed, "document text contains", expected, preview(&body)))
}

/// Runs use `FontName` (or `FontFamily`) for any of their scripts.
pub fn set_font(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["FontName", "FontFamily"])?;
    check_runs(
        doc,
        &params,
        "font",
        expected,
        |r| Some(r.font_display()).filter(|f| !f.is_empty()),
        |actual| actual.split('/').any(|f| text_equals(Some(f), Some(expected))),
    )
}

/// Runs are `FontSize` points.
pub fn set_font_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = require_font_size(&params, "FontSize")?;
    let tolerance = doc.tolerance();
    check_runs(
        doc,
        &params,
        "font size",
        &fmt_num(expected),
        |r| r.size.map(fmt_num),
        |actual| {
            actual
                .parse::<f64>()
                .is_ok_and(|a| number_equals(a, expected, tolerance))
        },
    )
}

/// Runs carry the `FontStyle` flags (bold, italic, underline, strike).
pub fn set_font_style(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let raw = params.require("FontStyle")?;
    let expected = FontFlags::parse(raw).ok_or_else(|| ScoringError::missing("FontStyle"))?;
    check_runs(
        doc,
        &params,
        "font style",
        &expected.to_string(),
        |r| Some(r.flags().to_string()),
        |actual| FontFlags::parse(actual).is_some_and(|a| a.satisfies(&expected)),
    )
}

/// Runs are coloured `FontColor`.
pub fn set_font_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["FontColor", "TextColor", "Color"])?;
    check_runs(
        doc,
        &params,
        "font colour",
        expected,
        |r| Some(r.color.clone().unwrap_or_else(|| "auto".to_string())),
        |actual| color_equals(actual, expected),
    )
}

/// Runs are spaced by `CharacterSpacing` points.
pub fn set_character_spacing(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_number("CharacterSpacing")?;
    let tolerance = doc.tolerance();
    check_runs(
        doc,
        &params,
        "character spacing",
        &fmt_num(expected),
        |r| Some(fmt_num(r.spacing.unwrap_or(0.0))),
        |actual| {
            actual
                .parse::<f64>()
                .is_ok_and(|a| number_equals(a, expected, tolerance))
        },
    )
}

/// Runs of `p` that overlap the first occurrence of `needle` in the text of
/// those runs.
fn runs_covering<'a>(p: &'a XmlNode, needle: &str) -> Vec<&'a XmlNode> {
    let runs = WordDocument::runs(p);
    let mut text = String::new();
    let mut spans = Vec::with_capacity(runs.len());
    for r in &runs {
        let start = text.len();
        for c in r.children() {
            if c.is("t") {
                text.push_str(c.text());
            } else if c.is("tab") {
                text.push('\t');
            }
        }
        spans.push((start, text.len()));
    }
    let Some(start) = text.find(needle) else {
        return Vec::new();
    };
    let end = start + needle.len();
    runs.into_iter()
        .zip(spans)
        .filter(|(_, (s, e))| s < e && *s < end && *e > start)
        .map(|(r, _)| r)
        .collect()
}

/// The runs holding `TargetText` are `FontSize` points.
pub fn set_specific_text_font_size(
    doc: &WordDocument,
    params: Params<'_>,
) -> Result<Check, ScoringError> {
    let target = params.require("TargetText")?;
    let expected = require_font_size(&params, "FontSize")?;
    let subject = format!("font size of '{target}'");

    for p in doc.paragraphs() {
        let runs = runs_covering(p, target);
        if runs.is_empty() {
            continue;
        }
        let mut sizes = Vec::with_capacity(runs.len());
        for r in runs {
            sizes.push(doc.run_props(p, r)?.size);
        }
        let passed = sizes
            .iter()
            .all(|s| s.is_some_and(|s| number_equals(s, expected, doc.tolerance())));
        let actual = sizes
            .iter()
            .map(|s| s.map_or_else(|| "unset".to_string(), fmt_num))
            .collect::<Vec<_>>()
            .join(" | ");
        return Ok(Check::compare(passed, subject, fmt_num(expected), actual));
    }
    Ok(Check::absent(subject, fmt_num(expected)))
}

/// `FindText` no longer occurs and `ReplaceText` occurs at least
/// `ReplaceCount` times (default 1).
pub fn find_and_replace(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let find = params.require("FindText")?;
    let replace = params.require("ReplaceText")?;
    let wanted = params.try_int("ReplaceCount").unwrap_or(1).max(1) as usize;
    let body = doc.body_text();

    let mut checks = vec![Check::compare(
        body.matches(replace).count() >= wanted,
        format!("occurrences of '{replace}'"),
        format!("at least {wanted}"),
        body.matches(replace).count().to_string(),
    )];
    if !replace.contains(find) {
        let left = body.matches(find).count();
        checks.push(Check::compare(
            left == 0,
            format!("occurrences of '{find}'"),
            "0",
            left.to_string(),
        ));
    }
    Ok(Check::all("find and replace", checks))
}

/// Target paragraphs use the paragraph style `StyleName`, matched by its
/// display name in either language.
pub fn apply_style(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("StyleName")?;
    let mut observed = Vec::new();
    for p in target_paragraphs(doc, &params)? {
        let shown = match doc.para_props(p)?.style_id {
            Some(id) => doc.style_name(&id)?.unwrap_or(id),
            None => "Normal".to_string(),
        };
        observed.push(shown);
    }
    Ok(Check::any(
        paragraph_subject(&params, "style"),
        expected,
        observed,
        |name| vocab::same(STYLE_NAMES, name, expected),
    ))
}

/// A template other than the default one is attached; with `TemplateName`,
/// its name contains that value.
pub fn apply_template(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.try_get("TemplateName");
    let template = attached_template(doc)?;
    let subject = "attached template";
    let Some(template) = template else {
        return Ok(Check::absent(subject, expected.unwrap_or("a template")));
    };
    let passed = match expected {
        Some(name) => text_contains(Some(&template), Some(name)),
        None => !text_equals(Some(&template), Some("Normal.dotm"))
            && !text_equals(Some(&template), Some("Normal")),
    };
    Ok(Check::compare(passed, subject, expected.unwrap_or("a non-default template"), template))
}

/// Name of the template the document is attached to, from the settings
/// relationship or the extended properties.
fn attached_template(doc: &WordDocument) -> Result<Option<String>, ScoringError> {
    let settings = doc
        .main_relationships()?
        .into_iter()
        .find(|r| r.is("settings"))
        .map(|r| r.target);
    if let Some(settings) = settings {
        let target = doc
            .package()
            .relationships(&settings)?
            .into_iter()
            .find(|r| r.is(rel::ATTACHED_TEMPLATE))
            .map(|r| r.target);
        if let Some(target) = target {
            let name = target.rsplit(['/', '\\']).next().unwrap_or(&target);
            return Ok(Some(name.to_string()));
        }
    }
    Ok(doc
        .package()
        .xml("docProps/app.xml")?
        .and_then(|app| app.child("Template"))
        .map(|t| t.text().trim().to_string())
        .filter(|t| !t.is_empty()))
}
