#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::{check_paragraphs, paragraph_subject, target_paragraphs};
use crate::{
    error::ScoringError,
    grade::{
        Check, Params,
        compare::{color_equals, number_equals},
        params::parse_number,
        vocab::{self, Vocab, WORD_ALIGNMENT, WORD_BORDER_STYLE},
    },
    ooxml::{XmlNode, fmt_num},
    word::{ParaProps, WordDocument},
};

/// Drop cap modes (`w:framePr/@dropCap`).
const DROP_CAP: Vocab = &[
    ("none", &["无"]),
    ("drop", &["下沉"]),
    ("margin", &["悬挂"]),
];

/// Shading patterns (`w:shd/@val`).
pub const SHADING_PATTERNS: Vocab = &[
    ("clear", &["无纹理", "清除"]),
    ("solid", &["实心填充", "100%"]),
    ("pct5", &["5%"]),
    ("pct10", &["10%"]),
    ("pct12", &["12.5%"]),
    ("pct15", &["15%"]),
    ("pct20", &["20%"]),
    ("pct25", &["25%"]),
    ("pct30", &["30%"]),
    ("pct35", &["35%"]),
    ("pct37", &["37.5%"]),
    ("pct40", &["40%"]),
    ("pct45", &["45%"]),
    ("pct50", &["50%"]),
    ("pct55", &["55%"]),
    ("pct60", &["60%"]),
    ("pct62", &["62.5%"]),
    ("pct65", &["65%"]),
    ("pct70", &["70%"]),
    ("pct75", &["75%"]),
    ("pct80", &["80%"]),
    ("pct85", &["85%"]),
    ("pct87", &["87.5%"]),
    ("pct90", &["90%"]),
    ("pct95", &["95%"]),
    ("horzStripe", &["水平条纹", "深色横线"]),
    ("vertStripe", &["垂直条纹", "深色竖线"]),
    ("reverseDiagStripe", &["深色对角线下", "深色下斜线"]),
    ("diagStripe", &["深色对角线上", "深色上斜线"]),
    ("horzCross", &["深色横线网格"]),
    ("diagCross", &["深色斜线网格"]),
];

/// List numbering kinds.
const NUMBERING_TYPES: Vocab = &[
    ("bullet", &["项目符号", "符号"]),
    ("decimal", &["编号", "数字", "1,2,3", "1.2.3."]),
    ("multilevel", &["多级列表", "多级编号"]),
    ("lowerLetter", &["a,b,c", "小写字母"]),
    ("upperLetter", &["A,B,C", "大写字母"]),
    ("lowerRoman", &["i,ii,iii", "小写罗马数字"]),
    ("upperRoman", &["I,II,III", "大写罗马数字"]),
    ("chineseCounting", &["一,二,三", "中文数字", "chineseCountingThousand"]),
];

/// Paragraphs are aligned `Alignment`.
pub fn set_alignment(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["Alignment", "HorizontalAlignment"])?;
    check_paragraphs(
        doc,
        &params,
        "alignment",
        expected,
        |_, props| Ok(Some(props.alignment.clone().unwrap_or_else(|| "left".into()))),
        |actual| vocab::same(WORD_ALIGNMENT, actual, expected),
    )
}

/// Expected line spacing as (value, unit): `1.5`, `1.5倍`, `双倍行距` are
/// multiples; `20磅` and `20pt` are exact points.
fn parse_line_spacing(raw: &str) -> Option<(f64, &'static str)> {
    let named = [("单倍行距", 1.0), ("1.5倍行距", 1.5), ("双倍行距", 2.0), ("2倍行距", 2.0)];
    if let Some((_, v)) = named.iter().find(|(n, _)| *n == raw.trim()) {
        return Some((*v, "x"));
    }
    let unit = if raw.contains('磅') || raw.to_lowercase().contains("pt") {
        "pt"
    } else {
        "x"
    };
    parse_number(raw).map(|v| (v, unit))
}

/// Paragraphs use `LineSpacing` (a multiple, or points when given in
/// points).
pub fn set_line_spacing(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let raw = params.require("LineSpacing")?;
    let (want, unit) = parse_line_spacing(raw).ok_or_else(|| ScoringError::missing("LineSpacing"))?;
    let tolerance = doc.tolerance();
    let expected = format!("{}{unit}", fmt_num(want));
    check_paragraphs(
        doc,
        &params,
        "line spacing",
        &expected,
        |_, props| {
            let (v, u) = props.line_spacing().unwrap_or((1.0, "x"));
            Ok(Some(format!("{}{u}", fmt_num(v))))
        },
        |actual| {
            actual
                .strip_suffix(unit)
                .and_then(|v| v.parse::<f64>().ok())
                .is_some_and(|v| number_equals(v, want, tolerance))
        },
    )
}

/// Paragraphs have `SpaceBefore` and/or `SpaceAfter` points.
pub fn set_spacing(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let before = params.try_number("SpaceBefore");
    let after = params.try_number("SpaceAfter");
    if before.is_none() && after.is_none() {
        return Err(ScoringError::missing("SpaceBefore or SpaceAfter"));
    }
    let tolerance = doc.tolerance();
    let show = |b: Option<f64>, a: Option<f64>| {
        [("before", b), ("after", a)]
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| format!("{k} {}", fmt_num(v))))
            .join(", ")
    };
    let expected = show(before, after);

    let mut observed = Vec::new();
    for p in target_paragraphs(doc, &params)? {
        let props = doc.para_props(p)?;
        let (b, a) = (
            props.space_before.unwrap_or(0.0),
            props.space_after.unwrap_or(0.0),
        );
        let ok = before.is_none_or(|want| number_equals(b, want, tolerance))
            && after.is_none_or(|want| number_equals(a, want, tolerance));
        observed.push((
            show(before.map(|_| b), after.map(|_| a)),
            ok,
        ));
    }
    Ok(Check::any_judged(paragraph_subject(&params, "spacing"), expected, observed))
}

/// One indentation measure in characters: the character-based attribute
/// wins, else twips are converted with the paragraph's character width.
fn indent_chars(chars: Option<f64>, twips: Option<f64>, char_width: f64) -> f64 {
    match (chars, twips) {
        (Some(c), _) => c / 100.0,
        (None, Some(t)) => t / char_width,
        (None, None) => 0.0,
    }
}

/// Paragraphs are indented by `FirstLineIndent`, `LeftIndent` and/or
/// `RightIndent` characters (a negative first line is a hanging indent).
pub fn set_indentation(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let wanted: Vec<(&str, f64)> = ["FirstLineIndent", "LeftIndent", "RightIndent"]
        .into_iter()
        .filter_map(|k| params.try_number(k).map(|v| (k, v)))
        .collect();
    if wanted.is_empty() {
        return Err(ScoringError::missing(
            "FirstLineIndent or LeftIndent or RightIndent",
        ));
    }
    let tolerance = doc.tolerance();
    let expected = wanted
        .iter()
        .map(|(k, v)| format!("{k} {}", fmt_num(*v)))
        .join(", ");

    let mut observed = Vec::new();
    for p in target_paragraphs(doc, &params)? {
        let props = doc.para_props(p)?;
        let width = doc.char_width_twips(p)?;
        let actual = |key: &str| match key {
            "FirstLineIndent" => indent_chars(props.first_line_chars, props.first_line, width),
            "LeftIndent" => indent_chars(props.left_chars, props.left, width),
            _ => indent_chars(props.right_chars, props.right, width),
        };
        let ok = wanted
            .iter()
            .all(|(k, v)| number_equals(actual(k), *v, tolerance));
        let shown = wanted
            .iter()
            .map(|(k, _)| format!("{k} {}", fmt_num(actual(k))))
            .join(", ");
        observed.push((shown, ok));
    }
    Ok(Check::any_judged(paragraph_subject(&params, "indentation"), expected, observed))
}

/// A paragraph carries a `DropCapType` drop cap (and `DropCapLines` lines
/// when given). A drop cap lives in its own framed paragraph, so the
/// paragraph before a selected one is considered too.
pub fn set_drop_cap(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.try_get("DropCapType").unwrap_or("drop");
    let lines = params.try_int("DropCapLines");
    let all = doc.paragraphs();
    let candidates: Vec<&XmlNode> = match params.index("ParagraphNumber", all.len())? {
        Some(i) => all[i.saturating_sub(1)..=i].to_vec(),
        None => all,
    };

    let observed = candidates.iter().filter_map(|p| {
        let frame = p.path(&["pPr", "framePr"])?;
        let mode = frame.attr("dropCap").unwrap_or("none").to_string();
        let count = frame.attr("lines").and_then(|l| l.parse::<i64>().ok());
        let ok = vocab::same(DROP_CAP, &mode, expected) && lines.is_none_or(|l| count == Some(l));
        let shown = match count {
            Some(n) => format!("{mode}, {n} lines"),
            None => mode,
        };
        Some((shown, ok))
    });
    let mut observed: Vec<(String, bool)> = observed.collect();
    if observed.is_empty() && vocab::same(DROP_CAP, "none", expected) {
        observed.push(("none".to_string(), true));
    }
    Ok(Check::any_judged(paragraph_subject(&params, "drop cap"), expected, observed))
}

/// Border property of a paragraph: every drawn side, deduplicated.
fn border_values(props: &ParaProps, pick: impl Fn(&crate::word::Border) -> Option<String>) -> Option<String> {
    if props.borders.is_empty() {
        return None;
    }
    Some(
        props
            .borders
            .iter()
            .map(|b| pick(b).unwrap_or_else(|| "auto".to_string()))
            .unique()
            .join("/"),
    )
}

/// Paragraph borders are coloured `BorderColor`.
pub fn set_border_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("BorderColor")?;
    check_paragraphs(
        doc,
        &params,
        "border colour",
        expected,
        |_, props| Ok(border_values(props, |b| b.color.clone())),
        |actual| actual.split('/').all(|c| color_equals(c, expected)),
    )
}

/// Paragraph borders use the line style `BorderStyle`.
pub fn set_border_style(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("BorderStyle")?;
    check_paragraphs(
        doc,
        &params,
        "border style",
        expected,
        |_, props| Ok(border_values(props, |b| Some(b.style.clone()))),
        |actual| actual.split('/').all(|s| vocab::same(WORD_BORDER_STYLE, s, expected)),
    )
}

/// Paragraph borders are `BorderWidth` points wide.
pub fn set_border_width(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let want = params.require_number("BorderWidth")?;
    let tolerance = doc.tolerance();
    check_paragraphs(
        doc,
        &params,
        "border width",
        &fmt_num(want),
        |_, props| Ok(border_values(props, |b| b.width.map(fmt_num))),
        |actual| {
            actual
                .split('/')
                .all(|w| w.parse::<f64>().is_ok_and(|w| number_equals(w, want, tolerance)))
        },
    )
}

/// Paragraphs are shaded with `ShadingColor` and/or `ShadingPattern`.
pub fn set_shading(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let color = params.first_of(&["ShadingColor", "FillColor"]);
    let pattern = params.try_get("ShadingPattern");
    if color.is_none() && pattern.is_none() {
        return Err(ScoringError::missing("ShadingColor or ShadingPattern"));
    }
    let expected = [color, pattern].into_iter().flatten().join(", ");

    let mut observed = Vec::new();
    for p in target_paragraphs(doc, &params)? {
        let props = doc.para_props(p)?;
        let fill = props.shading_fill.clone().unwrap_or_else(|| "auto".into());
        let pat = props.shading_pattern.clone().unwrap_or_else(|| "clear".into());
        let ok = color.is_none_or(|c| color_equals(&fill, c))
            && pattern.is_none_or(|want| vocab::same(SHADING_PATTERNS, &pat, want));
        observed.push((format!("{fill}, {pat}"), ok));
    }
    Ok(Check::any_judged(paragraph_subject(&params, "shading"), expected, observed))
}

/// List formatting of a paragraph: (`numFmt`, `multiLevelType`).
fn list_format(doc: &WordDocument, p: &XmlNode) -> Result<Option<(String, String)>, ScoringError> {
    match doc.para_props(p)?.numbering {
        Some((num_id, ilvl)) => doc.list_format(&num_id, ilvl),
        None => Ok(None),
    }
}

/// Paragraphs a list rule inspects: `ParagraphNumbers` when given, else
/// every body paragraph.
fn list_targets<'d>(doc: &'d WordDocument, params: &Params<'_>) -> Result<(Vec<&'d XmlNode>, bool), ScoringError> {
    let all = doc.paragraphs();
    let picked = params.index_list("ParagraphNumbers", all.len())?;
    if picked.is_empty() {
        return Ok((all, false));
    }
    Ok((picked.into_iter().map(|i| all[i]).collect(), true))
}

/// Shared list check: every listed paragraph (or any paragraph when none are
/// listed) is a list item whose format satisfies `matches`.
fn check_list(
    doc: &WordDocument,
    params: &Params<'_>,
    expected: &str,
    matches: impl Fn(&str, &str) -> bool,
) -> Result<Check, ScoringError> {
    let (targets, listed) = list_targets(doc, params)?;
    let mut shown = Vec::new();
    let mut hits = 0;
    for p in &targets {
        match list_format(doc, p)? {
            Some((fmt, multi)) => {
                if matches(&fmt, &multi) {
                    hits += 1;
                }
                shown.push(if multi == "multilevel" { format!("{fmt} (multilevel)") } else { fmt });
            }
            None => shown.push("not a list item".to_string()),
        }
    }
    let passed = if listed { hits == targets.len() && hits > 0 } else { hits > 0 };
    let actual = shown.into_iter().unique().join(", ");
    Ok(Check::compare(passed, "list format", expected, actual))
}

/// Paragraphs are bulleted list items.
pub fn create_bullet_list(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_list(doc, &params, "bullet", |fmt, _| fmt == "bullet")
}

/// Paragraphs are numbered list items.
pub fn create_numbered_list(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_list(doc, &params, "numbered", |fmt, _| fmt != "bullet" && fmt != "none")
}

/// `ParagraphNumbers` use the list kind `NumberingType`.
pub fn set_bullet_numbering(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("NumberingType")?;
    let kind = vocab::canonical(NUMBERING_TYPES, expected);
    check_list(doc, &params, expected, |fmt, multi| match kind {
        Some("multilevel") => multi == "multilevel",
        _ => vocab::same(NUMBERING_TYPES, fmt, expected),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_spacing_units() {
        assert_eq!(parse_line_spacing("1.5"), Some((1.5, "x")));
        assert_eq!(parse_line_spacing("双倍行距"), Some((2.0, "x")));
        assert_eq!(parse_line_spacing("20磅"), Some((20.0, "pt")));
    }

    #[test]
    fn indents_prefer_character_units() {
        assert_eq!(indent_chars(Some(200.0), Some(999.0), 210.0), 2.0);
        assert_eq!(indent_chars(None, Some(420.0), 210.0), 2.0);
        assert_eq!(indent_chars(None, None, 210.0), 0.0);
    }
}
