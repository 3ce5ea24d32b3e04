#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use itertools::Itertools;

use crate::{
    error::ScoringError,
    grade::{
        Check, Params,
        compare::{COARSE_EPSILON, color_equals, number_equals, text_contains, text_equals},
        params::parse_number,
        vocab::{self, ORIENTATION, Vocab, WORD_ALIGNMENT, WORD_BORDER_STYLE, parse_font_size},
    },
    ooxml::{XmlNode, fmt_num, twips_to_pt},
    word::{Border, WordDocument, collect},
};

/// Paper sizes in twips (portrait width, height).
const PAPER_SIZES: &[(&str, &[&str], f64, f64)] = &[
    ("A4", &["A4纸"], 11906.0, 16838.0),
    ("A3", &["A3纸"], 16838.0, 23811.0),
    ("A5", &["A5纸"], 8391.0, 11906.0),
    ("B5", &["B5 (ISO)", "ISO B5"], 9979.0, 14175.0),
    ("B5 (JIS)", &["JIS B5", "B5(JIS)"], 10319.0, 14571.0),
    ("Letter", &["信纸", "US Letter"], 12240.0, 15840.0),
    ("Legal", &["法律专用纸", "US Legal"], 12240.0, 20160.0),
];

/// Section break kinds (`w:type/@val`).
const SECTION_BREAKS: Vocab = &[
    ("nextPage", &["下一页", "下一页分节符"]),
    ("continuous", &["连续", "连续分节符"]),
    ("evenPage", &["偶数页", "偶数页分节符"]),
    ("oddPage", &["奇数页", "奇数页分节符"]),
    ("nextColumn", &["下一栏"]),
];

/// Page number formats (`w:pgNumType/@fmt`).
const PAGE_NUMBER_FORMATS: Vocab = &[
    ("decimal", &["1,2,3", "1, 2, 3", "阿拉伯数字"]),
    ("lowerLetter", &["a,b,c", "a, b, c"]),
    ("upperLetter", &["A,B,C", "A, B, C"]),
    ("lowerRoman", &["i,ii,iii", "i, ii, iii"]),
    ("upperRoman", &["I,II,III", "I, II, III"]),
];

/// Watermark orientations in degrees.
const WATERMARK_ANGLES: &[(&str, f64)] = &[
    ("水平", 0.0),
    ("horizontal", 0.0),
    ("斜式", 315.0),
    ("倾斜", 315.0),
    ("diagonal", 315.0),
];

/// Paper name for a page size in twips, in either orientation.
fn paper_name(w: f64, h: f64) -> Option<&'static str> {
    let (short, long) = if w <= h { (w, h) } else { (h, w) };
    PAPER_SIZES
        .iter()
        .find(|(_, _, pw, ph)| (short - pw).abs() <= 20.0 && (long - ph).abs() <= 20.0)
        .map(|(name, ..)| *name)
}

/// Canonical paper name for an authored label.
fn paper_label(label: &str) -> Option<&'static str> {
    let l = label.trim();
    PAPER_SIZES
        .iter()
        .find(|(name, aliases, ..)| {
            name.eq_ignore_ascii_case(l) || aliases.iter().any(|a| a.eq_ignore_ascii_case(l))
        })
        .map(|(name, ..)| *name)
}

/// Page size of a section in twips.
fn page_size(section: &XmlNode) -> Option<(f64, f64)> {
    let sz = section.child("pgSz")?;
    Some((sz.attr_f64("w")?, sz.attr_f64("h")?))
}

/// Sections use the paper size `PaperSize`.
pub fn set_page_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["PaperSize", "PageSize"])?;
    let want = paper_label(expected);
    let observed = doc.sections().into_iter().filter_map(page_size).map(|(w, h)| {
        let name = paper_name(w, h);
        let shown = name.map_or_else(
            || format!("{}x{}pt", fmt_num(twips_to_pt(w)), fmt_num(twips_to_pt(h))),
            str::to_string,
        );
        let ok = match (name, want) {
            (Some(n), Some(w)) => n == w,
            _ => text_equals(Some(&shown), Some(expected)),
        };
        (shown, ok)
    });
    Ok(Check::any_judged("paper size", expected, observed.collect::<Vec<_>>()))
}

/// Sections are oriented `Orientation`.
pub fn set_orientation(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["Orientation", "PageOrientation"])?;
    let observed: Vec<String> = doc
        .sections()
        .into_iter()
        .filter_map(|s| {
            let sz = s.child("pgSz")?;
            let landscape = sz.attr("orient") == Some("landscape")
                || page_size(s).is_some_and(|(w, h)| w > h);
            Some(if landscape { "landscape" } else { "portrait" }.to_string())
        })
        .collect();
    Ok(Check::any("page orientation", expected, observed, |actual| {
        vocab::same(ORIENTATION, actual, expected)
    }))
}

/// Sections have the given `TopMargin`, `BottomMargin`, `LeftMargin`,
/// `RightMargin` in points.
pub fn set_margins(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let sides = [
        ("TopMargin", "top"),
        ("BottomMargin", "bottom"),
        ("LeftMargin", "left"),
        ("RightMargin", "right"),
    ];
    let wanted: Vec<(&str, f64)> = sides
        .iter()
        .filter_map(|(key, attr)| params.try_number(key).map(|v| (*attr, v)))
        .collect();
    if wanted.is_empty() {
        return Err(ScoringError::missing(
            "TopMargin or BottomMargin or LeftMargin or RightMargin",
        ));
    }
    let expected = wanted
        .iter()
        .map(|(side, v)| format!("{side} {}", fmt_num(*v)))
        .join(", ");
    let observed = doc.sections().into_iter().filter_map(|s| {
        let mar = s.child("pgMar")?;
        let actual = |side: &str| mar.attr_f64(side).map_or(0.0, twips_to_pt);
        let ok = wanted
            .iter()
            .all(|(side, v)| number_equals(actual(side), *v, COARSE_EPSILON));
        let shown = wanted
            .iter()
            .map(|(side, _)| format!("{side} {}", fmt_num(actual(side))))
            .join(", ");
        Some((shown, ok))
    });
    Ok(Check::any_judged("page margins", expected, observed.collect::<Vec<_>>()))
}

/// Header or footer stories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Story {
    /// header parts
    Header,
    /// footer parts
    Footer,
}

impl Story {
    /// Root elements of every part of this story kind.
    fn roots(self, doc: &WordDocument) -> Result<Vec<&XmlNode>, ScoringError> {
        match self {
            Story::Header => doc.headers(),
            Story::Footer => doc.footers(),
        }
    }

    /// Label for verdicts.
    fn label(self) -> &'static str {
        match self {
            Story::Header => "header",
            Story::Footer => "footer",
        }
    }
}

/// Paragraphs with visible text across every part of a story kind.
fn story_paragraphs(doc: &WordDocument, story: Story) -> Result<Vec<&XmlNode>, ScoringError> {
    Ok(story
        .roots(doc)?
        .into_iter()
        .flat_map(|root| collect(root, "p"))
        .filter(|p| !WordDocument::paragraph_text(p).trim().is_empty())
        .collect())
}

/// Text of every part of a story kind.
fn story_texts(doc: &WordDocument, story: Story) -> Result<Vec<String>, ScoringError> {
    Ok(story
        .roots(doc)?
        .into_iter()
        .map(|root| {
            collect(root, "p")
                .into_iter()
                .map(WordDocument::paragraph_text)
                .join("\n")
        })
        .filter(|t| !t.trim().is_empty())
        .collect())
}

/// A story's text contains `expected`.
fn story_text(doc: &WordDocument, story: Story, expected: &str) -> Result<Check, ScoringError> {
    let observed = story_texts(doc, story)?;
    Ok(Check::any(format!("{} text", story.label()), expected, observed, |t| {
        text_contains(Some(t), Some(expected))
    }))
}

/// Headers contain `HeaderText` and footers contain `FooterText`; with
/// neither, some header or footer has text.
pub fn set_header_footer(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let header = params.try_get("HeaderText");
    let footer = params.try_get("FooterText");
    let mut checks = Vec::new();
    if let Some(h) = header {
        checks.push(story_text(doc, Story::Header, h)?);
    }
    if let Some(f) = footer {
        checks.push(story_text(doc, Story::Footer, f)?);
    }
    if checks.is_empty() {
        let found = !story_texts(doc, Story::Header)?.is_empty()
            || !story_texts(doc, Story::Footer)?.is_empty();
        return Ok(Check::presence(found, "header or footer text"));
    }
    Ok(Check::all("header/footer", checks))
}

/// A story's paragraphs all have runs whose value satisfies `matches`.
fn story_runs(
    doc: &WordDocument,
    story: Story,
    what: &str,
    expected: &str,
    value: impl Fn(&crate::word::RunProps) -> Option<String>,
    matches: impl Fn(&str) -> bool,
) -> Result<Check, ScoringError> {
    let mut observed = Vec::new();
    for p in story_paragraphs(doc, story)? {
        let values: Vec<String> = doc
            .paragraph_run_props(p)?
            .iter()
            .map(|r| value(r).unwrap_or_else(|| "unset".to_string()))
            .collect();
        let ok = values.iter().all(|v| matches(v));
        observed.push((values.into_iter().unique().join(" | "), ok));
    }
    Ok(Check::any_judged(format!("{} {what}", story.label()), expected, observed))
}

/// Font of a story's text.
fn story_font(doc: &WordDocument, story: Story, expected: &str) -> Result<Check, ScoringError> {
    story_runs(
        doc,
        story,
        "font",
        expected,
        |r| Some(r.font_display()).filter(|f| !f.is_empty()),
        |actual| actual.split('/').any(|f| text_equals(Some(f), Some(expected))),
    )
}

/// Font size of a story's text.
fn story_font_size(doc: &WordDocument, story: Story, raw: &str, key: &str) -> Result<Check, ScoringError> {
    let want = parse_font_size(raw).ok_or_else(|| ScoringError::missing(key))?;
    let tolerance = doc.tolerance();
    story_runs(
        doc,
        story,
        "font size",
        &fmt_num(want),
        |r| r.size.map(fmt_num),
        |actual| {
            actual
                .parse::<f64>()
                .is_ok_and(|a| number_equals(a, want, tolerance))
        },
    )
}

/// Alignment of a story's paragraphs.
fn story_alignment(doc: &WordDocument, story: Story, expected: &str) -> Result<Check, ScoringError> {
    let mut observed = Vec::new();
    for p in story_paragraphs(doc, story)? {
        observed.push(
            doc.para_props(p)?
                .alignment
                .unwrap_or_else(|| "left".to_string()),
        );
    }
    Ok(Check::any(
        format!("{} alignment", story.label()),
        expected,
        observed,
        |a| vocab::same(WORD_ALIGNMENT, a, expected),
    ))
}

/// Headers contain `HeaderText`.
pub fn set_header_text(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_text(doc, Story::Header, params.require("HeaderText")?)
}

/// Header text uses `HeaderFont`.
pub fn set_header_font(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_font(doc, Story::Header, params.require("HeaderFont")?)
}

/// Header text is `HeaderFontSize` points.
pub fn set_header_font_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_font_size(doc, Story::Header, params.require("HeaderFontSize")?, "HeaderFontSize")
}

/// Header paragraphs are aligned `HeaderAlignment`.
pub fn set_header_alignment(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_alignment(doc, Story::Header, params.require("HeaderAlignment")?)
}

/// Footers contain `FooterText`.
pub fn set_footer_text(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_text(doc, Story::Footer, params.require("FooterText")?)
}

/// Footer text uses `FooterFont`.
pub fn set_footer_font(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_font(doc, Story::Footer, params.require("FooterFont")?)
}

/// Footer text is `FooterFontSize` points.
pub fn set_footer_font_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_font_size(doc, Story::Footer, params.require("FooterFontSize")?, "FooterFontSize")
}

/// Footer paragraphs are aligned `FooterAlignment`.
pub fn set_footer_alignment(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    story_alignment(doc, Story::Footer, params.require("FooterAlignment")?)
}

/// Field instructions found in a paragraph, simple and complex fields alike.
fn field_instructions(p: &XmlNode) -> Vec<String> {
    let mut out: Vec<String> = p
        .find_all("fldSimple")
        .filter_map(|f| f.attr("instr"))
        .map(str::to_string)
        .collect();
    let complex: String = p.find_all("instrText").map(XmlNode::text).collect();
    if !complex.trim().is_empty() {
        out.push(complex);
    }
    out
}

/// Number format requested by a field's `\*` switch, if any.
fn field_format(instr: &str) -> Option<&'static str> {
    let (_, switch) = instr.split_once("\\*")?;
    match switch.split_whitespace().next()? {
        "roman" => Some("lowerRoman"),
        "ROMAN" => Some("upperRoman"),
        "alphabetic" => Some("lowerLetter"),
        "ALPHABETIC" => Some("upperLetter"),
        "Arabic" | "arabic" => Some("decimal"),
        _ => None,
    }
}

/// Canonical page number format for an authored value. The first character
/// of example labels is matched case-sensitively (`i` versus `I`).
fn page_number_format(value: &str) -> Option<&'static str> {
    let v = value.trim();
    if let Some((key, _)) = PAGE_NUMBER_FORMATS.iter().find(|(k, _)| *k == v) {
        return Some(key);
    }
    match v.chars().next()? {
        c if c.is_ascii_digit() => Some("decimal"),
        'i' => Some("lowerRoman"),
        'I' => Some("upperRoman"),
        'a' => Some("lowerLetter"),
        'A' => Some("upperLetter"),
        _ => vocab::canonical(PAGE_NUMBER_FORMATS, v),
    }
}

/// Expected position and alignment from a label such as `页面底端居中`,
/// `bottom center`, `页眉右侧`.
fn page_number_position(label: &str) -> (Option<&'static str>, Option<&'static str>) {
    let l = label.to_lowercase();
    let place = if l.contains("顶") || l.contains("页眉") || l.contains("top") || l.contains("header") {
        Some("top")
    } else if l.contains("底") || l.contains("页脚") || l.contains("bottom") || l.contains("footer") {
        Some("bottom")
    } else {
        None
    };
    let align = if l.contains('中') || l.contains("center") {
        Some("center")
    } else if l.contains("右") || l.contains("right") {
        Some("right")
    } else if l.contains("左") || l.contains("left") {
        Some("left")
    } else {
        None
    };
    (place, align)
}

/// A PAGE field sits in a header or footer, at `PageNumberPosition` and in
/// `PageNumberFormat` when given.
pub fn set_page_number(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let position = params.try_get("PageNumberPosition");
    let format = params.try_get("PageNumberFormat");
    let (want_place, want_align) = position.map(page_number_position).unwrap_or((None, None));
    let want_format = match format {
        Some(f) => Some(page_number_format(f).ok_or_else(|| ScoringError::missing("PageNumberFormat"))?),
        None => None,
    };
    let expected = [position, format].into_iter().flatten().join(", ");
    let expected = if expected.is_empty() { "page number".to_string() } else { expected };

    let section_format = doc
        .sections()
        .into_iter()
        .find_map(|s| s.child("pgNumType").and_then(|n| n.attr("fmt")))
        .unwrap_or("decimal");

    let mut observed = Vec::new();
    for (story, place) in [(Story::Header, "top"), (Story::Footer, "bottom")] {
        for root in story.roots(doc)? {
            for p in root.find_all("p") {
                let Some(instr) = field_instructions(p)
                    .into_iter()
                    .find(|i| i.split_whitespace().next() == Some("PAGE"))
                else {
                    continue;
                };
                let props = doc.para_props(p)?;
                let align = p
                    .path(&["pPr", "framePr"])
                    .and_then(|f| f.attr("xAlign"))
                    .map(str::to_string)
                    .or(props.alignment)
                    .unwrap_or_else(|| "left".to_string());
                let fmt = field_format(&instr).unwrap_or(section_format);
                let ok = want_place.is_none_or(|w| w == place)
                    && want_align.is_none_or(|w| vocab::same(WORD_ALIGNMENT, &align, w))
                    && want_format.is_none_or(|w| w == fmt);
                observed.push((format!("{place} {align}, {fmt}"), ok));
            }
        }
    }
    Ok(Check::any_judged("page number", expected, observed))
}

/// The page background is `BackgroundColor`.
pub fn set_background(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["BackgroundColor", "Color"])?;
    let actual = doc
        .document()
        .child("background")
        .and_then(|b| b.attr("color"));
    let Some(actual) = actual else {
        return Ok(Check::absent("page background", expected));
    };
    Ok(Check::compare(
        color_equals(actual, expected),
        "page background",
        expected,
        actual,
    ))
}

/// Page border sides drawn in each section.
fn page_borders(doc: &WordDocument) -> Vec<Vec<Border>> {
    doc.sections()
        .into_iter()
        .filter_map(|s| s.child("pgBorders"))
        .map(Border::read_all)
        .filter(|b| !b.is_empty())
        .collect()
}

/// Judges every section's page border with `pick` and `matches`.
fn check_page_border(
    doc: &WordDocument,
    what: &str,
    expected: &str,
    pick: impl Fn(&Border) -> Option<String>,
    matches: impl Fn(&str) -> bool,
) -> Check {
    let observed = page_borders(doc).into_iter().map(|sides| {
        let values: Vec<String> = sides
            .iter()
            .map(|b| pick(b).unwrap_or_else(|| "auto".to_string()))
            .unique()
            .collect();
        let ok = values.iter().all(|v| matches(v));
        (values.join("/"), ok)
    });
    Check::any_judged(format!("page border {what}"), expected, observed.collect::<Vec<_>>())
}

/// A page border is drawn, in `BorderStyle` when given.
pub fn set_page_border(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    if params.try_get("BorderStyle").is_some() {
        return set_page_border_style(doc, params);
    }
    Ok(Check::presence(!page_borders(doc).is_empty(), "page border"))
}

/// Page borders are coloured `BorderColor`.
pub fn set_page_border_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("BorderColor")?;
    Ok(check_page_border(doc, "colour", expected, |b| b.color.clone(), |c| {
        color_equals(c, expected)
    }))
}

/// Page borders use the line style `BorderStyle`.
pub fn set_page_border_style(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("BorderStyle")?;
    Ok(check_page_border(doc, "style", expected, |b| Some(b.style.clone()), |s| {
        vocab::same(WORD_BORDER_STYLE, s, expected)
    }))
}

/// Page borders are `BorderWidth` points wide.
pub fn set_page_border_width(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let want = params.require_number("BorderWidth")?;
    let tolerance = doc.tolerance();
    Ok(check_page_border(
        doc,
        "width",
        &fmt_num(want),
        |b| b.width.map(fmt_num),
        |w| w.parse::<f64>().is_ok_and(|w| number_equals(w, want, tolerance)),
    ))
}

/// A text watermark found in a header.
#[derive(Debug, Clone, Default, PartialEq)]
struct Watermark {
    /// watermark text
    text:     String,
    /// font family
    font:     Option<String>,
    /// font size in points; `None` when sized automatically
    size:     Option<f64>,
    /// rotation in degrees, normalised to `0..360`
    rotation: f64,
}

/// Splits a VML `style` attribute into properties.
fn css_properties(style: &str) -> HashMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim().to_lowercase(), v.trim().trim_matches('"').to_string()))
        .collect()
}

/// Text watermarks drawn as VML text paths in header parts.
fn watermarks(doc: &WordDocument) -> Result<Vec<Watermark>, ScoringError> {
    let mut out = Vec::new();
    for root in doc.headers()? {
        for shape in root.find_all("shape") {
            let Some(path) = shape.child("textpath") else {
                continue;
            };
            let text_style = css_properties(path.attr("style").unwrap_or_default());
            let shape_style = css_properties(shape.attr("style").unwrap_or_default());
            let size = text_style
                .get("font-size")
                .and_then(|s| parse_number(s))
                .filter(|s| *s > 1.0);
            let rotation = shape_style
                .get("rotation")
                .and_then(|r| r.parse::<f64>().ok())
                .unwrap_or(0.0)
                .rem_euclid(360.0);
            out.push(Watermark {
                text: path.attr("string").unwrap_or_default().to_string(),
                font: text_style.get("font-family").cloned(),
                size,
                rotation,
            });
        }
    }
    Ok(out)
}

/// A text watermark is present, reading `WatermarkText` when given.
pub fn set_watermark(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.try_get("WatermarkText");
    let marks = watermarks(doc)?;
    match expected {
        Some(text) => Ok(Check::any(
            "watermark text",
            text,
            marks.into_iter().map(|m| m.text),
            |t| text_equals(Some(t), Some(text)),
        )),
        None => Ok(Check::presence(!marks.is_empty(), "text watermark")),
    }
}

/// The watermark uses `WatermarkFont`.
pub fn set_watermark_font(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("WatermarkFont")?;
    let observed = watermarks(doc)?
        .into_iter()
        .map(|m| m.font.unwrap_or_else(|| "unset".to_string()));
    Ok(Check::any("watermark font", expected, observed, |f| {
        text_equals(Some(f), Some(expected))
    }))
}

/// The watermark is `WatermarkFontSize` points (or `auto`).
pub fn set_watermark_font_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let raw = params.require("WatermarkFontSize")?;
    let auto = matches!(raw.to_lowercase().as_str(), "auto" | "自动");
    let want = if auto {
        None
    } else {
        Some(parse_font_size(raw).ok_or_else(|| ScoringError::missing("WatermarkFontSize"))?)
    };
    let tolerance = doc.tolerance();
    let observed = watermarks(doc)?.into_iter().map(|m| {
        let ok = match (want, m.size) {
            (None, None) => true,
            (Some(w), Some(s)) => number_equals(s, w, tolerance),
            _ => false,
        };
        (m.size.map_or_else(|| "auto".to_string(), fmt_num), ok)
    });
    Ok(Check::any_judged("watermark font size", raw, observed.collect::<Vec<_>>()))
}

/// The watermark is rotated `WatermarkAngle` degrees (or laid out per
/// `WatermarkOrientation`: horizontal or diagonal).
pub fn set_watermark_orientation(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let raw = params.require_any(&["WatermarkAngle", "WatermarkOrientation"])?;
    let want = WATERMARK_ANGLES
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(raw.trim()))
        .map(|(_, deg)| *deg)
        .or_else(|| parse_number(raw))
        .ok_or_else(|| ScoringError::missing("WatermarkAngle"))?
        .rem_euclid(360.0);
    let observed = watermarks(doc)?.into_iter().map(|m| {
        let diff = (m.rotation - want).abs();
        let ok = diff.min(360.0 - diff) <= COARSE_EPSILON;
        (fmt_num(m.rotation), ok)
    });
    Ok(Check::any_judged("watermark angle", fmt_num(want), observed.collect::<Vec<_>>()))
}

/// The document has at least `ExpectedSectionCount` sections (default 2),
/// with a `SectionBreakType` break and `ColumnCount` columns when given.
pub fn manage_section(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let sections = doc.sections();
    let mut checks = Vec::new();

    let wanted = params.try_int("ExpectedSectionCount");
    if wanted.is_some() || params.try_get("SectionBreakType").is_none() {
        let wanted = wanted.unwrap_or(2).max(1) as usize;
        checks.push(Check::compare(
            sections.len() >= wanted,
            "section count",
            format!("at least {wanted}"),
            sections.len().to_string(),
        ));
    }
    if let Some(kind) = params.try_get("SectionBreakType") {
        let breaks: Vec<String> = sections
            .iter()
            .take(sections.len().saturating_sub(1))
            .map(|s| {
                s.child("type")
                    .and_then(XmlNode::val)
                    .unwrap_or("nextPage")
                    .to_string()
            })
            .collect();
        checks.push(Check::any("section break", kind, breaks, |b| {
            vocab::same(SECTION_BREAKS, b, kind)
        }));
    }
    if let Some(cols) = params.try_int("ColumnCount") {
        let counts = sections.iter().map(|s| {
            s.child("cols")
                .and_then(|c| c.attr("num"))
                .unwrap_or("1")
                .to_string()
        });
        checks.push(Check::any("columns", cols.to_string(), counts.collect::<Vec<_>>(), |c| {
            c == cols.to_string()
        }));
    }
    Ok(Check::all("sections", checks))
}

/// Counts `w:br` elements of the given type in the body.
fn count_breaks(doc: &WordDocument, kind: &str) -> usize {
    doc.body()
        .find_all("br")
        .filter(|b| b.attr("type") == Some(kind))
        .count()
}

/// At least `ExpectedCount` (default 1) page breaks exist, counting
/// "page break before" paragraphs.
pub fn insert_page_break(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let wanted = params.try_int("ExpectedCount").unwrap_or(1).max(1) as usize;
    let mut found = count_breaks(doc, "page");
    for p in doc.paragraphs() {
        if doc.para_props(p)?.page_break_before {
            found += 1;
        }
    }
    Ok(Check::compare(
        found >= wanted,
        "page breaks",
        format!("at least {wanted}"),
        found.to_string(),
    ))
}

/// At least `ExpectedCount` (default 1) column breaks exist.
pub fn insert_column_break(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let wanted = params.try_int("ExpectedCount").unwrap_or(1).max(1) as usize;
    let found = count_breaks(doc, "column");
    Ok(Check::compare(
        found >= wanted,
        "column breaks",
        format!("at least {wanted}"),
        found.to_string(),
    ))
}
