#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use crate::{
    error::ScoringError,
    grade::{
        Check, Params,
        compare::{COARSE_EPSILON, MEASURE_EPSILON, color_equals, number_equals, squash_whitespace, text_contains},
        params::parse_number,
        vocab::{self, parse_font_size},
    },
    ooxml::fmt_num,
    word::{
        WordDocument, collect,
        drawing::{
            Axis, COMPOUND_TYPES, DASH_TYPES, Drawing, POSITION_ALIGN, RELATIVE_FROM, SHAPE_TYPES,
            WRAP_STYLES, drawings, parse_shadow_label,
        },
    },
};

/// Which drawings a rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// pictures
    Image,
    /// preset shapes that are not text boxes
    AutoShape,
    /// text boxes
    TextBox,
}

impl Kind {
    /// Subject used in verdicts.
    fn label(self) -> &'static str {
        match self {
            Kind::Image => "image",
            Kind::AutoShape => "auto shape",
            Kind::TextBox => "text box",
        }
    }

    /// Whether `d` is of this kind.
    fn accepts(self, d: &Drawing<'_>) -> bool {
        match self {
            Kind::Image => d.is_picture(),
            Kind::AutoShape => d.is_auto_shape(),
            Kind::TextBox => d.is_text_box(),
        }
    }
}

/// Body drawings of one kind.
fn candidates(doc: &WordDocument, kind: Kind) -> Vec<Drawing<'_>> {
    drawings(doc.body())
        .into_iter()
        .filter(|d| kind.accepts(d))
        .collect()
}

/// Shorthand for "no drawing of this kind".
fn missing_drawing(kind: Kind, expected: impl Into<String>) -> Check {
    Check::absent(kind.label(), expected)
}

/// At least `ExpectedImageCount` pictures exist (default 1).
pub fn insert_image(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let wanted = params.try_int("ExpectedImageCount").unwrap_or(1).max(1) as usize;
    let legacy = doc.body().find_all("imagedata").count();
    let found = candidates(doc, Kind::Image).len() + legacy;
    Ok(Check::compare(
        found >= wanted,
        "images",
        format!("at least {wanted}"),
        found.to_string(),
    ))
}

/// Some drawing of `kind` measures the requested width and/or height.
fn check_size(
    doc: &WordDocument,
    params: &Params<'_>,
    kind: Kind,
    width_keys: &[&str],
    height_keys: &[&str],
) -> Result<Check, ScoringError> {
    let width = params.first_of(width_keys).and_then(parse_number);
    let height = params.first_of(height_keys).and_then(parse_number);
    if width.is_none() && height.is_none() {
        return Err(ScoringError::missing(format!(
            "{} or {}",
            width_keys.join("/"),
            height_keys.join("/")
        )));
    }
    let show = |v: Option<f64>| v.map_or_else(|| "*".to_string(), fmt_num);
    let expected = format!("{} x {}", show(width), show(height));
    let observed = candidates(doc, kind).into_iter().filter_map(|d| {
        let (w, h) = d.extent_pt()?;
        let ok = width.is_none_or(|want| number_equals(w, want, COARSE_EPSILON))
            && height.is_none_or(|want| number_equals(h, want, COARSE_EPSILON));
        Some((format!("{} x {}", fmt_num(w), fmt_num(h)), ok))
    });
    Ok(Check::any_judged(format!("{} size", kind.label()), expected, observed))
}

/// Describes and judges one drawing's anchor against the position
/// parameters.
fn judge_position(d: &Drawing<'_>, params: &Params<'_>) -> (String, bool) {
    let mut shown = Vec::new();
    let mut ok = true;
    for (axis, prefix) in [(Axis::Horizontal, "Horizontal"), (Axis::Vertical, "Vertical")] {
        let pos = d.position(axis);
        let align = pos.as_ref().and_then(|p| p.align.clone());
        let relative = pos.as_ref().map(|p| p.relative_from.clone());
        let offset = pos.as_ref().and_then(|p| p.offset_cm);

        if let Some(want) = params.try_get(&format!("{prefix}Alignment")) {
            ok &= align
                .as_deref()
                .is_some_and(|a| vocab::same(POSITION_ALIGN, a, want));
        }
        if let Some(want) = params.try_get(&format!("{prefix}RelativeTo")) {
            ok &= relative
                .as_deref()
                .is_some_and(|r| vocab::same(RELATIVE_FROM, r, want));
        }
        if let Some(want) = params.try_number(&format!("{prefix}AbsolutePosition")) {
            ok &= offset.is_some_and(|o| number_equals(o, want, MEASURE_EPSILON));
        }
        let place = match (align, offset) {
            (Some(a), _) => a,
            (None, Some(o)) => format!("{}cm", fmt_num(o)),
            (None, None) => "inline".to_string(),
        };
        shown.push(format!(
            "{} {place} from {}",
            prefix.to_lowercase(),
            relative.unwrap_or_else(|| "text".to_string())
        ));
    }
    for (key, attr) in [
        ("LockAnchor", "locked"),
        ("AllowOverlap", "allowOverlap"),
        ("LayoutInTableCell", "layoutInCell"),
    ] {
        if let Some(want) = params.try_bool(key) {
            let actual = d.anchor_flag(attr);
            ok &= actual == Some(want);
            shown.push(format!("{attr}={}", actual.map_or("n/a".to_string(), |a| a.to_string())));
        }
    }
    if let Some(want) = params.try_bool("MoveWithText") {
        let actual = d.moves_with_text();
        ok &= actual == Some(want);
        shown.push(format!(
            "moveWithText={}",
            actual.map_or("n/a".to_string(), |a| a.to_string())
        ));
    }
    (shown.join(", "), ok)
}

/// Position parameters any of which a rule may name.
const POSITION_KEYS: &[&str] = &[
    "HorizontalAlignment",
    "HorizontalRelativeTo",
    "HorizontalAbsolutePosition",
    "VerticalAlignment",
    "VerticalRelativeTo",
    "VerticalAbsolutePosition",
    "LockAnchor",
    "AllowOverlap",
    "LayoutInTableCell",
    "MoveWithText",
];

/// Some drawing of `kind` sits where the position parameters say.
fn check_position(doc: &WordDocument, params: &Params<'_>, kind: Kind) -> Result<Check, ScoringError> {
    let given: Vec<String> = POSITION_KEYS
        .iter()
        .filter_map(|k| params.try_get(k).map(|v| format!("{k}={v}")))
        .collect();
    if given.is_empty() {
        return Err(ScoringError::missing("HorizontalAlignment or VerticalAlignment"));
    }
    let observed = candidates(doc, kind)
        .into_iter()
        .map(|d| judge_position(&d, params));
    Ok(Check::any_judged(
        format!("{} position", kind.label()),
        given.join(", "),
        observed,
    ))
}

/// Some drawing of `kind` has an outline coloured like the first of `keys`.
fn check_line_color(
    doc: &WordDocument,
    params: &Params<'_>,
    kind: Kind,
    keys: &[&str],
) -> Result<Check, ScoringError> {
    let expected = params.require_any(keys)?;
    let observed = candidates(doc, kind)
        .into_iter()
        .map(|d| d.line_color().unwrap_or_else(|| "none".to_string()));
    Ok(Check::any(
        format!("{} outline colour", kind.label()),
        expected,
        observed,
        |c| color_equals(c, expected),
    ))
}

/// Some drawing of `kind` has a wrapping style of `WrapStyle`.
fn check_wrap(doc: &WordDocument, params: &Params<'_>, kind: Kind) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["WrapStyle", "WrapType"])?;
    let observed = candidates(doc, kind)
        .into_iter()
        .map(|d| d.wrap().to_string());
    Ok(Check::any(
        format!("{} wrapping", kind.label()),
        expected,
        observed,
        |w| vocab::same(WRAP_STYLES, w, expected),
    ))
}

/// Text properties of the runs inside a drawing: (size, colour) pairs.
fn text_run_values(
    doc: &WordDocument,
    d: &Drawing<'_>,
) -> Result<Vec<(Option<f64>, String)>, ScoringError> {
    let Some(content) = d.text_content() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for p in collect(content, "p") {
        for props in doc.paragraph_run_props(p)? {
            out.push((props.size, props.color.unwrap_or_else(|| "auto".to_string())));
        }
    }
    Ok(out)
}

/// Some drawing of `kind` has all its text at `FontSize` points.
fn check_text_size(doc: &WordDocument, params: &Params<'_>, kind: Kind) -> Result<Check, ScoringError> {
    let raw = params.require_any(&["FontSize", "TextSize"])?;
    let expected = parse_font_size(raw).ok_or_else(|| ScoringError::missing("FontSize"))?;
    let mut observed = Vec::new();
    for d in candidates(doc, kind) {
        let sizes: Vec<Option<f64>> = text_run_values(doc, &d)?.into_iter().map(|(s, _)| s).collect();
        if sizes.is_empty() {
            continue;
        }
        let ok = sizes
            .iter()
            .all(|s| s.is_some_and(|s| number_equals(s, expected, doc.tolerance())));
        let shown = sizes
            .iter()
            .map(|s| s.map_or_else(|| "unset".to_string(), fmt_num))
            .unique()
            .join(" | ");
        observed.push((shown, ok));
    }
    Ok(Check::any_judged(
        format!("{} text size", kind.label()),
        fmt_num(expected),
        observed,
    ))
}

/// Some drawing of `kind` contains `TextContent`.
fn check_text(doc: &WordDocument, params: &Params<'_>, kind: Kind) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["TextContent", "ExpectedContent", "Content"])?;
    let want = squash_whitespace(expected);
    let observed = candidates(doc, kind)
        .into_iter()
        .map(|d| squash_whitespace(&d.text()))
        .filter(|t| !t.is_empty());
    Ok(Check::any(
        format!("{} text", kind.label()),
        expected,
        observed,
        |t| text_contains(Some(t), Some(&want)),
    ))
}

/// Some picture measures `ImageWidth` x `ImageHeight` points.
pub fn set_image_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_size(
        doc,
        &params,
        Kind::Image,
        &["ImageWidth", "Width"],
        &["ImageHeight", "Height"],
    )
}

/// Some picture is anchored per the position parameters.
pub fn set_image_position(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_position(doc, &params, Kind::Image)
}

/// Some picture has a `BorderColor` outline.
pub fn set_image_border_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_line_color(doc, &params, Kind::Image, &["BorderColor", "LineColor"])
}

/// Some picture has a `BorderWidth` point outline.
pub fn set_image_border_width(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_number("BorderWidth")?;
    let tolerance = doc.tolerance();
    let observed = candidates(doc, Kind::Image)
        .into_iter()
        .map(|d| d.line_width_pt().map_or_else(|| "none".to_string(), fmt_num));
    Ok(Check::any(
        "image outline width",
        fmt_num(expected),
        observed,
        |w| w.parse::<f64>().is_ok_and(|w| number_equals(w, expected, tolerance)),
    ))
}

/// Some picture's outline uses `CompoundType`.
pub fn set_image_border_compound(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("CompoundType")?;
    let observed = candidates(doc, Kind::Image)
        .into_iter()
        .map(|d| d.compound().unwrap_or("none").to_string());
    Ok(Check::any("image outline compound", expected, observed, |c| {
        vocab::same(COMPOUND_TYPES, c, expected)
    }))
}

/// Some picture's outline uses `DashType`.
pub fn set_image_border_dash(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("DashType")?;
    let observed = candidates(doc, Kind::Image)
        .into_iter()
        .map(|d| d.dash().unwrap_or("none").to_string());
    Ok(Check::any("image outline dash", expected, observed, |c| {
        vocab::same(DASH_TYPES, c, expected)
    }))
}

/// Some picture casts a `ShadowType` shadow, coloured `ShadowColor` when
/// given.
pub fn set_image_shadow(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let label = params.require("ShadowType")?;
    let color = params.try_get("ShadowColor");
    let (kind, angle) = parse_shadow_label(label);
    let observed = candidates(doc, Kind::Image).into_iter().map(|d| match d.shadow() {
        Some(s) => {
            let ok = kind.is_none_or(|k| k == s.kind)
                && angle.is_none_or(|a| number_equals(a, s.direction, COARSE_EPSILON))
                && color.is_none_or(|c| s.color.as_deref().is_some_and(|sc| color_equals(sc, c)));
            let shown = format!(
                "{} {} {}",
                s.kind,
                fmt_num(s.direction),
                s.color.unwrap_or_else(|| "auto".to_string())
            );
            (shown, ok)
        }
        None => ("no shadow".to_string(), false),
    });
    let expected = match color {
        Some(c) => format!("{label} {c}"),
        None => label.to_string(),
    };
    Ok(Check::any_judged("image shadow", expected, observed))
}

/// Some picture wraps text per `WrapStyle`.
pub fn set_image_wrap(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_wrap(doc, &params, Kind::Image)
}

/// An auto shape exists, of `ShapeType` when given.
pub fn insert_auto_shape(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let shapes = candidates(doc, Kind::AutoShape);
    let Some(expected) = params.try_get("ShapeType") else {
        return Ok(Check::presence(!shapes.is_empty(), "auto shape"));
    };
    if shapes.is_empty() {
        return Ok(missing_drawing(Kind::AutoShape, expected));
    }
    let observed = shapes
        .into_iter()
        .map(|d| d.geometry().unwrap_or("custom").to_string());
    Ok(Check::any("auto shape type", expected, observed, |g| {
        vocab::same(SHAPE_TYPES, g, expected)
    }))
}

/// Some auto shape measures `ShapeWidth` x `ShapeHeight` points.
pub fn set_auto_shape_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_size(
        doc,
        &params,
        Kind::AutoShape,
        &["ShapeWidth", "Width"],
        &["ShapeHeight", "Height"],
    )
}

/// Some auto shape has a `LineColor` outline.
pub fn set_auto_shape_line_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_line_color(doc, &params, Kind::AutoShape, &["LineColor", "BorderColor"])
}

/// Some auto shape is filled `FillColor`.
pub fn set_auto_shape_fill_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["FillColor", "Color"])?;
    let observed = candidates(doc, Kind::AutoShape)
        .into_iter()
        .map(|d| d.fill_color().unwrap_or_else(|| "none".to_string()));
    Ok(Check::any("auto shape fill", expected, observed, |c| {
        color_equals(c, expected)
    }))
}

/// Some auto shape's text is `FontSize` points.
pub fn set_auto_shape_text_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text_size(doc, &params, Kind::AutoShape)
}

/// Some auto shape's text is coloured `TextColor`.
pub fn set_auto_shape_text_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["TextColor", "FontColor"])?;
    let mut observed = Vec::new();
    for d in candidates(doc, Kind::AutoShape) {
        let colors: Vec<String> = text_run_values(doc, &d)?
            .into_iter()
            .map(|(_, c)| c)
            .unique()
            .collect();
        if colors.is_empty() {
            continue;
        }
        let ok = colors.iter().all(|c| color_equals(c, expected));
        observed.push((colors.join(" | "), ok));
    }
    Ok(Check::any_judged("auto shape text colour", expected, observed))
}

/// Some auto shape contains `TextContent`.
pub fn set_auto_shape_text(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text(doc, &params, Kind::AutoShape)
}

/// Some auto shape is anchored per the position parameters.
pub fn set_auto_shape_position(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_position(doc, &params, Kind::AutoShape)
}

/// Some text box has a `BorderColor` outline.
pub fn set_text_box_border_color(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_line_color(doc, &params, Kind::TextBox, &["BorderColor", "LineColor"])
}

/// Some text box contains `TextContent`.
pub fn set_text_box_content(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text(doc, &params, Kind::TextBox)
}

/// Some text box's text is `FontSize` points.
pub fn set_text_box_text_size(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text_size(doc, &params, Kind::TextBox)
}

/// Some text box is anchored per the position parameters.
pub fn set_text_box_position(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_position(doc, &params, Kind::TextBox)
}

/// Some text box wraps text per `WrapStyle`.
pub fn set_text_box_wrap(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    check_wrap(doc, &params, Kind::TextBox)
}
