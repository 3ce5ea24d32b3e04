#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::{RANGE_KEYS, check_cells, optional_range, require_range};
use crate::{
    error::ScoringError,
    excel::{
        CellFormat, Font, Workbook, Worksheet,
        cell::{CellRange, CellRef, parse_sqref},
    },
    grade::{
        Check, Params,
        compare::{color_equals, number_equals, text_equals},
        vocab::{self, EXCEL_BORDER_STYLE, FontFlags, Vocab, parse_font_size},
    },
    ooxml::{XmlNode, fmt_num},
};

/// Underline kinds (`u/@val`).
const UNDERLINES: Vocab = &[
    ("none", &["无"]),
    ("single", &["单下划线"]),
    ("double", &["双下划线"]),
    ("singleAccounting", &["会计用单下划线"]),
    ("doubleAccounting", &["会计用双下划线"]),
];

/// Horizontal cell alignment.
const HORIZONTAL: Vocab = &[
    ("general", &["默认", "常规"]),
    ("left", &["左对齐", "靠左"]),
    ("center", &["居中", "居中对齐"]),
    ("right", &["右对齐", "靠右"]),
    ("fill", &["填充"]),
    ("justify", &["两端对齐"]),
    ("centerContinuous", &["跨列居中"]),
    ("distributed", &["分散对齐"]),
];

/// Vertical cell alignment.
const VERTICAL: Vocab = &[
    ("top", &["顶端对齐", "靠上"]),
    ("center", &["垂直居中对齐", "垂直居中", "居中"]),
    ("bottom", &["底端对齐", "靠下"]),
    ("justify", &["两端对齐"]),
    ("distributed", &["分散对齐"]),
];

/// Pattern fill types. Labels are matched with spaces removed.
const PATTERNS: Vocab = &[
    ("none", &["无"]),
    ("solid", &["实心"]),
    ("gray0625", &["6.25%灰色", "5%灰色"]),
    ("gray125", &["12.5%灰色", "10%灰色"]),
    ("lightGray", &["25%灰色", "20%灰色"]),
    ("mediumGray", &["50%灰色", "30%灰色", "40%灰色"]),
    ("darkGray", &["75%灰色", "60%灰色"]),
    ("darkHorizontal", &["水平条纹"]),
    ("darkVertical", &["垂直条纹"]),
    ("darkDown", &["反向对角条纹"]),
    ("darkUp", &["对角条纹"]),
    ("darkGrid", &["对角十字线"]),
    ("darkTrellis", &["粗对角十字线"]),
    ("lightHorizontal", &["细水平条纹"]),
    ("lightVertical", &["细垂直条纹"]),
    ("lightDown", &["细反向对角条纹"]),
    ("lightUp", &["细对角条纹"]),
    ("lightGrid", &["细水平十字线"]),
    ("lightTrellis", &["细对角十字线"]),
];

/// Number format categories as shown in the format dialog.
const NUMBER_CATEGORIES: Vocab = &[
    ("general", &["常规"]),
    ("number", &["数值", "数字"]),
    ("currency", &["货币"]),
    ("accounting", &["会计专用"]),
    ("date", &["日期"]),
    ("time", &["时间"]),
    ("percentage", &["百分比", "percent"]),
    ("fraction", &["分数"]),
    ("scientific", &["科学记数", "科学计数"]),
    ("text", &["文本"]),
    ("special", &["特殊"]),
    ("custom", &["自定义"]),
];

/// Built-in cell styles with their localized names.
const CELL_STYLES: Vocab = &[
    ("Normal", &["常规"]),
    ("Good", &["好"]),
    ("Bad", &["差"]),
    ("Neutral", &["中性", "适中"]),
    ("Input", &["输入"]),
    ("Output", &["输出"]),
    ("Calculation", &["计算"]),
    ("Check Cell", &["检查单元格"]),
    ("Explanatory Text", &["解释性文本"]),
    ("Warning Text", &["警告文本"]),
    ("Linked Cell", &["链接单元格"]),
    ("Note", &["注释"]),
    ("Title", &["标题"]),
    ("Heading 1", &["标题 1", "标题1"]),
    ("Heading 2", &["标题 2", "标题2"]),
    ("Heading 3", &["标题 3", "标题3"]),
    ("Heading 4", &["标题 4", "标题4"]),
    ("Total", &["汇总"]),
];

/// Conditional format rule families (`cfRule/@type`).
const CONDITION_TYPES: Vocab = &[
    (
        "highlight",
        &[
            "突出显示单元格规则",
            "cellIs",
            "containsText",
            "notContainsText",
            "beginsWith",
            "endsWith",
            "timePeriod",
            "duplicateValues",
            "uniqueValues",
            "containsBlanks",
            "notContainsBlanks",
        ],
    ),
    ("topBottom", &["项目选取规则", "top10", "aboveAverage"]),
    ("dataBar", &["数据条"]),
    ("colorScale", &["色阶"]),
    ("iconSet", &["图标集"]),
    ("expression", &["公式", "使用公式确定要设置格式的单元格"]),
];

/// Preset highlight formats as (label, fill colours, font colours).
const FORMAT_PRESETS: &[(&str, &[&str], &[&str])] = &[
    ("浅红填充色深红色文本", &["FFC7CE"], &["9C0006"]),
    ("黄填充色深黄色文本", &["FFEB9C"], &["9C5700", "9C6500"]),
    ("绿填充色深绿色文本", &["C6EFCE"], &["006100"]),
    ("浅红色填充", &["FFC7CE"], &[]),
    ("红色文本", &[], &["9C0006"]),
];

/// Checks a font property over `CellRange`, or over every font in the style
/// table when no range is given.
fn check_font(
    book: &Workbook,
    params: &Params<'_>,
    what: &str,
    expected: &str,
    value: impl Fn(&Font) -> String,
    matches: impl Fn(&str) -> bool,
) -> Result<Check, ScoringError> {
    match optional_range(params, RANGE_KEYS)? {
        Some(range) => {
            let ws = book.target_sheet(params)?;
            check_cells(&ws, &range, what, expected, |at| Ok(value(&ws.font(at)?)), matches)
        }
        None => {
            let observed = book.fonts()?.iter().map(&value).collect::<Vec<_>>();
            Ok(Check::any(format!("any {what}"), expected, observed, matches))
        }
    }
}

/// Font family is `FontName`.
pub fn set_cell_font(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["FontName", "FontFamily"])?;
    check_font(
        book,
        &params,
        "font",
        expected,
        |f| f.name.clone().unwrap_or_default(),
        |v| text_equals(Some(v), Some(expected)),
    )
}

/// Bold and italic flags match `FontStyle`.
pub fn set_font_style(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let raw = params.require("FontStyle")?;
    let expected = FontFlags::parse(raw).ok_or_else(|| ScoringError::missing("FontStyle"))?;
    check_font(
        book,
        &params,
        "font style",
        raw,
        |f| f.flags().to_string(),
        |v| FontFlags::parse(v).is_some_and(|got| got.satisfies(&expected)),
    )
}

/// Font size is `FontSize` points.
pub fn set_font_size(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let raw = params.require_any(&["FontSize", "Size"])?;
    let expected = parse_font_size(raw).ok_or_else(|| ScoringError::missing("FontSize"))?;
    let tolerance = book.tolerance();
    check_font(
        book,
        &params,
        "font size",
        raw,
        |f| f.size.map(fmt_num).unwrap_or_else(|| "unset".into()),
        |v| v.parse::<f64>().is_ok_and(|got| number_equals(got, expected, tolerance)),
    )
}

/// Font colour is `FontColor`.
pub fn set_font_color(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["FontColor", "Color"])?;
    check_font(
        book,
        &params,
        "font color",
        expected,
        |f| f.color.clone().unwrap_or_else(|| "auto".into()),
        |v| color_equals(v, expected),
    )
}

/// Underline kind is `UnderlineType` (any underline when absent).
pub fn add_underline(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.try_get("UnderlineType");
    check_font(
        book,
        &params,
        "underline",
        expected.unwrap_or("underlined"),
        |f| f.underline.clone().unwrap_or_else(|| "none".into()),
        |v| match expected {
            Some(want) => vocab::same(UNDERLINES, v, want),
            None => v != "none",
        },
    )
}

/// Checks an alignment axis over the required range.
fn check_alignment(
    book: &Workbook,
    params: &Params<'_>,
    what: &str,
    expected: &str,
    vocab: Vocab,
    value: fn(&CellFormat<'_>) -> String,
) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(params)?;
    let range = require_range(params, RANGE_KEYS)?;
    check_cells(
        &ws,
        &range,
        what,
        expected,
        |at| Ok(value(&ws.format(at)?)),
        |v| vocab::same(vocab, v, expected),
    )
}

/// Horizontal alignment is `HorizontalAlignment`.
pub fn set_horizontal_alignment(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["HorizontalAlignment", "Alignment"])?;
    check_alignment(book, &params, "horizontal alignment", expected, HORIZONTAL, |f| {
        f.horizontal().to_string()
    })
}

/// Vertical alignment is `VerticalAlignment`.
pub fn set_vertical_alignment(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("VerticalAlignment")?;
    check_alignment(book, &params, "vertical alignment", expected, VERTICAL, |f| {
        f.vertical().to_string()
    })
}

/// Horizontal and/or vertical alignment, whichever are given.
pub fn set_cell_alignment(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let horizontal = params.first_of(&["HorizontalAlignment", "Alignment"]);
    let vertical = params.try_get("VerticalAlignment");
    if horizontal.is_none() && vertical.is_none() {
        return Err(ScoringError::missing("HorizontalAlignment or VerticalAlignment"));
    }
    let mut checks = Vec::new();
    if let Some(h) = horizontal {
        checks.push(check_alignment(book, &params, "horizontal alignment", h, HORIZONTAL, |f| {
            f.horizontal().to_string()
        })?);
    }
    if let Some(v) = vertical {
        checks.push(check_alignment(book, &params, "vertical alignment", v, VERTICAL, |f| {
            f.vertical().to_string()
        })?);
    }
    Ok(Check::all("alignment", checks))
}

/// A cell edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    /// top edge
    Top,
    /// bottom edge
    Bottom,
    /// left edge
    Left,
    /// right edge
    Right,
}

impl Side {
    /// Element name in a `<border>` record.
    fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Bottom => "bottom",
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// The same edge seen from the neighbouring cell.
    fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The cell sharing this edge.
    fn neighbor(self, at: CellRef) -> Option<CellRef> {
        match self {
            Side::Top => (at.row > 1).then(|| CellRef::new(at.row - 1, at.col)),
            Side::Bottom => Some(CellRef::new(at.row + 1, at.col)),
            Side::Left => (at.col > 1).then(|| CellRef::new(at.row, at.col - 1)),
            Side::Right => Some(CellRef::new(at.row, at.col + 1)),
        }
    }
}

/// Ranges larger than this are refused by border rules.
const MAX_BORDER_CELLS: u32 = 10_000;

/// Edges on the outline of `range` (`outer`) or between its cells.
fn edges(range: &CellRange, outer: bool) -> Result<Vec<(CellRef, Side)>, ScoringError> {
    if range.height().saturating_mul(range.width()) > MAX_BORDER_CELLS {
        return Err(ScoringError::fault(format!("range {range} is too large for border checks")));
    }
    let (s, e) = (range.start, range.end);
    let mut out = Vec::new();
    if outer {
        for c in s.col..=e.col {
            out.push((CellRef::new(s.row, c), Side::Top));
            out.push((CellRef::new(e.row, c), Side::Bottom));
        }
        for r in s.row..=e.row {
            out.push((CellRef::new(r, s.col), Side::Left));
            out.push((CellRef::new(r, e.col), Side::Right));
        }
    } else {
        for r in s.row..e.row {
            for c in s.col..=e.col {
                out.push((CellRef::new(r, c), Side::Bottom));
            }
        }
        for r in s.row..=e.row {
            for c in s.col..e.col {
                out.push((CellRef::new(r, c), Side::Right));
            }
        }
    }
    Ok(out)
}

/// Style and colour of one edge, read from either cell sharing it.
/// Unbordered edges are `("none", "")`.
fn edge(ws: &Worksheet<'_>, at: CellRef, side: Side) -> Result<(String, String), ScoringError> {
    let own = ws.format(at)?;
    let neighbor = side.neighbor(at).map(|n| ws.format(n)).transpose()?;
    let found = own.border_side(side.name()).or_else(|| {
        neighbor
            .as_ref()
            .and_then(|f| f.border_side(side.opposite().name()))
    });
    match found {
        Some((style, color)) => {
            let color = match color {
                Some(c) => ws.book().resolve_color(c)?,
                None => None,
            };
            Ok((style.to_string(), color.unwrap_or_else(|| "auto".into())))
        }
        None => Ok(("none".into(), String::new())),
    }
}

/// Checks every edge in `edges` with `judge`; passes when all hold.
fn check_edges(
    ws: &Worksheet<'_>,
    subject: String,
    expected: &str,
    edges: Vec<(CellRef, Side)>,
    show: impl Fn(&(String, String)) -> String,
    judge: impl Fn(&(String, String)) -> bool,
) -> Result<Check, ScoringError> {
    if edges.is_empty() {
        return Ok(Check::absent(subject, expected));
    }
    let mut passed = true;
    let mut seen = Vec::new();
    for (at, side) in edges {
        let e = edge(ws, at, side)?;
        passed &= judge(&e);
        seen.push(show(&e));
    }
    let actual = seen.into_iter().unique().take(8).join(" | ");
    Ok(Check::compare(passed, subject, expected, actual))
}

/// Border style matching for one set of edges.
fn border_style(book: &Workbook, params: &Params<'_>, outer: bool) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(params)?;
    let range = require_range(params, RANGE_KEYS)?;
    let expected = params.require("BorderStyle")?;
    let what = if outer { "outer border" } else { "inner border" };
    check_edges(
        &ws,
        format!("{what} of {range}"),
        expected,
        edges(&range, outer)?,
        |(style, _)| style.clone(),
        |(style, _)| vocab::same(EXCEL_BORDER_STYLE, style, expected),
    )
}

/// Border colour matching for one set of edges.
fn border_color(book: &Workbook, params: &Params<'_>, outer: bool) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(params)?;
    let range = require_range(params, RANGE_KEYS)?;
    let expected = params.require("BorderColor")?;
    let what = if outer { "outer border color" } else { "inner border color" };
    check_edges(
        &ws,
        format!("{what} of {range}"),
        expected,
        edges(&range, outer)?,
        |(style, color)| if style == "none" { "none".into() } else { color.clone() },
        |(style, color)| style != "none" && color_equals(color, expected),
    )
}

/// Every edge between the cells of `CellRange` has `BorderStyle`.
pub fn set_inner_border_style(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    border_style(book, &params, false)
}

/// Every edge between the cells of `CellRange` has `BorderColor`.
pub fn set_inner_border_color(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    border_color(book, &params, false)
}

/// The outline of `CellRange` has `BorderStyle`.
pub fn set_outer_border_style(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    border_style(book, &params, true)
}

/// The outline of `CellRange` has `BorderColor`.
pub fn set_outer_border_color(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    border_color(book, &params, true)
}

/// Every edge of `CellRange` is bordered, with `BorderStyle` and
/// `BorderColor` when given.
pub fn set_cell_border(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let style = params.try_get("BorderStyle");
    let color = params.try_get("BorderColor");
    let mut all = edges(&range, true)?;
    all.extend(edges(&range, false)?);
    let expected = [style, color].into_iter().flatten().join(", ");
    let expected = if expected.is_empty() { "bordered".to_string() } else { expected };
    check_edges(
        &ws,
        format!("borders of {range}"),
        &expected,
        all,
        |(s, c)| if c.is_empty() { s.clone() } else { format!("{s} {c}") },
        |(s, c)| {
            s != "none"
                && style.is_none_or(|want| vocab::same(EXCEL_BORDER_STYLE, s, want))
                && color.is_none_or(|want| color_equals(c, want))
        },
    )
}

/// Background colour of a cell: the foreground of a solid fill, the
/// background of a patterned one.
fn fill_color(book: &Workbook, format: &CellFormat<'_>) -> Result<String, ScoringError> {
    let slot = match format.pattern_type() {
        "none" => return Ok("none".into()),
        "solid" => "fgColor",
        _ => "bgColor",
    };
    let color = match format.pattern().and_then(|p| p.child(slot)) {
        Some(c) => book.resolve_color(c)?,
        None => None,
    };
    Ok(color.unwrap_or_else(|| "auto".into()))
}

/// Every cell of `CellRange` is filled with `FillColor`.
pub fn set_fill_color(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let expected = params.require_any(&["FillColor", "BackgroundColor", "Color"])?;
    check_cells(
        &ws,
        &range,
        "fill color",
        expected,
        |at| fill_color(book, &ws.format(at)?),
        |v| color_equals(v, expected),
    )
}

/// Every cell of `CellRange` has pattern `PatternStyle`.
pub fn set_pattern_style(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let expected = params.require("PatternStyle")?;
    let wanted: String = expected.chars().filter(|c| !c.is_whitespace()).collect();
    check_cells(
        &ws,
        &range,
        "pattern",
        expected,
        |at| Ok(ws.format(at)?.pattern_type().to_string()),
        |v| vocab::same(PATTERNS, v, &wanted),
    )
}

/// Every cell of `CellRange` has pattern colour `PatternColor`.
pub fn set_pattern_color(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let expected = params.require("PatternColor")?;
    check_cells(
        &ws,
        &range,
        "pattern color",
        expected,
        |at| {
            let format = ws.format(at)?;
            let color = match format.pattern().and_then(|p| p.child("fgColor")) {
                Some(c) => book.resolve_color(c)?,
                None => None,
            };
            Ok(color.unwrap_or_else(|| "none".into()))
        },
        |v| color_equals(v, expected),
    )
}

/// Format codes of the common built-in number formats.
const BUILTIN_FORMATS: &[(usize, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "m/d/yyyy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yyyy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
];

/// First id available to workbook-defined number formats.
const FIRST_CUSTOM_FORMAT: usize = 164;

/// Category of a built-in number format id.
fn builtin_category(id: usize) -> Option<&'static str> {
    Some(match id {
        0 => "general",
        1..=4 | 37..=40 => "number",
        5..=8 => "currency",
        9 | 10 => "percentage",
        11 | 48 => "scientific",
        12 | 13 => "fraction",
        14..=17 | 22 | 27..=31 | 34..=36 | 50..=58 => "date",
        18..=21 | 32 | 33 | 45..=47 => "time",
        41..=44 => "accounting",
        49 => "text",
        _ => return None,
    })
}

/// Category a format code displays as.
fn classify_code(code: &str) -> &'static str {
    let lower = code.to_lowercase();
    // Literal text and colour tags say nothing about the category.
    let mut bare = String::new();
    let mut quoted = false;
    let mut bracket = String::new();
    let mut in_bracket = false;
    for c in lower.chars() {
        match c {
            '"' => quoted = !quoted,
            _ if quoted => {}
            '[' => {
                in_bracket = true;
                bracket.clear();
            }
            ']' if in_bracket => {
                in_bracket = false;
                if bracket.starts_with('$') {
                    bare.push('$');
                } else if bracket.starts_with("dbnum") {
                    bare.push('§');
                } else if matches!(bracket.as_str(), "h" | "hh" | "m" | "mm" | "s" | "ss") {
                    bare.push('h');
                }
            }
            _ if in_bracket => bracket.push(c),
            _ => bare.push(c),
        }
    }
    if bare.trim() == "@" {
        "text"
    } else if bare.contains('§') {
        "special"
    } else if bare.contains('*') || bare.contains("_(") {
        "accounting"
    } else if bare.contains('%') {
        "percentage"
    } else if bare.contains("e+") || bare.contains("e-") {
        "scientific"
    } else if bare.contains("?/") || bare.contains("#/") {
        "fraction"
    } else if ['$', '¥', '￥', '€', '£'].iter().any(|s| bare.contains(*s)) {
        "currency"
    } else if bare.contains('y') || bare.contains('d') {
        "date"
    } else if bare.contains('h') || bare.contains('s') {
        "time"
    } else if bare.contains('0') || bare.contains('#') {
        "number"
    } else if bare.contains("general") {
        "general"
    } else {
        "custom"
    }
}

/// `category (code)` for a cell format; workbook-defined formats read as
/// `category, custom (code)`.
fn number_format(format: &CellFormat<'_>) -> String {
    let id = format.num_fmt_id;
    let code = format
        .num_fmt_code
        .clone()
        .or_else(|| {
            BUILTIN_FORMATS
                .iter()
                .find(|(i, _)| *i == id)
                .map(|(_, c)| c.to_string())
        })
        .unwrap_or_default();
    let category = builtin_category(id).unwrap_or_else(|| classify_code(&code));
    if id >= FIRST_CUSTOM_FORMAT {
        format!("{category}, custom ({code})")
    } else {
        format!("{category} ({code})")
    }
}

/// Number format of every cell in `CellRange` is `NumberFormat`: a category
/// name or a literal format code.
pub fn set_number_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let expected = params.require_any(&["NumberFormat", "FormatCategory", "NumberFormatType", "FormatCode"])?;
    check_cells(
        &ws,
        &range,
        "number format",
        expected,
        |at| Ok(number_format(&ws.format(at)?)),
        |v| {
            let (head, code) = v
                .split_once(" (")
                .map(|(h, c)| (h, c.strip_suffix(')').unwrap_or(c)))
                .unwrap_or((v, ""));
            head.split(", ")
                .any(|cat| vocab::same(NUMBER_CATEGORIES, cat, expected))
                || text_equals(Some(code), Some(expected))
        },
    )
}

/// Comparable form of a cell style name: localized names reduced to the
/// built-in English one, accent styles spelled `Accent1`.
fn style_key(name: &str) -> String {
    let mut name = name.trim().to_string();
    for accent in ["强调文字颜色", "强调文字色", "着色"] {
        name = name.replace(accent, "Accent");
    }
    let name = vocab::canonical(CELL_STYLES, &name)
        .map(str::to_string)
        .unwrap_or(name);
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Every cell of `CellRange` uses the cell style `StyleName`.
pub fn set_cell_style(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let expected = params.require_any(&["StyleName", "CellStyle"])?;
    let want = style_key(expected);
    check_cells(
        &ws,
        &range,
        "cell style",
        expected,
        |at| Ok(ws.format(at)?.style_name.unwrap_or_else(|| "Normal".into())),
        |v| style_key(v) == want,
    )
}

/// Fill and font colours of differential format `dxf_id`.
fn dxf_colors(book: &Workbook, dxf_id: Option<usize>) -> Result<(Option<String>, Option<String>), ScoringError> {
    let Some(styles) = book.styles()? else {
        return Ok((None, None));
    };
    let Some(dxf) = dxf_id.and_then(|i| styles.child("dxfs")?.children_named("dxf").nth(i)) else {
        return Ok((None, None));
    };
    let resolve = |node: Option<&XmlNode>| -> Result<Option<String>, ScoringError> {
        match node {
            Some(c) => book.resolve_color(c),
            None => Ok(None),
        }
    };
    let pattern = dxf.child("fill").and_then(|f| f.child("patternFill"));
    let fill = resolve(
        pattern.and_then(|p| p.child("bgColor").or_else(|| p.child("fgColor"))),
    )?;
    let font = resolve(dxf.child("font").and_then(|f| f.child("color")))?;
    Ok((fill, font))
}

/// Whether a rule's differential format looks like `style`: a preset
/// label, or a colour matching either its fill or font.
fn format_matches(style: &str, fill: Option<&str>, font: Option<&str>) -> bool {
    let fits = |have: Option<&str>, wants: &[&str]| {
        wants.is_empty() || have.is_some_and(|h| wants.iter().any(|w| color_equals(h, w)))
    };
    match FORMAT_PRESETS.iter().find(|(label, _, _)| *label == style.trim()) {
        Some((_, fills, fonts)) => fits(fill, fills) && fits(font, fonts),
        None => [fill, font]
            .into_iter()
            .flatten()
            .any(|c| color_equals(c, style)),
    }
}

/// A conditional format exists, on `CellRange` when given, of
/// `ConditionType` with `ConditionValue` and `FormatStyle` when given.
pub fn set_conditional_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = optional_range(&params, RANGE_KEYS)?;
    let kind = params.first_of(&["ConditionType", "RuleType"]);
    let value = params.try_get("ConditionValue");
    let style = params.try_get("FormatStyle");
    let expected = [range.map(|r| r.to_string()), kind.map(str::to_string), value.map(str::to_string), style.map(str::to_string)]
        .into_iter()
        .flatten()
        .join(" ");
    let expected = if expected.is_empty() { "present".to_string() } else { expected };

    let mut observed = Vec::new();
    for block in ws.root().children_named("conditionalFormatting") {
        let sqref = block.attr("sqref").unwrap_or_default();
        let on_range = range.is_none_or(|r| parse_sqref(sqref).iter().any(|s| s.overlaps(&r)));
        for rule in block.children_named("cfRule") {
            let rule_type = rule.attr("type").unwrap_or_default();
            let formulas: Vec<String> = rule
                .children_named("formula")
                .map(|f| f.text().trim().trim_matches('"').to_string())
                .chain(rule.attr("text").map(str::to_string))
                .chain(rule.attr("rank").map(str::to_string))
                .collect();
            let (fill, font) = dxf_colors(book, rule.attr("dxfId").and_then(|d| d.parse().ok()))?;
            let ok = on_range
                && kind.is_none_or(|k| vocab::same(CONDITION_TYPES, rule_type, k))
                && value.is_none_or(|v| {
                    let v = v.trim().trim_matches('"');
                    formulas.iter().any(|f| text_equals(Some(f), Some(v)))
                })
                && style.is_none_or(|s| format_matches(s, fill.as_deref(), font.as_deref()));
            let shown = format!("{sqref} {rule_type} {}", formulas.join(","));
            observed.push((shown.trim().to_string(), ok));
        }
    }
    Ok(Check::any_judged("conditional format", expected, observed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_custom_number_formats() {
        assert_eq!(classify_code("yyyy\"年\"m\"月\"d\"日\""), "date");
        assert_eq!(classify_code("[$¥-804]#,##0.00"), "currency");
        assert_eq!(classify_code("_(* #,##0_)"), "accounting");
        assert_eq!(classify_code("0.0%"), "percentage");
        assert_eq!(classify_code("[h]:mm"), "time");
        assert_eq!(classify_code("[DBNum1]G/通用格式"), "special");
        assert_eq!(classify_code("0.000"), "number");
    }

    #[test]
    fn matches_localized_cell_styles() {
        assert_eq!(style_key("20% - 强调文字颜色 1"), style_key("20% - Accent1"));
        assert_eq!(style_key("标题 1"), style_key("Heading 1"));
        assert_ne!(style_key("好"), style_key("Bad"));
    }

    #[test]
    fn border_edges_cover_the_outline() {
        let range = CellRange::parse("A1:B2").expect("range");
        assert_eq!(edges(&range, true).expect("outer").len(), 8);
        assert_eq!(edges(&range, false).expect("inner").len(), 4);
    }
}
