#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use crate::{
    error::ScoringError,
    grade::{
        Check, Params,
        compare::{COARSE_EPSILON, color_equals, number_equals, squash_whitespace, text_equals},
        vocab::{self, Vocab, WORD_ALIGNMENT, WORD_BORDER_STYLE, WORD_VERTICAL_ALIGNMENT},
    },
    ooxml::{XmlNode, fmt_num, twips_to_pt},
    word::{Border, WordDocument, collect},
};

/// Row height rules (`w:trHeight/@hRule`).
const HEIGHT_RULES: Vocab = &[
    ("auto", &["自动"]),
    ("atLeast", &["最小值", "至少"]),
    ("exact", &["固定值", "精确值"]),
];

/// Width units (`w:tcW/@type`).
const WIDTH_TYPES: Vocab = &[
    ("auto", &["自动"]),
    ("dxa", &["固定值", "磅", "fixed"]),
    ("pct", &["百分比", "percent"]),
];

/// Shading areas.
const AREA_TYPES: Vocab = &[("row", &["行"]), ("column", &["列"])];

/// Styles Word applies to a freshly inserted table.
const DEFAULT_TABLE_STYLES: &[&str] = &["TableGrid", "Table Grid", "TableNormal", "Normal Table", "a3"];

/// One cell placed on the table grid.
#[derive(Debug, Clone, Copy)]
struct GridCell<'a> {
    /// first grid column covered (0-based)
    col:  usize,
    /// number of grid columns covered
    span: usize,
    /// the `w:tc` element
    tc:   &'a XmlNode,
}

impl<'a> GridCell<'a> {
    /// Whether the cell covers grid column `col`.
    fn covers(&self, col: usize) -> bool {
        col >= self.col && col < self.col + self.span
    }

    /// `w:vMerge` state: `restart`, `continue`, or `None` when unmerged.
    fn vmerge(&self) -> Option<&'a str> {
        self.tc
            .path(&["tcPr", "vMerge"])
            .map(|v| v.val().unwrap_or("continue"))
    }
}

/// Rows of a table, excluding those of nested tables.
fn rows(tbl: &XmlNode) -> Vec<&XmlNode> {
    tbl.children_named("tr").collect()
}

/// Cells of a row placed on the grid, honouring `gridBefore` and
/// `gridSpan`.
fn grid_cells(tr: &XmlNode) -> Vec<GridCell<'_>> {
    let mut col = tr
        .path(&["trPr", "gridBefore"])
        .and_then(|g| g.attr_f64("val"))
        .unwrap_or(0.0) as usize;
    let mut out = Vec::new();
    for tc in tr.children_named("tc") {
        let span = tc
            .path(&["tcPr", "gridSpan"])
            .and_then(|g| g.attr_f64("val"))
            .map_or(1, |s| s.max(1.0) as usize);
        out.push(GridCell { col, span, tc });
        col += span;
    }
    out
}

/// Number of grid columns.
fn column_count(tbl: &XmlNode) -> usize {
    let grid = tbl
        .child("tblGrid")
        .map_or(0, |g| g.children_named("gridCol").count());
    let widest = rows(tbl)
        .into_iter()
        .map(|tr| grid_cells(tr).last().map_or(0, |c| c.col + c.span))
        .max()
        .unwrap_or(0);
    grid.max(widest)
}

/// The cell covering grid position (`row`, `col`), both 0-based.
fn cell_at(tbl: &XmlNode, row: usize, col: usize) -> Option<GridCell<'_>> {
    let tr = *rows(tbl).get(row)?;
    grid_cells(tr).into_iter().find(|c| c.covers(col))
}

/// Visible text of a cell.
fn cell_text(tc: &XmlNode) -> String {
    collect(tc, "p")
        .into_iter()
        .map(WordDocument::paragraph_text)
        .join("\n")
}

/// The table selected by `TableIndex` (default: the first).
fn select_table<'d>(doc: &'d WordDocument, params: &Params<'_>) -> Result<Option<&'d XmlNode>, ScoringError> {
    let tables = doc.tables();
    if tables.is_empty() {
        return Ok(None);
    }
    let i = params.index_or_first("TableIndex", tables.len())?;
    Ok(Some(tables[i]))
}

/// Resolves a required 1-based index parameter.
fn required_index(params: &Params<'_>, key: &str, count: usize) -> Result<usize, ScoringError> {
    params.index(key, count)?.ok_or_else(|| ScoringError::missing(key))
}

/// Inclusive 0-based range from a start key and an optional end key.
fn required_range(
    params: &Params<'_>,
    start: &str,
    end: &str,
    count: usize,
) -> Result<std::ops::RangeInclusive<usize>, ScoringError> {
    let s = required_index(params, start, count)?;
    let e = params.index(end, count)?.unwrap_or(s);
    Ok(s.min(e)..=s.max(e))
}

/// Shorthand for the "no table" verdict.
fn no_table(expected: impl Into<String>) -> Check {
    Check::absent("table", expected)
}

/// At least `ExpectedTableCount` tables exist (default 1).
pub fn insert_table(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let wanted = params.try_int("ExpectedTableCount").unwrap_or(1).max(1) as usize;
    let found = doc.tables().len();
    Ok(Check::compare(
        found >= wanted,
        "tables",
        format!("at least {wanted}"),
        found.to_string(),
    ))
}

/// The table uses `TableStyle`; without it, any style beyond the default
/// grid.
pub fn set_style(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.try_get("TableStyle");
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(expected.unwrap_or("a table style")));
    };
    let Some(id) = tbl.path(&["tblPr", "tblStyle"]).and_then(XmlNode::val) else {
        return Ok(Check::absent("table style", expected.unwrap_or("a table style")));
    };
    let name = doc.style_name(id)?.unwrap_or_else(|| id.to_string());
    let squash = |s: &str| s.replace(' ', "");
    let passed = match expected {
        Some(want) => {
            text_equals(Some(&squash(&name)), Some(&squash(want)))
                || text_equals(Some(&squash(id)), Some(&squash(want)))
        }
        None => !DEFAULT_TABLE_STYLES.contains(&id) && !DEFAULT_TABLE_STYLES.contains(&name.as_str()),
    };
    Ok(Check::compare(passed, "table style", expected.unwrap_or("a non-default style"), name))
}

/// Borders drawn on a table: table-level borders, else those of its style,
/// else the first cell's.
fn table_borders(doc: &WordDocument, tbl: &XmlNode) -> Result<Vec<Border>, ScoringError> {
    if let Some(b) = tbl.path(&["tblPr", "tblBorders"]) {
        return Ok(Border::read_all(b));
    }
    if let Some(id) = tbl.path(&["tblPr", "tblStyle"]).and_then(XmlNode::val) {
        if let Some(b) = doc.style(id)?.and_then(|s| s.path(&["tblPr", "tblBorders"])) {
            return Ok(Border::read_all(b));
        }
    }
    Ok(tbl
        .find("tcBorders")
        .map(Border::read_all)
        .unwrap_or_default())
}

/// The table has borders, in `BorderStyle`, `BorderColor` and `BorderWidth`
/// when given.
pub fn set_border(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table("table borders"));
    };
    let borders = table_borders(doc, tbl)?;
    if borders.is_empty() {
        return Ok(Check::absent("table borders", "table borders"));
    }
    let mut checks = Vec::new();
    if let Some(style) = params.try_get("BorderStyle") {
        let actual = borders.iter().map(|b| b.style.as_str()).unique().join("/");
        let ok = borders.iter().all(|b| vocab::same(WORD_BORDER_STYLE, &b.style, style));
        checks.push(Check::compare(ok, "border style", style, actual));
    }
    if let Some(color) = params.try_get("BorderColor") {
        let colors: Vec<String> = borders
            .iter()
            .map(|b| b.color.clone().unwrap_or_else(|| "auto".into()))
            .unique()
            .collect();
        let ok = colors.iter().all(|c| color_equals(c, color));
        checks.push(Check::compare(ok, "border colour", color, colors.join("/")));
    }
    if let Some(width) = params.try_number("BorderWidth") {
        let widths: Vec<Option<f64>> = borders.iter().map(|b| b.width).collect();
        let ok = widths
            .iter()
            .all(|w| w.is_some_and(|w| number_equals(w, width, doc.tolerance())));
        let actual = widths
            .iter()
            .map(|w| w.map_or_else(|| "unset".to_string(), fmt_num))
            .unique()
            .join("/");
        checks.push(Check::compare(ok, "border width", fmt_num(width), actual));
    }
    if checks.is_empty() {
        return Ok(Check::presence(true, "table borders"));
    }
    Ok(Check::all("table borders", checks))
}

/// The table has `Rows` rows and `Columns` columns.
pub fn set_rows_columns(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let want_rows = params.try_int("Rows");
    let want_cols = params.try_int("Columns");
    if want_rows.is_none() && want_cols.is_none() {
        return Err(ScoringError::missing("Rows or Columns"));
    }
    let expected = format!(
        "{}x{}",
        want_rows.map_or("?".into(), |r| r.to_string()),
        want_cols.map_or("?".into(), |c| c.to_string())
    );
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(expected));
    };
    let (r, c) = (rows(tbl).len() as i64, column_count(tbl) as i64);
    let passed = want_rows.is_none_or(|w| w == r) && want_cols.is_none_or(|w| w == c);
    Ok(Check::compare(passed, "table size", expected, format!("{r}x{c}")))
}

/// Cells of one row or column (`AreaType`, `AreaNumber`) between
/// `StartPosition` and `EndPosition` are shaded `ShadingColor`.
pub fn set_shading(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let color = params.require_any(&["ShadingColor", "FillColor"])?;
    let area = params.require("AreaType")?;
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(color));
    };
    let (row_count, col_count) = (rows(tbl).len(), column_count(tbl));
    let by_row = match vocab::canonical(AREA_TYPES, area) {
        Some("row") => true,
        Some(_) => false,
        None => return Err(ScoringError::missing("AreaType")),
    };
    let (line_count, cross_count) = if by_row { (row_count, col_count) } else { (col_count, row_count) };
    let line = required_index(&params, "AreaNumber", line_count)?;
    let start = params.index("StartPosition", cross_count)?.unwrap_or(0);
    let end = params
        .index("EndPosition", cross_count)?
        .unwrap_or(cross_count.saturating_sub(1));

    let mut fills = Vec::new();
    for pos in start.min(end)..=start.max(end) {
        let (r, c) = if by_row { (line, pos) } else { (pos, line) };
        if let Some(cell) = cell_at(tbl, r, c) {
            let fill = cell
                .tc
                .path(&["tcPr", "shd"])
                .and_then(|s| s.attr("fill"))
                .unwrap_or("auto");
            fills.push(fill.to_string());
        }
    }
    if fills.is_empty() {
        return Ok(Check::absent("shaded cells", color));
    }
    let passed = fills.iter().all(|f| color_equals(f, color));
    Ok(Check::compare(
        passed,
        format!("{area} {} shading", line + 1),
        color,
        fills.into_iter().unique().join("/"),
    ))
}

/// Rows `StartRow`..=`EndRow` are `RowHeight` points high, with the
/// `HeightType` rule when given.
pub fn set_row_height(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let height = params.require_number("RowHeight")?;
    let rule = params.try_get("HeightType");
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(fmt_num(height)));
    };
    let all = rows(tbl);
    let range = required_range(&params, "StartRow", "EndRow", all.len())?;

    let mut shown = Vec::new();
    let mut passed = true;
    for tr in &all[range] {
        let h = tr.path(&["trPr", "trHeight"]);
        let value = h.and_then(|h| h.attr_f64("val")).map(twips_to_pt);
        let actual_rule = h
            .map(|h| h.attr("hRule").unwrap_or("atLeast"))
            .unwrap_or("auto");
        let ok = value.is_some_and(|v| number_equals(v, height, doc.tolerance()))
            && rule.is_none_or(|r| vocab::same(HEIGHT_RULES, actual_rule, r));
        passed &= ok;
        shown.push(format!(
            "{} {actual_rule}",
            value.map_or_else(|| "unset".to_string(), fmt_num)
        ));
    }
    let expected = match rule {
        Some(r) => format!("{} {r}", fmt_num(height)),
        None => fmt_num(height),
    };
    Ok(Check::compare(passed, "row height", expected, shown.into_iter().unique().join(", ")))
}

/// Columns `StartColumn`..=`EndColumn` are `ColumnWidth` wide (points, or
/// percent for `WidthType` pct).
pub fn set_column_width(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let width = params.require_number("ColumnWidth")?;
    let kind = params.try_get("WidthType").and_then(|k| vocab::canonical(WIDTH_TYPES, k));
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(fmt_num(width)));
    };
    let range = required_range(&params, "StartColumn", "EndColumn", column_count(tbl))?;
    let grid: Vec<f64> = tbl
        .child("tblGrid")
        .map(|g| {
            g.children_named("gridCol")
                .map(|c| c.attr_f64("w").unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default();

    let mut shown = Vec::new();
    let mut passed = true;
    for col in range {
        let tc_w = cell_at(tbl, 0, col).and_then(|c| c.tc.path(&["tcPr", "tcW"]));
        let unit = tc_w.and_then(|w| w.attr("type")).unwrap_or("dxa");
        let (value, unit) = match (unit, tc_w.and_then(|w| w.attr("w"))) {
            ("pct", Some(w)) => (
                w.strip_suffix('%')
                    .and_then(|p| p.parse::<f64>().ok())
                    .or_else(|| w.parse::<f64>().ok().map(|v| v / 50.0)),
                "pct",
            ),
            ("auto", _) => (grid.get(col).map(|w| twips_to_pt(*w)), "auto"),
            (_, w) => (
                w.and_then(|w| w.parse::<f64>().ok())
                    .or_else(|| grid.get(col).copied())
                    .map(twips_to_pt),
                "dxa",
            ),
        };
        let ok = value.is_some_and(|v| number_equals(v, width, COARSE_EPSILON))
            && kind.is_none_or(|k| k == unit);
        passed &= ok;
        shown.push(format!(
            "{} {unit}",
            value.map_or_else(|| "unset".to_string(), fmt_num)
        ));
    }
    Ok(Check::compare(
        passed,
        "column width",
        fmt_num(width),
        shown.into_iter().unique().join(", "),
    ))
}

/// The cell at (`row`, `col`) holds `expected`.
fn check_cell_text(tbl: &XmlNode, row: usize, col: usize, expected: &str) -> Check {
    let subject = format!("cell ({}, {}) text", row + 1, col + 1);
    let Some(cell) = cell_at(tbl, row, col) else {
        return Check::absent(subject, expected);
    };
    let actual = squash_whitespace(&cell_text(cell.tc));
    Check::compare(
        text_equals(Some(&actual), Some(&squash_whitespace(expected))),
        subject,
        expected,
        actual,
    )
}

/// The cell at `RowNumber`, `ColumnNumber` holds `CellContent`.
pub fn set_cell_content(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("CellContent")?;
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(expected));
    };
    let row = required_index(&params, "RowNumber", rows(tbl).len())?;
    let col = required_index(&params, "ColumnNumber", column_count(tbl))?;
    Ok(check_cell_text(tbl, row, col, expected))
}

/// Horizontal (paragraph) and vertical (cell) alignment of one cell.
fn check_cell_alignment(
    doc: &WordDocument,
    tbl: &XmlNode,
    row: usize,
    col: usize,
    params: &Params<'_>,
) -> Result<Check, ScoringError> {
    let horizontal = params.try_get("HorizontalAlignment");
    let vertical = params.try_get("VerticalAlignment");
    if horizontal.is_none() && vertical.is_none() {
        return Err(ScoringError::missing("HorizontalAlignment or VerticalAlignment"));
    }
    let subject = format!("cell ({}, {}) alignment", row + 1, col + 1);
    let expected = [horizontal, vertical].into_iter().flatten().join(", ");
    let Some(cell) = cell_at(tbl, row, col) else {
        return Ok(Check::absent(subject, expected));
    };

    let mut checks = Vec::new();
    if let Some(want) = horizontal {
        let mut aligns = Vec::new();
        for p in collect(cell.tc, "p") {
            aligns.push(
                doc.para_props(p)?
                    .alignment
                    .unwrap_or_else(|| "left".to_string()),
            );
        }
        let ok = !aligns.is_empty() && aligns.iter().all(|a| vocab::same(WORD_ALIGNMENT, a, want));
        checks.push(Check::compare(ok, "horizontal", want, aligns.into_iter().unique().join("/")));
    }
    if let Some(want) = vertical {
        let actual = cell
            .tc
            .path(&["tcPr", "vAlign"])
            .and_then(XmlNode::val)
            .unwrap_or("top");
        checks.push(Check::compare(
            vocab::same(WORD_VERTICAL_ALIGNMENT, actual, want),
            "vertical",
            want,
            actual,
        ));
    }
    Ok(Check::all(subject, checks))
}

/// The cell at `RowNumber`, `ColumnNumber` is aligned per
/// `HorizontalAlignment` and/or `VerticalAlignment`.
pub fn set_cell_alignment(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table("cell alignment"));
    };
    let row = required_index(&params, "RowNumber", rows(tbl).len())?;
    let col = required_index(&params, "ColumnNumber", column_count(tbl))?;
    check_cell_alignment(doc, tbl, row, col, &params)
}

/// The table is aligned `TableAlignment`, indented `LeftIndent` points when
/// given.
pub fn set_alignment(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["TableAlignment", "Alignment"])?;
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(expected));
    };
    let actual = tbl
        .path(&["tblPr", "jc"])
        .and_then(XmlNode::val)
        .unwrap_or("left");
    let mut checks = vec![Check::compare(
        vocab::same(WORD_ALIGNMENT, actual, expected),
        "alignment",
        expected,
        actual,
    )];
    if let Some(indent) = params.try_number("LeftIndent") {
        let actual = tbl
            .path(&["tblPr", "tblInd"])
            .and_then(|i| i.attr_f64("w"))
            .map_or(0.0, twips_to_pt);
        checks.push(Check::compare(
            number_equals(actual, indent, COARSE_EPSILON),
            "left indent",
            fmt_num(indent),
            fmt_num(actual),
        ));
    }
    Ok(Check::all("table alignment", checks))
}

/// Cells from (`StartRow`, `StartColumn`) to (`EndRow`, `EndColumn`) are
/// merged into one.
pub fn merge_cells(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table("merged cells"));
    };
    let rows_range = required_range(&params, "StartRow", "EndRow", rows(tbl).len())?;
    let cols_range = required_range(&params, "StartColumn", "EndColumn", column_count(tbl))?;
    let (top, bottom) = (*rows_range.start(), *rows_range.end());
    let (left, right) = (*cols_range.start(), *cols_range.end());
    let expected = format!("({}, {})-({}, {})", top + 1, left + 1, bottom + 1, right + 1);

    let mut problems = Vec::new();
    for r in top..=bottom {
        match cell_at(tbl, r, left) {
            Some(cell) if cell.col == left && cell.col + cell.span == right + 1 => {
                let vm = cell.vmerge();
                let ok = if top == bottom {
                    vm.is_none()
                } else if r == top {
                    vm == Some("restart")
                } else {
                    vm == Some("continue")
                };
                if !ok {
                    problems.push(format!("row {} not vertically merged", r + 1));
                }
            }
            Some(cell) => problems.push(format!(
                "row {} spans columns {}-{}",
                r + 1,
                cell.col + 1,
                cell.col + cell.span
            )),
            None => problems.push(format!("row {} has no cell there", r + 1)),
        }
    }
    if top == bottom && left == right {
        problems.push("range covers a single cell".to_string());
    }
    let actual = if problems.is_empty() { "merged".to_string() } else { problems.join("; ") };
    Ok(Check::compare(problems.is_empty(), "merged range", expected, actual))
}

/// The header cell of `ColumnNumber` holds `HeaderContent`.
pub fn set_header_content(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["HeaderContent", "CellContent"])?;
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table(expected));
    };
    let col = required_index(&params, "ColumnNumber", column_count(tbl))?;
    Ok(check_cell_text(tbl, 0, col, expected))
}

/// The header cell of `ColumnNumber` is aligned per `HorizontalAlignment`
/// and/or `VerticalAlignment`.
pub fn set_header_alignment(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let Some(tbl) = select_table(doc, &params)? else {
        return Ok(no_table("header alignment"));
    };
    let col = required_index(&params, "ColumnNumber", column_count(tbl))?;
    check_cell_alignment(doc, tbl, 0, col, &params)
}
