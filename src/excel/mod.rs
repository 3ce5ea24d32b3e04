#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Read-only view over a spreadsheet package: sheets, cell values, the style
//! table, and the parts hanging off worksheets (drawings, charts, pivots).

/// Cell and range addressing.
pub mod cell;
/// Tag registry, keyword mapping, and the rule handlers.
pub mod rules;

use std::{collections::BTreeMap, path::Path};

use tracing::debug;

use self::cell::{CellRange, CellRef, shift_formula};
use crate::{
    config::ScoringConfig,
    error::{Extracted, ScoringError},
    grade::{Params, vocab::FontFlags},
    ooxml::{Package, XmlNode, rel},
};

/// Conventional name of the workbook part.
const MAIN_PART: &str = "xl/workbook.xml";
/// Row height in points when neither the row nor the sheet sets one.
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;
/// Column width in characters when neither the column nor the sheet sets
/// one.
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Ranges larger than this are inspected through their stored cells only.
const MAX_RANGE_CELLS: u64 = 10_000;

/// The legacy indexed palette (`<color indexed="n"/>`), first 64 entries.
const INDEXED_COLORS: [&str; 64] = [
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "000000", "FFFFFF", "FF0000", "00FF00", "0000FF", "FFFF00", "FF00FF", "00FFFF", //
    "800000", "008000", "000080", "808000", "800080", "008080", "C0C0C0", "808080", //
    "9999FF", "993366", "FFFFCC", "CCFFFF", "660066", "FF8080", "0066CC", "CCCCFF", //
    "000080", "FF00FF", "FFFF00", "00FFFF", "800080", "800000", "008080", "0000FF", //
    "00CCFF", "CCFFFF", "CCFFCC", "FFFF99", "99CCFF", "FF99CC", "CC99FF", "FFCC99", //
    "3366FF", "33CCCC", "99CC00", "FFCC00", "FF9900", "FF6600", "666699", "969696", //
    "003366", "339966", "003300", "333300", "993300", "993366", "333399", "333333",
];

/// Theme colour slots in `theme` attribute order.
const THEME_SLOTS: [&str; 12] = [
    "lt1", "dk1", "lt2", "dk2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Whether a sheet holds cells or only a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    /// a grid of cells
    Worksheet,
    /// a sheet that is one chart
    Chartsheet,
}

/// One entry of the workbook's sheet list.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    /// display name
    pub name:   String,
    /// part name
    pub part:   String,
    /// worksheet or chart sheet
    pub kind:   SheetKind,
    /// position in the workbook (0-based), also the `localSheetId`
    pub index:  usize,
    /// `visible`, `hidden` or `veryHidden`
    pub state:  String,
}

/// A workbook-level defined name.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    /// name, e.g. `_xlnm.Print_Area`
    pub name:     String,
    /// sheet the name is scoped to
    pub local_to: Option<usize>,
    /// formula text
    pub formula:  String,
}

/// An opened `.xlsx` package.
#[derive(Debug)]
pub struct Workbook {
    /// the package
    package:        Package,
    /// name of the workbook part
    workbook_part:  String,
    /// sheets in workbook order
    sheets:         Vec<SheetEntry>,
    /// shared string table
    shared_strings: Vec<String>,
    /// tolerance for measurement-like comparisons
    tolerance:      f64,
}

impl Workbook {
    /// Opens and validates a spreadsheet.
    pub fn open(path: &Path, cfg: &ScoringConfig) -> Result<Self, ScoringError> {
        let package = Package::open(path, cfg.max_package_bytes())?;
        Self::from_package(package, cfg.error_tolerance())
    }

    /// Validates an already unpacked package and reads the sheet list and
    /// shared strings.
    pub fn from_package(package: Package, tolerance: f64) -> Result<Self, ScoringError> {
        let workbook_part = package.main_part(MAIN_PART)?;
        let root = package.required_xml(&workbook_part)?;
        if !root.is("workbook") {
            return Err(ScoringError::DocumentUnavailable(format!(
                "{workbook_part} is not a spreadsheet workbook"
            )));
        }
        let rels = package
            .relationships(&workbook_part)
            .map_err(|e| ScoringError::DocumentUnavailable(e.to_string()))?;

        let mut sheets = Vec::new();
        for (index, sheet) in root
            .child("sheets")
            .map(|s| s.children_named("sheet").collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .enumerate()
        {
            let Some(r) = sheet
                .attr("r:id")
                .or_else(|| sheet.attr("id"))
                .and_then(|id| rels.iter().find(|r| r.id == id))
            else {
                continue;
            };
            let kind = if r.is("chartsheet") { SheetKind::Chartsheet } else { SheetKind::Worksheet };
            sheets.push(SheetEntry {
                name: sheet.attr("name").unwrap_or_default().to_string(),
                part: r.target.clone(),
                kind,
                index,
                state: sheet.attr("state").unwrap_or("visible").to_string(),
            });
        }
        if !sheets.iter().any(|s| s.kind == SheetKind::Worksheet) {
            return Err(ScoringError::DocumentUnavailable(format!(
                "{workbook_part} lists no worksheets"
            )));
        }

        let shared_strings = match rels.iter().find(|r| r.is("sharedStrings")) {
            Some(r) => package
                .xml(&r.target)
                .map_err(|e| ScoringError::DocumentUnavailable(e.to_string()))?
                .map(|sst| sst.children_named("si").map(rich_text).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(Self {
            package,
            workbook_part,
            sheets,
            shared_strings,
            tolerance,
        })
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Epsilon for measurement comparisons.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// The workbook part's root element.
    pub fn root(&self) -> Result<&XmlNode, ScoringError> {
        self.package.required_xml(&self.workbook_part)
    }

    /// Every sheet, in workbook order.
    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    /// Sheets holding cells.
    pub fn worksheets(&self) -> impl Iterator<Item = &SheetEntry> {
        self.sheets.iter().filter(|s| s.kind == SheetKind::Worksheet)
    }

    /// A sheet by display name, ignoring case and surrounding whitespace.
    pub fn sheet_named(&self, name: &str) -> Option<&SheetEntry> {
        let name = name.trim();
        self.sheets
            .iter()
            .find(|s| s.name.trim().eq_ignore_ascii_case(name))
    }

    /// The worksheet a rule targets: `TargetWorksheet` when it names an
    /// existing worksheet, otherwise the first one.
    pub fn target_sheet(&self, params: &Params<'_>) -> Result<Worksheet<'_>, ScoringError> {
        let named = params
            .first_of(&["TargetWorksheet", "SheetName"])
            .and_then(|n| {
                let found = self.sheet_named(n).filter(|s| s.kind == SheetKind::Worksheet);
                if found.is_none() {
                    debug!(sheet = n, "target worksheet not found, using the first");
                }
                found
            });
        let entry = match named {
            Some(entry) => entry,
            None => self
                .worksheets()
                .next()
                .ok_or_else(|| ScoringError::fault("workbook has no worksheets"))?,
        };
        self.worksheet(entry)
    }

    /// Opens a view over one worksheet.
    pub fn worksheet<'a>(&'a self, entry: &'a SheetEntry) -> Result<Worksheet<'a>, ScoringError> {
        let root = self
            .package
            .xml(&entry.part)?
            .ok_or_else(|| ScoringError::fault(format!("missing sheet part {}", entry.part)))?;
        Ok(Worksheet::new(self, entry, root))
    }

    /// Text of shared string `index`.
    pub fn shared_string(&self, index: usize) -> Option<&str> {
        self.shared_strings.get(index).map(String::as_str)
    }

    /// Workbook-level defined names.
    pub fn defined_names(&self) -> Result<Vec<DefinedName>, ScoringError> {
        Ok(self
            .root()?
            .child("definedNames")
            .map(|d| {
                d.children_named("definedName")
                    .map(|n| DefinedName {
                        name:     n.attr("name").unwrap_or_default().to_string(),
                        local_to: n
                            .attr("localSheetId")
                            .and_then(|i| i.parse().ok()),
                        formula:  n.text().trim().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// A related part of the workbook by relationship type.
    fn workbook_related(&self, suffix: &str) -> Extracted<&XmlNode> {
        match self.package.related(&self.workbook_part, suffix)?.first() {
            Some(target) => self.package.xml(target),
            None => Ok(None),
        }
    }

    /// The style table.
    pub fn styles(&self) -> Extracted<&XmlNode> {
        self.workbook_related("styles")
    }

    /// Formatting of cell format record `xf` (an index into `cellXfs`).
    pub fn format(&self, xf: usize) -> Result<CellFormat<'_>, ScoringError> {
        let Some(styles) = self.styles()? else {
            return Ok(CellFormat::default());
        };
        let Some(record) = nth_record(styles, "cellXfs", "xf", xf) else {
            return Ok(CellFormat::default());
        };
        let index = |attr: &str| record.attr(attr).and_then(|v| v.parse::<usize>().ok());
        let num_fmt_id = index("numFmtId").unwrap_or(0);
        let num_fmt_code = styles
            .child("numFmts")
            .and_then(|n| {
                n.children_named("numFmt")
                    .find(|f| f.attr("numFmtId").and_then(|v| v.parse().ok()) == Some(num_fmt_id))
            })
            .and_then(|f| f.attr("formatCode"))
            .map(str::to_string);
        let xf_id = index("xfId").unwrap_or(0);
        let style_name = styles
            .child("cellStyles")
            .and_then(|c| {
                c.children_named("cellStyle")
                    .find(|s| s.attr("xfId").and_then(|v| v.parse().ok()) == Some(xf_id))
            })
            .and_then(|s| s.attr("name"))
            .map(str::to_string);
        Ok(CellFormat {
            font: nth_record(styles, "fonts", "font", index("fontId").unwrap_or(0)),
            fill: nth_record(styles, "fills", "fill", index("fillId").unwrap_or(0)),
            border: nth_record(styles, "borders", "border", index("borderId").unwrap_or(0)),
            alignment: record.child("alignment"),
            num_fmt_id,
            num_fmt_code,
            style_name,
        })
    }

    /// Every font in the style table.
    pub fn fonts(&self) -> Result<Vec<Font>, ScoringError> {
        let Some(styles) = self.styles()? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for f in styles
            .child("fonts")
            .map(|f| f.children_named("font").collect::<Vec<_>>())
            .unwrap_or_default()
        {
            out.push(self.read_font(f)?);
        }
        Ok(out)
    }

    /// Reads a `<font>` record.
    pub fn read_font(&self, font: &XmlNode) -> Result<Font, ScoringError> {
        let val = |name: &str| font.child(name).and_then(XmlNode::val).map(str::to_string);
        let flag = |name: &str| {
            font.child(name)
                .is_some_and(|n| !matches!(n.val(), Some("0" | "false")))
        };
        Ok(Font {
            name:      val("name").or_else(|| val("rFont")),
            size:      font.child("sz").and_then(|s| s.attr_f64("val")),
            bold:      flag("b"),
            italic:    flag("i"),
            strike:    flag("strike"),
            underline: font
                .child("u")
                .map(|u| u.val().unwrap_or("single").to_string())
                .filter(|u| u != "none"),
            color:     match font.child("color") {
                Some(c) => self.resolve_color(c)?,
                None => None,
            },
        })
    }

    /// RGB of a `<color>` element: literal, indexed palette, or theme slot.
    pub fn resolve_color(&self, color: &XmlNode) -> Result<Option<String>, ScoringError> {
        if let Some(rgb) = color.attr("rgb") {
            return Ok(Some(rgb.to_string()));
        }
        if let Some(i) = color.attr("indexed").and_then(|v| v.parse::<usize>().ok()) {
            return Ok(INDEXED_COLORS.get(i).map(|c| c.to_string()));
        }
        if let Some(i) = color.attr("theme").and_then(|v| v.parse::<usize>().ok()) {
            return self.theme_color(i);
        }
        Ok(color.attr("auto").map(|_| "auto".to_string()))
    }

    /// RGB of theme colour slot `index`.
    fn theme_color(&self, index: usize) -> Result<Option<String>, ScoringError> {
        match THEME_SLOTS.get(index) {
            Some(slot) => self.scheme_color(slot),
            None => Ok(None),
        }
    }

    /// RGB of a drawing scheme colour such as `accent1` or `tx1`.
    pub fn scheme_color(&self, name: &str) -> Result<Option<String>, ScoringError> {
        let slot = match name {
            "tx1" => "dk1",
            "bg1" => "lt1",
            "tx2" => "dk2",
            "bg2" => "lt2",
            other => other,
        };
        let Some(theme) = self.workbook_related("theme")? else {
            return Ok(None);
        };
        Ok(theme.find("clrScheme").and_then(|s| s.child(slot)).and_then(|c| {
            c.child("srgbClr")
                .and_then(XmlNode::val)
                .or_else(|| c.child("sysClr").and_then(|s| s.attr("lastClr")))
                .map(str::to_string)
        }))
    }

    /// Charts in workbook order, restricted to `sheet` when given. Each
    /// chart is reported with the sheet that hosts it.
    pub fn charts(&self, sheet: Option<&SheetEntry>) -> Result<Vec<Chart<'_>>, ScoringError> {
        let mut out = Vec::new();
        for entry in &self.sheets {
            if sheet.is_some_and(|s| s.part != entry.part) {
                continue;
            }
            for drawing in self.package.related(&entry.part, rel::DRAWING)? {
                let Some(root) = self.package.xml(&drawing)? else {
                    continue;
                };
                for frame in root.find_all("chart") {
                    let Some(id) = frame.attr("r:id").or_else(|| frame.attr("id")) else {
                        continue;
                    };
                    let Some(part) = self.package.related_by_id(&drawing, id)? else {
                        continue;
                    };
                    if let Some(space) = self.package.xml(&part)? {
                        out.push(Chart {
                            sheet: entry,
                            part,
                            space,
                        });
                    }
                }
            }
        }
        Ok(out)
    }

    /// Pivot table definitions attached to `sheet`, with their cache
    /// definitions.
    pub fn pivot_tables(
        &self,
        sheet: &SheetEntry,
    ) -> Result<Vec<(&XmlNode, Option<&XmlNode>)>, ScoringError> {
        let mut out = Vec::new();
        for part in self.package.related(&sheet.part, rel::PIVOT_TABLE)? {
            let Some(table) = self.package.xml(&part)? else {
                continue;
            };
            let cache = match self.package.related(&part, rel::PIVOT_CACHE)?.first() {
                Some(c) => self.package.xml(c)?,
                None => None,
            };
            out.push((table, cache));
        }
        Ok(out)
    }
}

/// Record `index` of a style-table list such as `fonts/font`.
fn nth_record<'s>(styles: &'s XmlNode, list: &str, item: &'s str, index: usize) -> Option<&'s XmlNode> {
    styles.child(list)?.children_named(item).nth(index)
}

/// Concatenated text of a shared or inline string item (`t` plus rich
/// runs, phonetic runs excluded).
fn rich_text(si: &XmlNode) -> String {
    if let Some(t) = si.child("t") {
        return t.text().to_string();
    }
    si.children_named("r")
        .filter_map(|r| r.child("t"))
        .map(XmlNode::text)
        .collect()
}

/// Formatting a cell format record points at.
#[derive(Debug, Clone, Default)]
pub struct CellFormat<'a> {
    /// `<font>`
    pub font:         Option<&'a XmlNode>,
    /// `<fill>`
    pub fill:         Option<&'a XmlNode>,
    /// `<border>`
    pub border:       Option<&'a XmlNode>,
    /// `<alignment>`
    pub alignment:    Option<&'a XmlNode>,
    /// number format id
    pub num_fmt_id:   usize,
    /// custom number format code, when the id is not built in
    pub num_fmt_code: Option<String>,
    /// named cell style
    pub style_name:   Option<String>,
}

impl CellFormat<'_> {
    /// Horizontal alignment; `general` when unset.
    pub fn horizontal(&self) -> &str {
        self.alignment
            .and_then(|a| a.attr("horizontal"))
            .unwrap_or("general")
    }

    /// Vertical alignment; `bottom` when unset.
    pub fn vertical(&self) -> &str {
        self.alignment
            .and_then(|a| a.attr("vertical"))
            .unwrap_or("bottom")
    }

    /// The pattern fill element.
    pub fn pattern(&self) -> Option<&XmlNode> {
        self.fill?.child("patternFill")
    }

    /// Pattern type; `none` when unset.
    pub fn pattern_type(&self) -> &str {
        self.pattern()
            .and_then(|p| p.attr("patternType"))
            .unwrap_or("none")
    }

    /// One border side (`left`, `right`, `top`, `bottom`) as (style, colour
    /// element). Unset sides are `None`.
    pub fn border_side(&self, side: &str) -> Option<(&str, Option<&XmlNode>)> {
        let node = self.border?.child(side)?;
        let style = node.attr("style").filter(|s| *s != "none")?;
        Some((style, node.child("color")))
    }
}

/// A font record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
    /// family name
    pub name:      Option<String>,
    /// size in points
    pub size:      Option<f64>,
    /// bold
    pub bold:      bool,
    /// italic
    pub italic:    bool,
    /// strike-through
    pub strike:    bool,
    /// underline kind when underlined
    pub underline: Option<String>,
    /// colour as RGB or `auto`
    pub color:     Option<String>,
}

impl Font {
    /// Style flags.
    pub fn flags(&self) -> FontFlags {
        FontFlags {
            bold:      self.bold,
            italic:    self.italic,
            underline: self.underline.is_some(),
            strike:    self.strike,
        }
    }
}

/// A chart and where it lives.
#[derive(Debug, Clone)]
pub struct Chart<'a> {
    /// the sheet hosting the chart
    pub sheet: &'a SheetEntry,
    /// chart part name
    pub part:  String,
    /// `c:chartSpace` root
    pub space: &'a XmlNode,
}

impl<'a> Chart<'a> {
    /// Whether the chart is a chart sheet of its own.
    pub fn on_chartsheet(&self) -> bool {
        self.sheet.kind == SheetKind::Chartsheet
    }

    /// The `c:chart` element.
    pub fn chart(&self) -> Option<&'a XmlNode> {
        self.space.child("chart")
    }

    /// The plot area.
    pub fn plot_area(&self) -> Option<&'a XmlNode> {
        self.chart()?.child("plotArea")
    }
}

/// A view over one worksheet with its cells indexed by coordinate.
#[derive(Debug)]
pub struct Worksheet<'a> {
    /// owning workbook
    book:  &'a Workbook,
    /// the workbook entry
    entry: &'a SheetEntry,
    /// `<worksheet>` root
    root:  &'a XmlNode,
    /// `<c>` elements by coordinate
    cells: BTreeMap<CellRef, &'a XmlNode>,
    /// `<row>` elements by row number
    rows:  BTreeMap<u32, &'a XmlNode>,
}

impl<'a> Worksheet<'a> {
    /// Indexes the rows and cells of a worksheet. Rows and cells without an
    /// explicit reference follow their predecessor.
    fn new(book: &'a Workbook, entry: &'a SheetEntry, root: &'a XmlNode) -> Self {
        let mut cells = BTreeMap::new();
        let mut rows = BTreeMap::new();
        let mut row_no = 0u32;
        for row in root
            .child("sheetData")
            .map(|d| d.children_named("row").collect::<Vec<_>>())
            .unwrap_or_default()
        {
            row_no = row
                .attr("r")
                .and_then(|r| r.parse().ok())
                .unwrap_or(row_no + 1);
            rows.insert(row_no, row);
            let mut col = 0u32;
            for c in row.children_named("c") {
                let at = c
                    .attr("r")
                    .and_then(CellRef::parse)
                    .unwrap_or(CellRef::new(row_no, col + 1));
                col = at.col;
                cells.insert(at, c);
            }
        }
        Self {
            book,
            entry,
            root,
            cells,
            rows,
        }
    }

    /// The workbook entry.
    pub fn entry(&self) -> &'a SheetEntry {
        self.entry
    }

    /// The owning workbook.
    pub fn book(&self) -> &'a Workbook {
        self.book
    }

    /// The `<worksheet>` root.
    pub fn root(&self) -> &'a XmlNode {
        self.root
    }

    /// The `<c>` element at `at`.
    pub fn cell(&self, at: CellRef) -> Option<&'a XmlNode> {
        self.cells.get(&at).copied()
    }

    /// Cells of `range` to inspect: every cell of a small range, only the
    /// stored cells of a large one.
    pub fn cells_in(&self, range: &CellRange) -> Vec<CellRef> {
        if u64::from(range.height()) * u64::from(range.width()) <= MAX_RANGE_CELLS {
            return range.cells().collect();
        }
        self.cells
            .keys()
            .filter(|at| range.contains(**at))
            .copied()
            .collect()
    }

    /// Coordinates of cells holding a value or formula.
    pub fn filled_cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.cells
            .iter()
            .filter(|(_, c)| c.child("v").is_some() || c.child("f").is_some() || c.child("is").is_some())
            .map(|(at, _)| *at)
    }

    /// Row numbers holding at least one value.
    pub fn data_rows(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self.filled_cells().map(|c| c.row).collect();
        rows.dedup();
        rows
    }

    /// Displayed value of a cell: shared strings resolved, booleans as
    /// `TRUE`/`FALSE`, numbers as stored. Empty when there is no value.
    pub fn value(&self, at: CellRef) -> String {
        let Some(c) = self.cell(at) else {
            return String::new();
        };
        let raw = c.child("v").map(XmlNode::text).unwrap_or_default();
        match c.attr("t") {
            Some("s") => raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|i| self.book.shared_string(i))
                .unwrap_or_default()
                .to_string(),
            Some("inlineStr") => c.child("is").map(rich_text).unwrap_or_default(),
            Some("b") => if raw.trim() == "1" { "TRUE" } else { "FALSE" }.to_string(),
            _ => raw.to_string(),
        }
    }

    /// Formula text of a cell without the leading `=`. Shared formulas are
    /// rebuilt from their anchor cell.
    pub fn formula(&self, at: CellRef) -> Option<String> {
        let f = self.cell(at)?.child("f")?;
        let text = f.text().trim();
        if !text.is_empty() {
            return Some(text.trim_start_matches('=').to_string());
        }
        if f.attr("t") != Some("shared") {
            return None;
        }
        let si = f.attr("si")?;
        let (anchor, master) = self.cells.iter().find_map(|(pos, c)| {
            let mf = c.child("f")?;
            (mf.attr("t") == Some("shared") && mf.attr("si") == Some(si) && !mf.text().trim().is_empty())
                .then_some((*pos, mf.text().trim()))
        })?;
        Some(shift_formula(
            master.trim_start_matches('='),
            at.row as i64 - anchor.row as i64,
            at.col as i64 - anchor.col as i64,
        ))
    }

    /// Cell format index, falling back to the row's and then the column's
    /// default style.
    pub fn style_index(&self, at: CellRef) -> usize {
        let parse = |n: &XmlNode| n.attr("s").and_then(|s| s.parse::<usize>().ok());
        if let Some(s) = self.cell(at).and_then(parse) {
            return s;
        }
        if let Some(s) = self
            .rows
            .get(&at.row)
            .filter(|r| matches!(r.attr("customFormat"), Some("1" | "true")))
            .and_then(|r| parse(r))
        {
            return s;
        }
        self.column(at.col).and_then(parse).unwrap_or(0)
    }

    /// Effective formatting of a cell.
    pub fn format(&self, at: CellRef) -> Result<CellFormat<'a>, ScoringError> {
        self.book.format(self.style_index(at))
    }

    /// Font of a cell.
    pub fn font(&self, at: CellRef) -> Result<Font, ScoringError> {
        match self.format(at)?.font {
            Some(f) => self.book.read_font(f),
            None => Ok(Font::default()),
        }
    }

    /// Merged ranges.
    pub fn merged_ranges(&self) -> Vec<CellRange> {
        self.root
            .child("mergeCells")
            .map(|m| {
                m.children_named("mergeCell")
                    .filter_map(|c| c.attr("ref"))
                    .filter_map(CellRange::parse)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `<sheetFormatPr>` element.
    fn format_pr(&self) -> Option<&'a XmlNode> {
        self.root.child("sheetFormatPr")
    }

    /// Height of a row in points.
    pub fn row_height(&self, row: u32) -> f64 {
        self.rows
            .get(&row)
            .and_then(|r| r.attr_f64("ht"))
            .or_else(|| self.format_pr().and_then(|f| f.attr_f64("defaultRowHeight")))
            .unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    /// The `<row>` element of a row.
    pub fn row(&self, row: u32) -> Option<&'a XmlNode> {
        self.rows.get(&row).copied()
    }

    /// The `<col>` element covering a column.
    fn column(&self, col: u32) -> Option<&'a XmlNode> {
        self.root.child("cols")?.children_named("col").find(|c| {
            let min = c.attr_f64("min").unwrap_or(0.0) as u32;
            let max = c.attr_f64("max").unwrap_or(0.0) as u32;
            (min..=max).contains(&col)
        })
    }

    /// Width of a column in characters.
    pub fn column_width(&self, col: u32) -> f64 {
        self.column(col)
            .and_then(|c| c.attr_f64("width"))
            .or_else(|| self.format_pr().and_then(|f| f.attr_f64("defaultColWidth")))
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    /// The sheet's first `<sheetView>`.
    pub fn sheet_view(&self) -> Option<&'a XmlNode> {
        self.root.child("sheetViews")?.child("sheetView")
    }
}
