#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Spreadsheet rule handlers and the tag registry.

/// Cell content, merges, formulas and functions.
pub mod basic;
/// Charts.
pub mod chart;
/// Filters, sorting, pivots, subtotals, validation.
pub mod data;
/// Fonts, alignment, borders, fills, number formats, cell styles.
pub mod format;
/// Sheet structure, page setup, views, protection.
pub mod sheet;

use itertools::Itertools;
use phf::phf_map;

use super::{
    Workbook, Worksheet,
    cell::{CellRange, CellRef},
};
use crate::{
    error::ScoringError,
    grade::{Check, Handler, Params, mapping::KeywordRule},
};

/// Handler signature for spreadsheet rules.
pub type ExcelHandler = Handler<Workbook>;

/// Every supported spreadsheet tag.
pub static REGISTRY: phf::Map<&'static str, ExcelHandler> = phf_map! {
    "FillOrCopyCellContent" => basic::fill_or_copy as ExcelHandler,
    "DeleteCellContent" => basic::delete_content as ExcelHandler,
    "InsertDeleteCells" => basic::insert_delete_cells as ExcelHandler,
    "InsertDeleteRows" => basic::insert_delete_rows as ExcelHandler,
    "MergeCells" => basic::merge_cells as ExcelHandler,
    "SetFormula" => basic::set_formula as ExcelHandler,
    "UseFunction" => basic::use_function as ExcelHandler,

    "SetRowHeight" => sheet::set_row_height as ExcelHandler,
    "SetColumnWidth" => sheet::set_column_width as ExcelHandler,
    "ModifySheetName" => sheet::manage_worksheet as ExcelHandler,
    "ManageWorksheet" => sheet::manage_worksheet as ExcelHandler,
    "FreezePanes" => sheet::freeze_panes as ExcelHandler,
    "SetPageSetup" => sheet::set_page_setup as ExcelHandler,
    "SetPrintArea" => sheet::set_print_area as ExcelHandler,
    "SetHeaderFooter" => sheet::set_header_footer as ExcelHandler,
    "SetWorksheetProtection" => sheet::set_protection as ExcelHandler,

    "SetCellFont" => format::set_cell_font as ExcelHandler,
    "SetFont" => format::set_cell_font as ExcelHandler,
    "SetFontStyle" => format::set_font_style as ExcelHandler,
    "SetFontSize" => format::set_font_size as ExcelHandler,
    "SetSize" => format::set_font_size as ExcelHandler,
    "SetFontColor" => format::set_font_color as ExcelHandler,
    "SetColor" => format::set_font_color as ExcelHandler,
    "AddUnderline" => format::add_underline as ExcelHandler,
    "SetHorizontalAlignment" => format::set_horizontal_alignment as ExcelHandler,
    "SetVerticalAlignment" => format::set_vertical_alignment as ExcelHandler,
    "SetCellAlignment" => format::set_cell_alignment as ExcelHandler,
    "SetInnerBorderStyle" => format::set_inner_border_style as ExcelHandler,
    "SetInnerBorderColor" => format::set_inner_border_color as ExcelHandler,
    "SetOuterBorderStyle" => format::set_outer_border_style as ExcelHandler,
    "SetOuterBorderColor" => format::set_outer_border_color as ExcelHandler,
    "SetCellBorder" => format::set_cell_border as ExcelHandler,
    "SetCellFillColor" => format::set_fill_color as ExcelHandler,
    "SetCellBackgroundColor" => format::set_fill_color as ExcelHandler,
    "SetPatternFillStyle" => format::set_pattern_style as ExcelHandler,
    "SetPatternFillColor" => format::set_pattern_color as ExcelHandler,
    "SetNumberFormat" => format::set_number_format as ExcelHandler,
    "SetCellStyleData" => format::set_cell_style as ExcelHandler,
    "SetConditionalFormatting" => format::set_conditional_format as ExcelHandler,
    "ConditionalFormat" => format::set_conditional_format as ExcelHandler,

    "SetAutoFilter" => data::set_auto_filter as ExcelHandler,
    "Filter" => data::set_auto_filter as ExcelHandler,
    "SortData" => data::sort_data as ExcelHandler,
    "Sort" => data::sort_data as ExcelHandler,
    "CreatePivotTable" => data::create_pivot_table as ExcelHandler,
    "PivotTable" => data::create_pivot_table as ExcelHandler,
    "Subtotal" => data::subtotal as ExcelHandler,
    "AdvancedFilterCondition" => data::advanced_filter_condition as ExcelHandler,
    "AdvancedFilterData" => data::advanced_filter_data as ExcelHandler,
    "SetDataValidation" => data::set_data_validation as ExcelHandler,

    "CreateChart" => chart::create_chart as ExcelHandler,
    "ChartType" => chart::chart_type as ExcelHandler,
    "ChartStyle" => chart::chart_style as ExcelHandler,
    "ChartTitle" => chart::chart_title as ExcelHandler,
    "LegendPosition" => chart::legend_position as ExcelHandler,
    "ChartMove" => chart::chart_move as ExcelHandler,
    "CategoryAxisDataRange" => chart::category_range as ExcelHandler,
    "ValueAxisDataRange" => chart::value_range as ExcelHandler,
    "ChartTitleFormat" => chart::title_format as ExcelHandler,
    "HorizontalAxisTitle" => chart::horizontal_axis_title as ExcelHandler,
    "HorizontalAxisTitleFormat" => chart::horizontal_axis_title_format as ExcelHandler,
    "LegendFormat" => chart::legend_format as ExcelHandler,
    "VerticalAxisOptions" => chart::vertical_axis_options as ExcelHandler,
    "MajorHorizontalGridlines" => chart::major_horizontal_gridlines as ExcelHandler,
    "MinorHorizontalGridlines" => chart::minor_horizontal_gridlines as ExcelHandler,
    "MajorVerticalGridlines" => chart::major_vertical_gridlines as ExcelHandler,
    "MinorVerticalGridlines" => chart::minor_vertical_gridlines as ExcelHandler,
    "DataSeriesFormat" => chart::series_format as ExcelHandler,
    "AddDataLabels" => chart::add_data_labels as ExcelHandler,
    "DataLabelsFormat" => chart::data_labels_format as ExcelHandler,
    "ChartAreaFormat" => chart::chart_area_format as ExcelHandler,
    "ChartFloorColor" => chart::floor_color as ExcelHandler,
    "ChartBorder" => chart::chart_border as ExcelHandler,
};

/// Name keywords for spreadsheet points, first match wins.
pub const EXCEL_KEYWORDS: &[KeywordRule] = &[
    (&["FillOrCopy"], "FillOrCopyCellContent"),
    (&["DeleteCell"], "DeleteCellContent"),
    (&["InsertDelete", "Cells"], "InsertDeleteCells"),
    (&["MergeCells"], "MergeCells"),
    (&["InsertDelete", "Rows"], "InsertDeleteRows"),
    (&["CellFont"], "SetCellFont"),
    (&["FontStyle"], "SetFontStyle"),
    (&["FontSize"], "SetFontSize"),
    (&["FontColor"], "SetFontColor"),
    (&["CellAlignment"], "SetCellAlignment"),
    (&["CellBorder"], "SetCellBorder"),
    (&["CellBackground"], "SetCellBackgroundColor"),
    (&["NumberFormat"], "SetNumberFormat"),
    (&["Formula"], "SetFormula"),
    (&["Function"], "UseFunction"),
    (&["Chart"], "CreateChart"),
    (&["Filter"], "SetAutoFilter"),
    (&["Sort"], "SortData"),
    (&["PivotTable"], "CreatePivotTable"),
    (&["ConditionalFormat"], "SetConditionalFormatting"),
    (&["DataValidation"], "SetDataValidation"),
    (&["Freeze"], "FreezePanes"),
    (&["PageSetup"], "SetPageSetup"),
    (&["PrintArea"], "SetPrintArea"),
    (&["HeaderFooter"], "SetHeaderFooter"),
    (&["Worksheet"], "ManageWorksheet"),
    (&["Protection"], "SetWorksheetProtection"),
];

/// Handler registered for `tag`.
pub fn handler(tag: &str) -> Option<ExcelHandler> {
    REGISTRY.get(tag).copied()
}

/// A required range parameter under any of `keys`. Text that is not a
/// reference counts as an invalid parameter.
pub(crate) fn require_range(params: &Params<'_>, keys: &[&str]) -> Result<CellRange, ScoringError> {
    let raw = params.require_any(keys)?;
    CellRange::parse(raw).ok_or_else(|| ScoringError::missing(keys.join(" or ")))
}

/// An optional range parameter under any of `keys`.
pub(crate) fn optional_range(
    params: &Params<'_>,
    keys: &[&str],
) -> Result<Option<CellRange>, ScoringError> {
    match params.first_of(keys) {
        Some(raw) => CellRange::parse(raw)
            .map(Some)
            .ok_or_else(|| ScoringError::missing(keys.join(" or "))),
        None => Ok(None),
    }
}

/// The range rules read their target cells from.
pub(crate) const RANGE_KEYS: &[&str] = &["CellRange", "CellAddress", "TargetRange", "Range"];

/// Checks a per-cell property over every cell of `range`; passes when all
/// of them match.
pub(crate) fn check_cells(
    ws: &Worksheet<'_>,
    range: &CellRange,
    what: &str,
    expected: &str,
    value: impl Fn(CellRef) -> Result<String, ScoringError>,
    matches: impl Fn(&str) -> bool,
) -> Result<Check, ScoringError> {
    let subject = format!("{what} of {range}");
    let cells = ws.cells_in(range);
    if cells.is_empty() {
        return Ok(Check::absent(subject, expected));
    }
    let mut values = Vec::with_capacity(cells.len());
    for at in cells {
        values.push(value(at)?);
    }
    let passed = values.iter().all(|v| matches(v));
    let shown = values.into_iter().unique().take(8).join(" | ");
    Ok(Check::compare(passed, subject, expected, shown))
}
