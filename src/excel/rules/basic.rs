#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::{RANGE_KEYS, check_cells, require_range};
use crate::{
    error::ScoringError,
    excel::{
        Workbook, Worksheet,
        cell::{CellRange, CellRef},
    },
    grade::{
        Check, Params,
        compare::{number_equals, text_equals},
    },
};

/// Formula text reduced for comparison: no leading `=`, no whitespace, upper
/// case.
pub(crate) fn normalize_formula(formula: &str) -> String {
    formula
        .trim()
        .trim_start_matches('=')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Whether a cell value equals an expected one. Numbers compare by value
/// (`6` equals `6.00`) with no tolerance; anything else compares as text.
pub(crate) fn value_matches(actual: &str, expected: &str) -> bool {
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(e)) => number_equals(a, e, 0.0),
        _ => text_equals(Some(actual), Some(expected)),
    }
}

/// Pairs of `A1:value` in a `CellValues` list. Both ASCII and full-width
/// colons separate the address from the value.
fn cell_values(list: &str) -> Option<Vec<(CellRef, &str)>> {
    list.split([',', '，', ';', '；'])
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            let (at, value) = item.split_once([':', '：'])?;
            Some((CellRef::parse(at)?, value.trim()))
        })
        .collect()
}

/// Cells hold the expected content: every `CellValues` pair, or every cell
/// of `CellRange` equal to `ExpectedValue`. A multi-cell range without an
/// expected value passes when the range is completely filled.
pub fn fill_or_copy(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    if let Some(list) = params.try_get("CellValues") {
        let pairs = cell_values(list).ok_or_else(|| ScoringError::missing("CellValues"))?;
        let checks = pairs
            .into_iter()
            .map(|(at, expected)| {
                let actual = ws.value(at);
                Check::compare(
                    text_equals(Some(&actual), Some(expected)),
                    format!("cell {at}"),
                    expected,
                    actual,
                )
            })
            .collect();
        return Ok(Check::all("cell contents", checks));
    }

    let range = require_range(&params, RANGE_KEYS)?;
    match params.try_get("ExpectedValue") {
        Some(expected) => check_cells(
            &ws,
            &range,
            "content",
            expected,
            |at| Ok(ws.value(at)),
            |v| value_matches(v, expected),
        ),
        None if !range.is_single() => Ok(check_cells(
            &ws,
            &range,
            "content",
            "filled",
            |at| Ok(ws.value(at)),
            |v| !v.trim().is_empty(),
        )?
        .heuristic()),
        None => Err(ScoringError::missing("ExpectedValue")),
    }
}

/// Every cell of `CellRange` is empty.
pub fn delete_content(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    check_cells(
        &ws,
        &range,
        "content",
        "",
        |at| Ok(ws.value(at)),
        |v| v.trim().is_empty(),
    )
}

/// Cells were inserted or deleted: the content now at `CellRange` is the
/// shifted `ExpectedValue`, or blank when no value is given.
pub fn insert_delete_cells(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let check = match params.try_get("ExpectedValue") {
        Some(expected) => check_cells(
            &ws,
            &range,
            "shifted content",
            expected,
            |at| Ok(ws.value(at)),
            |v| value_matches(v, expected),
        )?,
        None => check_cells(
            &ws,
            &range,
            "shifted content",
            "",
            |at| Ok(ws.value(at)),
            |v| v.trim().is_empty(),
        )?,
    };
    Ok(check.heuristic())
}

/// Row numbers between the first and last data row that hold no value.
fn row_gaps(ws: &Worksheet<'_>) -> Vec<u32> {
    let rows = ws.data_rows();
    rows.iter()
        .tuple_windows()
        .flat_map(|(a, b)| (a + 1)..*b)
        .collect()
}

/// Rows were inserted or deleted: the sheet holds `ExpectedRowCount` data
/// rows, the rows in `RowNumbers` are blank, or the data has a blank row.
pub fn insert_delete_rows(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    if let Some(expected) = params.try_int("ExpectedRowCount") {
        let actual = ws.data_rows().len();
        return Ok(Check::compare(
            actual as i64 == expected,
            "data row count",
            expected.to_string(),
            actual.to_string(),
        )
        .heuristic());
    }
    let gaps = row_gaps(&ws);
    let wanted = params.list("RowNumbers");
    if !wanted.is_empty() {
        let rows: Vec<u32> = wanted
            .iter()
            .map(|r| r.parse::<u32>().map_err(|_| ScoringError::missing("RowNumbers")))
            .collect::<Result<_, _>>()?;
        let data = ws.data_rows();
        let blank = |r: &u32| !data.contains(r);
        return Ok(Check::compare(
            rows.iter().all(blank),
            "blank rows",
            rows.iter().join(","),
            gaps.iter().join(","),
        )
        .heuristic());
    }
    Ok(Check::compare(!gaps.is_empty(), "blank rows inside the data", "present", gaps.iter().join(","))
        .heuristic())
}

/// `CellRange` is one merged block.
pub fn merge_cells(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, RANGE_KEYS)?;
    let merged = ws.merged_ranges();
    Ok(Check::any(
        "merged range",
        range.to_string(),
        merged.iter().map(CellRange::to_string),
        |m| CellRange::parse(m) == Some(range),
    ))
}

/// The cell at `CellRange` carries `ExpectedFormula`, compared without
/// whitespace, case or the leading `=`.
pub fn set_formula(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let at = require_range(&params, RANGE_KEYS)?.start;
    let expected = params.require("ExpectedFormula")?;
    let actual = ws.formula(at).unwrap_or_default();
    Ok(Check::compare(
        normalize_formula(&actual) == normalize_formula(expected),
        format!("formula in {at}"),
        expected,
        actual,
    ))
}

/// The cell at `CellAddress` holds a formula that contains
/// `FormulaContent` and evaluates to `ExpectedValue` (whichever are given).
pub fn use_function(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let at = require_range(&params, RANGE_KEYS)?.start;
    params.require_any(&["FormulaContent", "ExpectedValue"])?;

    let Some(formula) = ws.formula(at) else {
        let expected = params
            .first_of(&["FormulaContent", "ExpectedValue"])
            .unwrap_or_default();
        return Ok(Check::absent(format!("formula in {at}"), expected));
    };
    let mut checks = Vec::new();
    if let Some(content) = params.try_get("FormulaContent") {
        checks.push(Check::compare(
            normalize_formula(&formula).contains(&normalize_formula(content)),
            format!("formula in {at}"),
            content,
            formula.as_str(),
        ));
    }
    if let Some(expected) = params.try_get("ExpectedValue") {
        let actual = ws.value(at);
        checks.push(Check::compare(
            value_matches(&actual, expected),
            format!("value of {at}"),
            expected,
            actual,
        ));
    }
    Ok(Check::all("function", checks))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cell_value_lists() {
        let pairs = cell_values("A1:Name，B2：42").expect("pairs");
        assert_eq!(pairs, vec![(CellRef::new(1, 1), "Name"), (CellRef::new(2, 2), "42")]);
        assert!(cell_values("A1").is_none());
    }

    #[test]
    fn formulas_compare_loosely() {
        assert_eq!(normalize_formula("= sum(A1: A3)"), "SUM(A1:A3)");
        assert!(value_matches("6.00", "6"));
        assert!(value_matches("Total", " total"));
        assert!(!value_matches("3.1", "3"));
        assert!(!value_matches("2.95", "3"));
        assert!(!value_matches("3", "3 units"));
    }
}
