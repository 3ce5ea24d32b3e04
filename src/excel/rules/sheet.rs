#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::require_range;
use crate::{
    error::ScoringError,
    excel::{
        SheetKind, Workbook,
        cell::{CellRef, column_index, normalize_ref},
    },
    grade::{
        Check, Params,
        compare::{COARSE_EPSILON, number_equals, squash_whitespace, text_contains, text_equals},
        params::parse_number,
        vocab::{self, ORIENTATION, Vocab},
    },
    ooxml::fmt_num,
};

/// Paper sizes (`pageSetup/@paperSize`).
const PAPER_SIZES: Vocab = &[
    ("1", &["Letter", "信纸"]),
    ("5", &["Legal"]),
    ("8", &["A3"]),
    ("9", &["A4"]),
    ("11", &["A5"]),
    ("12", &["B4"]),
    ("13", &["B5"]),
];

/// Centimetres per inch; sheet margins are stored in inches.
const CM_PER_INCH: f64 = 2.54;

/// Every row in `RowNumbers` is `RowHeight` points tall.
pub fn set_row_height(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let key = if params.try_get("RowNumbers").is_some() { "RowNumbers" } else { "RowNumber" };
    let rows: Vec<u32> = params
        .list(key)
        .into_iter()
        .map(|r| r.parse::<u32>().map_err(|_| ScoringError::missing("RowNumbers")))
        .collect::<Result<_, _>>()?;
    if rows.is_empty() {
        return Err(ScoringError::missing("RowNumbers"));
    }
    let expected = params.require_number("RowHeight")?;
    let heights: Vec<f64> = rows.iter().map(|r| ws.row_height(*r)).collect();
    let passed = heights
        .iter()
        .all(|h| number_equals(*h, expected, book.tolerance()));
    Ok(Check::compare(
        passed,
        format!("height of rows {}", rows.iter().join(",")),
        fmt_num(expected),
        heights.into_iter().map(fmt_num).unique().join(" | "),
    ))
}

/// Every column in `ColumnLetters` is `ColumnWidth` characters wide.
pub fn set_column_width(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let key = if params.try_get("ColumnLetters").is_some() { "ColumnLetters" } else { "ColumnLetter" };
    let cols: Vec<(String, u32)> = params
        .list(key)
        .into_iter()
        .map(|c| {
            column_index(c)
                .map(|i| (c.to_uppercase(), i))
                .ok_or_else(|| ScoringError::missing("ColumnLetters"))
        })
        .collect::<Result<_, _>>()?;
    if cols.is_empty() {
        return Err(ScoringError::missing("ColumnLetters"));
    }
    let expected = params.require_number("ColumnWidth")?;
    let widths: Vec<f64> = cols.iter().map(|(_, c)| ws.column_width(*c)).collect();
    // Stored widths include cell padding, about 0.7 characters.
    let passed = widths
        .iter()
        .all(|w| number_equals(*w, expected, COARSE_EPSILON));
    Ok(Check::compare(
        passed,
        format!("width of columns {}", cols.iter().map(|(name, _)| name).join(",")),
        fmt_num(expected),
        widths.into_iter().map(fmt_num).unique().join(" | "),
    ))
}

/// Sheet list changes: `NewSheetName` exists, `OriginalSheetName` is gone,
/// the workbook has `ExpectedSheetCount` sheets.
pub fn manage_worksheet(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    params.require_any(&["NewSheetName", "OriginalSheetName", "ExpectedSheetCount"])?;
    let names = book.sheets().iter().map(|s| s.name.as_str()).join(", ");
    let mut checks = Vec::new();
    if let Some(name) = params.try_get("NewSheetName") {
        checks.push(Check::compare(book.sheet_named(name).is_some(), "sheet", name, names.as_str()));
    }
    if let Some(name) = params.try_get("OriginalSheetName") {
        let renamed = params
            .try_get("NewSheetName")
            .is_some_and(|new| text_equals(Some(new), Some(name)));
        if !renamed {
            checks.push(Check::compare(
                book.sheet_named(name).is_none(),
                "old sheet name",
                format!("no sheet named {name}"),
                names.as_str(),
            ));
        }
    }
    if let Some(count) = params.try_int("ExpectedSheetCount") {
        let actual = book.sheets().len();
        checks.push(Check::compare(
            actual as i64 == count,
            "sheet count",
            count.to_string(),
            actual.to_string(),
        ));
    }
    Ok(Check::all("worksheets", checks))
}

/// Panes are frozen, at `FreezeCell` or after `FreezeRows` rows and
/// `FreezeColumns` columns when given.
pub fn freeze_panes(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let cell = params
        .first_of(&["FreezeCell", "TopLeftCell", "FreezePosition"])
        .map(|c| CellRef::parse(c).ok_or_else(|| ScoringError::missing("FreezeCell")))
        .transpose()?;
    let rows = params.try_int("FreezeRows");
    let cols = params.try_int("FreezeColumns");
    let expected = match (cell, rows, cols) {
        (Some(c), _, _) => format!("frozen at {c}"),
        (None, None, None) => "frozen".to_string(),
        (None, r, c) => format!("frozen {} rows {} columns", r.unwrap_or(0), c.unwrap_or(0)),
    };

    let pane = ws
        .sheet_view()
        .and_then(|v| v.child("pane"))
        .filter(|p| matches!(p.attr("state"), Some("frozen" | "frozenSplit")));
    let Some(pane) = pane else {
        return Ok(Check::absent("frozen panes", expected));
    };
    let x = pane.attr_f64("xSplit").unwrap_or(0.0) as i64;
    let y = pane.attr_f64("ySplit").unwrap_or(0.0) as i64;
    let top_left = pane
        .attr("topLeftCell")
        .and_then(CellRef::parse)
        .unwrap_or(CellRef::new(y as u32 + 1, x as u32 + 1));
    let split = CellRef::new(y as u32 + 1, x as u32 + 1);
    let passed = cell.is_none_or(|c| c == split || c == top_left)
        && rows.is_none_or(|r| r == y)
        && cols.is_none_or(|c| c == x);
    Ok(Check::compare(
        passed,
        "frozen panes",
        expected,
        format!("frozen at {split} ({y} rows {x} columns)"),
    ))
}

/// Page setup: `Orientation`, `PaperSize`, `Scale` and margins in
/// centimetres, whichever are given.
pub fn set_page_setup(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    const MARGINS: [(&str, &str); 6] = [
        ("TopMargin", "top"),
        ("BottomMargin", "bottom"),
        ("LeftMargin", "left"),
        ("RightMargin", "right"),
        ("HeaderMargin", "header"),
        ("FooterMargin", "footer"),
    ];
    let ws = book.target_sheet(&params)?;
    let mut keys = vec!["Orientation", "PaperSize", "Scale"];
    keys.extend(MARGINS.iter().map(|(k, _)| *k));
    params.require_any(&keys)?;

    let setup = ws.root().child("pageSetup");
    let attr = |name: &str| setup.and_then(|s| s.attr(name));
    let mut checks = Vec::new();
    if let Some(want) = params.try_get("Orientation") {
        let actual = attr("orientation").unwrap_or("portrait");
        checks.push(Check::compare(
            vocab::same(ORIENTATION, actual, want),
            "orientation",
            want,
            actual,
        ));
    }
    if let Some(want) = params.try_get("PaperSize") {
        let actual = attr("paperSize").unwrap_or("1");
        checks.push(Check::compare(vocab::same(PAPER_SIZES, actual, want), "paper size", want, actual));
    }
    if let Some(want) = params.try_get("Scale") {
        let actual = attr("scale").unwrap_or("100");
        let passed = match (parse_number(want), actual.parse::<f64>()) {
            (Some(w), Ok(a)) => number_equals(a, w, 0.5),
            _ => false,
        };
        checks.push(Check::compare(passed, "scale", want, actual));
    }
    let margins = ws.root().child("pageMargins");
    for (key, attr_name) in MARGINS {
        let Some(raw) = params.try_get(key) else {
            continue;
        };
        let want = parse_number(raw).ok_or_else(|| ScoringError::missing(key))?;
        let actual = margins
            .and_then(|m| m.attr_f64(attr_name))
            .map(|inches| inches * CM_PER_INCH);
        checks.push(match actual {
            Some(cm) => Check::compare(
                number_equals(cm, want, book.tolerance()),
                format!("{attr_name} margin (cm)"),
                raw,
                fmt_num(cm),
            ),
            None => Check::absent(format!("{attr_name} margin"), raw),
        });
    }
    Ok(Check::all("page setup", checks))
}

/// The sheet's print area is `PrintArea`.
pub fn set_print_area(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let want = require_range(&params, &["PrintArea", "CellRange", "PrintRange"])?;
    let index = ws.entry().index;
    let area = book.defined_names()?.into_iter().find(|n| {
        n.name.eq_ignore_ascii_case("_xlnm.Print_Area") && n.local_to.is_none_or(|i| i == index)
    });
    Ok(match area {
        Some(n) => {
            let actual = normalize_ref(&n.formula);
            Check::compare(actual == want.to_string(), "print area", want.to_string(), actual)
        }
        None => Check::absent("print area", want.to_string()),
    })
}

/// Header or footer text without its `&` formatting codes.
fn strip_codes(text: &str) -> String {
    let mut out = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('&') => out.push('&'),
            Some('"') => {
                for f in chars.by_ref() {
                    if f == '"' {
                        break;
                    }
                }
            }
            Some('K') => {
                for _ in 0..6 {
                    chars.next();
                }
            }
            Some(d) if d.is_ascii_digit() => {
                while chars.peek().is_some_and(char::is_ascii_digit) {
                    chars.next();
                }
            }
            Some('L' | 'C' | 'R') => out.push(' '),
            _ => {}
        }
    }
    squash_whitespace(&out)
}

/// Header text contains `HeaderText`, footer text contains `FooterText`.
pub fn set_header_footer(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let header = params.try_get("HeaderText");
    let footer = params.try_get("FooterText");
    if header.is_none() && footer.is_none() {
        return Err(ScoringError::missing("HeaderText or FooterText"));
    }
    let hf = ws.root().child("headerFooter");
    let texts = |names: &[&str]| -> Vec<String> {
        names
            .iter()
            .filter_map(|n| hf.and_then(|h| h.child(n)))
            .map(|n| strip_codes(n.text()))
            .filter(|t| !t.is_empty())
            .collect()
    };
    let mut checks = Vec::new();
    if let Some(want) = header {
        let want_text = squash_whitespace(want);
        checks.push(Check::any(
            "header",
            want,
            texts(&["oddHeader", "evenHeader", "firstHeader"]),
            |t| text_contains(Some(t), Some(&want_text)),
        ));
    }
    if let Some(want) = footer {
        let want_text = squash_whitespace(want);
        checks.push(Check::any(
            "footer",
            want,
            texts(&["oddFooter", "evenFooter", "firstFooter"]),
            |t| text_contains(Some(t), Some(&want_text)),
        ));
    }
    Ok(Check::all("header and footer", checks))
}

/// The worksheet is protected, with a password when `HasPassword` is true.
pub fn set_protection(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    if ws.entry().kind != SheetKind::Worksheet {
        return Ok(Check::absent("sheet protection", "protected"));
    }
    let protection = ws
        .root()
        .child("sheetProtection")
        .filter(|p| matches!(p.attr("sheet"), Some("1" | "true")));
    let Some(protection) = protection else {
        return Ok(Check::absent("sheet protection", "protected"));
    };
    let has_password = protection.attr("password").is_some() || protection.attr("hashValue").is_some();
    match params.try_bool("HasPassword") {
        Some(want) => Ok(Check::compare(
            has_password == want,
            "sheet protection",
            if want { "protected with password" } else { "protected without password" },
            if has_password { "protected with password" } else { "protected without password" },
        )),
        None => Ok(Check::presence(true, "sheet protection")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_header_codes() {
        assert_eq!(strip_codes("&L&\"宋体,加粗\"&12Quarterly&CPage &P&R&KFF0000Draft"), "Quarterly Page Draft");
        assert_eq!(strip_codes("A && B"), "A & B");
    }
}
