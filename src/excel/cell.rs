#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt;

/// Largest row number a sheet can hold.
pub const MAX_ROW: u32 = 1_048_576;
/// Largest column number a sheet can hold (`XFD`).
pub const MAX_COL: u32 = 16_384;

/// A 1-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    /// row number
    pub row: u32,
    /// column number
    pub col: u32,
}

/// Column number of a column name (`A` = 1, `AA` = 27).
pub fn column_index(name: &str) -> Option<u32> {
    let name = name.trim().trim_start_matches('$');
    if name.is_empty() || name.len() > 3 {
        return None;
    }
    let mut col = 0u32;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    (col <= MAX_COL).then_some(col)
}

/// Column name of a column number.
pub fn column_name(mut col: u32) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    out.iter().rev().collect()
}

impl CellRef {
    /// Creates a coordinate.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parses `B7`, `$B$7` or `b7`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().replace('$', "");
        let split = text.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = text.split_at(split);
        let col = column_index(letters)?;
        let row: u32 = digits.parse().ok()?;
        (row >= 1 && row <= MAX_ROW).then_some(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.col), self.row)
    }
}

/// A rectangular block of cells, corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// top-left corner
    pub start: CellRef,
    /// bottom-right corner
    pub end:   CellRef,
}

impl CellRange {
    /// Parses `A1:C3`, `A1`, `$A$1:$C$3` or `Sheet1!A1:C3`. Whole columns
    /// (`B:B`) and rows (`2:4`) expand to the sheet bounds.
    pub fn parse(text: &str) -> Option<Self> {
        let text = strip_sheet(text.trim());
        let (a, b) = text.split_once(':').unwrap_or((text, text));
        if let (Some(c1), Some(c2)) = (column_index(a), column_index(b)) {
            return Some(Self::from_corners(CellRef::new(1, c1), CellRef::new(MAX_ROW, c2)));
        }
        if let (Ok(r1), Ok(r2)) = (
            a.trim().replace('$', "").parse::<u32>(),
            b.trim().replace('$', "").parse::<u32>(),
        ) {
            let in_sheet = |r: u32| (1..=MAX_ROW).contains(&r);
            if !(in_sheet(r1) && in_sheet(r2)) {
                return None;
            }
            return Some(Self::from_corners(CellRef::new(r1, 1), CellRef::new(r2, MAX_COL)));
        }
        Some(Self::from_corners(CellRef::parse(a)?, CellRef::parse(b)?))
    }

    /// Normalises two corners given in any order.
    pub fn from_corners(a: CellRef, b: CellRef) -> Self {
        Self {
            start: CellRef::new(a.row.min(b.row), a.col.min(b.col)),
            end:   CellRef::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// A single-cell range.
    pub fn single(cell: CellRef) -> Self {
        Self { start: cell, end: cell }
    }

    /// Whether the range is one cell.
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.end.row.saturating_sub(self.start.row).saturating_add(1)
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.end.col.saturating_sub(self.start.col).saturating_add(1)
    }

    /// Whether `cell` lies inside the range.
    pub fn contains(&self, cell: CellRef) -> bool {
        (self.start.row..=self.end.row).contains(&cell.row)
            && (self.start.col..=self.end.col).contains(&cell.col)
    }

    /// Whether the two ranges share at least one cell.
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |r| (self.start.col..=self.end.col).map(move |c| CellRef::new(r, c)))
    }

    /// The smallest range covering both.
    pub fn union(&self, other: &CellRange) -> CellRange {
        CellRange {
            start: CellRef::new(
                self.start.row.min(other.start.row),
                self.start.col.min(other.start.col),
            ),
            end:   CellRef::new(self.end.row.max(other.end.row), self.end.col.max(other.end.col)),
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Drops a leading `Sheet!` or `'My Sheet'!` qualifier.
pub fn strip_sheet(text: &str) -> &str {
    match text.rfind('!') {
        Some(i) => &text[i + 1..],
        None => text,
    }
}

/// Canonical spelling of a reference for comparison: no sheet, no `$`,
/// upper case, and `A1:A1` collapsed to `A1`. Unparseable text is returned
/// trimmed and upper-cased.
pub fn normalize_ref(text: &str) -> String {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| match CellRange::parse(part) {
            Some(range) => range.to_string(),
            None => strip_sheet(part.trim()).replace('$', "").to_uppercase(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// The ranges of a space-separated `sqref`.
pub fn parse_sqref(text: &str) -> Vec<CellRange> {
    text.split_whitespace().filter_map(CellRange::parse).collect()
}

/// Shifts the relative references of a shared formula by (`rows`, `cols`).
/// References inside string literals and `$`-anchored parts stay put.
pub fn shift_formula(formula: &str, rows: i64, cols: i64) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut i = 0;
    let mut in_string = false;
    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            in_string = !in_string;
            out.push(c);
            i += 1;
            continue;
        }
        let boundary = i == 0 || !(chars[i - 1].is_ascii_alphanumeric() || chars[i - 1] == '_' || chars[i - 1] == '.');
        if in_string || !boundary || !(c == '$' || c.is_ascii_alphabetic()) {
            out.push(c);
            i += 1;
            continue;
        }
        let mut j = i;
        let col_abs = chars[j] == '$';
        if col_abs {
            j += 1;
        }
        let letters_start = j;
        while j < chars.len() && chars[j].is_ascii_alphabetic() && j - letters_start < 3 {
            j += 1;
        }
        let letters: String = chars[letters_start..j].iter().collect();
        let row_abs = j < chars.len() && chars[j] == '$';
        let mut k = if row_abs { j + 1 } else { j };
        let digits_start = k;
        while k < chars.len() && chars[k].is_ascii_digit() {
            k += 1;
        }
        let is_ref = !letters.is_empty()
            && k > digits_start
            && (k == chars.len() || !(chars[k].is_ascii_alphanumeric() || chars[k] == '(' || chars[k] == '_'));
        let parsed = is_ref
            .then(|| {
                let col = column_index(&letters)?;
                let row: u32 = chars[digits_start..k].iter().collect::<String>().parse().ok()?;
                Some((col, row))
            })
            .flatten();
        match parsed {
            Some((col, row)) => {
                let col = if col_abs { col as i64 } else { col as i64 + cols };
                let row = if row_abs { row as i64 } else { row as i64 + rows };
                if col_abs {
                    out.push('$');
                }
                out.push_str(&column_name(col.max(1) as u32));
                if row_abs {
                    out.push('$');
                }
                out.push_str(&row.max(1).to_string());
                i = k;
            }
            None => {
                let end = j.max(i + 1);
                out.extend(&chars[i..end]);
                i = end;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_addresses() {
        assert_eq!(CellRef::parse("$AB$12"), Some(CellRef::new(12, 28)));
        assert_eq!(CellRef::parse("A0"), None);
        assert_eq!(column_name(28), "AB");
        assert_eq!(column_name(16_384), "XFD");
        let r = CellRange::parse("Sheet1!$C$3:A1").expect("range");
        assert_eq!(r.to_string(), "A1:C3");
        assert_eq!(r.cells().count(), 9);
        assert_eq!(CellRange::parse("B:B").map(|r| r.width()), Some(1));
    }

    #[test]
    fn whole_rows_stay_inside_the_sheet() {
        let rows = CellRange::parse("2:4").expect("rows");
        assert_eq!((rows.height(), rows.width()), (3, MAX_COL));
        assert_eq!(CellRange::parse("1:1048576").map(|r| r.height()), Some(MAX_ROW));
        assert_eq!(CellRange::parse("0:4"), None);
        assert_eq!(CellRange::parse("0:4294967295"), None);
        assert_eq!(CellRange::parse("3:1048577"), None);

        let extreme = CellRange {
            start: CellRef::new(0, 0),
            end:   CellRef::new(u32::MAX, u32::MAX),
        };
        assert_eq!(extreme.height(), u32::MAX);
        assert_eq!(extreme.width(), u32::MAX);
    }

    #[test]
    fn normalizes_references() {
        assert_eq!(normalize_ref("'Sales Data'!$a$1:$b$9"), "A1:B9");
        assert_eq!(normalize_ref("C5:C5"), "C5");
    }

    #[test]
    fn shifts_shared_formulas() {
        assert_eq!(shift_formula("SUM(A1:B1)*$C$1", 2, 0), "SUM(A3:B3)*$C$1");
        assert_eq!(shift_formula("A1&\"B2\"", 0, 1), "B1&\"B2\"");
        assert_eq!(shift_formula("LOG10(A$1)", 3, 1), "LOG10(B$1)");
    }
}
