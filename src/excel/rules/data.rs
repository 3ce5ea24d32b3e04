#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use super::{RANGE_KEYS, optional_range, require_range};
use crate::{
    error::ScoringError,
    excel::{
        Workbook, Worksheet,
        cell::{CellRange, CellRef, column_index, column_name, normalize_ref, parse_sqref, strip_sheet},
    },
    grade::{
        Check, Params,
        compare::{text_contains, text_equals},
        vocab::{self, Vocab},
    },
    ooxml::XmlNode,
};

/// Sort directions.
const SORT_ORDERS: Vocab = &[
    ("ascending", &["升序", "asc", "递增"]),
    ("descending", &["降序", "desc", "递减"]),
];

/// Aggregations of pivot data fields (`dataField/@subtotal`).
const PIVOT_FUNCTIONS: Vocab = &[
    ("sum", &["求和", "总和"]),
    ("average", &["平均值", "avg", "mean"]),
    ("count", &["计数"]),
    ("countNums", &["数值计数"]),
    ("max", &["最大值"]),
    ("min", &["最小值"]),
    ("product", &["乘积"]),
    ("stdDev", &["标准偏差"]),
    ("var", &["方差"]),
];

/// Summary functions of the subtotal dialog with their `SUBTOTAL` codes.
const SUBTOTAL_CODES: &[(&str, &[&str], u32)] = &[
    ("sum", &["求和"], 9),
    ("count", &["计数"], 3),
    ("average", &["平均值"], 1),
    ("max", &["最大值"], 4),
    ("min", &["最小值"], 5),
    ("product", &["乘积"], 6),
];

/// Data validation kinds (`dataValidation/@type`).
const VALIDATION_TYPES: Vocab = &[
    ("none", &["任何值", "any"]),
    ("whole", &["整数"]),
    ("decimal", &["小数"]),
    ("list", &["序列", "列表"]),
    ("date", &["日期"]),
    ("time", &["时间"]),
    ("textLength", &["文本长度"]),
    ("custom", &["自定义"]),
];

/// A column given as a letter (`B`) or a 1-based number (`2`).
fn parse_column(text: &str) -> Option<u32> {
    let text = text.trim();
    column_index(text).or_else(|| text.parse::<u32>().ok().filter(|c| *c >= 1))
}

/// Parses `B:x,C:y` into (column, value) pairs.
fn column_conditions(list: &str) -> Option<Vec<(u32, &str)>> {
    list.split([',', '，', ';', '；'])
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            let (col, value) = item.split_once([':', '：'])?;
            Some((parse_column(col)?, value.trim()))
        })
        .collect()
}

/// Values a filter column keeps: listed values and custom criteria.
fn filter_values(column: &XmlNode) -> Vec<String> {
    let listed = column
        .child("filters")
        .map(|f| {
            f.children_named("filter")
                .filter_map(|v| v.attr("val"))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let custom = column
        .find_all("customFilter")
        .filter_map(|c| c.attr("val"))
        .map(str::to_string);
    listed.into_iter().chain(custom).collect()
}

/// An auto filter exists, over `DataRange` when given, filtering each
/// column of `FilterConditions` for its value.
pub fn set_auto_filter(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let expected_range = params.first_of(&["DataRange", "FilterRange", "CellRange"]);
    let conditions = match params.try_get("FilterConditions") {
        Some(list) => column_conditions(list).ok_or_else(|| ScoringError::missing("FilterConditions"))?,
        None => Vec::new(),
    };
    let Some(filter) = ws.root().child("autoFilter") else {
        return Ok(Check::absent("auto filter", expected_range.unwrap_or("present")));
    };
    let actual_ref = filter.attr("ref").unwrap_or_default();

    let mut checks = vec![match expected_range {
        Some(want) => Check::compare(
            normalize_ref(actual_ref) == normalize_ref(want),
            "filter range",
            want,
            actual_ref,
        ),
        None => Check::presence(true, "auto filter"),
    }];
    let first_col = CellRange::parse(actual_ref).map_or(1, |r| r.start.col);
    for (col, value) in conditions {
        let offset = col.saturating_sub(first_col);
        let kept = filter
            .children_named("filterColumn")
            .find(|c| c.attr("colId").and_then(|i| i.parse::<u32>().ok()) == Some(offset))
            .map(filter_values)
            .unwrap_or_default();
        checks.push(Check::any(
            format!("filter on column {}", column_name(col)),
            value,
            kept,
            |v| text_equals(Some(v), Some(value)) || text_contains(Some(v), Some(value)),
        ));
    }
    Ok(Check::all("auto filter", checks))
}

/// Numeric or text sort key of a cell value.
fn sort_key(value: &str) -> (Option<f64>, String) {
    (value.trim().parse::<f64>().ok(), value.trim().to_lowercase())
}

/// Whether `values` are ordered in `descending` or ascending order. Numbers
/// compare numerically when every value is a number.
fn is_sorted(values: &[String], descending: bool) -> bool {
    let keys: Vec<_> = values.iter().map(|v| sort_key(v)).collect();
    let numeric = keys.iter().all(|(n, _)| n.is_some());
    keys.iter().tuple_windows().all(|(a, b)| {
        let ord = if numeric {
            a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)
        } else {
            a.1.cmp(&b.1)
        };
        if descending { ord.is_ge() } else { ord.is_le() }
    })
}

/// Values of column `col` in the sort target: `DataRange` rows when given,
/// else every data row, skipping the header row when there is one.
fn column_values(ws: &Worksheet<'_>, range: Option<CellRange>, col: u32, header: bool) -> Vec<String> {
    ws.data_rows()
        .into_iter()
        .filter(|row| range.is_none_or(|r| (r.start.row..=r.end.row).contains(row)))
        .skip(usize::from(header))
        .map(|row| ws.value(CellRef::new(row, col)))
        .filter(|v| !v.trim().is_empty())
        .collect()
}

/// Data is sorted on `SortColumn` in `SortOrder`: a recorded sort state
/// for that column, or values that are already in order.
pub fn sort_data(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let raw_col = params.require_any(&["SortColumn", "SortField"])?;
    let col = parse_column(raw_col).ok_or_else(|| ScoringError::missing("SortColumn"))?;
    let order = params.try_get("SortOrder").unwrap_or("ascending");
    let descending = match vocab::canonical(SORT_ORDERS, order) {
        Some(key) => key == "descending",
        None => return Err(ScoringError::missing("SortOrder")),
    };
    let header = params.try_bool("HasHeader").unwrap_or(true);
    let range = optional_range(&params, &["DataRange", "CellRange"])?;
    let expected = format!("{} {}", column_name(col), if descending { "descending" } else { "ascending" });

    let recorded = ws.root().find_all("sortCondition").any(|c| {
        let on_col = c
            .attr("ref")
            .and_then(CellRange::parse)
            .is_some_and(|r| r.start.col == col);
        let desc = matches!(c.attr("descending"), Some("1" | "true"));
        on_col && desc == descending
    });
    let values = column_values(&ws, range, col, header);
    let ordered = values.len() > 1 && is_sorted(&values, descending);
    let actual = if recorded {
        "sort state recorded".to_string()
    } else {
        values.iter().take(8).join(", ")
    };
    Ok(Check::compare(recorded || ordered, "sorted column", expected, actual).heuristic())
}

/// Names of a pivot cache's fields.
fn cache_fields(cache: Option<&XmlNode>) -> Vec<String> {
    cache
        .and_then(|c| c.child("cacheFields"))
        .map(|f| {
            f.children_named("cacheField")
                .map(|c| c.attr("name").unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Field names listed under `list/item` by index into `fields`.
fn axis_fields(table: &XmlNode, list: &str, item: &str, fields: &[String]) -> Vec<String> {
    table
        .child(list)
        .map(|l| {
            l.children_named(item)
                .filter_map(|f| f.attr("x").or_else(|| f.attr("fld")))
                .filter_map(|i| i.parse::<usize>().ok())
                .filter_map(|i| fields.get(i).cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Whether every expected name appears in `actual`.
fn has_fields(actual: &[String], expected: &[&str]) -> bool {
    expected
        .iter()
        .all(|e| actual.iter().any(|a| text_equals(Some(a), Some(e))))
}

/// A pivot table exists with the given row, column and data fields, data
/// aggregation and insertion cell.
pub fn create_pivot_table(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let rows = params.list("PivotRowFields");
    let cols = params.list("PivotColumnFields");
    let data = params.first_of(&["PivotDataField", "PivotDataFields"]);
    let function = params.try_get("PivotFunction");
    let insert = params
        .try_get("PivotInsertCell")
        .map(|c| CellRef::parse(strip_sheet(c)).ok_or_else(|| ScoringError::missing("PivotInsertCell")))
        .transpose()?;
    let expected = [
        (!rows.is_empty()).then(|| format!("rows {}", rows.join(","))),
        (!cols.is_empty()).then(|| format!("columns {}", cols.join(","))),
        data.map(|d| format!("data {d}")),
        function.map(|f| format!("by {f}")),
        insert.map(|c| format!("at {c}")),
    ]
    .into_iter()
    .flatten()
    .join(", ");
    let expected = if expected.is_empty() { "present".to_string() } else { expected };

    let mut observed = Vec::new();
    for entry in book.worksheets() {
        for (table, cache) in book.pivot_tables(entry)? {
            let fields = cache_fields(cache);
            let row_fields = axis_fields(table, "rowFields", "field", &fields);
            let col_fields = axis_fields(table, "colFields", "field", &fields);
            let data_fields: Vec<(String, String, String)> = table
                .child("dataFields")
                .map(|d| {
                    d.children_named("dataField")
                        .map(|f| {
                            let source = f
                                .attr("fld")
                                .and_then(|i| i.parse::<usize>().ok())
                                .and_then(|i| fields.get(i).cloned())
                                .unwrap_or_default();
                            let name = f.attr("name").unwrap_or_default().to_string();
                            let agg = f.attr("subtotal").unwrap_or("sum").to_string();
                            (source, name, agg)
                        })
                        .collect()
                })
                .unwrap_or_default();
            let at = table
                .child("location")
                .and_then(|l| l.attr("ref"))
                .and_then(CellRange::parse)
                .map(|r| r.start);

            let ok = has_fields(&row_fields, &rows)
                && has_fields(&col_fields, &cols)
                && data.is_none_or(|d| {
                    data_fields.iter().any(|(source, name, agg)| {
                        (text_equals(Some(source), Some(d)) || text_contains(Some(name), Some(d)))
                            && function.is_none_or(|f| vocab::same(PIVOT_FUNCTIONS, agg, f))
                    })
                })
                && (data.is_some() || function.is_none_or(|f| {
                    data_fields.iter().any(|(_, _, agg)| vocab::same(PIVOT_FUNCTIONS, agg, f))
                }))
                && insert.is_none_or(|c| at == Some(c));
            let shown = format!(
                "{}: rows {} columns {} data {}{}",
                entry.name,
                row_fields.join(","),
                col_fields.join(","),
                data_fields
                    .iter()
                    .map(|(source, _, agg)| format!("{agg}({source})"))
                    .join(","),
                at.map(|c| format!(" at {c}")).unwrap_or_default(),
            );
            observed.push((shown, ok));
        }
    }
    Ok(Check::any_judged("pivot table", expected, observed))
}

/// `SUBTOTAL` codes in a formula (function numbers below 100 and their
/// hidden-row variants above 100).
fn subtotal_codes(formula: &str) -> Vec<u32> {
    let upper = formula.to_uppercase();
    upper
        .match_indices("SUBTOTAL(")
        .filter_map(|(i, m)| {
            let rest = &upper[i + m.len()..];
            let code: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            code.parse::<u32>().ok().map(|c| if c > 100 { c - 100 } else { c })
        })
        .collect()
}

/// Subtotals were inserted: `SUBTOTAL` formulas with the function of
/// `SummaryFunction` in `SummaryColumn`, grouped by `GroupByColumn`.
pub fn subtotal(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let function = params.try_get("SummaryFunction");
    let code = match function {
        Some(f) => {
            let needle = f.trim().to_lowercase();
            let found = SUBTOTAL_CODES.iter().find(|(key, labels, _)| {
                *key == needle || labels.iter().any(|l| l.to_lowercase() == needle)
            });
            Some(found.map(|(_, _, c)| *c).ok_or_else(|| ScoringError::missing("SummaryFunction"))?)
        }
        None => None,
    };
    let summary_col = params
        .try_get("SummaryColumn")
        .map(|c| parse_column(c).ok_or_else(|| ScoringError::missing("SummaryColumn")))
        .transpose()?;
    let group_col = params
        .try_get("GroupByColumn")
        .map(|c| parse_column(c).ok_or_else(|| ScoringError::missing("GroupByColumn")))
        .transpose()?;

    let mut found = Vec::new();
    for at in ws.filled_cells() {
        if summary_col.is_some_and(|c| c != at.col) {
            continue;
        }
        if let Some(formula) = ws.formula(at) {
            let codes = subtotal_codes(&formula);
            if !codes.is_empty() {
                found.push((at, formula, codes));
            }
        }
    }
    let expected = [function, params.try_get("SummaryColumn")].into_iter().flatten().join(" in ");
    let expected = if expected.is_empty() { "SUBTOTAL".to_string() } else { expected };
    let observed = found.iter().map(|(at, formula, codes)| {
        (format!("{at}: {formula}"), code.is_none_or(|c| codes.contains(&c)))
    });
    let mut checks = vec![Check::any_judged("subtotal formulas", expected, observed)];
    if let Some(col) = group_col {
        let grouped = ws.filled_cells().any(|at| {
            at.col == col && {
                let v = ws.value(at).to_lowercase();
                v.contains("汇总") || v.contains("total") || v.contains("计数") || v.contains("平均")
            }
        }) || ws.root().find_all("row").any(|r| r.attr("outlineLevel").is_some());
        checks.push(Check::presence(grouped, "subtotal grouping").heuristic());
    }
    Ok(Check::all("subtotal", checks))
}

/// The criteria block at `ConditionRange` has `FilterField` as a header
/// with `FilterValue` below it.
pub fn advanced_filter_condition(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = require_range(&params, &["ConditionRange", "CriteriaRange"])?;
    let field = params.require("FilterField")?;
    let value = params.try_get("FilterValue");
    let expected = match value {
        Some(v) => format!("{field} {v}"),
        None => field.to_string(),
    };
    let mut observed = Vec::new();
    for col in range.start.col..=range.end.col {
        let header = ws.value(CellRef::new(range.start.row, col));
        if header.trim().is_empty() {
            continue;
        }
        let below: Vec<String> = (range.start.row + 1..=range.end.row)
            .map(|row| ws.value(CellRef::new(row, col)))
            .filter(|v| !v.trim().is_empty())
            .collect();
        let ok = text_equals(Some(&header), Some(field))
            && value.is_none_or(|want| below.iter().any(|b| text_equals(Some(b), Some(want))));
        observed.push((format!("{header} {}", below.join(",")).trim().to_string(), ok));
    }
    Ok(Check::any_judged(format!("criteria in {range}"), expected, observed))
}

/// The defined name `name` (with or without the `_xlnm.` prefix).
fn defined_name(book: &Workbook, name: &str) -> Result<Option<String>, ScoringError> {
    Ok(book
        .defined_names()?
        .into_iter()
        .find(|n| n.name.trim_start_matches("_xlnm.").eq_ignore_ascii_case(name))
        .map(|n| n.formula))
}

/// An advanced filter ran over `DataRange` with `CriteriaRange`, copying
/// results to `CopyToRange` when given.
pub fn advanced_filter_data(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let data = params.require("DataRange")?;
    let criteria = params.require_any(&["CriteriaRange", "ConditionRange"])?;
    let copy_to = params.try_get("CopyToRange");

    let compare = |what: &str, name: &str, want: &str, starts_only: bool| -> Result<Check, ScoringError> {
        Ok(match defined_name(book, name)? {
            Some(formula) => {
                let same = if starts_only {
                    CellRange::parse(&formula).map(|r| r.start) == CellRange::parse(want).map(|r| r.start)
                } else {
                    normalize_ref(&formula) == normalize_ref(want)
                };
                Check::compare(same, what, want, normalize_ref(&formula))
            }
            None => Check::absent(what, want),
        })
    };
    let mut checks = vec![
        compare("filter data range", "_FilterDatabase", data, false)?,
        compare("criteria range", "Criteria", criteria, false)?,
    ];
    if let Some(target) = copy_to {
        checks.push(compare("copy destination", "Extract", target, true)?);
    }
    Ok(Check::all("advanced filter", checks))
}

/// A data validation exists, on `CellRange` when given, of
/// `ValidationType` with source `ValidationValue` when given.
pub fn set_data_validation(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let ws = book.target_sheet(&params)?;
    let range = optional_range(&params, RANGE_KEYS)?;
    let kind = params.try_get("ValidationType");
    let source = params.first_of(&["ValidationValue", "ValidationSource", "Formula"]);
    let expected = [range.map(|r| r.to_string()), kind.map(str::to_string), source.map(str::to_string)]
        .into_iter()
        .flatten()
        .join(" ");
    let expected = if expected.is_empty() { "present".to_string() } else { expected };

    let observed = ws.root().find_all("dataValidation").map(|dv| {
        let sqref = dv
            .attr("sqref")
            .map(str::to_string)
            .or_else(|| dv.child("sqref").map(|s| s.text().to_string()))
            .unwrap_or_default();
        let rule = dv.attr("type").unwrap_or("none");
        let formula = dv
            .child("formula1")
            .map(|f| f.child("f").map_or_else(|| f.text(), XmlNode::text))
            .unwrap_or_default()
            .trim()
            .trim_matches('"')
            .to_string();
        let ok = range.is_none_or(|r| parse_sqref(&sqref).iter().any(|s| s.overlaps(&r)))
            && kind.is_none_or(|k| vocab::same(VALIDATION_TYPES, rule, k))
            && source.is_none_or(|s| {
                let s = s.trim().trim_start_matches('=');
                normalize_ref(&formula) == normalize_ref(s)
                    || text_equals(Some(&formula.replace('，', ",")), Some(&s.replace('，', ",")))
            });
        (format!("{sqref} {rule} {formula}").trim().to_string(), ok)
    });
    Ok(Check::any_judged("data validation", expected, observed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_numbers_numerically() {
        let values = ["2", "10", "33"].map(String::from);
        assert!(is_sorted(&values, false));
        assert!(!is_sorted(&values, true));
        let names = ["b", "A", "c"].map(String::from);
        assert!(!is_sorted(&names, false));
    }

    #[test]
    fn reads_subtotal_codes() {
        assert_eq!(subtotal_codes("SUBTOTAL(9,C2:C5)+subtotal(109,D2:D5)"), vec![9, 9]);
        assert_eq!(column_conditions("B:Sales，3：East"), Some(vec![(2, "Sales"), (3, "East")]));
    }
}
