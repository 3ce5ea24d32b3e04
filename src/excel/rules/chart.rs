#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use crate::{
    error::ScoringError,
    excel::{
        Chart, SheetKind, Workbook,
        cell::{CellRange, normalize_ref},
    },
    grade::{
        Check, Params,
        compare::{MEASURE_EPSILON, color_equals, number_equals, squash_whitespace, text_equals},
        params::parse_number,
        vocab::{self, Vocab, parse_font_size},
    },
    ooxml::{XmlNode, fmt_num},
};

/// Chart types as offered by the insert-chart dialog.
const CHART_TYPES: Vocab = &[
    ("clusteredColumn", &["簇状柱形图", "柱形图", "column"]),
    ("stackedColumn", &["堆积柱形图"]),
    ("percentStackedColumn", &["百分比堆积柱形图"]),
    ("clusteredColumn3D", &["三维簇状柱形图"]),
    ("clusteredBar", &["簇状条形图", "条形图", "bar"]),
    ("stackedBar", &["堆积条形图"]),
    ("percentStackedBar", &["百分比堆积条形图"]),
    ("line", &["折线图"]),
    ("lineMarkers", &["带数据标记的折线图"]),
    ("stackedLine", &["堆积折线图"]),
    ("pie", &["饼图"]),
    ("explodedPie", &["分离型饼图"]),
    ("pie3D", &["三维饼图"]),
    ("doughnut", &["圆环图"]),
    ("area", &["面积图"]),
    ("stackedArea", &["堆积面积图"]),
    ("scatter", &["散点图", "xy"]),
    ("bubble", &["气泡图"]),
    ("radar", &["雷达图"]),
    ("surface", &["曲面图"]),
    ("stock", &["股票图", "股价图"]),
    ("combo", &["组合图"]),
];

/// Legend placements (`legendPos`), plus `none` for a deleted legend and
/// `overlay` for a floating one.
const LEGEND_POSITIONS: Vocab = &[
    ("none", &["无图例", "无"]),
    ("r", &["图表右侧", "右侧", "right"]),
    ("t", &["图表顶部", "顶部", "top"]),
    ("b", &["图表底部", "底部", "bottom"]),
    ("l", &["图表左侧", "左侧", "left"]),
    ("tr", &["顶端右侧重叠", "右上", "topRight"]),
    ("overlay", &["图表区域中浮动", "浮动"]),
];

/// Where a chart lives.
const MOVE_LOCATIONS: Vocab = &[
    ("chartsheet", &["新工作表", "new sheet"]),
    ("object", &["作为对象插入", "对象位于", "embedded"]),
];

/// Data label positions (`dLblPos`).
const LABEL_POSITIONS: Vocab = &[
    ("ctr", &["居中", "center"]),
    ("inEnd", &["内侧结尾", "数据标签内"]),
    ("inBase", &["内侧基底", "轴内侧"]),
    ("outEnd", &["外侧结尾", "数据标签外"]),
    ("bestFit", &["数据标注引导线", "最佳匹配", "最佳位置"]),
    ("l", &["靠左"]),
    ("r", &["靠右"]),
    ("t", &["靠上"]),
    ("b", &["靠下"]),
];

/// Chart border line styles.
const LINE_STYLES: Vocab = &[
    ("none", &["无边框", "无线条", "noFill"]),
    ("solid", &["单实线", "实线"]),
    ("double", &["双线", "dbl"]),
    ("dotted", &["点线", "sysDot", "dot"]),
    ("dashed", &["虚线", "短划线", "dash", "sysDash", "lgDash", "sysDashDot", "dashDot"]),
    ("thick", &["粗线"]),
];

/// Line widths at or above this many EMU count as a thick line (2.25 pt).
const THICK_LINE_EMU: f64 = 28_575.0;

/// The chart a rule targets: `ChartNumber` (1-based, default 1) among the
/// charts of `TargetWorksheet` when that sheet hosts any, else among all
/// charts in workbook order.
fn select_chart<'b>(book: &'b Workbook, params: &Params<'_>) -> Result<Option<Chart<'b>>, ScoringError> {
    let sheet = params
        .first_of(&["TargetWorksheet", "SheetName"])
        .and_then(|n| book.sheet_named(n));
    let mut charts = match sheet {
        Some(s) => book.charts(Some(s))?,
        None => Vec::new(),
    };
    if charts.is_empty() {
        charts = book.charts(None)?;
    }
    if charts.is_empty() {
        return Ok(None);
    }
    let index = params.index_or_first("ChartNumber", charts.len())?;
    Ok(Some(charts.swap_remove(index)))
}

/// Subject line naming the selected chart.
fn subject(params: &Params<'_>, what: &str) -> String {
    let number = params.try_get("ChartNumber").unwrap_or("1");
    format!("chart {number} {what}").trim_end().to_string()
}

/// Runs `rule` on the selected chart, or reports that there is none.
fn with_chart<'b>(
    book: &'b Workbook,
    params: &Params<'_>,
    what: &str,
    expected: &str,
    rule: impl FnOnce(&Chart<'b>) -> Result<Check, ScoringError>,
) -> Result<Check, ScoringError> {
    match select_chart(book, params)? {
        Some(chart) => rule(&chart),
        None => Ok(Check::absent(subject(params, what), expected)),
    }
}

/// RGB of the colour inside `node` (`srgbClr`, `schemeClr`, `sysClr`).
fn color_of(book: &Workbook, node: &XmlNode) -> Result<Option<String>, ScoringError> {
    if let Some(rgb) = node.child("srgbClr").and_then(XmlNode::val) {
        return Ok(Some(rgb.to_string()));
    }
    if let Some(scheme) = node.child("schemeClr").and_then(XmlNode::val) {
        return book.scheme_color(scheme);
    }
    Ok(node
        .child("sysClr")
        .and_then(|s| s.attr("lastClr").or_else(|| s.val()))
        .map(str::to_string))
}

/// Solid fill colour of a shape-properties or line element: `none` for
/// `noFill`, `None` when unset.
fn solid_fill(book: &Workbook, node: Option<&XmlNode>) -> Result<Option<String>, ScoringError> {
    let Some(node) = node else {
        return Ok(None);
    };
    if node.child("noFill").is_some() {
        return Ok(Some("none".into()));
    }
    match node.child("solidFill") {
        Some(fill) => color_of(book, fill),
        None => Ok(None),
    }
}

/// The chart type key of a plot area.
fn type_of(plot: &XmlNode) -> String {
    let groups: Vec<&XmlNode> = plot
        .children()
        .iter()
        .filter(|c| c.local_name().ends_with("Chart"))
        .collect();
    let kinds: Vec<&str> = groups.iter().map(|g| g.local_name()).unique().collect();
    if kinds.len() > 1 {
        return "combo".into();
    }
    let Some(group) = groups.first() else {
        return "none".into();
    };
    let grouping = group.child("grouping").and_then(XmlNode::val).unwrap_or("standard");
    let prefix = match grouping {
        "stacked" => "stacked",
        "percentStacked" => "percentStacked",
        _ => "",
    };
    let with_prefix = |base: &str| {
        if prefix.is_empty() {
            base.to_string()
        } else {
            let mut chars = base.chars();
            let head: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
            format!("{prefix}{head}{}", chars.as_str())
        }
    };
    match group.local_name() {
        name @ ("barChart" | "bar3DChart") => {
            let shape = match group.child("barDir").and_then(XmlNode::val) {
                Some("bar") => "Bar",
                _ => "Column",
            };
            let kind = if prefix.is_empty() { "clustered" } else { prefix };
            let suffix = if name == "bar3DChart" { "3D" } else { "" };
            format!("{kind}{shape}{suffix}")
        }
        "lineChart" | "line3DChart" => {
            let markers = group.children_named("ser").any(|s| {
                s.path(&["marker", "symbol"])
                    .and_then(XmlNode::val)
                    .is_none_or(|v| v != "none")
            });
            if prefix.is_empty() && markers {
                "lineMarkers".into()
            } else {
                with_prefix("line")
            }
        }
        "pieChart" => {
            let exploded = group
                .find_all("explosion")
                .any(|e| e.attr_f64("val").is_some_and(|v| v > 0.0));
            if exploded { "explodedPie" } else { "pie" }.into()
        }
        "pie3DChart" => "pie3D".into(),
        "ofPieChart" => "ofPie".into(),
        "doughnutChart" => "doughnut".into(),
        "areaChart" | "area3DChart" => with_prefix("area"),
        "scatterChart" => "scatter".into(),
        "bubbleChart" => "bubble".into(),
        "radarChart" => "radar".into(),
        "surfaceChart" | "surface3DChart" => "surface".into(),
        "stockChart" => "stock".into(),
        other => other.trim_end_matches("Chart").into(),
    }
}

/// Every data series of the chart, in plot order.
fn series<'c>(chart: &Chart<'c>) -> Vec<&'c XmlNode> {
    chart
        .plot_area()
        .map(|p| p.find_all("ser").collect())
        .unwrap_or_default()
}

/// Visible text of a title or label element.
fn title_text(title: &XmlNode) -> String {
    let rich: String = title.find_all("t").map(XmlNode::text).collect();
    if !rich.trim().is_empty() {
        return squash_whitespace(&rich);
    }
    title
        .find_all("v")
        .map(XmlNode::text)
        .collect::<String>()
        .trim()
        .to_string()
}

/// A chart exists, of `ChartType` when given.
pub fn create_chart(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.try_get("ChartType");
    match expected {
        Some(_) => chart_type_check(book, &params),
        None => with_chart(book, &params, "chart", "present", |_| {
            Ok(Check::presence(true, subject(&params, "")))
        }),
    }
}

/// Shared body of the chart type rules.
fn chart_type_check(book: &Workbook, params: &Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("ChartType")?;
    with_chart(book, params, "type", expected, |chart| {
        let actual = chart.plot_area().map(type_of).unwrap_or_else(|| "none".into());
        Ok(Check::compare(
            vocab::same(CHART_TYPES, &actual, expected),
            subject(params, "type"),
            expected,
            actual,
        ))
    })
}

/// The chart is of `ChartType`.
pub fn chart_type(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    chart_type_check(book, &params)
}

/// The chart uses quick style `StyleNumber`.
pub fn chart_style(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let raw = params.require("StyleNumber")?;
    let expected = raw.trim().parse::<i64>().map_err(|_| ScoringError::missing("StyleNumber"))?;
    with_chart(book, &params, "style", raw, |chart| {
        // Office 2010 writes the style as 100 + n in an alternate block.
        let style = chart
            .space
            .find_all("style")
            .filter_map(|s| s.attr_f64("val"))
            .map(|v| (if v > 100.0 { v - 100.0 } else { v }) as i64)
            .next()
            .unwrap_or(2);
        Ok(Check::compare(style == expected, subject(&params, "style"), raw, style.to_string()))
    })
}

/// The chart title reads `ChartTitle`.
pub fn chart_title(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["ChartTitle", "Title"])?;
    with_chart(book, &params, "title", expected, |chart| {
        let title = chart
            .chart()
            .and_then(|c| c.child("title"))
            .map(title_text)
            .unwrap_or_default();
        Ok(Check::compare(
            text_equals(Some(&title), Some(&squash_whitespace(expected))),
            subject(&params, "title"),
            expected,
            title,
        ))
    })
}

/// The legend sits at `LegendPosition`.
pub fn legend_position(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("LegendPosition")?;
    with_chart(book, &params, "legend", expected, |chart| {
        let legend = chart.chart().and_then(|c| c.child("legend"));
        let actual = match legend {
            None => "none",
            Some(l) if l.child("overlay").and_then(XmlNode::val).is_some_and(|v| v == "1") => "overlay",
            Some(l) => l.child("legendPos").and_then(XmlNode::val).unwrap_or("r"),
        };
        Ok(Check::compare(
            vocab::same(LEGEND_POSITIONS, actual, expected),
            subject(&params, "legend position"),
            expected,
            actual,
        ))
    })
}

/// The chart was moved to `MoveLocation`, on `TargetSheet` when given.
pub fn chart_move(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let location = params.require("MoveLocation")?;
    let target = params.try_get("TargetSheet");
    let expected = match target {
        Some(t) => format!("{location} {t}"),
        None => location.to_string(),
    };
    with_chart(book, &params, "location", &expected, |chart| {
        let kind = if chart.sheet.kind == SheetKind::Chartsheet { "chartsheet" } else { "object" };
        let passed = vocab::same(MOVE_LOCATIONS, kind, location)
            && target.is_none_or(|t| text_equals(Some(&chart.sheet.name), Some(t)));
        Ok(Check::compare(
            passed,
            subject(&params, "location"),
            expected.as_str(),
            format!("{kind} {}", chart.sheet.name),
        ))
    })
}

/// Compares the references of every series' `slot` (`cat` or `val`) with
/// `expected`; passes when one series or the union of all of them matches.
fn check_series_ref(
    book: &Workbook,
    params: &Params<'_>,
    what: &str,
    slot: &str,
    expected: &str,
) -> Result<Check, ScoringError> {
    with_chart(book, params, what, expected, |chart| {
        let refs: Vec<String> = series(chart)
            .into_iter()
            .filter_map(|s| s.child(slot))
            .filter_map(|d| d.find("f"))
            .map(|f| f.text().trim().to_string())
            .collect();
        let want = normalize_ref(expected);
        let union = refs
            .iter()
            .filter_map(|r| CellRange::parse(r))
            .reduce(|a, b| a.union(&b))
            .map(|r| r.to_string());
        let passed = refs.iter().any(|r| normalize_ref(r) == want) || union.is_some_and(|u| u == want);
        Ok(Check::compare(
            passed,
            subject(params, what),
            expected,
            refs.iter().map(|r| normalize_ref(r)).unique().join(", "),
        ))
    })
}

/// Category labels come from `CategoryRange`.
pub fn category_range(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("CategoryRange")?;
    check_series_ref(book, &params, "category range", "cat", expected)
}

/// Values come from `ValueRange`.
pub fn value_range(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require("ValueRange")?;
    check_series_ref(book, &params, "value range", "val", expected)
}

/// Font facts of one run-properties element.
struct TextStyle {
    /// typeface
    font:  Option<String>,
    /// size in points
    size:  Option<f64>,
    /// RGB colour
    color: Option<String>,
}

/// Run properties (`defRPr`, `rPr`) under `node`.
fn text_styles(book: &Workbook, node: &XmlNode) -> Result<Vec<TextStyle>, ScoringError> {
    let mut out = Vec::new();
    for props in node.descendants().filter(|n| n.is("defRPr") || n.is("rPr")) {
        let font = ["latin", "ea"]
            .iter()
            .filter_map(|k| props.child(k).and_then(|f| f.attr("typeface")))
            .find(|t| !t.starts_with('+'))
            .map(str::to_string);
        out.push(TextStyle {
            font,
            size: props.attr_f64("sz").map(|s| s / 100.0),
            color: solid_fill(book, Some(props))?,
        });
    }
    Ok(out)
}

/// Checks `FontName`, `FontSize` and `FontColor` (whichever are given)
/// against the text of the element `locate` finds.
fn check_text_format<'b>(
    book: &'b Workbook,
    params: &Params<'_>,
    what: &str,
    locate: impl FnOnce(&Chart<'b>) -> Option<&'b XmlNode>,
) -> Result<Check, ScoringError> {
    let font = params.first_of(&["FontName", "FontFamily"]);
    let size = params
        .try_get("FontSize")
        .map(|s| parse_font_size(s).ok_or_else(|| ScoringError::missing("FontSize")))
        .transpose()?;
    let color = params.try_get("FontColor");
    if font.is_none() && size.is_none() && color.is_none() {
        return Err(ScoringError::missing("FontName or FontSize or FontColor"));
    }
    let expected = [font.map(str::to_string), size.map(fmt_num), color.map(str::to_string)]
        .into_iter()
        .flatten()
        .join(" ");
    with_chart(book, params, what, &expected, |chart| {
        let Some(node) = locate(chart) else {
            return Ok(Check::absent(subject(params, what), expected.as_str()));
        };
        let observed = text_styles(book, node)?.into_iter().map(|s| {
            let ok = font.is_none_or(|f| s.font.as_deref().is_some_and(|g| text_equals(Some(g), Some(f))))
                && size.is_none_or(|want| s.size.is_some_and(|got| number_equals(got, want, MEASURE_EPSILON)))
                && color.is_none_or(|want| s.color.as_deref().is_some_and(|got| color_equals(got, want)));
            let shown = [s.font, s.size.map(fmt_num), s.color].into_iter().flatten().join(" ");
            (shown, ok)
        });
        Ok(Check::any_judged(subject(params, what), expected.as_str(), observed))
    })
}

/// The chart title's font matches.
pub fn title_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text_format(book, &params, "title format", |chart| chart.chart()?.child("title"))
}

/// The legend's font matches.
pub fn legend_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text_format(book, &params, "legend format", |chart| chart.chart()?.child("legend"))
}

/// The data labels' font matches.
pub fn data_labels_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text_format(book, &params, "data label format", |chart| chart.plot_area()?.find("dLbls"))
}

/// Axes of the plot area whose `axPos` is one of `positions`.
fn axes<'c>(chart: &Chart<'c>, positions: &[&str]) -> Vec<&'c XmlNode> {
    chart
        .plot_area()
        .map(|p| {
            p.children()
                .iter()
                .filter(|a| matches!(a.local_name(), "catAx" | "valAx" | "dateAx" | "serAx"))
                .filter(|a| {
                    a.child("axPos")
                        .and_then(XmlNode::val)
                        .is_some_and(|pos| positions.contains(&pos))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Horizontal axes (bottom or top).
const HORIZONTAL_AXES: &[&str] = &["b", "t"];
/// Vertical axes (left or right).
const VERTICAL_AXES: &[&str] = &["l", "r"];

/// The horizontal axis carries the title `AxisTitle`.
pub fn horizontal_axis_title(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["AxisTitle", "HorizontalAxisTitle"])?;
    with_chart(book, &params, "axis title", expected, |chart| {
        let titles = axes(chart, HORIZONTAL_AXES)
            .into_iter()
            .filter_map(|a| a.child("title"))
            .map(title_text);
        let want = squash_whitespace(expected);
        Ok(Check::any(subject(&params, "horizontal axis title"), expected, titles, |t| {
            text_equals(Some(t), Some(&want))
        }))
    })
}

/// The horizontal axis title's font matches.
pub fn horizontal_axis_title_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_text_format(book, &params, "horizontal axis title format", |chart| {
        axes(chart, HORIZONTAL_AXES)
            .into_iter()
            .find_map(|a| a.child("title"))
    })
}

/// The vertical value axis has `MinValue`, `MaxValue` and `MajorUnit`
/// (whichever are given).
pub fn vertical_axis_options(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let keys = [("MinValue", "min"), ("MaxValue", "max"), ("MajorUnit", "majorUnit")];
    let wanted: Vec<(&str, &str, f64)> = keys
        .iter()
        .filter_map(|(key, element)| params.try_get(key).map(|raw| (*key, *element, raw)))
        .map(|(key, element, raw)| {
            parse_number(raw)
                .map(|n| (key, element, n))
                .ok_or_else(|| ScoringError::missing(key))
        })
        .collect::<Result<_, _>>()?;
    if wanted.is_empty() {
        return Err(ScoringError::missing("MinValue or MaxValue or MajorUnit"));
    }
    let expected = wanted
        .iter()
        .map(|(key, _, n)| format!("{key} {}", fmt_num(*n)))
        .join(", ");
    with_chart(book, &params, "vertical axis", &expected, |chart| {
        let axis = axes(chart, VERTICAL_AXES)
            .into_iter()
            .find(|a| a.is("valAx"));
        let Some(axis) = axis else {
            return Ok(Check::absent(subject(&params, "vertical axis"), expected.as_str()));
        };
        let checks = wanted
            .iter()
            .map(|(key, element, want)| {
                let actual = match *element {
                    "majorUnit" => axis.child("majorUnit"),
                    bound => axis.child("scaling").and_then(|s| s.child(bound)),
                }
                .and_then(|n| n.attr_f64("val"));
                match actual {
                    Some(got) => Check::compare(
                        number_equals(got, *want, MEASURE_EPSILON),
                        *key,
                        fmt_num(*want),
                        fmt_num(got),
                    ),
                    None => Check::compare(false, *key, fmt_num(*want), "auto"),
                }
            })
            .collect();
        Ok(Check::all(subject(&params, "vertical axis"), checks))
    })
}

/// Shared body of the four gridline rules: gridlines of kind `element`
/// (`majorGridlines` or `minorGridlines`) on axes at `positions` match
/// `GridlineVisible` (default true) and `GridlineColor`.
fn check_gridlines(
    book: &Workbook,
    params: &Params<'_>,
    what: &str,
    element: &str,
    positions: &[&str],
) -> Result<Check, ScoringError> {
    let visible = params.try_bool("GridlineVisible").unwrap_or(true);
    let color = params.try_get("GridlineColor").filter(|_| visible);
    let expected = match (visible, color) {
        (false, _) => "hidden".to_string(),
        (true, Some(c)) => format!("shown {c}"),
        (true, None) => "shown".to_string(),
    };
    with_chart(book, params, what, &expected, |chart| {
        let lines: Vec<&XmlNode> = axes(chart, positions)
            .into_iter()
            .filter_map(|a| a.child(element))
            .collect();
        let mut colors = Vec::new();
        for line in &lines {
            let ln = line.child("spPr").and_then(|s| s.child("ln"));
            colors.push(solid_fill(book, ln)?.unwrap_or_else(|| "auto".into()));
        }
        let shown = !lines.is_empty();
        let passed = shown == visible
            && color.is_none_or(|want| colors.iter().any(|c| color_equals(c, want)));
        let actual = if shown {
            format!("shown {}", colors.iter().unique().join(","))
        } else {
            "hidden".to_string()
        };
        Ok(Check::compare(passed, subject(params, what), expected.as_str(), actual.trim()))
    })
}

/// Major gridlines across the chart (on the vertical axis).
pub fn major_horizontal_gridlines(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_gridlines(book, &params, "major horizontal gridlines", "majorGridlines", VERTICAL_AXES)
}

/// Minor gridlines across the chart.
pub fn minor_horizontal_gridlines(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_gridlines(book, &params, "minor horizontal gridlines", "minorGridlines", VERTICAL_AXES)
}

/// Major gridlines up the chart (on the horizontal axis).
pub fn major_vertical_gridlines(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_gridlines(book, &params, "major vertical gridlines", "majorGridlines", HORIZONTAL_AXES)
}

/// Minor gridlines up the chart.
pub fn minor_vertical_gridlines(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    check_gridlines(book, &params, "minor vertical gridlines", "minorGridlines", HORIZONTAL_AXES)
}

/// Series `SeriesIndex` (default 1) is coloured `SeriesColor`, by fill or,
/// for lines, by stroke.
pub fn series_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["SeriesColor", "FillColor", "Color"])?;
    with_chart(book, &params, "series", expected, |chart| {
        let all = series(chart);
        if all.is_empty() {
            return Ok(Check::absent(subject(&params, "series"), expected));
        }
        let index = params.index_or_first("SeriesIndex", all.len())?;
        let props = all[index].child("spPr");
        let fill = solid_fill(book, props)?;
        let line = solid_fill(book, props.and_then(|p| p.child("ln")))?;
        let observed = [fill, line].into_iter().flatten().collect::<Vec<_>>();
        let what = subject(&params, &format!("series {} color", index + 1));
        if observed.is_empty() {
            return Ok(Check::compare(false, what, expected, "automatic"));
        }
        Ok(Check::any(what, expected, observed, |c| color_equals(c, expected)))
    })
}

/// Data labels are shown, at `LabelPosition` when given.
pub fn add_data_labels(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let position = params.first_of(&["LabelPosition", "DataLabelPosition"]);
    let expected = position.unwrap_or("shown");
    with_chart(book, &params, "data labels", expected, |chart| {
        let Some(plot) = chart.plot_area() else {
            return Ok(Check::absent(subject(&params, "data labels"), expected));
        };
        let shown_flag = |l: &XmlNode| {
            ["showVal", "showCatName", "showSerName", "showPercent"]
                .iter()
                .any(|k| l.child(k).and_then(XmlNode::val).is_some_and(|v| v == "1" || v == "true"))
        };
        let observed = plot.find_all("dLbls").filter(|l| shown_flag(*l)).map(|l| {
            let pos = l
                .child("dLblPos")
                .and_then(XmlNode::val)
                .unwrap_or("default")
                .to_string();
            let ok = position.is_none_or(|want| vocab::same(LABEL_POSITIONS, &pos, want));
            (pos, ok)
        });
        Ok(Check::any_judged(subject(&params, "data labels"), expected, observed))
    })
}

/// The chart area has `FillColor` and `BorderColor` (whichever are given).
pub fn chart_area_format(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let fill = params.first_of(&["FillColor", "ChartAreaColor"]);
    let border = params.try_get("BorderColor");
    if fill.is_none() && border.is_none() {
        return Err(ScoringError::missing("FillColor or BorderColor"));
    }
    let expected = [fill, border].into_iter().flatten().join(", ");
    with_chart(book, &params, "chart area", &expected, |chart| {
        let props = chart.space.child("spPr");
        let mut checks = Vec::new();
        if let Some(want) = fill {
            let actual = solid_fill(book, props)?.unwrap_or_else(|| "automatic".into());
            checks.push(Check::compare(color_equals(&actual, want), "fill", want, actual));
        }
        if let Some(want) = border {
            let actual = solid_fill(book, props.and_then(|p| p.child("ln")))?
                .unwrap_or_else(|| "automatic".into());
            checks.push(Check::compare(color_equals(&actual, want), "border", want, actual));
        }
        Ok(Check::all(subject(&params, "chart area"), checks))
    })
}

/// The floor of a 3-D chart is filled with `FloorColor`.
pub fn floor_color(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.require_any(&["FloorColor", "FillColor"])?;
    with_chart(book, &params, "floor", expected, |chart| {
        let floor = chart.chart().and_then(|c| c.child("floor"));
        let Some(floor) = floor else {
            return Ok(Check::absent(subject(&params, "floor"), expected));
        };
        let actual = solid_fill(book, floor.child("spPr"))?.unwrap_or_else(|| "automatic".into());
        Ok(Check::compare(color_equals(&actual, expected), subject(&params, "floor color"), expected, actual))
    })
}

/// Line style key of an `a:ln` element.
fn line_style(ln: &XmlNode) -> &'static str {
    if ln.child("noFill").is_some() {
        return "none";
    }
    if ln.attr("cmpd").is_some_and(|c| c != "sng") {
        return "double";
    }
    match ln.child("prstDash").and_then(XmlNode::val) {
        Some("sysDot" | "dot") => return "dotted",
        Some("solid") | None => {}
        Some(_) => return "dashed",
    }
    if ln.attr_f64("w").is_some_and(|w| w >= THICK_LINE_EMU) {
        "thick"
    } else {
        "solid"
    }
}

/// The chart border has `BorderStyle` and `BorderColor` (whichever are
/// given).
pub fn chart_border(book: &Workbook, params: Params<'_>) -> Result<Check, ScoringError> {
    let style = params.try_get("BorderStyle");
    let color = params.try_get("BorderColor");
    if style.is_none() && color.is_none() {
        return Err(ScoringError::missing("BorderStyle or BorderColor"));
    }
    let expected = [style, color].into_iter().flatten().join(", ");
    with_chart(book, &params, "border", &expected, |chart| {
        let ln = chart.space.child("spPr").and_then(|p| p.child("ln"));
        let mut checks = Vec::new();
        if let Some(want) = style {
            let actual = ln.map(line_style).unwrap_or("solid");
            checks.push(Check::compare(vocab::same(LINE_STYLES, actual, want), "style", want, actual));
        }
        if let Some(want) = color {
            let actual = solid_fill(book, ln)?.unwrap_or_else(|| "automatic".into());
            checks.push(Check::compare(color_equals(&actual, want), "color", want, actual));
        }
        Ok(Check::all(subject(&params, "border"), checks))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_chart_types() {
        let plot = XmlNode::parse(
            br#"<c:plotArea xmlns:c="c"><c:barChart><c:barDir val="bar"/><c:grouping val="stacked"/></c:barChart></c:plotArea>"#,
        )
        .expect("parse");
        assert_eq!(type_of(&plot), "stackedBar");
        let line = XmlNode::parse(
            br#"<c:plotArea xmlns:c="c"><c:lineChart><c:grouping val="standard"/><c:ser><c:marker><c:symbol val="none"/></c:marker></c:ser></c:lineChart></c:plotArea>"#,
        )
        .expect("parse");
        assert_eq!(type_of(&line), "line");
        assert!(vocab::same(CHART_TYPES, "clusteredColumn", "簇状柱形图"));
    }

    #[test]
    fn classifies_border_lines() {
        let ln = XmlNode::parse(br#"<a:ln xmlns:a="a" w="9525"><a:prstDash val="sysDash"/></a:ln>"#).expect("parse");
        assert_eq!(line_style(&ln), "dashed");
        let thick = XmlNode::parse(br#"<a:ln xmlns:a="a" w="38100"/>"#).expect("parse");
        assert_eq!(line_style(&thick), "thick");
    }
}
