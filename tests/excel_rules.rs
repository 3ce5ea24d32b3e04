mod common;

use std::path::Path;

use common::{Xlsx, point, sheet_data};
use docgrade::{DocumentKind, ExcelScoringEngine, KnowledgePointResult, ScoringEngine};

const STYLES: &str = r#"<numFmts count="1"><numFmt numFmtId="164" formatCode="[$¥-804]#,##0.00"/></numFmts><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/><xf numFmtId="10" fontId="1" fillId="0" borderId="0" applyFont="1"><alignment horizontal="center"/></xf><xf numFmtId="164" fontId="0" fillId="0" borderId="0"/></cellXfs>"#;

fn run(path: &Path, tag: &str, params: &[(&str, &str)]) -> KnowledgePointResult {
    let points = [point(DocumentKind::Excel, "op-1", tag, 5.0, params)];
    ExcelScoringEngine
        .detect_knowledge_points(path, &points)
        .pop()
        .expect("one verdict")
}

fn styled_book() -> Xlsx {
    Xlsx::new()
        .sheet(
            "Sheet1",
            r#"<sheetData><row r="1"><c r="A1" s="1" t="inlineStr"><is><t>Title</t></is></c><c r="B1" s="2"><v>12.5</v></c></row></sheetData>"#,
        )
        .styles(STYLES)
}

#[test]
fn fill_or_copy_passes_when_cell_holds_value() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "Hello")]))
        .write();
    let result = run(&path, "FillOrCopyCellContent", &[("CellRange", "A1"), ("ExpectedValue", "Hello")]);
    assert!(result.is_correct, "{}", result.details);
    assert_eq!(result.achieved_score, 5.0);
    assert_eq!(result.actual_value, "Hello");
}

#[test]
fn fill_or_copy_reports_empty_actual_for_blank_cell() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("B2", "other")]))
        .write();
    let result = run(&path, "FillOrCopyCellContent", &[("CellRange", "A1"), ("ExpectedValue", "Hello")]);
    assert!(!result.is_correct);
    assert_eq!(result.actual_value, "");
    assert_eq!(result.achieved_score, 0.0);
}

#[test]
fn numeric_cell_content_compares_by_exact_value() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "3.1"), ("B1", "6.00")]))
        .write();
    let near = run(&path, "FillOrCopyCellContent", &[("CellRange", "A1"), ("ExpectedValue", "3")]);
    assert!(!near.is_correct, "{}", near.details);
    assert_eq!(near.achieved_score, 0.0);
    assert!(run(&path, "FillOrCopyCellContent", &[("CellRange", "B1"), ("ExpectedValue", "6")]).is_correct);
    assert!(!run(&path, "FillOrCopyCellContent", &[("CellRange", "B1"), ("ExpectedValue", "6 units")]).is_correct);
    assert!(!run(&path, "InsertDeleteCells", &[("CellRange", "A1"), ("ExpectedValue", "3")]).is_correct);
}

#[test]
fn fill_detection_over_a_range_is_labelled_heuristic() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "1"), ("A2", "2"), ("A3", "3")]))
        .write();
    let result = run(&path, "FillOrCopyCellContent", &[("CellRange", "A1:A3")]);
    assert!(result.is_correct, "{}", result.details);
    assert!(result.details.starts_with("heuristic:"));
}

#[test]
fn cell_values_list_checks_every_pair() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "Name"), ("B1", "42")]))
        .write();
    let ok = run(&path, "FillOrCopyCellContent", &[("CellValues", "A1:Name,B1:42")]);
    assert!(ok.is_correct, "{}", ok.details);
    let bad = run(&path, "FillOrCopyCellContent", &[("CellValues", "A1:Name,B1:43")]);
    assert!(!bad.is_correct);
}

#[test]
fn delete_content_needs_blank_cells() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "keep")]))
        .write();
    assert!(run(&path, "DeleteCellContent", &[("CellRange", "B1:B3")]).is_correct);
    assert!(!run(&path, "DeleteCellContent", &[("CellRange", "A1:A2")]).is_correct);
}

#[test]
fn row_ranges_outside_the_sheet_are_invalid_parameters() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "keep")]))
        .write();
    let result = run(&path, "DeleteCellContent", &[("CellRange", "0:4294967295")]);
    assert!(!result.is_correct);
    let message = result.error_message.expect("error message");
    assert!(message.starts_with("missing or invalid parameter"), "{message}");

    assert!(!run(&path, "DeleteCellContent", &[("CellRange", "1:1048576")]).is_correct);
    assert!(run(&path, "DeleteCellContent", &[("CellRange", "2:1048576")]).is_correct);
}

#[test]
fn cell_font_found_in_style_table() {
    let path = styled_book().write();
    let result = run(&path, "SetCellFont", &[("FontName", "Arial")]);
    assert!(result.is_correct, "{}", result.details);

    let missing = run(&path, "SetCellFont", &[("FontName", "Times New Roman")]);
    assert!(!missing.is_correct);
}

#[test]
fn cell_font_checks_the_styled_range() {
    let path = styled_book().write();
    assert!(run(&path, "SetCellFont", &[("FontName", "arial"), ("CellRange", "A1")]).is_correct);
    assert!(!run(&path, "SetCellFont", &[("FontName", "Arial"), ("CellRange", "A1:B1")]).is_correct);
}

#[test]
fn font_size_color_and_style_follow_the_cell_format() {
    let path = styled_book().write();
    assert!(run(&path, "SetFontSize", &[("FontSize", "14"), ("CellRange", "A1")]).is_correct);
    assert!(run(&path, "SetFontColor", &[("FontColor", "红色"), ("CellRange", "A1")]).is_correct);
    assert!(run(&path, "SetFontColor", &[("FontColor", "#FF0000"), ("CellRange", "A1")]).is_correct);
    assert!(run(&path, "SetFontStyle", &[("FontStyle", "加粗"), ("CellRange", "A1")]).is_correct);
}

#[test]
fn generic_aliases_reach_the_spreadsheet_handlers() {
    let path = styled_book().write();
    assert!(run(&path, "SetFont", &[("FontName", "Arial")]).is_correct);
    assert!(run(&path, "SetSize", &[("FontSize", "14"), ("CellRange", "A1")]).is_correct);
}

#[test]
fn horizontal_alignment_accepts_authoring_labels() {
    let path = styled_book().write();
    let result = run(&path, "SetHorizontalAlignment", &[("CellRange", "A1"), ("HorizontalAlignment", "居中")]);
    assert!(result.is_correct, "{}", result.details);
    assert!(!run(&path, "SetHorizontalAlignment", &[("CellRange", "B1"), ("HorizontalAlignment", "center")]).is_correct);
}

#[test]
fn number_format_categories() {
    let path = styled_book().write();
    assert!(run(&path, "SetNumberFormat", &[("CellRange", "A1"), ("NumberFormat", "百分比")]).is_correct);
    assert!(run(&path, "SetNumberFormat", &[("CellRange", "B1"), ("NumberFormat", "货币")]).is_correct);
}

#[test]
fn merge_formula_and_function() {
    let body = r#"<sheetData><row r="1"><c r="A1"><v>1</v></c><c r="B1"><v>2</v></c><c r="C1"><f>SUM(A1:B1)</f><v>3</v></c></row></sheetData><mergeCells count="1"><mergeCell ref="D1:E2"/></mergeCells>"#;
    let path = Xlsx::new().sheet("Sheet1", body).write();

    assert!(run(&path, "MergeCells", &[("CellRange", "D1:E2")]).is_correct);
    assert!(!run(&path, "MergeCells", &[("CellRange", "D1:E1")]).is_correct);
    assert!(run(&path, "SetFormula", &[("CellRange", "C1"), ("ExpectedFormula", "=sum(A1:B1)")]).is_correct);
    let function = run(
        &path,
        "UseFunction",
        &[("CellAddress", "C1"), ("FormulaContent", "SUM"), ("ExpectedValue", "3")],
    );
    assert!(function.is_correct, "{}", function.details);
    assert!(!run(&path, "UseFunction", &[("CellAddress", "A1"), ("FormulaContent", "SUM")]).is_correct);
}

#[test]
fn frozen_panes_and_print_area() {
    let body = r#"<sheetViews><sheetView workbookViewId="0"><pane ySplit="1" topLeftCell="A2" activePane="bottomLeft" state="frozen"/></sheetView></sheetViews><sheetData/>"#;
    let path = Xlsx::new()
        .sheet("Sheet1", body)
        .defined_names(r#"<definedName name="_xlnm.Print_Area" localSheetId="0">Sheet1!$A$1:$C$10</definedName>"#)
        .write();

    assert!(run(&path, "FreezePanes", &[("FreezeCell", "A2")]).is_correct);
    assert!(run(&path, "FreezePanes", &[("FreezeRows", "1")]).is_correct);
    assert!(!run(&path, "FreezePanes", &[("FreezeColumns", "1")]).is_correct);
    assert!(run(&path, "SetPrintArea", &[("PrintArea", "A1:C10")]).is_correct);
    assert!(!run(&path, "SetPrintArea", &[("PrintArea", "A1:C9")]).is_correct);
}

#[test]
fn auto_filter_range_and_conditions() {
    let body = format!(
        r#"{}<autoFilter ref="A1:C5"><filterColumn colId="1"><filters><filter val="East"/></filters></filterColumn></autoFilter>"#,
        sheet_data(&[("A1", "Name"), ("B1", "Region"), ("C1", "Sales")])
    );
    let path = Xlsx::new().sheet("Sheet1", &body).write();
    let result = run(&path, "SetAutoFilter", &[("DataRange", "$A$1:$C$5"), ("FilterConditions", "B:East")]);
    assert!(result.is_correct, "{}", result.details);
    assert!(!run(&path, "SetAutoFilter", &[("FilterConditions", "B:West")]).is_correct);
}

#[test]
fn sort_detection_is_a_heuristic() {
    let path = Xlsx::new()
        .sheet(
            "Sheet1",
            &sheet_data(&[("A1", "Name"), ("B1", "Score"), ("A2", "x"), ("B2", "90"), ("A3", "y"), ("B3", "75"), ("A4", "z"), ("B4", "60")]),
        )
        .write();
    let result = run(&path, "SortData", &[("SortColumn", "B"), ("SortOrder", "降序")]);
    assert!(result.is_correct, "{}", result.details);
    assert!(result.details.starts_with("heuristic:"));
    assert!(!run(&path, "SortData", &[("SortColumn", "B"), ("SortOrder", "ascending")]).is_correct);
}

#[test]
fn worksheet_management_and_target_fallback() {
    let path = Xlsx::new()
        .sheet("Sales", &sheet_data(&[("A1", "first")]))
        .sheet("Costs", &sheet_data(&[("A1", "second")]))
        .write();
    assert!(run(&path, "ManageWorksheet", &[("NewSheetName", "Sales")]).is_correct);
    assert!(run(&path, "ModifySheetName", &[("NewSheetName", "Costs"), ("OriginalSheetName", "Sheet1")]).is_correct);
    assert!(run(&path, "ManageWorksheet", &[("ExpectedSheetCount", "2")]).is_correct);

    let named = run(
        &path,
        "FillOrCopyCellContent",
        &[("TargetWorksheet", "Costs"), ("CellRange", "A1"), ("ExpectedValue", "second")],
    );
    assert!(named.is_correct, "{}", named.details);
    let fallback = run(
        &path,
        "FillOrCopyCellContent",
        &[("TargetWorksheet", "Nope"), ("CellRange", "A1"), ("ExpectedValue", "first")],
    );
    assert!(fallback.is_correct, "{}", fallback.details);
}

const BAR_CHART: &str = r#"<c:title><c:tx><c:rich><a:p><a:r><a:t>Quarterly Sales</a:t></a:r></a:p></c:rich></c:tx></c:title><c:plotArea><c:barChart><c:barDir val="bar"/><c:grouping val="stacked"/><c:ser><c:idx val="0"/><c:spPr><a:solidFill><a:srgbClr val="4472C4"/></a:solidFill></c:spPr><c:dLbls><c:dLblPos val="ctr"/><c:showVal val="1"/></c:dLbls><c:cat><c:strRef><c:f>Sheet1!$A$2:$A$5</c:f></c:strRef></c:cat><c:val><c:numRef><c:f>Sheet1!$B$2:$B$5</c:f></c:numRef></c:val></c:ser></c:barChart><c:catAx><c:axId val="1"/><c:axPos val="l"/></c:catAx><c:valAx><c:axId val="2"/><c:scaling><c:max val="100"/><c:min val="0"/></c:scaling><c:axPos val="b"/><c:majorGridlines/><c:majorUnit val="20"/></c:valAx></c:plotArea><c:legend><c:legendPos val="b"/><c:overlay val="0"/></c:legend>"#;

fn chart_book() -> Xlsx {
    Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "Quarter"), ("B1", "Sales")]))
        .chart(0, BAR_CHART)
}

#[test]
fn chart_type_title_and_legend() {
    let path = chart_book().write();
    assert!(run(&path, "CreateChart", &[]).is_correct);
    assert!(run(&path, "ChartType", &[("ChartType", "堆积条形图")]).is_correct);
    assert!(!run(&path, "ChartType", &[("ChartType", "clusteredColumn")]).is_correct);
    assert!(run(&path, "ChartTitle", &[("ChartTitle", "quarterly sales")]).is_correct);
    assert!(run(&path, "LegendPosition", &[("LegendPosition", "底部")]).is_correct);
    assert!(run(&path, "ChartMove", &[("MoveLocation", "作为对象插入")]).is_correct);
}

#[test]
fn chart_data_ranges_and_series() {
    let path = chart_book().write();
    assert!(run(&path, "CategoryAxisDataRange", &[("CategoryRange", "A2:A5")]).is_correct);
    assert!(run(&path, "ValueAxisDataRange", &[("ValueRange", "Sheet1!$B$2:$B$5")]).is_correct);
    assert!(run(&path, "DataSeriesFormat", &[("SeriesColor", "#4472c4")]).is_correct);
    assert!(run(&path, "AddDataLabels", &[("LabelPosition", "居中")]).is_correct);
}

#[test]
fn chart_axes_and_gridlines() {
    let path = chart_book().write();
    // A bar chart puts its value axis at the bottom; its gridlines run up the chart.
    assert!(run(&path, "MajorVerticalGridlines", &[]).is_correct);
    assert!(run(&path, "MajorHorizontalGridlines", &[("GridlineVisible", "false")]).is_correct);
    assert!(!run(&path, "MinorVerticalGridlines", &[]).is_correct);
}

#[test]
fn chart_number_out_of_range_is_a_detection_failure() {
    let path = chart_book().write();
    let result = run(&path, "ChartTitle", &[("ChartTitle", "Quarterly Sales"), ("ChartNumber", "2")]);
    assert!(!result.is_correct);
    let message = result.error_message.expect("error message");
    assert!(message.starts_with("detection failed"), "{message}");
}

#[test]
fn workbook_without_charts_fails_chart_rules() {
    let path = Xlsx::new().sheet("Sheet1", &sheet_data(&[("A1", "x")])).write();
    let result = run(&path, "CreateChart", &[]);
    assert!(!result.is_correct);
    assert!(result.error_message.is_none());
}

const BORDER_STYLES: &str = r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="4"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><patternFill patternType="solid"><fgColor rgb="FFFFFF00"/><bgColor indexed="64"/></patternFill></fill><fill><patternFill patternType="lightGray"><fgColor rgb="FF0070C0"/></patternFill></fill></fills><borders count="2"><border><left/><right/><top/><bottom/><diagonal/></border><border><left style="thin"><color rgb="FFFF0000"/></left><right style="thin"><color rgb="FFFF0000"/></right><top style="thin"><color rgb="FFFF0000"/></top><bottom style="thin"><color rgb="FFFF0000"/></bottom><diagonal/></border></borders><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/><xf numFmtId="0" fontId="0" fillId="2" borderId="1" applyFill="1" applyBorder="1"/><xf numFmtId="0" fontId="0" fillId="3" borderId="0" applyFill="1"/></cellXfs><dxfs count="1"><dxf><font><color rgb="FF9C0006"/></font><fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf></dxfs>"#;

fn bordered_book() -> std::path::PathBuf {
    let body = r#"<sheetData><row r="1"><c r="A1" s="1"/><c r="B1" s="1"/><c r="C1" s="2"/></row><row r="2"><c r="A2" s="1"/><c r="B2" s="1"/></row></sheetData>"#;
    Xlsx::new().sheet("Sheet1", body).styles(BORDER_STYLES).write()
}

#[test]
fn outer_and_inner_borders_are_checked_edge_by_edge() {
    let path = bordered_book();
    let outer = run(&path, "SetOuterBorderStyle", &[("CellRange", "A1:B2"), ("BorderStyle", "单实线")]);
    assert!(outer.is_correct, "{}", outer.details);
    assert!(run(&path, "SetInnerBorderStyle", &[("CellRange", "A1:B2"), ("BorderStyle", "thin")]).is_correct);
    assert!(run(&path, "SetOuterBorderColor", &[("CellRange", "A1:B2"), ("BorderColor", "红色")]).is_correct);
    assert!(run(&path, "SetInnerBorderColor", &[("CellRange", "A1:B2"), ("BorderColor", "#FF0000")]).is_correct);

    assert!(!run(&path, "SetOuterBorderStyle", &[("CellRange", "A1:B2"), ("BorderStyle", "双线")]).is_correct);
    assert!(!run(&path, "SetOuterBorderStyle", &[("CellRange", "A1:C2"), ("BorderStyle", "thin")]).is_correct);
    assert!(!run(&path, "SetOuterBorderColor", &[("CellRange", "A1:B2"), ("BorderColor", "蓝色")]).is_correct);
}

#[test]
fn cell_border_needs_every_edge() {
    let path = bordered_book();
    let all = run(&path, "SetCellBorder", &[("CellRange", "A1:B2"), ("BorderStyle", "thin"), ("BorderColor", "FF0000")]);
    assert!(all.is_correct, "{}", all.details);
    assert!(!run(&path, "SetCellBorder", &[("CellRange", "C1")]).is_correct);
}

#[test]
fn oversized_border_ranges_fail_detection() {
    let path = bordered_book();
    let result = run(&path, "SetOuterBorderStyle", &[("CellRange", "A1:Z1000"), ("BorderStyle", "thin")]);
    assert!(!result.is_correct);
    let message = result.error_message.expect("error message");
    assert!(message.starts_with("detection failed"), "{message}");
}

#[test]
fn fill_and_pattern_follow_the_fill_record() {
    let path = bordered_book();
    let fill = run(&path, "SetCellFillColor", &[("CellRange", "A1:B2"), ("FillColor", "黄色")]);
    assert!(fill.is_correct, "{}", fill.details);
    assert!(run(&path, "SetCellBackgroundColor", &[("CellRange", "A1"), ("BackgroundColor", "#FFFF00")]).is_correct);
    assert!(!run(&path, "SetCellFillColor", &[("CellRange", "C1"), ("FillColor", "yellow")]).is_correct);

    assert!(run(&path, "SetPatternFillStyle", &[("CellRange", "C1"), ("PatternStyle", "25% 灰色")]).is_correct);
    assert!(!run(&path, "SetPatternFillStyle", &[("CellRange", "A1"), ("PatternStyle", "lightGray")]).is_correct);
    assert!(run(&path, "SetPatternFillColor", &[("CellRange", "C1"), ("PatternColor", "0070C0")]).is_correct);
    assert!(!run(&path, "SetPatternFillColor", &[("CellRange", "C1"), ("PatternColor", "红色")]).is_correct);
}

#[test]
fn conditional_format_matches_rule_value_and_preset() {
    let body = format!(
        r#"{}<conditionalFormatting sqref="B2:B5"><cfRule type="cellIs" dxfId="0" priority="1" operator="greaterThan"><formula>100</formula></cfRule></conditionalFormatting>"#,
        sheet_data(&[("B2", "90"), ("B3", "120")])
    );
    let path = Xlsx::new().sheet("Sheet1", &body).styles(BORDER_STYLES).write();

    let result = run(
        &path,
        "SetConditionalFormatting",
        &[
            ("CellRange", "B2:B5"),
            ("ConditionType", "突出显示单元格规则"),
            ("ConditionValue", "100"),
            ("FormatStyle", "浅红填充色深红色文本"),
        ],
    );
    assert!(result.is_correct, "{}", result.details);
    assert!(run(&path, "ConditionalFormat", &[]).is_correct);
    assert!(!run(&path, "ConditionalFormat", &[("ConditionValue", "200")]).is_correct);
    assert!(!run(&path, "ConditionalFormat", &[("CellRange", "D1:D5")]).is_correct);
    assert!(!run(&path, "ConditionalFormat", &[("FormatStyle", "绿填充色深绿色文本")]).is_correct);
}

#[test]
fn data_validation_type_and_source() {
    let body = format!(
        r#"{}<dataValidations count="1"><dataValidation type="list" allowBlank="1" sqref="C2:C10"><formula1>"Yes,No"</formula1></dataValidation></dataValidations>"#,
        sheet_data(&[("C1", "Approved")])
    );
    let path = Xlsx::new().sheet("Sheet1", &body).write();

    let result = run(
        &path,
        "SetDataValidation",
        &[("CellRange", "C2:C10"), ("ValidationType", "序列"), ("ValidationValue", "Yes,No")],
    );
    assert!(result.is_correct, "{}", result.details);
    assert!(!run(&path, "SetDataValidation", &[("ValidationType", "whole")]).is_correct);
    assert!(!run(&path, "SetDataValidation", &[("ValidationValue", "Yes,No,Maybe")]).is_correct);

    let plain = Xlsx::new().sheet("Sheet1", &sheet_data(&[("A1", "x")])).write();
    assert!(!run(&plain, "SetDataValidation", &[]).is_correct);
}

#[test]
fn pivot_table_fields_function_and_location() {
    let table = r#"<location ref="H3:I6" firstHeaderRow="1" firstDataRow="1" firstDataCol="1"/><rowFields count="1"><field x="1"/></rowFields><dataFields count="1"><dataField name="Sum of Sales" fld="2" baseField="0" baseItem="0"/></dataFields>"#;
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "Name"), ("B1", "Region"), ("C1", "Sales")]))
        .pivot(0, table, &["Name", "Region", "Sales"])
        .write();

    let result = run(
        &path,
        "CreatePivotTable",
        &[
            ("PivotRowFields", "Region"),
            ("PivotDataField", "Sales"),
            ("PivotFunction", "求和"),
            ("PivotInsertCell", "H3"),
        ],
    );
    assert!(result.is_correct, "{}", result.details);
    assert!(run(&path, "PivotTable", &[]).is_correct);
    assert!(!run(&path, "PivotTable", &[("PivotFunction", "average")]).is_correct);
    assert!(!run(&path, "PivotTable", &[("PivotColumnFields", "Region")]).is_correct);
    assert!(!run(&path, "PivotTable", &[("PivotInsertCell", "A20")]).is_correct);

    let plain = Xlsx::new().sheet("Sheet1", &sheet_data(&[("A1", "x")])).write();
    assert!(!run(&plain, "CreatePivotTable", &[]).is_correct);
}

#[test]
fn subtotal_formulas_and_grouping() {
    let body = r#"<sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Region</t></is></c><c r="C1" t="inlineStr"><is><t>Sales</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>East</t></is></c><c r="C2"><v>10</v></c></row><row r="3"><c r="A3" t="inlineStr"><is><t>East 汇总</t></is></c><c r="C3"><f>SUBTOTAL(9,C2:C2)</f><v>10</v></c></row></sheetData>"#;
    let path = Xlsx::new().sheet("Sheet1", body).write();

    let result = run(
        &path,
        "Subtotal",
        &[("SummaryFunction", "求和"), ("SummaryColumn", "C"), ("GroupByColumn", "A")],
    );
    assert!(result.is_correct, "{}", result.details);
    assert!(!run(&path, "Subtotal", &[("SummaryFunction", "average")]).is_correct);
    assert!(!run(&path, "Subtotal", &[("SummaryColumn", "B")]).is_correct);
}

#[test]
fn advanced_filter_criteria_and_ranges() {
    let path = Xlsx::new()
        .sheet("Sheet1", &sheet_data(&[("A1", "Name"), ("B1", "Region"), ("E1", "Region"), ("E2", "East")]))
        .defined_names(
            r#"<definedName name="_xlnm._FilterDatabase" localSheetId="0" hidden="1">Sheet1!$A$1:$C$5</definedName><definedName name="_xlnm.Criteria" localSheetId="0">Sheet1!$E$1:$E$2</definedName><definedName name="_xlnm.Extract" localSheetId="0">Sheet1!$G$1:$I$1</definedName>"#,
        )
        .write();

    let condition = run(
        &path,
        "AdvancedFilterCondition",
        &[("ConditionRange", "E1:E2"), ("FilterField", "region"), ("FilterValue", "East")],
    );
    assert!(condition.is_correct, "{}", condition.details);
    assert!(!run(&path, "AdvancedFilterCondition", &[("ConditionRange", "E1:E2"), ("FilterField", "Region"), ("FilterValue", "West")]).is_correct);

    let data = run(
        &path,
        "AdvancedFilterData",
        &[("DataRange", "A1:C5"), ("CriteriaRange", "$E$1:$E$2"), ("CopyToRange", "G1")],
    );
    assert!(data.is_correct, "{}", data.details);
    assert!(!run(&path, "AdvancedFilterData", &[("DataRange", "A1:C5"), ("CriteriaRange", "E1:E2"), ("CopyToRange", "H1")]).is_correct);
    assert!(!run(&path, "AdvancedFilterData", &[("DataRange", "A1:D5"), ("CriteriaRange", "E1:E2")]).is_correct);
}

#[test]
fn row_heights_and_column_widths() {
    let body = r#"<sheetFormatPr defaultRowHeight="15"/><cols><col min="2" max="3" width="20.7109375" customWidth="1"/></cols><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="2" ht="30" customHeight="1"><c r="A2"><v>2</v></c></row></sheetData>"#;
    let path = Xlsx::new().sheet("Sheet1", body).write();

    assert!(run(&path, "SetRowHeight", &[("RowNumbers", "2"), ("RowHeight", "30")]).is_correct);
    assert!(!run(&path, "SetRowHeight", &[("RowNumbers", "1,2"), ("RowHeight", "30")]).is_correct);
    assert!(run(&path, "SetColumnWidth", &[("ColumnLetters", "B,C"), ("ColumnWidth", "20")]).is_correct);
    assert!(!run(&path, "SetColumnWidth", &[("ColumnLetters", "A"), ("ColumnWidth", "20")]).is_correct);
}

#[test]
fn page_setup_reads_margins_in_centimetres() {
    let body = r#"<sheetData/><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/><pageSetup paperSize="9" orientation="landscape" scale="80"/>"#;
    let path = Xlsx::new().sheet("Sheet1", body).write();

    let result = run(
        &path,
        "SetPageSetup",
        &[("Orientation", "横向"), ("PaperSize", "A4"), ("Scale", "80%"), ("TopMargin", "1.9")],
    );
    assert!(result.is_correct, "{}", result.details);
    assert!(!run(&path, "SetPageSetup", &[("PaperSize", "Letter")]).is_correct);
    assert!(!run(&path, "SetPageSetup", &[("LeftMargin", "2.5")]).is_correct);
    assert!(!run(&path, "SetPageSetup", &[("Orientation", "portrait")]).is_correct);
}

#[test]
fn header_footer_text_ignores_format_codes() {
    let body = r#"<sheetData/><headerFooter><oddHeader>&amp;C&amp;"宋体,加粗"Quarterly Report</oddHeader><oddFooter>&amp;RPage &amp;P</oddFooter></headerFooter>"#;
    let path = Xlsx::new().sheet("Sheet1", body).write();

    let result = run(&path, "SetHeaderFooter", &[("HeaderText", "quarterly report"), ("FooterText", "Page")]);
    assert!(result.is_correct, "{}", result.details);
    assert!(!run(&path, "SetHeaderFooter", &[("HeaderText", "Annual")]).is_correct);
    let missing = run(&path, "SetHeaderFooter", &[]);
    assert!(missing.error_message.is_some_and(|m| m.starts_with("missing or invalid parameter")));
}

#[test]
fn worksheet_protection_and_password() {
    let locked = Xlsx::new()
        .sheet("Sheet1", r#"<sheetData/><sheetProtection sheet="1" objects="1" scenarios="1" password="CC3D"/>"#)
        .write();
    assert!(run(&locked, "SetWorksheetProtection", &[]).is_correct);
    assert!(run(&locked, "SetWorksheetProtection", &[("HasPassword", "是")]).is_correct);
    assert!(!run(&locked, "SetWorksheetProtection", &[("HasPassword", "false")]).is_correct);

    let open = Xlsx::new().sheet("Sheet1", &sheet_data(&[("A1", "x")])).write();
    assert!(!run(&open, "SetWorksheetProtection", &[]).is_correct);
}
