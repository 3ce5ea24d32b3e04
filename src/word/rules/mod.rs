#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Word-processing rule handlers and the tag registry.

/// Paragraph layout: alignment, spacing, indentation, borders, lists.
pub mod paragraph;
/// Page setup, headers and footers, watermarks, sections.
pub mod page;
/// Hyperlinks, bookmarks, notes, comments, revisions, protection.
pub mod references;
/// Pictures, auto shapes and text boxes.
pub mod shapes;
/// Tables.
pub mod table;
/// Document text, fonts, styles.
pub mod text;

use itertools::Itertools;
use phf::phf_map;

use super::{ParaProps, RunProps, WordDocument};
use crate::{
    error::ScoringError,
    grade::{Check, Handler, Params, mapping::KeywordRule},
    ooxml::XmlNode,
};

/// Handler signature for word-processing rules.
pub type WordHandler = Handler<WordDocument>;

/// Every supported word-processing tag.
pub static REGISTRY: phf::Map<&'static str, WordHandler> = phf_map! {
    "SetDocumentContent" => text::set_document_content as WordHandler,
    "SetDocumentFont" => text::set_font as WordHandler,
    "SetParagraphFont" => text::set_font as WordHandler,
    "SetFont" => text::set_font as WordHandler,
    "SetFontSize" => text::set_font_size as WordHandler,
    "SetParagraphFontSize" => text::set_font_size as WordHandler,
    "SetSize" => text::set_font_size as WordHandler,
    "SetFontStyle" => text::set_font_style as WordHandler,
    "SetParagraphFontStyle" => text::set_font_style as WordHandler,
    "SetFontColor" => text::set_font_color as WordHandler,
    "SetParagraphTextColor" => text::set_font_color as WordHandler,
    "SetColor" => text::set_font_color as WordHandler,
    "SetParagraphCharacterSpacing" => text::set_character_spacing as WordHandler,
    "SetSpecificTextFontSize" => text::set_specific_text_font_size as WordHandler,
    "FindAndReplace" => text::find_and_replace as WordHandler,
    "ApplyStyle" => text::apply_style as WordHandler,
    "ApplyTemplate" => text::apply_template as WordHandler,

    "SetParagraphAlignment" => paragraph::set_alignment as WordHandler,
    "SetLineSpacing" => paragraph::set_line_spacing as WordHandler,
    "SetParagraphLineSpacing" => paragraph::set_line_spacing as WordHandler,
    "SetParagraphSpacing" => paragraph::set_spacing as WordHandler,
    "SetIndentation" => paragraph::set_indentation as WordHandler,
    "SetParagraphIndentation" => paragraph::set_indentation as WordHandler,
    "SetParagraphDropCap" => paragraph::set_drop_cap as WordHandler,
    "SetParagraphBorderColor" => paragraph::set_border_color as WordHandler,
    "SetParagraphBorderStyle" => paragraph::set_border_style as WordHandler,
    "SetParagraphBorderWidth" => paragraph::set_border_width as WordHandler,
    "SetParagraphShading" => paragraph::set_shading as WordHandler,
    "CreateBulletList" => paragraph::create_bullet_list as WordHandler,
    "CreateNumberedList" => paragraph::create_numbered_list as WordHandler,
    "SetBulletNumbering" => paragraph::set_bullet_numbering as WordHandler,

    "SetPageSize" => page::set_page_size as WordHandler,
    "SetPaperSize" => page::set_page_size as WordHandler,
    "SetPageOrientation" => page::set_orientation as WordHandler,
    "SetPageMargin" => page::set_margins as WordHandler,
    "SetPageMargins" => page::set_margins as WordHandler,
    "SetHeaderFooter" => page::set_header_footer as WordHandler,
    "SetHeaderText" => page::set_header_text as WordHandler,
    "SetHeaderFont" => page::set_header_font as WordHandler,
    "SetHeaderFontSize" => page::set_header_font_size as WordHandler,
    "SetHeaderAlignment" => page::set_header_alignment as WordHandler,
    "SetFooterText" => page::set_footer_text as WordHandler,
    "SetFooterFont" => page::set_footer_font as WordHandler,
    "SetFooterFontSize" => page::set_footer_font_size as WordHandler,
    "SetFooterAlignment" => page::set_footer_alignment as WordHandler,
    "SetPageNumber" => page::set_page_number as WordHandler,
    "SetPageBackground" => page::set_background as WordHandler,
    "SetPageBorder" => page::set_page_border as WordHandler,
    "SetPageBorderColor" => page::set_page_border_color as WordHandler,
    "SetPageBorderStyle" => page::set_page_border_style as WordHandler,
    "SetPageBorderWidth" => page::set_page_border_width as WordHandler,
    "SetWatermark" => page::set_watermark as WordHandler,
    "SetWatermarkText" => page::set_watermark as WordHandler,
    "SetWatermarkFont" => page::set_watermark_font as WordHandler,
    "SetWatermarkFontSize" => page::set_watermark_font_size as WordHandler,
    "SetWatermarkOrientation" => page::set_watermark_orientation as WordHandler,
    "ManageSection" => page::manage_section as WordHandler,
    "InsertPageBreak" => page::insert_page_break as WordHandler,
    "InsertColumnBreak" => page::insert_column_break as WordHandler,

    "InsertTable" => table::insert_table as WordHandler,
    "SetTableStyle" => table::set_style as WordHandler,
    "SetTableBorder" => table::set_border as WordHandler,
    "SetTableRowsColumns" => table::set_rows_columns as WordHandler,
    "SetTableShading" => table::set_shading as WordHandler,
    "SetTableRowHeight" => table::set_row_height as WordHandler,
    "SetTableColumnWidth" => table::set_column_width as WordHandler,
    "SetTableCellContent" => table::set_cell_content as WordHandler,
    "SetTableCellAlignment" => table::set_cell_alignment as WordHandler,
    "SetTableAlignment" => table::set_alignment as WordHandler,
    "MergeTableCells" => table::merge_cells as WordHandler,
    "SetTableHeaderContent" => table::set_header_content as WordHandler,
    "SetTableHeaderAlignment" => table::set_header_alignment as WordHandler,

    "InsertImage" => shapes::insert_image as WordHandler,
    "SetImageSize" => shapes::set_image_size as WordHandler,
    "SetImagePosition" => shapes::set_image_position as WordHandler,
    "SetImageBorderColor" => shapes::set_image_border_color as WordHandler,
    "SetImageBorderWidth" => shapes::set_image_border_width as WordHandler,
    "SetImageBorderCompoundType" => shapes::set_image_border_compound as WordHandler,
    "SetImageBorderDashType" => shapes::set_image_border_dash as WordHandler,
    "SetImageShadow" => shapes::set_image_shadow as WordHandler,
    "SetImageWrapStyle" => shapes::set_image_wrap as WordHandler,
    "InsertAutoShape" => shapes::insert_auto_shape as WordHandler,
    "SetAutoShapeSize" => shapes::set_auto_shape_size as WordHandler,
    "SetAutoShapeLineColor" => shapes::set_auto_shape_line_color as WordHandler,
    "SetAutoShapeFillColor" => shapes::set_auto_shape_fill_color as WordHandler,
    "SetAutoShapeTextSize" => shapes::set_auto_shape_text_size as WordHandler,
    "SetAutoShapeTextColor" => shapes::set_auto_shape_text_color as WordHandler,
    "SetAutoShapeTextContent" => shapes::set_auto_shape_text as WordHandler,
    "SetAutoShapePosition" => shapes::set_auto_shape_position as WordHandler,
    "SetTextBoxBorderColor" => shapes::set_text_box_border_color as WordHandler,
    "SetTextBoxContent" => shapes::set_text_box_content as WordHandler,
    "SetTextBoxTextSize" => shapes::set_text_box_text_size as WordHandler,
    "SetTextBoxPosition" => shapes::set_text_box_position as WordHandler,
    "SetTextBoxWrapStyle" => shapes::set_text_box_wrap as WordHandler,

    "InsertHyperlink" => references::insert_hyperlink as WordHandler,
    "InsertBookmark" => references::insert_bookmark as WordHandler,
    "InsertCrossReference" => references::insert_cross_reference as WordHandler,
    "InsertTableOfContents" => references::insert_table_of_contents as WordHandler,
    "InsertFootnote" => references::insert_footnote as WordHandler,
    "InsertEndnote" => references::insert_endnote as WordHandler,
    "InsertComment" => references::insert_comment as WordHandler,
    "EnableTrackChanges" => references::enable_track_changes as WordHandler,
    "SetDocumentProtection" => references::set_document_protection as WordHandler,
};

/// Name keywords for word-processing points, first match wins.
pub const WORD_KEYWORDS: &[KeywordRule] = &[
    (&["DocumentContent"], "SetDocumentContent"),
    (&["DocumentFont"], "SetDocumentFont"),
    (&["FontStyle"], "SetFontStyle"),
    (&["FontSize"], "SetFontSize"),
    (&["FontColor"], "SetFontColor"),
    (&["ParagraphAlignment"], "SetParagraphAlignment"),
    (&["LineSpacing"], "SetLineSpacing"),
    (&["ParagraphSpacing"], "SetParagraphSpacing"),
    (&["Indent"], "SetIndentation"),
    (&["BulletList"], "CreateBulletList"),
    (&["NumberedList"], "CreateNumberedList"),
    (&["InsertTable"], "InsertTable"),
    (&["TableStyle"], "SetTableStyle"),
    (&["TableBorder"], "SetTableBorder"),
    (&["InsertImage"], "InsertImage"),
    (&["ImagePosition"], "SetImagePosition"),
    (&["ImageSize"], "SetImageSize"),
    (&["HeaderFooter"], "SetHeaderFooter"),
    (&["PageNumber"], "SetPageNumber"),
    (&["PageMargin"], "SetPageMargin"),
    (&["PageOrientation"], "SetPageOrientation"),
    (&["PageSize"], "SetPageSize"),
    (&["Section"], "ManageSection"),
    (&["PageBreak"], "InsertPageBreak"),
    (&["ColumnBreak"], "InsertColumnBreak"),
    (&["Hyperlink"], "InsertHyperlink"),
    (&["Bookmark"], "InsertBookmark"),
    (&["CrossReference"], "InsertCrossReference"),
    (&["TableOfContents"], "InsertTableOfContents"),
    (&["Footnote"], "InsertFootnote"),
    (&["Endnote"], "InsertEndnote"),
    (&["Comment"], "InsertComment"),
    (&["TrackChanges"], "EnableTrackChanges"),
    (&["Protection"], "SetDocumentProtection"),
    (&["Watermark"], "SetWatermark"),
    (&["Background"], "SetPageBackground"),
    (&["Border"], "SetPageBorder"),
    (&["Style"], "ApplyStyle"),
    (&["Template"], "ApplyTemplate"),
];

/// Handler registered for `tag`.
pub fn handler(tag: &str) -> Option<WordHandler> {
    REGISTRY.get(tag).copied()
}

/// Paragraphs a rule applies to: the one named by `ParagraphNumber`, or
/// every body paragraph with visible text.
pub(crate) fn target_paragraphs<'d>(
    doc: &'d WordDocument,
    params: &Params<'_>,
) -> Result<Vec<&'d XmlNode>, ScoringError> {
    let all = doc.paragraphs();
    match params.index("ParagraphNumber", all.len())? {
        Some(i) => Ok(vec![all[i]]),
        None => Ok(all
            .into_iter()
            .filter(|p| !WordDocument::paragraph_text(p).trim().is_empty())
            .collect()),
    }
}

/// Checks a per-run property over the target paragraphs. A paragraph
/// satisfies the rule when every visible run does; the rule passes when any
/// target paragraph does.
pub(crate) fn check_runs(
    doc: &WordDocument,
    params: &Params<'_>,
    what: &str,
    expected: &str,
    value: impl Fn(&RunProps) -> Option<String>,
    matches: impl Fn(&str) -> bool,
) -> Result<Check, ScoringError> {
    let subject = paragraph_subject(params, what);
    let mut observed = Vec::new();
    for p in target_paragraphs(doc, params)? {
        let values: Vec<Option<String>> = doc
            .paragraph_run_props(p)?
            .iter()
            .map(&value)
            .collect();
        let ok = values
            .iter()
            .all(|v| v.as_deref().is_some_and(&matches));
        let shown = values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| "unset".to_string()))
            .unique()
            .join(" | ");
        if ok {
            return Ok(Check::compare(true, subject, expected, shown));
        }
        observed.push(shown);
    }
    if observed.is_empty() {
        return Ok(Check::absent(subject, expected));
    }
    let actual = observed.into_iter().unique().take(8).join(", ");
    Ok(Check::compare(false, subject, expected, actual))
}

/// Checks a per-paragraph property over the target paragraphs; passes when
/// any of them matches.
pub(crate) fn check_paragraphs(
    doc: &WordDocument,
    params: &Params<'_>,
    what: &str,
    expected: &str,
    value: impl Fn(&XmlNode, &ParaProps) -> Result<Option<String>, ScoringError>,
    matches: impl Fn(&str) -> bool,
) -> Result<Check, ScoringError> {
    let mut observed = Vec::new();
    for p in target_paragraphs(doc, params)? {
        let props = doc.para_props(p)?;
        observed.push(value(p, &props)?.unwrap_or_else(|| "unset".to_string()));
    }
    Ok(Check::any(paragraph_subject(params, what), expected, observed, matches))
}

/// Subject line naming the selected paragraph.
pub(crate) fn paragraph_subject(params: &Params<'_>, what: &str) -> String {
    match params.try_get("ParagraphNumber") {
        Some(n) => format!("paragraph {n} {what}"),
        None => format!("any paragraph {what}"),
    }
}
