#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Read-only view over a word-processing package and the extractors that
//! resolve effective run and paragraph formatting.

/// Drawing (picture, shape, text box) accessors.
pub mod drawing;
/// Tag registry, keyword mapping, and the rule handlers.
pub mod rules;

use std::path::Path;

use crate::{
    config::ScoringConfig,
    error::{Extracted, ScoringError},
    grade::vocab::FontFlags,
    ooxml::{Package, XmlNode, eighth_pt_to_pt, half_pt_to_pt, is_on, rel, twips_to_pt},
};

/// Conventional name of the main document part.
const MAIN_PART: &str = "word/document.xml";
/// Elements whose subtrees are not part of the surrounding text flow.
const DETACHED: &[&str] = &["txbxContent", "Fallback", "footnote", "endnote"];
/// Width of one character in twips when no font size is known (10.5pt).
const DEFAULT_CHAR_TWIPS: f64 = 210.0;

/// An opened `.docx` package.
#[derive(Debug)]
pub struct WordDocument {
    /// the underlying package
    package:   Package,
    /// name of the main document part
    main_part: String,
    /// root element of the main document part
    document:  XmlNode,
    /// tolerance for measurement-like comparisons
    tolerance: f64,
}

impl WordDocument {
    /// Opens and validates a word-processing document.
    pub fn open(path: &Path, cfg: &ScoringConfig) -> Result<Self, ScoringError> {
        let package = Package::open(path, cfg.max_package_bytes())?;
        Self::from_package(package, cfg.error_tolerance())
    }

    /// Validates an already unpacked package.
    pub fn from_package(package: Package, tolerance: f64) -> Result<Self, ScoringError> {
        let main_part = package.main_part(MAIN_PART)?;
        let bytes = package.bytes(&main_part).ok_or_else(|| {
            ScoringError::DocumentUnavailable(format!("missing main part {main_part}"))
        })?;
        let document = XmlNode::parse(bytes).map_err(|e| {
            ScoringError::DocumentUnavailable(format!("{main_part} is malformed: {e:#}"))
        })?;
        if !document.is("document") || document.child("body").is_none() {
            return Err(ScoringError::DocumentUnavailable(format!(
                "{main_part} is not a word-processing document body"
            )));
        }
        Ok(Self {
            package,
            main_part,
            document,
            tolerance,
        })
    }

    /// The underlying package.
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Tolerance for measurement-like comparisons.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Root `w:document` element.
    pub fn document(&self) -> &XmlNode {
        &self.document
    }

    /// The `w:body` element (validated at open).
    pub fn body(&self) -> &XmlNode {
        self.document.child("body").unwrap_or(&self.document)
    }

    /// Body paragraphs in document order, including those in table cells
    /// but not those in text boxes.
    pub fn paragraphs(&self) -> Vec<&XmlNode> {
        collect(self.body(), "p")
    }

    /// Body tables in document order, nested tables included.
    pub fn tables(&self) -> Vec<&XmlNode> {
        collect(self.body(), "tbl")
    }

    /// Paragraph text in reading order, i.e. its `w:t` runs with tabs.
    pub fn paragraph_text(p: &XmlNode) -> String {
        let mut out = String::new();
        walk(p, &mut |n| {
            if n.is("t") {
                out.push_str(n.text());
            } else if n.is("tab") && n.attr("pos").is_none() {
                out.push('\t');
            }
        });
        out
    }

    /// Text of every body paragraph, one per line.
    pub fn body_text(&self) -> String {
        self.paragraphs()
            .into_iter()
            .map(Self::paragraph_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Runs of a paragraph (through hyperlinks, insertions, smart tags),
    /// excluding text-box content.
    pub fn runs(p: &XmlNode) -> Vec<&XmlNode> {
        collect(p, "r")
    }

    /// Runs of a paragraph that carry visible text.
    pub fn text_runs(p: &XmlNode) -> Vec<&XmlNode> {
        Self::runs(p)
            .into_iter()
            .filter(|r| r.children_named("t").any(|t| !t.text().trim().is_empty()))
            .collect()
    }

    /// A part related to the main document by relationship type, falling
    /// back to its conventional name.
    fn related_part(&self, suffix: &str, fallback: &str) -> Extracted<&XmlNode> {
        let target = self
            .package
            .related(&self.main_part, suffix)?
            .into_iter()
            .next()
            .unwrap_or_else(|| fallback.to_string());
        self.package.xml(&target)
    }

    /// Style definitions.
    pub fn styles(&self) -> Extracted<&XmlNode> {
        self.related_part("styles", "word/styles.xml")
    }

    /// Numbering definitions.
    pub fn numbering(&self) -> Extracted<&XmlNode> {
        self.related_part("numbering", "word/numbering.xml")
    }

    /// Document settings.
    pub fn settings(&self) -> Extracted<&XmlNode> {
        self.related_part("settings", "word/settings.xml")
    }

    /// Footnotes part.
    pub fn footnotes(&self) -> Extracted<&XmlNode> {
        self.related_part("footnotes", "word/footnotes.xml")
    }

    /// Endnotes part.
    pub fn endnotes(&self) -> Extracted<&XmlNode> {
        self.related_part("endnotes", "word/endnotes.xml")
    }

    /// Comments part.
    pub fn comments(&self) -> Extracted<&XmlNode> {
        self.related_part("comments", "word/comments.xml")
    }

    /// Relationships of the main part.
    pub fn main_relationships(&self) -> Result<Vec<crate::ooxml::Relationship>, ScoringError> {
        self.package.relationships(&self.main_part)
    }

    /// Section properties in document order; the body-level one (governing
    /// the last section) comes last.
    pub fn sections(&self) -> Vec<&XmlNode> {
        let mut out: Vec<&XmlNode> = self
            .paragraphs()
            .into_iter()
            .filter_map(|p| p.path(&["pPr", "sectPr"]))
            .collect();
        out.extend(self.body().child("sectPr"));
        out
    }

    /// Root elements of every header part.
    pub fn headers(&self) -> Result<Vec<&XmlNode>, ScoringError> {
        self.story_parts(rel::HEADER)
    }

    /// Root elements of every footer part.
    pub fn footers(&self) -> Result<Vec<&XmlNode>, ScoringError> {
        self.story_parts(rel::FOOTER)
    }

    /// Parsed parts related to the main document by type.
    fn story_parts(&self, suffix: &str) -> Result<Vec<&XmlNode>, ScoringError> {
        let mut out = Vec::new();
        for target in self.package.related(&self.main_part, suffix)? {
            if let Some(root) = self.package.xml(&target)? {
                out.push(root);
            }
        }
        Ok(out)
    }

    /// A style definition by id.
    pub fn style(&self, id: &str) -> Extracted<&XmlNode> {
        Ok(self.styles()?.and_then(|styles| {
            styles
                .children_named("style")
                .find(|s| s.attr("styleId") == Some(id))
        }))
    }

    /// Display name (`w:name`) of a style id.
    pub fn style_name(&self, id: &str) -> Extracted<String> {
        Ok(self
            .style(id)?
            .and_then(|s| s.child("name"))
            .and_then(XmlNode::val)
            .map(str::to_string))
    }

    /// Style ids from the root ancestor down to `id`, following `basedOn`.
    fn style_chain(&self, id: &str) -> Result<Vec<&XmlNode>, ScoringError> {
        let mut chain = Vec::new();
        let mut next = Some(id.to_string());
        while let Some(current) = next.take() {
            if chain.len() >= 16 {
                break;
            }
            let Some(style) = self.style(&current)? else {
                break;
            };
            next = style
                .child("basedOn")
                .and_then(XmlNode::val)
                .map(str::to_string);
            chain.push(style);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Id of the default paragraph style.
    fn default_paragraph_style(&self) -> Extracted<String> {
        Ok(self.styles()?.and_then(|styles| {
            styles
                .children_named("style")
                .find(|s| s.attr("type") == Some("paragraph") && is_on_attr(s.attr("default")))
                .and_then(|s| s.attr("styleId"))
                .map(str::to_string)
        }))
    }

    /// Paragraph style id in effect for `p`.
    fn paragraph_style_id(&self, p: &XmlNode) -> Extracted<String> {
        match p.path(&["pPr", "pStyle"]).and_then(XmlNode::val) {
            Some(id) => Ok(Some(id.to_string())),
            None => self.default_paragraph_style(),
        }
    }

    /// Effective run formatting: document defaults, then the paragraph
    /// style chain, then the character style chain, then direct formatting.
    pub fn run_props(&self, p: &XmlNode, r: &XmlNode) -> Result<RunProps, ScoringError> {
        let mut props = RunProps::default();
        if let Some(defaults) = self
            .styles()?
            .and_then(|s| s.path(&["docDefaults", "rPrDefault", "rPr"]))
        {
            props.merge(defaults);
        }
        if let Some(id) = self.paragraph_style_id(p)? {
            for style in self.style_chain(&id)? {
                if let Some(rpr) = style.child("rPr") {
                    props.merge(rpr);
                }
            }
        }
        if let Some(id) = r.path(&["rPr", "rStyle"]).and_then(XmlNode::val) {
            for style in self.style_chain(id)? {
                if let Some(rpr) = style.child("rPr") {
                    props.merge(rpr);
                }
            }
        }
        if let Some(rpr) = r.child("rPr") {
            props.merge(rpr);
        }
        Ok(props)
    }

    /// Effective formatting of each visible run of `p`; a paragraph without
    /// visible runs reports its paragraph-mark formatting instead.
    pub fn paragraph_run_props(&self, p: &XmlNode) -> Result<Vec<RunProps>, ScoringError> {
        let runs = Self::text_runs(p);
        if runs.is_empty() {
            let mut props = self.run_props(p, &XmlNode::default())?;
            if let Some(mark) = p.path(&["pPr", "rPr"]) {
                props.merge(mark);
            }
            return Ok(vec![props]);
        }
        runs.into_iter().map(|r| self.run_props(p, r)).collect()
    }

    /// Effective paragraph formatting: document defaults, the style chain,
    /// then direct formatting.
    pub fn para_props(&self, p: &XmlNode) -> Result<ParaProps, ScoringError> {
        let mut props = ParaProps::default();
        if let Some(defaults) = self
            .styles()?
            .and_then(|s| s.path(&["docDefaults", "pPrDefault", "pPr"]))
        {
            props.merge(defaults);
        }
        if let Some(id) = self.paragraph_style_id(p)? {
            for style in self.style_chain(&id)? {
                if let Some(ppr) = style.child("pPr") {
                    props.merge(ppr);
                }
            }
            props.style_id = Some(id);
        }
        if let Some(ppr) = p.child("pPr") {
            props.merge(ppr);
        }
        Ok(props)
    }

    /// Character width in twips for indentation maths, from the paragraph's
    /// first visible run.
    pub fn char_width_twips(&self, p: &XmlNode) -> Result<f64, ScoringError> {
        Ok(self
            .paragraph_run_props(p)?
            .first()
            .and_then(|r| r.size)
            .map_or(DEFAULT_CHAR_TWIPS, |pt| pt * 20.0))
    }

    /// Number format of a list level: (`numFmt`, `multiLevelType`).
    pub fn list_format(&self, num_id: &str, ilvl: i64) -> Extracted<(String, String)> {
        let Some(numbering) = self.numbering()? else {
            return Ok(None);
        };
        let Some(abstract_id) = numbering
            .children_named("num")
            .find(|n| n.attr("numId") == Some(num_id))
            .and_then(|n| n.child("abstractNumId"))
            .and_then(XmlNode::val)
        else {
            return Ok(None);
        };
        let Some(abs) = numbering
            .children_named("abstractNum")
            .find(|a| a.attr("abstractNumId") == Some(abstract_id))
        else {
            return Ok(None);
        };
        let multi = abs
            .child("multiLevelType")
            .and_then(XmlNode::val)
            .unwrap_or("singleLevel")
            .to_string();
        let level = ilvl.to_string();
        let fmt = abs
            .children_named("lvl")
            .find(|l| l.attr("ilvl") == Some(level.as_str()))
            .and_then(|l| l.child("numFmt"))
            .and_then(XmlNode::val)
            .unwrap_or("decimal")
            .to_string();
        Ok(Some((fmt, multi)))
    }
}

/// Whether an `on/off` attribute value is set.
fn is_on_attr(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "on"))
}

/// Visits `node`'s descendants in document order, skipping detached
/// subtrees (text boxes, fallback content).
fn walk<'a>(node: &'a XmlNode, f: &mut dyn FnMut(&'a XmlNode)) {
    let mut pending: Vec<&'a XmlNode> = node.children().iter().rev().collect();
    while let Some(next) = pending.pop() {
        if DETACHED.contains(&next.local_name()) {
            continue;
        }
        f(next);
        pending.extend(next.children().iter().rev());
    }
}

/// Descendants of `node` with the given local name, skipping detached
/// subtrees.
pub fn collect<'a>(node: &'a XmlNode, local_name: &str) -> Vec<&'a XmlNode> {
    let mut out = Vec::new();
    walk(node, &mut |n| {
        if n.is(local_name) {
            out.push(n);
        }
    });
    out
}

/// Text of every `w:t` under `node`, text boxes included.
pub fn all_text(node: &XmlNode) -> String {
    node.find_all("t").map(XmlNode::text).collect()
}

/// Effective character formatting of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    /// `w:rFonts/@ascii`
    pub ascii:     Option<String>,
    /// `w:rFonts/@hAnsi`
    pub h_ansi:    Option<String>,
    /// `w:rFonts/@eastAsia`
    pub east_asia: Option<String>,
    /// size in points
    pub size:      Option<f64>,
    /// bold
    pub bold:      bool,
    /// italic
    pub italic:    bool,
    /// any underline other than `none`
    pub underline: bool,
    /// single or double strike-through
    pub strike:    bool,
    /// `w:color/@val`
    pub color:     Option<String>,
    /// character spacing in points
    pub spacing:   Option<f64>,
}

impl RunProps {
    /// Overlays the properties set in one `w:rPr`.
    pub fn merge(&mut self, rpr: &XmlNode) {
        if let Some(fonts) = rpr.child("rFonts") {
            let set = |slot: &mut Option<String>, key: &str| {
                if let Some(v) = fonts.attr(key) {
                    *slot = Some(v.to_string());
                }
            };
            set(&mut self.ascii, "ascii");
            set(&mut self.h_ansi, "hAnsi");
            set(&mut self.east_asia, "eastAsia");
        }
        if let Some(sz) = rpr.child("sz").and_then(|n| n.attr_f64("val")) {
            self.size = Some(half_pt_to_pt(sz));
        }
        if let Some(b) = rpr.child("b") {
            self.bold = is_on(Some(b));
        }
        if let Some(i) = rpr.child("i") {
            self.italic = is_on(Some(i));
        }
        if let Some(u) = rpr.child("u") {
            self.underline = u.val().is_some_and(|v| v != "none");
        }
        if let Some(s) = rpr.child("strike").or_else(|| rpr.child("dstrike")) {
            self.strike = is_on(Some(s));
        }
        if let Some(c) = rpr.child("color").and_then(XmlNode::val) {
            self.color = Some(c.to_string());
        }
        if let Some(sp) = rpr.child("spacing").and_then(|n| n.attr_f64("val")) {
            self.spacing = Some(twips_to_pt(sp));
        }
    }

    /// Every font name the run may render with.
    pub fn fonts(&self) -> Vec<&str> {
        [&self.east_asia, &self.ascii, &self.h_ansi]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Whether any of the run's fonts is `name`.
    pub fn has_font(&self, name: &str) -> bool {
        self.fonts()
            .iter()
            .any(|f| crate::grade::text_equals(Some(f), Some(name)))
    }

    /// Fonts as a single description.
    pub fn font_display(&self) -> String {
        let mut fonts = self.fonts();
        fonts.dedup();
        fonts.join("/")
    }

    /// Style flags.
    pub fn flags(&self) -> FontFlags {
        FontFlags {
            bold:      self.bold,
            italic:    self.italic,
            underline: self.underline,
            strike:    self.strike,
        }
    }
}

/// One side of a paragraph or page border.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Border {
    /// `top`, `left`, `bottom`, `right`, ...
    pub side:  String,
    /// line style (`w:val`)
    pub style: String,
    /// width in points
    pub width: Option<f64>,
    /// colour (`w:color`)
    pub color: Option<String>,
}

impl Border {
    /// Reads the border sides under a `w:pBdr`, `w:pgBorders` or
    /// `w:tblBorders` element.
    pub fn read_all(container: &XmlNode) -> Vec<Border> {
        container
            .children()
            .iter()
            .map(|side| Border {
                side:  side.local_name().to_string(),
                style: side.val().unwrap_or("none").to_string(),
                width: side.attr_f64("sz").map(eighth_pt_to_pt),
                color: side.attr("color").map(str::to_string),
            })
            .filter(|b| b.style != "none" && b.style != "nil")
            .collect()
    }
}

/// Effective paragraph formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParaProps {
    /// paragraph style id
    pub style_id:          Option<String>,
    /// `w:jc/@val`
    pub alignment:         Option<String>,
    /// space before, points
    pub space_before:      Option<f64>,
    /// space after, points
    pub space_after:       Option<f64>,
    /// `w:spacing/@line`
    pub line:              Option<f64>,
    /// `w:spacing/@lineRule`
    pub line_rule:         Option<String>,
    /// first-line indent in hundredths of a character
    pub first_line_chars:  Option<f64>,
    /// first-line indent in twips (negative when hanging)
    pub first_line:        Option<f64>,
    /// left indent in hundredths of a character
    pub left_chars:        Option<f64>,
    /// left indent in twips
    pub left:              Option<f64>,
    /// right indent in hundredths of a character
    pub right_chars:       Option<f64>,
    /// right indent in twips
    pub right:             Option<f64>,
    /// list membership: (`numId`, `ilvl`)
    pub numbering:         Option<(String, i64)>,
    /// border sides
    pub borders:           Vec<Border>,
    /// shading fill colour
    pub shading_fill:      Option<String>,
    /// shading pattern (`w:shd/@val`)
    pub shading_pattern:   Option<String>,
    /// drop cap mode from `w:framePr/@dropCap`
    pub drop_cap:          Option<String>,
    /// `w:pageBreakBefore`
    pub page_break_before: bool,
}

impl ParaProps {
    /// Overlays the properties set in one `w:pPr`.
    pub fn merge(&mut self, ppr: &XmlNode) {
        if let Some(jc) = ppr.child("jc").and_then(XmlNode::val) {
            self.alignment = Some(jc.to_string());
        }
        if let Some(sp) = ppr.child("spacing") {
            if let Some(v) = sp.attr_f64("before") {
                self.space_before = Some(twips_to_pt(v));
            }
            if let Some(v) = sp.attr_f64("beforeLines") {
                self.space_before.get_or_insert(v / 100.0 * 12.0);
            }
            if let Some(v) = sp.attr_f64("after") {
                self.space_after = Some(twips_to_pt(v));
            }
            if let Some(v) = sp.attr_f64("afterLines") {
                self.space_after.get_or_insert(v / 100.0 * 12.0);
            }
            if let Some(v) = sp.attr_f64("line") {
                self.line = Some(v);
                self.line_rule = Some(sp.attr("lineRule").unwrap_or("auto").to_string());
            }
        }
        if let Some(ind) = ppr.child("ind") {
            let num = |keys: &[&str]| keys.iter().find_map(|k| ind.attr_f64(k));
            if let Some(v) = num(&["firstLineChars"]) {
                self.first_line_chars = Some(v);
            }
            if let Some(v) = num(&["hangingChars"]) {
                self.first_line_chars = Some(-v);
            }
            if let Some(v) = num(&["firstLine"]) {
                self.first_line = Some(v);
            }
            if let Some(v) = num(&["hanging"]) {
                self.first_line = Some(-v);
            }
            if let Some(v) = num(&["leftChars", "startChars"]) {
                self.left_chars = Some(v);
            }
            if let Some(v) = num(&["left", "start"]) {
                self.left = Some(v);
            }
            if let Some(v) = num(&["rightChars", "endChars"]) {
                self.right_chars = Some(v);
            }
            if let Some(v) = num(&["right", "end"]) {
                self.right = Some(v);
            }
        }
        if let Some(num) = ppr.child("numPr") {
            let id = num.child("numId").and_then(XmlNode::val);
            let lvl = num
                .child("ilvl")
                .and_then(|l| l.attr_f64("val"))
                .unwrap_or(0.0) as i64;
            self.numbering = match id {
                Some("0") | None => None,
                Some(id) => Some((id.to_string(), lvl)),
            };
        }
        if let Some(bdr) = ppr.child("pBdr") {
            self.borders = Border::read_all(bdr);
        }
        if let Some(shd) = ppr.child("shd") {
            self.shading_fill = shd.attr("fill").map(str::to_string);
            self.shading_pattern = shd.val().map(str::to_string);
        }
        if let Some(frame) = ppr.child("framePr") {
            self.drop_cap = frame.attr("dropCap").map(str::to_string);
        }
        if let Some(pb) = ppr.child("pageBreakBefore") {
            self.page_break_before = is_on(Some(pb));
        }
    }

    /// Line spacing as (value, unit): a multiple for `auto`, points
    /// otherwise.
    pub fn line_spacing(&self) -> Option<(f64, &'static str)> {
        let line = self.line?;
        match self.line_rule.as_deref() {
            Some("exact") | Some("atLeast") => Some((twips_to_pt(line), "pt")),
            _ => Some((line / 240.0, "x")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_keeps_document_order_and_skips_text_boxes() {
        let xml = br#"<w:body xmlns:w="w"><w:p><w:r><w:t>one</w:t></w:r><w:r><w:txbxContent><w:p><w:r><w:t>boxed</w:t></w:r></w:p></w:txbxContent></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>two</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body>"#;
        let body = XmlNode::parse(xml).expect("parse");
        let texts: Vec<&str> = collect(&body, "t").into_iter().map(XmlNode::text).collect();
        assert_eq!(texts, ["one", "two"]);
        assert_eq!(collect(&body, "p").len(), 2);
        assert_eq!(all_text(&body), "oneboxedtwo");
    }

    #[test]
    fn paragraph_text_walks_runs_and_tabs() {
        let xml = br#"<w:p xmlns:w="w"><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r><w:r><w:t>c</w:t></w:r></w:p>"#;
        let p = XmlNode::parse(xml).expect("parse");
        assert_eq!(WordDocument::paragraph_text(&p), "a\tbc");
    }
}
