#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{
    grade::vocab::Vocab,
    ooxml::{XmlNode, emu_to_cm, emu_to_pt},
};

/// Preset geometries by authoring label.
pub const SHAPE_TYPES: Vocab = &[
    ("rect", &["矩形", "rectangle"]),
    ("roundRect", &["圆角矩形", "rounded rectangle"]),
    ("ellipse", &["椭圆", "oval"]),
    ("rightArrow", &["右箭头", "箭头: 右"]),
    ("downArrow", &["下箭头", "箭头: 下"]),
    ("leftArrow", &["左箭头", "箭头: 左"]),
    ("upArrow", &["上箭头", "箭头: 上"]),
    ("leftRightArrow", &["双向箭头", "左右箭头", "箭头: 左右"]),
    ("bentArrow", &["折弯箭头", "箭头: 圆角右"]),
    ("chevron", &["尖括号", "箭头: V 形"]),
    ("blockArc", &["块弧形", "空心弧"]),
    ("heart", &["爱心形状", "心形"]),
    ("smileyFace", &["笑脸"]),
    ("star5", &["五角星", "星形: 五角"]),
    ("star16", &["16角星", "星形: 十六角"]),
    ("irregularSeal1", &["爆炸形状1", "爆炸形: 8 pt"]),
    ("irregularSeal2", &["爆炸形状2", "爆炸形: 14 pt"]),
    ("cloud", &["云形状", "云形"]),
];

/// Text wrapping styles.
pub const WRAP_STYLES: Vocab = &[
    ("inline", &["嵌入型", "inlineShape"]),
    ("square", &["四周型", "四周型环绕"]),
    ("tight", &["紧密型", "紧密型环绕"]),
    ("through", &["穿越型", "穿越型环绕"]),
    ("topAndBottom", &["上下型", "上下型环绕"]),
    ("behind", &["衬于文字下方", "behindText"]),
    ("inFront", &["浮于文字上方", "inFrontOfText"]),
];

/// Outline compound types (`a:ln/@cmpd`).
pub const COMPOUND_TYPES: Vocab = &[
    ("sng", &["单线", "single"]),
    ("dbl", &["双线", "double"]),
    ("thickThin", &["由粗到细", "上粗下细"]),
    ("thinThick", &["由细到粗", "上细下粗"]),
    ("tri", &["三线", "triple"]),
];

/// Outline dash types (`a:prstDash/@val`).
pub const DASH_TYPES: Vocab = &[
    ("solid", &["实线"]),
    ("sysDot", &["圆点"]),
    ("sysDash", &["方点"]),
    ("dash", &["短划线"]),
    ("lgDash", &["长划线"]),
    ("dashDot", &["短划线点", "划线-点"]),
    ("lgDashDot", &["长划线点", "长划线-点"]),
    ("lgDashDotDot", &["长划线点点", "长划线-点-点"]),
];

/// Anchor reference frames (`wp:positionH/@relativeFrom`).
pub const RELATIVE_FROM: Vocab = &[
    ("margin", &["页边距"]),
    ("page", &["页面"]),
    ("column", &["栏"]),
    ("character", &["字符"]),
    ("paragraph", &["段落"]),
    ("line", &["行"]),
    ("leftMargin", &["左边距"]),
    ("rightMargin", &["右边距"]),
    ("topMargin", &["上边距"]),
    ("bottomMargin", &["下边距"]),
    ("insideMargin", &["内边距"]),
    ("outsideMargin", &["外边距"]),
];

/// Relative alignments (`wp:align`).
pub const POSITION_ALIGN: Vocab = &[
    ("left", &["左对齐", "靠左"]),
    ("center", &["居中", "居中对齐"]),
    ("right", &["右对齐", "靠右"]),
    ("inside", &["内部"]),
    ("outside", &["外部"]),
    ("top", &["顶端对齐", "顶端"]),
    ("bottom", &["底端对齐", "底端"]),
];

/// Shadow directions by label, as `dir` angles in degrees. Two-character
/// labels come first so `右下` is not read as `右`.
pub const SHADOW_DIRECTIONS: &[(&str, f64)] = &[
    ("右下", 45.0),
    ("右上", 315.0),
    ("左下", 135.0),
    ("左上", 225.0),
    ("右", 0.0),
    ("下", 90.0),
    ("左", 180.0),
    ("上", 270.0),
];

/// Horizontal or vertical anchor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `wp:positionH`
    Horizontal,
    /// `wp:positionV`
    Vertical,
}

/// Anchor position on one axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Position {
    /// reference frame
    pub relative_from: String,
    /// relative alignment, when positioned by alignment
    pub align:         Option<String>,
    /// absolute offset in centimetres, when positioned by offset
    pub offset_cm:     Option<f64>,
}

/// A drop shadow on a drawing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shadow {
    /// `outer`, `inner` or `perspective`
    pub kind:      String,
    /// direction in degrees
    pub direction: f64,
    /// shadow colour, when set as RGB
    pub color:     Option<String>,
}

/// A `wp:inline` or `wp:anchor` drawing.
#[derive(Debug, Clone, Copy)]
pub struct Drawing<'a> {
    /// the `wp:inline` / `wp:anchor` element
    node: &'a XmlNode,
}

/// Every drawing in `root`, the root itself and text-box contents included.
pub fn drawings(root: &XmlNode) -> Vec<Drawing<'_>> {
    std::iter::once(root)
        .chain(root.descendants())
        .filter(|n| n.is("drawing"))
        .flat_map(|d| d.children())
        .filter(|c| c.is("inline") || c.is("anchor"))
        .map(|node| Drawing { node })
        .collect()
}

impl<'a> Drawing<'a> {
    /// Whether the drawing flows with the text.
    pub fn is_inline(&self) -> bool {
        self.node.is("inline")
    }

    /// Whether the drawing holds a picture.
    pub fn is_picture(&self) -> bool {
        self.node.find("pic").is_some()
    }

    /// The word-processing shape element, if any.
    fn shape(&self) -> Option<&'a XmlNode> {
        self.node.find("wsp")
    }

    /// Whether the drawing is a text box.
    pub fn is_text_box(&self) -> bool {
        self.shape()
            .and_then(|s| s.child("cNvSpPr"))
            .is_some_and(|c| matches!(c.attr("txBox"), Some("1" | "true")))
    }

    /// Whether the drawing is an auto shape (a shape that is not a text box).
    pub fn is_auto_shape(&self) -> bool {
        self.shape().is_some() && !self.is_text_box()
    }

    /// Size in points as (width, height).
    pub fn extent_pt(&self) -> Option<(f64, f64)> {
        let ext = self.node.child("extent")?;
        Some((emu_to_pt(ext.attr_f64("cx")?), emu_to_pt(ext.attr_f64("cy")?)))
    }

    /// Wrapping style, one of the [`WRAP_STYLES`] keys.
    pub fn wrap(&self) -> &'static str {
        if self.is_inline() {
            return "inline";
        }
        for (element, style) in [
            ("wrapSquare", "square"),
            ("wrapTight", "tight"),
            ("wrapThrough", "through"),
            ("wrapTopAndBottom", "topAndBottom"),
        ] {
            if self.node.child(element).is_some() {
                return style;
            }
        }
        if matches!(self.node.attr("behindDoc"), Some("1" | "true")) {
            "behind"
        } else {
            "inFront"
        }
    }

    /// Anchor position on one axis; inline drawings have none.
    pub fn position(&self, axis: Axis) -> Option<Position> {
        let element = match axis {
            Axis::Horizontal => "positionH",
            Axis::Vertical => "positionV",
        };
        let pos = self.node.child(element)?;
        Some(Position {
            relative_from: pos.attr("relativeFrom").unwrap_or_default().to_string(),
            align:         pos.child("align").map(|a| a.text().trim().to_string()),
            offset_cm:     pos
                .child("posOffset")
                .and_then(|o| o.text().trim().parse::<f64>().ok())
                .map(emu_to_cm),
        })
    }

    /// An on/off attribute of the anchor element.
    pub fn anchor_flag(&self, name: &str) -> Option<bool> {
        if self.is_inline() {
            return None;
        }
        Some(matches!(self.node.attr(name), Some("1" | "true")))
    }

    /// Whether the drawing moves with its paragraph.
    pub fn moves_with_text(&self) -> Option<bool> {
        self.position(Axis::Vertical)
            .map(|p| matches!(p.relative_from.as_str(), "paragraph" | "line"))
    }

    /// Shape properties (`pic:spPr` or `wps:spPr`).
    fn sp_pr(&self) -> Option<&'a XmlNode> {
        self.node.find("spPr")
    }

    /// Preset geometry name.
    pub fn geometry(&self) -> Option<&'a str> {
        self.sp_pr()?.child("prstGeom")?.attr("prst")
    }

    /// Outline element, when one is drawn.
    fn outline(&self) -> Option<&'a XmlNode> {
        self.sp_pr()?
            .child("ln")
            .filter(|ln| ln.child("noFill").is_none())
    }

    /// Outline colour as RGB.
    pub fn line_color(&self) -> Option<String> {
        self.outline().and_then(solid_rgb)
    }

    /// Outline width in points.
    pub fn line_width_pt(&self) -> Option<f64> {
        self.outline()?.attr_f64("w").map(emu_to_pt)
    }

    /// Outline compound type; `sng` when unset.
    pub fn compound(&self) -> Option<&'a str> {
        self.outline().map(|ln| ln.attr("cmpd").unwrap_or("sng"))
    }

    /// Outline dash type; `solid` when unset.
    pub fn dash(&self) -> Option<&'a str> {
        self.outline()
            .map(|ln| ln.child("prstDash").and_then(XmlNode::val).unwrap_or("solid"))
    }

    /// Solid fill colour as RGB.
    pub fn fill_color(&self) -> Option<String> {
        self.sp_pr().and_then(solid_rgb)
    }

    /// First shadow effect.
    pub fn shadow(&self) -> Option<Shadow> {
        let effects = self.sp_pr()?.child("effectLst")?;
        let (kind, node) = [("outer", "outerShdw"), ("inner", "innerShdw"), ("perspective", "prstShdw")]
            .into_iter()
            .find_map(|(kind, name)| effects.child(name).map(|n| (kind, n)))?;
        Some(Shadow {
            kind:      kind.to_string(),
            direction: node.attr_f64("dir").map_or(0.0, |d| d / 60_000.0),
            color:     node
                .child("srgbClr")
                .and_then(XmlNode::val)
                .map(str::to_string),
        })
    }

    /// Text-box content (`w:txbxContent`), when the drawing carries text.
    pub fn text_content(&self) -> Option<&'a XmlNode> {
        self.node.find("txbxContent")
    }

    /// Visible text inside the drawing.
    pub fn text(&self) -> String {
        self.text_content()
            .map(|c| {
                c.find_all("p")
                    .map(|p| p.find_all("t").map(XmlNode::text).collect::<String>())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

/// RGB of a `a:solidFill` child, following `sysClr/@lastClr`.
fn solid_rgb(parent: &XmlNode) -> Option<String> {
    let fill = parent.child("solidFill")?;
    fill.child("srgbClr")
        .and_then(XmlNode::val)
        .or_else(|| fill.child("sysClr").and_then(|c| c.attr("lastClr")))
        .map(str::to_string)
}

/// Reads a shadow label (`外部右下`, `inner 左上`, `45`) into (kind, angle).
/// `None` for the angle means any direction.
pub fn parse_shadow_label(label: &str) -> (Option<&'static str>, Option<f64>) {
    let lower = label.to_lowercase();
    let kind = if label.contains("内部") || lower.contains("inner") {
        Some("inner")
    } else if label.contains("透视") || lower.contains("perspective") {
        Some("perspective")
    } else if label.contains("外部") || lower.contains("outer") {
        Some("outer")
    } else {
        None
    };
    let angle = SHADOW_DIRECTIONS
        .iter()
        .find(|(name, _)| label.contains(name))
        .map(|(_, deg)| *deg)
        .or_else(|| crate::grade::params::parse_number(label));
    (kind, angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_labels() {
        assert_eq!(parse_shadow_label("外部右下斜偏移"), (Some("outer"), Some(45.0)));
        assert_eq!(parse_shadow_label("内部左上"), (Some("inner"), Some(225.0)));
        assert_eq!(parse_shadow_label("向下偏移"), (None, Some(90.0)));
    }

    #[test]
    fn anchored_drawing_reads_position_and_wrap() {
        let xml = br#"<w:drawing xmlns:w="w" xmlns:wp="wp" xmlns:a="a" xmlns:wps="wps">
<wp:anchor behindDoc="1" locked="1" allowOverlap="1" layoutInCell="1">
<wp:positionH relativeFrom="column"><wp:posOffset>720000</wp:posOffset></wp:positionH>
<wp:positionV relativeFrom="paragraph"><wp:align>top</wp:align></wp:positionV>
<wp:extent cx="1270000" cy="635000"/><wp:wrapNone/>
<a:graphic><a:graphicData><wps:wsp><wps:cNvSpPr/><wps:spPr>
<a:prstGeom prst="star5"/><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill>
<a:ln w="25400" cmpd="dbl"><a:solidFill><a:srgbClr val="0070C0"/></a:solidFill><a:prstDash val="dash"/></a:ln>
</wps:spPr></wps:wsp></a:graphicData></a:graphic></wp:anchor></w:drawing>"#;
        let root = XmlNode::parse(xml).expect("parse");
        let found = drawings(&root);
        assert_eq!(found.len(), 1);
        let d = found[0];
        assert!(d.is_auto_shape());
        assert_eq!(d.wrap(), "behind");
        assert_eq!(d.extent_pt(), Some((100.0, 50.0)));
        assert_eq!(d.geometry(), Some("star5"));
        assert_eq!(d.fill_color().as_deref(), Some("FF0000"));
        assert_eq!(d.line_color().as_deref(), Some("0070C0"));
        assert_eq!(d.line_width_pt(), Some(2.0));
        assert_eq!(d.compound(), Some("dbl"));
        assert_eq!(d.dash(), Some("dash"));
        let h = d.position(Axis::Horizontal).expect("horizontal");
        assert_eq!(h.relative_from, "column");
        assert_eq!(h.offset_cm, Some(2.0));
        assert_eq!(d.moves_with_text(), Some(true));
        assert_eq!(d.anchor_flag("locked"), Some(true));
    }

    #[test]
    fn drawings_nested_in_paragraphs_are_found_in_order() {
        let xml = br#"<w:body xmlns:w="w" xmlns:wp="wp" xmlns:a="a" xmlns:pic="pic">
<w:p><w:r><w:drawing><wp:inline><wp:extent cx="635000" cy="635000"/>
<a:graphic><a:graphicData><pic:pic><pic:spPr/></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>
<w:p><w:r><w:drawing><wp:anchor behindDoc="0"><wp:wrapSquare/></wp:anchor></w:drawing></w:r></w:p></w:body>"#;
        let root = XmlNode::parse(xml).expect("parse");
        let found = drawings(&root);
        assert_eq!(found.len(), 2);
        assert!(found[0].is_inline());
        assert!(found[0].is_picture());
        assert_eq!(found[0].wrap(), "inline");
        assert_eq!(found[0].anchor_flag("locked"), None);
        assert_eq!(found[1].wrap(), "square");
        assert!(found[1].position(Axis::Horizontal).is_none());
    }
}
