#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result, bail};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

/// A read-only element tree for a single XML part.
///
/// Only what the extractors need is kept: the qualified element name, its
/// attributes in document order, element children, and the element's own
/// (non-whitespace) text.
#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    /// qualified name as written in the part, e.g. `w:p`
    name:     String,
    /// attributes as (qualified name, unescaped value)
    attrs:    Vec<(String, String)>,
    /// child elements in document order
    children: Vec<XmlNode>,
    /// text directly inside this element
    text:     String,
}

/// Deepest element nesting a part may have. Real parts stay far below it;
/// deeper input is treated as malformed.
pub const MAX_DEPTH: usize = 512;

/// Returns the part of a qualified name after the namespace prefix.
fn local(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, l)| l)
}

impl XmlNode {
    /// Parses a complete XML part into a tree and returns its root element.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlNode> = vec![XmlNode::default()];
        loop {
            match reader
                .read_event()
                .with_context(|| format!("malformed XML near byte {}", reader.buffer_position()))?
            {
                Event::Start(e) => {
                    if stack.len() > MAX_DEPTH {
                        bail!("XML nested deeper than {MAX_DEPTH} elements");
                    }
                    stack.push(Self::from_start(&e)?);
                }
                Event::Empty(e) => {
                    let node = Self::from_start(&e)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Event::End(_) => {
                    let node = match stack.pop() {
                        Some(node) if !stack.is_empty() => node,
                        _ => bail!("unbalanced closing tag"),
                    };
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    if let Some(top) = stack.last_mut() {
                        top.push_text(&text);
                    }
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    if let Some(top) = stack.last_mut() {
                        top.push_text(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            bail!("unexpected end of XML: {} element(s) left open", stack.len() - 1);
        }
        stack
            .pop()
            .and_then(|doc| doc.children.into_iter().next())
            .context("XML part has no root element")
    }

    /// Builds an element (without children) from a start tag.
    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in e.attributes().with_checks(false) {
            let attr = attr.with_context(|| format!("bad attribute on <{name}>"))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Self::default()
        })
    }

    /// Appends character data, dropping formatting whitespace unless the
    /// element is a text run or asks for space preservation.
    fn push_text(&mut self, text: &str) {
        if !text.trim().is_empty()
            || self.local_name() == "t"
            || self.attr("xml:space") == Some("preserve")
        {
            self.text.push_str(text);
        }
    }

    /// Qualified name, e.g. `c:barChart`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix, e.g. `barChart`.
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Whether this element has the given local name.
    pub fn is(&self, local_name: &str) -> bool {
        self.local_name() == local_name
    }

    /// Attribute lookup. An exact qualified-name match wins; otherwise the
    /// first attribute whose local name matches is returned, so `val` finds
    /// `w:val`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .or_else(|| {
                if name.contains(':') {
                    None
                } else {
                    self.attrs.iter().find(|(k, _)| local(k) == name)
                }
            })
            .map(|(_, v)| v.as_str())
    }

    /// Shorthand for the ubiquitous `val` attribute.
    pub fn val(&self) -> Option<&str> {
        self.attr("val")
    }

    /// Parses an attribute as a number.
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|v| v.trim().parse::<f64>().ok())
    }

    /// All attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Text directly inside this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Concatenated text of this element and all of its descendants.
    pub fn inner_text(&self) -> String {
        let mut out = self.text.clone();
        for d in self.descendants() {
            out.push_str(&d.text);
        }
        out
    }

    /// Element children.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First child with the given local name.
    pub fn child(&self, local_name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.is(local_name))
    }

    /// Children with the given local name.
    pub fn children_named<'a>(
        &'a self,
        local_name: &'a str,
    ) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.is(local_name))
    }

    /// Follows a chain of child local names from this element.
    pub fn path(&self, steps: &[&str]) -> Option<&XmlNode> {
        steps
            .iter()
            .try_fold(self, |node, step| node.child(step))
    }

    /// Depth-first, document-order iterator over all descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First descendant with the given local name.
    pub fn find(&self, local_name: &str) -> Option<&XmlNode> {
        self.descendants().find(|d| d.is(local_name))
    }

    /// All descendants with the given local name.
    pub fn find_all<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.descendants().filter(move |d| d.is(local_name))
    }
}

/// Iterator returned by [`XmlNode::descendants`].
pub struct Descendants<'a> {
    /// pending nodes, next one on top
    stack: Vec<&'a XmlNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="urn:w"><w:body>
  <w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve"> Hi &amp; bye</w:t></w:r></w:p>
</w:body></w:document>"#;
        let root = XmlNode::parse(xml).expect("parse");
        assert!(root.is("document"));
        let p = root.find("p").expect("paragraph");
        assert_eq!(p.path(&["pPr", "jc"]).and_then(XmlNode::val), Some("center"));
        assert_eq!(p.inner_text(), " Hi & bye");
        assert_eq!(root.path(&["body"]).map(|b| b.children().len()), Some(1));
    }

    #[test]
    fn rejects_parts_nested_too_deep() {
        let depth = 200_000;
        let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let err = XmlNode::parse(xml.as_bytes()).expect_err("too deep");
        assert!(err.to_string().contains("nested deeper"), "{err}");

        let ok = format!("{}{}", "<a>".repeat(MAX_DEPTH), "</a>".repeat(MAX_DEPTH));
        let root = XmlNode::parse(ok.as_bytes()).expect("parse at the limit");
        assert_eq!(root.descendants().count(), MAX_DEPTH - 1);
    }

    #[test]
    fn rejects_unbalanced_markup() {
        assert!(XmlNode::parse(b"<a><b></a>").is_err());
        assert!(XmlNode::parse(b"<a>").is_err());
    }
}
