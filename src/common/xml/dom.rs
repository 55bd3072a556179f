//! Ordered, mutable XML element tree.
//!
//! Presentation parts are edited structurally: shapes are copied between
//! slides, runs are rewritten, background elements are replaced. This tree
//! keeps element order, attribute order and prefixed names exactly as read so
//! a part can be parsed, edited and written back without disturbing markup
//! it does not touch.
//!
//! Names are kept in their qualified form (`p:sp`, `a:t`). Namespace
//! declarations are ordinary attributes and travel with the element that
//! declares them.

use crate::common::xml::escape_xml;
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// XML declaration written in front of every serialized part.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Errors produced while building a tree from XML text.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed XML: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, DomError>;

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// One XML element with its attributes and children, in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element with a qualified name such as `p:sp`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    /// Builder form of [`set_text`](Self::set_text).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Qualified name, including the prefix.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    #[inline]
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Whether this element has the given qualified name.
    #[inline]
    pub fn is(&self, qname: &str) -> bool {
        self.name == qname
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Look up an attribute by its qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Child elements, skipping text nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given qualified name.
    pub fn child(&self, qname: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(qname))
    }

    pub fn child_mut(&mut self, qname: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.is(qname))
    }

    /// All child elements with the given qualified name.
    pub fn children_named<'a>(&'a self, qname: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |el| el.is(qname))
    }

    /// Follow a path of qualified names from this element.
    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        let mut current = self;
        for name in path {
            current = current.child(name)?;
        }
        Some(current)
    }

    pub fn find_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for name in path {
            current = current.child_mut(name)?;
        }
        Some(current)
    }

    /// Get the named child, appending an empty one if it is missing.
    pub fn ensure_child(&mut self, qname: &str) -> &mut XmlElement {
        let pos = match self.position(qname) {
            Some(pos) => pos,
            None => {
                self.children.push(XmlNode::Element(XmlElement::new(qname)));
                self.children.len() - 1
            },
        };
        match &mut self.children[pos] {
            XmlNode::Element(el) => el,
            XmlNode::Text(_) => unreachable!("position() only matches elements"),
        }
    }

    /// Index in [`children`](Self::children) of the first element with this name.
    pub fn position(&self, qname: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.is(qname)))
    }

    /// Every element below this one, depth first, in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&XmlElement> = self.elements().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// First element below this one matching `pred`, depth first.
    pub fn find_descendant_mut(
        &mut self,
        pred: &dyn Fn(&XmlElement) -> bool,
    ) -> Option<&mut XmlElement> {
        for node in self.children.iter_mut() {
            if let XmlNode::Element(el) = node {
                if pred(el) {
                    return Some(el);
                }
                if let Some(found) = el.find_descendant_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Visit this element and every element below it, depth first.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut XmlElement)) {
        visit(self);
        for el in self.elements_mut() {
            el.walk_mut(visit);
        }
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            if let XmlNode::Text(t) = node {
                out.push_str(t);
            }
        }
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        let text = text.into();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text));
        }
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert a child element at a position in [`children`](Self::children).
    pub fn insert(&mut self, index: usize, child: XmlElement) {
        let index = index.min(self.children.len());
        self.children.insert(index, XmlNode::Element(child));
    }

    /// Append `child` before the first element named `before`, or at the end.
    pub fn insert_before(&mut self, before: &str, child: XmlElement) {
        match self.position(before) {
            Some(pos) => self.insert(pos, child),
            None => self.push(child),
        }
    }

    /// Remove child elements matching `pred`, returning how many were removed.
    pub fn remove_elements(&mut self, pred: impl Fn(&XmlElement) -> bool) -> usize {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(el) if pred(el)));
        before - self.children.len()
    }

    /// Remove and return every child element, keeping text nodes.
    pub fn take_elements(&mut self) -> Vec<XmlElement> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.children.len());
        for node in self.children.drain(..) {
            match node {
                XmlNode::Element(el) => taken.push(el),
                text => kept.push(text),
            }
        }
        self.children = kept;
        taken
    }

    /// Parse a standalone XML fragment or document into its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        parse_bytes(xml.as_bytes())
    }

    /// Parse the bytes of a package part into its root element.
    pub fn parse_bytes(xml: &[u8]) -> Result<Self> {
        parse_bytes(xml)
    }

    /// Serialize this element and its subtree without an XML declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(256);
        self.write_into(&mut out);
        out
    }

    /// Serialize as a complete part: declaration followed by this element.
    pub fn to_document(&self) -> Vec<u8> {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push_str("\r\n");
        self.write_into(&mut out);
        out.into_bytes()
    }

    fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Element(el) => el.write_into(out),
                XmlNode::Text(text) => out.push_str(&escape_xml(text)),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Depth-first iterator returned by [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let len = self.stack.len();
        self.stack.extend(next.elements());
        self.stack[len..].reverse();
        Some(next)
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let raw = std::str::from_utf8(&attr.value)?;
        let value = unescape(raw)?;
        element.attrs.push((key.to_string(), value.into_owned()));
    }
    Ok(element)
}

fn push_text(stack: &mut [XmlElement], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(XmlNode::Text(prev)) = parent.children.last_mut() {
        prev.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push(element);
            Ok(())
        },
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        },
        None => Err(DomError::Malformed("more than one root element".to_string())),
    }
}

fn parse_bytes(xml: &[u8]) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(element_from_start(&e)?),
            Event::Empty(e) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DomError::Malformed("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            },
            Event::Text(t) => {
                let raw = std::str::from_utf8(&t)?;
                // Whitespace between elements is layout, except inside text runs.
                let keep = stack
                    .last()
                    .is_some_and(|parent| parent.local_name() == "t" || !raw.trim().is_empty());
                if keep {
                    let text = unescape(raw)?;
                    push_text(&mut stack, &text);
                }
            },
            Event::CData(c) => {
                let text = std::str::from_utf8(&c)?;
                push_text(&mut stack, text);
            },
            Event::GeneralRef(r) => {
                if let Some(ch) = r.resolve_char_ref()? {
                    let mut tmp = [0u8; 4];
                    push_text(&mut stack, ch.encode_utf8(&mut tmp));
                } else {
                    let name = std::str::from_utf8(&r)?;
                    let resolved = resolve_predefined_entity(name).ok_or_else(|| {
                        DomError::Malformed(format!("unknown entity &{};", name))
                    })?;
                    push_text(&mut stack, resolved);
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(DomError::Malformed("unclosed element".to_string()));
    }
    root.ok_or_else(|| DomError::Malformed("no root element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld>
    <p:spTree>
      <p:sp><p:txBody><a:p><a:r><a:t>Fish &amp; Chips</a:t></a:r><a:r><a:t> </a:t></a:r></a:p></p:txBody></p:sp>
    </p:spTree>
  </p:cSld>
</p:sld>"#;

    #[test]
    fn test_parse_keeps_names_and_attrs() {
        let root = XmlElement::parse(SLIDE).unwrap();
        assert_eq!(root.name(), "p:sld");
        assert_eq!(root.local_name(), "sld");
        assert_eq!(
            root.attr("xmlns:a"),
            Some("http://schemas.openxmlformats.org/drawingml/2006/main")
        );
        let tree = root.find(&["p:cSld", "p:spTree"]).unwrap();
        assert_eq!(tree.elements().count(), 1);
    }

    #[test]
    fn test_entities_and_run_whitespace() {
        let root = XmlElement::parse(SLIDE).unwrap();
        let texts: Vec<String> = root
            .descendants()
            .filter(|el| el.is("a:t"))
            .map(|el| el.text())
            .collect();
        assert_eq!(texts, vec!["Fish & Chips".to_string(), " ".to_string()]);
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let root = XmlElement::parse(SLIDE).unwrap();
        let reparsed = XmlElement::parse_bytes(&root.to_document()).unwrap();
        assert_eq!(root, reparsed);
        assert!(root.to_xml().contains("Fish &amp; Chips"));
    }

    #[test]
    fn test_char_refs() {
        let root = XmlElement::parse("<a:t>caf&#233; &#x263A;</a:t>").unwrap();
        assert_eq!(root.text(), "café ☺");
    }

    #[test]
    fn test_descendants_order() {
        let root = XmlElement::parse("<r><a><b/><c/></a><d/></r>").unwrap();
        let names: Vec<&str> = root.descendants().map(|el| el.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_mutation_helpers() {
        let mut root = XmlElement::parse("<p:spTree><p:sp/><p:extLst/></p:spTree>").unwrap();
        root.insert_before("p:extLst", XmlElement::new("p:pic"));
        let names: Vec<&str> = root.elements().map(|el| el.name()).collect();
        assert_eq!(names, vec!["p:sp", "p:pic", "p:extLst"]);

        assert_eq!(root.remove_elements(|el| el.is("p:sp")), 1);
        root.ensure_child("p:grpSpPr").set_attr("bwMode", "auto");
        root.ensure_child("p:grpSpPr").set_attr("bwMode", "white");
        assert_eq!(root.child("p:grpSpPr").unwrap().attr("bwMode"), Some("white"));
        assert_eq!(root.children_named("p:grpSpPr").count(), 1);
    }

    #[test]
    fn test_find_descendant_mut() {
        let mut root = XmlElement::parse("<r><a><b id=\"1\"/></a><b id=\"2\"/></r>").unwrap();
        let found = root.find_descendant_mut(&|el| el.is("b")).unwrap();
        found.set_attr("id", "9");
        assert!(root.to_xml().contains(r#"<b id="9"/>"#));
        assert!(root.to_xml().contains(r#"<b id="2"/>"#));
    }

    #[test]
    fn test_malformed_input() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<a/><b/>").is_err());
    }
}
