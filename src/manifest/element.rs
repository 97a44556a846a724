//! Minimal XML element tree
//!
//! quick-xml events are folded into an owned tree so the manifest walk can
//! look at siblings and ancestors the way a DOM would.

use crate::{IngestError, Result};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Deepest element nesting accepted in a document
pub const MAX_DEPTH: usize = 256;

/// A node below an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element with its attributes and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| malformed(format!("Invalid attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| malformed(format!("Invalid attribute value: {}", e)))?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Self {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        })
    }

    /// Attribute value by qualified name (e.g. `appid`, `xml:lang`)
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn first_child_element(&self) -> Option<&Element> {
        self.child_elements().next()
    }

    /// Concatenated direct text content, trimmed; `None` when blank
    pub fn text(&self) -> Option<String> {
        let mut text = String::new();
        for node in &self.children {
            if let Node::Text(t) = node {
                text.push_str(t);
            }
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn malformed(msg: impl Into<String>) -> IngestError {
    IngestError::MalformedManifest(msg.into())
}

fn push_text(stack: &mut [Element], text: String) {
    // Text outside the root element carries nothing
    if let Some(parent) = stack.last_mut() {
        match parent.children.last_mut() {
            Some(Node::Text(prev)) => prev.push_str(&text),
            _ => parent.children.push(Node::Text(text)),
        }
    }
}

fn close(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(malformed("Extra content at the end of the document")),
    }
    Ok(())
}

/// Parse an XML document into its root element
pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            malformed(format!(
                "Error parsing manifest XML at position {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref e) => {
                if root.is_some() && stack.is_empty() {
                    return Err(malformed("Extra content at the end of the document"));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(malformed(format!(
                        "Elements nested deeper than {} levels",
                        MAX_DEPTH
                    )));
                }
                stack.push(Element::from_start(e)?);
            }
            Event::Empty(ref e) => {
                let element = Element::from_start(e)?;
                close(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed("Unexpected closing tag"))?;
                close(&mut stack, &mut root, element)?;
            }
            Event::Text(ref t) => {
                let raw = std::str::from_utf8(t)
                    .map_err(|e| malformed(format!("Invalid UTF-8 in text: {}", e)))?;
                let text = unescape(raw).map_err(|e| malformed(format!("Invalid text: {}", e)))?;
                push_text(&mut stack, text.into_owned());
            }
            Event::CData(ref c) => {
                let text = std::str::from_utf8(c)
                    .map_err(|e| malformed(format!("Invalid UTF-8 in CDATA: {}", e)))?;
                push_text(&mut stack, text.to_string());
            }
            Event::GeneralRef(ref r) => {
                let name = std::str::from_utf8(r)
                    .map_err(|e| malformed(format!("Invalid UTF-8 in reference: {}", e)))?;
                let entity = format!("&{};", name);
                let resolved = unescape(&entity)
                    .map_err(|e| malformed(format!("Unknown entity {}: {}", entity, e)))?;
                push_text(&mut stack, resolved.into_owned());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed("Premature end of the document"));
    }

    root.ok_or_else(|| malformed("Document has no root element"))
}
