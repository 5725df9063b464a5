//! Owned element tree for decoded build documents.
//!
//! Build codes inflate to an XML document describing the whole build:
//! a root element containing the build attributes, skill sets, an item
//! container, and a passive tree container. The extractor only ever
//! walks this tree, so it is parsed once into an owned structure
//! instead of re-streaming events.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed markup: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("document has no root element")]
    MissingRoot,
}

/// A single element in the parsed document tree.
///
/// Attributes keep document order; `text` is the concatenation of all
/// direct text content (item blocks store their whole body here).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child with the given element name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given element name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All elements with the given name anywhere below this one,
    /// in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }
}

/// A decoded build document.
///
/// Invariant: the passive tree container references exactly one active
/// spec at a time (by id); inactive specs remain present and queryable.
#[derive(Debug, Clone)]
pub struct BuildDocument {
    pub root: Element,
}

impl BuildDocument {
    /// The top-level build element holding class/ascendancy/stats.
    pub fn build(&self) -> Option<&Element> {
        self.root.child("Build")
    }

    /// The skills container (skill sets and socket groups).
    pub fn skills(&self) -> Option<&Element> {
        self.root.child("Skills")
    }

    /// The item container (item text blocks plus item sets).
    pub fn items(&self) -> Option<&Element> {
        self.root.child("Items")
    }

    /// The passive tree container (one or more specs).
    pub fn tree(&self) -> Option<&Element> {
        self.root.child("Tree")
    }
}

/// Parse UTF-8 markup text into a document tree.
pub fn parse_document(xml: &str) -> Result<BuildDocument, DocumentError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Stack of open elements; the last closed top-level element wins
    // as root (documents are expected to have exactly one).
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(element_from_start(&e)?);
            }
            Event::Empty(e) => {
                let elem = element_from_start(&e)?;
                attach(&mut stack, &mut root, elem);
            }
            Event::End(_) => {
                if let Some(elem) = stack.pop() {
                    attach(&mut stack, &mut root, elem);
                }
            }
            Event::Text(t) => {
                if let Some(parent) = stack.last_mut() {
                    let text = t.unescape()?;
                    if !parent.text.is_empty() {
                        parent.text.push('\n');
                    }
                    parent.text.push_str(&text);
                }
            }
            Event::CData(t) => {
                if let Some(parent) = stack.last_mut() {
                    parent.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.map(|root| BuildDocument { root })
        .ok_or(DocumentError::MissingRoot)
}

fn element_from_start(
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<Element, DocumentError> {
    let mut elem = Element {
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        elem.attributes.push((key, value));
    }
    Ok(elem)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, elem: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(elem);
    } else {
        *root = Some(elem);
    }
}
