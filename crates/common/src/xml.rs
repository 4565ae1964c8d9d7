//! A small element tree for XML and SOAP response bodies.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, ErrorKind, Result};

/// An XML element with its attributes, text content and child elements.
///
/// Lookups by name compare local names, so `soapenv:Fault` matches `Fault`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a document and return its root element.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            match reader.read_event_into(&mut buf).map_err(xml_error)? {
                Event::Start(start) => stack.push(XmlNode::from_start(&start)?),
                Event::Empty(start) => {
                    let node = XmlNode::from_start(&start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| decode_error("unbalanced closing tag"))?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text.unescape().map_err(xml_error)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(decode_error("unexpected end of document"));
        }
        root.ok_or_else(|| decode_error("document has no root element"))
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    /// The qualified element name, e.g. `soapenv:Fault`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local(&self.name)
    }

    /// Text content directly inside this element, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Attribute value by (local) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name || local(k) == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.local_name() == name)
    }

    /// All direct children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.local_name() == name)
    }

    /// First element with the given local name, searching depth-first from this node.
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.local_name() == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Text of the first element named `name`, if any.
    pub fn find_text(&self, name: &str) -> Option<&str> {
        self.find(name).map(XmlNode::text)
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_none() {
        *root = Some(node);
    } else {
        return Err(decode_error("document has more than one root element"));
    }
    Ok(())
}

fn local(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn decode_error(message: &str) -> Error {
    Error::new(ErrorKind::Decode(format!("invalid XML: {}", message)))
}

fn xml_error(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::with_source(ErrorKind::Decode(format!("invalid XML: {}", err)), err)
}
