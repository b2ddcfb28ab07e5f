use crate::markup::walk::MarkupNode;
use quick_xml::escape::{partial_escape, resolve_html5_entity};
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use std::borrow::Cow;
use quick_xml::{NsReader, Writer};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

pub const PENCIL_NS: &str = "http://www.evolus.vn/Namespace/Pencil";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Malformed(String),
}

/// Element or attribute name: the spelling found in the file plus the
/// namespace it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub raw: String,
    pub namespace: Option<String>,
    pub local: String,
}

impl QualifiedName {
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(namespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QualifiedName,
    pub attributes: Vec<Attribute>,
    pub text: Option<String>,
    pub children: Vec<Element>,
    pub tail: Option<String>,
}

impl Element {
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.name.is(namespace, local)
    }

    /// Value of an attribute without namespace, e.g. `name="text"`.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn attribute_ns(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.is(namespace, local))
            .map(|a| a.value.as_str())
    }

    pub fn parse(xml: &[u8]) -> Result<Element, MarkupError> {
        let mut reader = NsReader::from_reader(xml);
        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let element = build_element(&reader, &e)?;
                    stack.push(element);
                }
                Event::Empty(e) => {
                    let element = build_element(&reader, &e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| MarkupError::Malformed("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(e) => {
                    let text = e.unescape_with(resolve_html5_entity)?;
                    append_text(&mut stack, &text);
                }
                Event::CData(e) => {
                    let bytes = e.into_inner();
                    append_text(&mut stack, std::str::from_utf8(&bytes)?);
                }
                // Comments, processing instructions and doctype are not kept
                Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(MarkupError::Malformed("unclosed element at end of document".to_string()));
        }

        root.ok_or_else(|| MarkupError::Malformed("document has no root element".to_string()))
    }

    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Element, MarkupError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Serializes the tree as UTF-8 with an XML declaration.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MarkupError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.get_mut().write_all(b"\n")?;
        write_element(&mut writer, self)?;
        Ok(writer.into_inner())
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MarkupError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl MarkupNode for Element {
    fn children(&self) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    fn set_text(&mut self, text: String) {
        self.text = Some(text);
    }

    fn set_tail(&mut self, tail: String) {
        self.tail = Some(tail);
    }
}

fn build_element<R>(reader: &NsReader<R>, start: &BytesStart<'_>) -> Result<Element, MarkupError> {
    let (ns, local) = reader.resolve_element(start.name());
    let name = QualifiedName {
        raw: std::str::from_utf8(start.name().as_ref())?.to_string(),
        namespace: element_namespace(ns)?,
        local: std::str::from_utf8(local.as_ref())?.to_string(),
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let (ns, local) = reader.resolve_attribute(attr.key);
        let value = attr.unescape_value()?.into_owned();
        attributes.push(Attribute {
            name: QualifiedName {
                raw: std::str::from_utf8(attr.key.as_ref())?.to_string(),
                namespace: attribute_namespace(ns)?,
                local: std::str::from_utf8(local.as_ref())?.to_string(),
            },
            value,
        });
    }

    Ok(Element {
        name,
        attributes,
        text: None,
        children: Vec::new(),
        tail: None,
    })
}

fn element_namespace(result: ResolveResult<'_>) -> Result<Option<String>, MarkupError> {
    match result {
        ResolveResult::Unknown(prefix) => Err(MarkupError::Malformed(format!(
            "undeclared namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
        other => attribute_namespace(other),
    }
}

// Unknown attribute prefixes (including `xmlns:*` declarations) are kept verbatim without a namespace
fn attribute_namespace(result: ResolveResult<'_>) -> Result<Option<String>, MarkupError> {
    match result {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(std::str::from_utf8(uri)?.to_string())),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => Ok(None),
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), MarkupError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(MarkupError::Malformed("multiple root elements".to_string())),
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) {
    // Text outside the root element is only whitespace in well-formed files
    let Some(parent) = stack.last_mut() else {
        return;
    };

    let slot = match parent.children.last_mut() {
        Some(child) => &mut child.tail,
        None => &mut parent.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
}

fn write_element<W: Write>(writer: &mut Writer<W>, element: &Element) -> Result<(), MarkupError> {
    let mut start = BytesStart::new(element.name.raw.as_str());
    for attr in &element.attributes {
        start.push_attribute(XmlAttribute {
            key: QName(attr.name.raw.as_bytes()),
            value: Cow::Owned(escape_attribute(&attr.value).into_bytes()),
        });
    }

    let has_text = element.text.as_deref().is_some_and(|t| !t.is_empty());
    if !has_text && element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if let Some(text) = &element.text {
        write_text(writer, text)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
        if let Some(tail) = &child.tail {
            write_text(writer, tail)?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.raw.as_str())))?;
    Ok(())
}

// Line breaks and tabs become character references; written raw, a reader would normalize them to spaces
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn write_text<W: Write>(writer: &mut Writer<W>, text: &str) -> Result<(), MarkupError> {
    if text.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    Ok(())
}
