/*!
 * Minimal mutable XML tree over quick-xml.
 *
 * OOXML parts are small enough to hold in memory, and the writer needs to
 * rewrite cells in place while leaving every other element untouched. Names
 * are kept fully qualified ("w:tbl") since WordprocessingML always binds the
 * main namespace to the `w` prefix.
 */

use std::io::{Cursor, Write};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use crate::errors::DocxError;

/// A node in the tree
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An element with its attributes and children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text append
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Child elements, skipping text and comments
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Direct children with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Remove direct children with the given name
    pub fn remove_children(&mut self, name: &str) {
        self.children.retain(|node| !matches!(node, XmlNode::Element(e) if e.name == name));
    }

    /// All descendant elements with the given name, in document order.
    /// Matching elements are not searched further.
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for element in self.elements() {
            if element.name == name {
                out.push(element);
            } else {
                element.find_all(name, out);
            }
        }
    }

    /// Concatenated character data of the whole subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) | XmlNode::CData(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
                _ => {}
            }
        }
    }
}

/// A parsed XML part
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Comments or processing instructions before the root element
    pub prologue: Vec<XmlNode>,
    pub root: XmlElement,
}

impl XmlDocument {
    /// Parse a part. `part` names the archive entry for error reports.
    pub fn parse(xml: &str, part: &str) -> Result<Self, DocxError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut prologue = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                DocxError::xml(part, format!("{} at byte {}", e, reader.buffer_position()))
            })?;

            match event {
                Event::Start(start) => {
                    stack.push(element_from_start(&start, part)?);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start, part)?;
                    attach(&mut stack, &mut root, element, part)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| DocxError::xml(part, "unbalanced end tag"))?;
                    attach(&mut stack, &mut root, element, part)?;
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|e| DocxError::xml(part, e))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(value.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let value = String::from_utf8_lossy(&data).into_owned();
                        parent.children.push(XmlNode::CData(value));
                    }
                }
                Event::Comment(comment) => {
                    let value = String::from_utf8_lossy(&comment).into_owned();
                    push_misc(&mut stack, &mut prologue, root.is_some(), XmlNode::Comment(value));
                }
                Event::PI(pi) => {
                    let value = String::from_utf8_lossy(&pi).into_owned();
                    push_misc(
                        &mut stack,
                        &mut prologue,
                        root.is_some(),
                        XmlNode::ProcessingInstruction(value),
                    );
                }
                Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if !stack.is_empty() {
            return Err(DocxError::xml(part, "unexpected end of document"));
        }
        let root = root.ok_or_else(|| DocxError::xml(part, "no root element"))?;
        Ok(Self { prologue, root })
    }

    /// Serialize with a standard declaration. The declaration is always
    /// `<?xml version="1.0" encoding="UTF-8" standalone="yes"?>`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let io_err = |e: std::io::Error| DocxError::xml("<serializer>", e);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(io_err)?;
        writer.get_mut().write_all(b"\r\n").map_err(io_err)?;

        for node in &self.prologue {
            write_node(&mut writer, node).map_err(io_err)?;
        }
        write_element(&mut writer, &self.root).map_err(io_err)?;

        Ok(writer.into_inner().into_inner())
    }
}

fn element_from_start(start: &BytesStart, part: &str) -> Result<XmlElement, DocxError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| DocxError::xml(part, e))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| DocxError::xml(part, e))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    part: &str,
) -> Result<(), DocxError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(DocxError::xml(part, "multiple root elements")),
    }
}

fn push_misc(stack: &mut [XmlElement], prologue: &mut Vec<XmlNode>, after_root: bool, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if !after_root => prologue.push(node),
        None => {}
    }
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: &XmlNode) -> std::io::Result<()> {
    match node {
        XmlNode::Element(element) => write_element(writer, element),
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        XmlNode::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str()))),
        XmlNode::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
        }
        XmlNode::ProcessingInstruction(text) => {
            writer.write_event(Event::PI(BytesPI::new(text.as_str())))
        }
    }
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, element: &XmlElement) -> std::io::Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))
}
