//! Bookmark markers (w:bookmarkStart, w:bookmarkEnd)
//!
//! Both markers may sit between blocks or inside paragraphs, so they are
//! registered for both roles.

use crate::codec::{BlockLevel, Decoder, Element, ParagraphLevel, Registry};
use crate::error::Result;
use crate::xml::{read_attributes, XmlWriter};
use quick_xml::events::{BytesStart, Event};

pub(crate) fn register(registry: &Registry) {
    registry.register_block(|name| match name {
        "w:bookmarkStart" => Some(Box::new(BookmarkStart::default()) as Box<dyn BlockLevel>),
        "w:bookmarkEnd" => Some(Box::new(BookmarkEnd::default()) as Box<dyn BlockLevel>),
        _ => None,
    });
    registry.register_paragraph_content(|name| match name {
        "w:bookmarkStart" => Some(Box::new(BookmarkStart::default()) as Box<dyn ParagraphLevel>),
        "w:bookmarkEnd" => Some(Box::new(BookmarkEnd::default()) as Box<dyn ParagraphLevel>),
        _ => None,
    });
}

/// Start of a bookmark
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookmarkStart {
    pub id: String,
    pub name: String,
    /// Other attributes (w:colFirst, w:colLast, w:displacedByCustomXml)
    pub attributes: Vec<(String, String)>,
}

impl BookmarkStart {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.into(),
            attributes: Vec::new(),
        }
    }
}

impl Element for BookmarkStart {
    fn decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        for (key, value) in read_attributes(start)? {
            match key.as_str() {
                "w:id" => self.id = value,
                "w:name" => self.name = value,
                _ => self.attributes.push((key, value)),
            }
        }
        decoder.skip(start, empty)
    }

    fn encode(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut elem = BytesStart::new("w:bookmarkStart");
        elem.push_attribute(("w:id", self.id.as_str()));
        elem.push_attribute(("w:name", self.name.as_str()));
        for (key, value) in &self.attributes {
            elem.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    crate::element_any!();
}

impl BlockLevel for BookmarkStart {}
impl ParagraphLevel for BookmarkStart {}

/// End of a bookmark
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookmarkEnd {
    pub id: String,
    pub attributes: Vec<(String, String)>,
}

impl BookmarkEnd {
    pub fn new(id: u32) -> Self {
        Self {
            id: id.to_string(),
            attributes: Vec::new(),
        }
    }
}

impl Element for BookmarkEnd {
    fn decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        for (key, value) in read_attributes(start)? {
            if key == "w:id" {
                self.id = value;
            } else {
                self.attributes.push((key, value));
            }
        }
        decoder.skip(start, empty)
    }

    fn encode(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut elem = BytesStart::new("w:bookmarkEnd");
        elem.push_attribute(("w:id", self.id.as_str()));
        for (key, value) in &self.attributes {
            elem.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    crate::element_any!();
}

impl BlockLevel for BookmarkEnd {}
impl ParagraphLevel for BookmarkEnd {}
