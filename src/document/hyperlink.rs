//! Hyperlink element (w:hyperlink)

use crate::codec::{Decoder, Element, ParagraphLevel, Registry};
use crate::document::paragraph::decode_paragraph_content;
use crate::document::{ParagraphContent, Run};
use crate::error::Result;
use crate::xml::{read_attributes, XmlWriter};
use quick_xml::events::{BytesEnd, BytesStart, Event};

pub(crate) fn register(registry: &Registry) {
    registry.register_paragraph_content(|name| {
        (name == "w:hyperlink").then(|| Box::new(Hyperlink::default()) as Box<dyn ParagraphLevel>)
    });
}

/// Hyperlink element
#[derive(Debug, Default)]
pub struct Hyperlink {
    /// Relationship ID (for external links)
    pub r_id: Option<String>,
    /// Anchor (for internal links)
    pub anchor: Option<String>,
    /// Other attributes (w:history, w:tooltip, ...)
    pub attributes: Vec<(String, String)>,
    /// Content: runs, and anything else allowed inside a paragraph
    pub content: Vec<ParagraphContent>,
}

impl Hyperlink {
    /// External link through relationship `r_id`
    pub fn external(r_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            r_id: Some(r_id.into()),
            content: vec![ParagraphContent::Run(Run::new(text))],
            ..Default::default()
        }
    }

    /// Link to a bookmark in the same document
    pub fn internal(anchor: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            anchor: Some(anchor.into()),
            content: vec![ParagraphContent::Run(Run::new(text))],
            ..Default::default()
        }
    }

    /// Runs directly inside the link
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|c| match c {
            ParagraphContent::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Link text
    pub fn text(&self) -> String {
        self.content.iter().map(ParagraphContent::text).collect()
    }
}

impl Element for Hyperlink {
    fn decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        for (key, value) in read_attributes(start)? {
            match key.as_str() {
                "r:id" => self.r_id = Some(value),
                "w:anchor" => self.anchor = Some(value),
                _ => self.attributes.push((key, value)),
            }
        }
        self.content = decode_paragraph_content(decoder, start, empty)?;
        Ok(())
    }

    fn encode(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new("w:hyperlink");
        if let Some(r_id) = &self.r_id {
            start.push_attribute(("r:id", r_id.as_str()));
        }
        if let Some(anchor) = &self.anchor {
            start.push_attribute(("w:anchor", anchor.as_str()));
        }
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.content.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            for content in &self.content {
                content.write_to(writer)?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:hyperlink")))?;
        }

        Ok(())
    }

    crate::element_any!();
}

impl ParagraphLevel for Hyperlink {}
