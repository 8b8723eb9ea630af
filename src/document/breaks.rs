//! Run-level breaks and tabs (w:br, w:tab)

use crate::codec::{Decoder, Element, Registry, RunLevel};
use crate::error::Result;
use crate::xml::{get_attr, XmlWriter};
use quick_xml::events::{BytesStart, Event};

pub(crate) fn register(registry: &Registry) {
    registry.register_run_content(|name| match name {
        "w:br" => Some(Box::new(Break::default()) as Box<dyn RunLevel>),
        "w:tab" => Some(Box::new(Tab) as Box<dyn RunLevel>),
        _ => None,
    });
}

/// Break type
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BreakType {
    #[default]
    TextWrapping,
    Page,
    Column,
    /// Any other value, kept as written
    Other(String),
}

impl BreakType {
    fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("textWrapping") => BreakType::TextWrapping,
            Some("page") => BreakType::Page,
            Some("column") => BreakType::Column,
            Some(other) => BreakType::Other(other.to_string()),
        }
    }
}

/// Break (w:br)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Break {
    pub kind: BreakType,
    /// Text wrapping restart location (w:clear)
    pub clear: Option<String>,
}

impl Break {
    pub fn new(kind: BreakType) -> Self {
        Self { kind, clear: None }
    }

    pub fn page() -> Self {
        Self::new(BreakType::Page)
    }
}

impl Element for Break {
    fn decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        self.kind = BreakType::parse(get_attr(start, "w:type").as_deref());
        self.clear = get_attr(start, "w:clear");
        decoder.skip(start, empty)
    }

    fn encode(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new("w:br");
        match &self.kind {
            BreakType::TextWrapping => {}
            BreakType::Page => start.push_attribute(("w:type", "page")),
            BreakType::Column => start.push_attribute(("w:type", "column")),
            BreakType::Other(value) => start.push_attribute(("w:type", value.as_str())),
        }
        if let Some(clear) = &self.clear {
            start.push_attribute(("w:clear", clear.as_str()));
        }
        writer.write_event(Event::Empty(start))?;
        Ok(())
    }

    crate::element_any!();
}

impl RunLevel for Break {}

/// Tab character (w:tab)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tab;

impl Element for Tab {
    fn decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()> {
        decoder.skip(start, empty)
    }

    fn encode(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.write_event(Event::Empty(BytesStart::new("w:tab")))?;
        Ok(())
    }

    crate::element_any!();
}

impl RunLevel for Tab {}
