//! XML utilities and raw element preservation for round-trip support

mod namespace;
mod raw;

pub use namespace::*;
pub use raw::RawXml;

use crate::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::str::FromStr;

/// Writer every part and element serializes into
pub type XmlWriter = Writer<Vec<u8>>;

/// Start a new part: XML declaration only
pub fn new_writer() -> Result<XmlWriter> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

/// Helper to get an (unescaped) attribute value from BytesStart
pub fn get_attr(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Helper to get w:val attribute (common in OOXML)
pub fn get_w_val(element: &BytesStart) -> Option<String> {
    get_attr(element, "w:val").or_else(|| get_attr(element, "val"))
}

/// True when every attribute of `element` is one of `allowed`
pub fn attrs_within(element: &BytesStart, allowed: &[&str]) -> bool {
    element.attributes().all(|attr| {
        attr.map_or(false, |a| allowed.iter().any(|name| a.key.as_ref() == name.as_bytes()))
    })
}

/// `w:val` of an element that carries no other attribute
pub fn sole_w_val(element: &BytesStart) -> Option<String> {
    if attrs_within(element, &["w:val"]) {
        get_attr(element, "w:val")
    } else {
        None
    }
}

/// Parse an optional attribute.
///
/// `Some(None)` when the attribute is absent, `None` when it is present but
/// does not parse as `T`.
pub fn parse_attr<T: FromStr>(element: &BytesStart, name: &str) -> Option<Option<T>> {
    get_attr(element, name)
        .map(|value| value.parse())
        .transpose()
        .ok()
}

/// Parse a boolean value from OOXML (handles "1", "true", "on", or missing val)
pub fn parse_bool(element: &BytesStart) -> bool {
    match get_w_val(element) {
        None => true, // <w:b/> means true
        Some(v) => matches!(v.as_str(), "1" | "true" | "on"),
    }
}

/// All attributes of a tag, namespace declarations included, in source order
pub fn read_attributes(element: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in element.attributes() {
        let attr = attr?;
        attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            attr.unescape_value()?.into_owned(),
        ));
    }
    Ok(attrs)
}

/// Write `<name w:val="value"/>`
pub fn write_val(writer: &mut XmlWriter, name: &str, value: &str) -> Result<()> {
    let mut elem = BytesStart::new(name);
    elem.push_attribute(("w:val", value));
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Write an on/off property: `<name/>` for true, `<name w:val="0"/>` for false
pub fn write_on_off(writer: &mut XmlWriter, name: &str, on: bool) -> Result<()> {
    let mut elem = BytesStart::new(name);
    if !on {
        elem.push_attribute(("w:val", "0"));
    }
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Write `<name attrs...>text</name>`
pub fn write_text_element(
    writer: &mut XmlWriter,
    name: &str,
    attrs: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    let mut start = BytesStart::new(name);
    for attr in attrs {
        start.push_attribute(*attr);
    }
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Root element of a part, with its namespace declarations and other
/// attributes (e.g. `mc:Ignorable`) kept verbatim
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootTag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl RootTag {
    /// Root tag with the given namespace declarations
    pub fn new(name: &str, namespaces: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            attributes: namespaces
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Capture a root start tag
    pub fn from_start(start: &BytesStart) -> Result<Self> {
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes: read_attributes(start)?,
        })
    }

    /// Write the opening tag
    pub fn write_start(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;
        Ok(())
    }

    /// Write the closing tag
    pub fn write_end(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}
