//! Verbatim capture of elements nothing else understands

use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::Result;
use crate::xml::{read_attributes, XmlWriter};

/// An unrecognized element preserved for round-trip.
///
/// Holds the qualified name, the attributes split into namespace
/// declarations and ordinary attributes, and the exact bytes between the
/// start and end tag. The inner bytes are owned, never borrowed from the
/// source buffer, and only change by replacing the whole value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawXml {
    /// Qualified element name (e.g. "w:customXml")
    pub name: String,
    /// `xmlns` / `xmlns:*` declarations found on the element itself
    pub namespaces: Vec<(String, String)>,
    /// Other attributes as (qualified name, unescaped value)
    pub attributes: Vec<(String, String)>,
    inner: Vec<u8>,
}

impl RawXml {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build from a start tag and the verbatim bytes of its content
    pub fn from_start(start: &BytesStart, inner: Vec<u8>) -> Result<Self> {
        let mut raw = Self::new(String::from_utf8_lossy(start.name().as_ref()));
        for (key, value) in read_attributes(start)? {
            if is_namespace_declaration(&key) {
                raw.namespaces.push((key, value));
            } else {
                raw.attributes.push((key, value));
            }
        }
        raw.inner = inner;
        Ok(raw)
    }

    /// Add an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Replace the inner markup (must be well-formed XML content)
    pub fn with_inner(mut self, inner: impl Into<Vec<u8>>) -> Self {
        self.inner = inner.into();
        self
    }

    /// Exact bytes between the start and end tag
    pub fn inner(&self) -> &[u8] {
        &self.inner
    }

    /// Local part of the element name
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Value of an attribute by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Write element to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in self.namespaces.iter().chain(&self.attributes) {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.inner.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            writer.get_mut().extend_from_slice(&self.inner);
            writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        }

        Ok(())
    }
}

fn is_namespace_declaration(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}
