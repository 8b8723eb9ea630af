//! Content Types handling for OPC packages
//!
//! Parses and generates `[Content_Types].xml`, and holds the fixed
//! extension tables used when a content type has to be inferred.

use crate::error::{Error, Result};
use crate::opc::PartUri;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::io::Write;

/// Content types definition for an OPC package
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    /// Default extension mappings (extension -> content type)
    defaults: BTreeMap<String, String>,
    /// Override mappings (part URI -> content type)
    overrides: BTreeMap<PartUri, String>,
}

impl ContentTypes {
    /// Create a new ContentTypes with the standard defaults
    pub fn new() -> Self {
        let mut ct = Self::default();
        ct.add_default("rels", RELATIONSHIPS);
        ct.add_default("xml", XML);
        ct
    }

    /// Parse from XML bytes
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut ct = Self::default();
        loop {
            match reader.read_event()? {
                Event::Empty(e) | Event::Start(e) => match e.name().local_name().as_ref() {
                    b"Default" => {
                        let ext = get_attr(&e, "Extension")?;
                        let content_type = get_attr(&e, "ContentType")?;
                        ct.defaults.insert(ext.to_lowercase(), content_type);
                    }
                    b"Override" => {
                        let part_name = get_attr(&e, "PartName")?;
                        let content_type = get_attr(&e, "ContentType")?;
                        ct.overrides.insert(PartUri::new(&part_name)?, content_type);
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(ct)
    }

    /// Serialize to XML bytes
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Write to a writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut types = BytesStart::new("Types");
        types.push_attribute(("xmlns", NS_CONTENT_TYPES));
        xml.write_event(Event::Start(types))?;

        for (ext, content_type) in &self.defaults {
            let mut default = BytesStart::new("Default");
            default.push_attribute(("Extension", ext.as_str()));
            default.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(default))?;
        }

        for (uri, content_type) in &self.overrides {
            let mut override_elem = BytesStart::new("Override");
            override_elem.push_attribute(("PartName", uri.as_str()));
            override_elem.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(override_elem))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Types")))?;

        Ok(())
    }

    /// Add a default extension mapping
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.to_lowercase(), content_type.to_string());
    }

    /// Register the content type of a part.
    ///
    /// Uses the extension default when it already says the same thing,
    /// otherwise records an override.
    pub fn register(&mut self, uri: &PartUri, content_type: &str) {
        let default = uri
            .extension()
            .and_then(|ext| self.defaults.get(&ext.to_lowercase()));
        if default.map(String::as_str) == Some(content_type) {
            self.overrides.remove(uri);
        } else {
            self.overrides.insert(uri.clone(), content_type.to_string());
        }
    }

    /// Get the content type for a part
    pub fn get(&self, uri: &PartUri) -> Option<&str> {
        if let Some(ct) = self.overrides.get(uri) {
            return Some(ct);
        }

        uri.extension()
            .and_then(|ext| self.defaults.get(&ext.to_lowercase()))
            .map(|s| s.as_str())
    }
}

/// Content type for a media file, inferred from its extension
pub fn media_content_type(file_name: &str) -> &'static str {
    let ext = extension_of(file_name);
    match ext.as_deref() {
        Some("png") => PNG,
        Some("jpg") | Some("jpeg") => JPEG,
        Some("gif") => GIF,
        Some("bmp") => BMP,
        Some("tif") | Some("tiff") => TIFF,
        Some("svg") => SVG,
        Some("emf") => EMF,
        Some("wmf") => WMF,
        _ => OCTET_STREAM,
    }
}

/// Best-effort content type for a part nothing else describes
pub fn guess_content_type(file_name: &str) -> &'static str {
    match extension_of(file_name).as_deref() {
        Some("xml") => XML,
        Some("rels") => RELATIONSHIPS,
        _ => media_content_type(file_name),
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let name = file_name.rsplit('/').next().unwrap_or(file_name);
    name.rfind('.').map(|dot| name[dot + 1..].to_ascii_lowercase())
}

/// Get an attribute value from an XML element
fn get_attr(element: &BytesStart, name: &str) -> Result<String> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(attr.unescape_value()?.into_owned());
        }
    }
    Err(Error::MissingAttribute {
        element: String::from_utf8_lossy(element.name().as_ref()).to_string(),
        attr: name.to_string(),
    })
}

// Namespace
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

// Package-level content types
pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const XML: &str = "application/xml";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
pub const EXTENDED_PROPERTIES: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";

// WordprocessingML part content types
pub const MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub const SETTINGS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
pub const WEB_SETTINGS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.webSettings+xml";
pub const FONT_TABLE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.fontTable+xml";
pub const NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
pub const FOOTNOTES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footnotes+xml";
pub const ENDNOTES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.endnotes+xml";
pub const COMMENTS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
pub const HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub const FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

// Media content types
pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";
pub const GIF: &str = "image/gif";
pub const BMP: &str = "image/bmp";
pub const TIFF: &str = "image/tiff";
pub const SVG: &str = "image/svg+xml";
pub const EMF: &str = "image/x-emf";
pub const WMF: &str = "image/x-wmf";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_types() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="XML" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

        let ct = ContentTypes::from_xml(xml).unwrap();

        let doc_uri = PartUri::new("/word/document.xml").unwrap();
        assert_eq!(ct.get(&doc_uri), Some(MAIN_DOCUMENT));

        let other = PartUri::new("/customXml/item1.xml").unwrap();
        assert_eq!(ct.get(&other), Some(XML));
    }

    #[test]
    fn test_register_prefers_defaults() {
        let mut ct = ContentTypes::new();
        let item = PartUri::new("/customXml/item1.xml").unwrap();
        let doc = PartUri::new("/word/document.xml").unwrap();

        ct.register(&item, XML);
        ct.register(&doc, MAIN_DOCUMENT);

        assert!(ct.overrides.get(&item).is_none());
        assert_eq!(ct.overrides.get(&doc).map(String::as_str), Some(MAIN_DOCUMENT));
    }

    #[test]
    fn test_roundtrip() {
        let mut ct = ContentTypes::new();
        let doc_uri = PartUri::new("/word/document.xml").unwrap();
        ct.register(&doc_uri, MAIN_DOCUMENT);

        let xml = ct.to_xml().unwrap();
        let ct2 = ContentTypes::from_xml(&xml).unwrap();

        assert_eq!(ct2.get(&doc_uri), Some(MAIN_DOCUMENT));
    }

    #[test]
    fn test_media_table() {
        assert_eq!(media_content_type("logo.PNG"), PNG);
        assert_eq!(media_content_type("photo.jpeg"), JPEG);
        assert_eq!(media_content_type("scan.tif"), TIFF);
        assert_eq!(media_content_type("vector.emf"), EMF);
        assert_eq!(media_content_type("data.bin"), OCTET_STREAM);
        assert_eq!(media_content_type("noext"), OCTET_STREAM);
    }

    #[test]
    fn test_guess_for_unknown_parts() {
        assert_eq!(guess_content_type("customXml/item1.xml"), XML);
        assert_eq!(guess_content_type("_rels/.rels"), RELATIONSHIPS);
        assert_eq!(guess_content_type("docProps/thumbnail.wmf"), WMF);
        assert_eq!(guess_content_type("embeddings/oleObject1.bin"), OCTET_STREAM);
    }
}
