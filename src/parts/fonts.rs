//! Font table part (w:fonts)

use crate::codec::{Decoder, Registry};
use crate::error::Result;
use crate::xml::{self, read_attributes, RawXml, RootTag};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// A font entry (w:font)
#[derive(Clone, Debug, Default)]
pub struct Font {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// altName, panose1, charset, family, pitch, sig, embedding
    pub children: Vec<RawXml>,
}

impl Font {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn child_val(&self, local: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.local_name() == local)
            .and_then(|c| c.attr("w:val"))
    }

    /// Font family ("roman", "swiss", ...)
    pub fn family(&self) -> Option<&str> {
        self.child_val("family")
    }

    pub fn charset(&self) -> Option<&str> {
        self.child_val("charset")
    }

    pub fn alt_name(&self) -> Option<&str> {
        self.child_val("altName")
    }
}

/// The font table part
#[derive(Clone, Debug)]
pub struct FontTable {
    pub root: RootTag,
    pub fonts: Vec<Font>,
    pub extras: Vec<RawXml>,
}

impl Default for FontTable {
    fn default() -> Self {
        Self {
            root: RootTag::new("w:fonts", &xml::minimal_document_namespaces()),
            fonts: Vec::new(),
            extras: Vec::new(),
        }
    }
}

impl FontTable {
    pub fn get(&self, name: &str) -> Option<&Font> {
        self.fonts.iter().find(|f| f.name == name)
    }

    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        let mut table = FontTable {
            root: RootTag::from_start(&root)?,
            ..Default::default()
        };
        if empty {
            return Ok(table);
        }

        while let Some((child, child_empty)) = decoder.next_child(&root)? {
            if child.name().local_name().as_ref() != b"font" {
                table.extras.push(decoder.capture(&child, child_empty)?);
                continue;
            }

            let mut font = Font::default();
            for (key, value) in read_attributes(&child)? {
                if key == "w:name" {
                    font.name = value;
                } else {
                    font.attributes.push((key, value));
                }
            }
            if !child_empty {
                while let Some((grand, grand_empty)) = decoder.next_child(&child)? {
                    font.children.push(decoder.capture(&grand, grand_empty)?);
                }
            }
            table.fonts.push(font);
        }

        Ok(table)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;
        for font in &self.fonts {
            let mut start = BytesStart::new("w:font");
            start.push_attribute(("w:name", font.name.as_str()));
            for (key, value) in &font.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            if font.children.is_empty() {
                writer.write_event(Event::Empty(start))?;
                continue;
            }
            writer.write_event(Event::Start(start))?;
            for child in &font.children {
                child.write_to(&mut writer)?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:font")))?;
        }
        for extra in &self.extras {
            extra.write_to(&mut writer)?;
        }
        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_table_round_trip() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:fonts xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:font w:name="Calibri"><w:altName w:val="Carlito"/><w:panose1 w:val="020F0502020204030204"/><w:charset w:val="00"/><w:family w:val="swiss"/><w:pitch w:val="variable"/></w:font>"#,
            r#"<w:font w:name="Symbol"/>"#,
            r#"</w:fonts>"#
        );
        let table = FontTable::parse(xml.as_bytes(), &Registry::new()).unwrap();

        let calibri = table.get("Calibri").unwrap();
        assert_eq!(calibri.family(), Some("swiss"));
        assert_eq!(calibri.charset(), Some("00"));
        assert_eq!(calibri.alt_name(), Some("Carlito"));
        assert!(table.get("Symbol").unwrap().children.is_empty());
        assert_eq!(String::from_utf8(table.to_xml().unwrap()).unwrap(), xml);
    }
}
