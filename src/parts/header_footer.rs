//! Header and footer parts (w:hdr, w:ftr)

use crate::codec::{Decoder, Registry};
use crate::document::{blocks_text, decode_blocks, BlockContent, Paragraph};
use crate::error::{Error, Result};
use crate::xml::{self, RootTag};

/// Which of the two part kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderFooterKind {
    Header,
    Footer,
}

impl HeaderFooterKind {
    fn root_name(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => "w:hdr",
            HeaderFooterKind::Footer => "w:ftr",
        }
    }
}

/// A header or footer part
#[derive(Debug)]
pub struct HeaderFooter {
    pub root: RootTag,
    pub content: Vec<BlockContent>,
}

impl HeaderFooter {
    /// Empty part of the given kind, holding one empty paragraph
    pub fn new(kind: HeaderFooterKind) -> Self {
        Self {
            root: RootTag::new(kind.root_name(), &xml::document_namespaces()),
            content: vec![BlockContent::Paragraph(Paragraph::default())],
        }
    }

    /// Part holding a single paragraph of text
    pub fn with_text(kind: HeaderFooterKind, text: impl Into<String>) -> Self {
        Self {
            content: vec![BlockContent::Paragraph(Paragraph::new(text))],
            ..Self::new(kind)
        }
    }

    pub fn kind(&self) -> HeaderFooterKind {
        if self.root.name.ends_with("ftr") {
            HeaderFooterKind::Footer
        } else {
            HeaderFooterKind::Header
        }
    }

    /// Switch between w:hdr and w:ftr, keeping the root prefix and namespaces
    pub fn set_kind(&mut self, kind: HeaderFooterKind) {
        let local = &kind.root_name()[2..];
        self.root.name = match self.root.name.split_once(':') {
            Some((prefix, _)) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        };
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(BlockContent::as_paragraph)
    }

    pub fn text(&self) -> String {
        blocks_text(&self.content)
    }

    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        match root.name().local_name().as_ref() {
            b"hdr" | b"ftr" => {}
            _ => {
                return Err(Error::InvalidDocument(format!(
                    "expected w:hdr or w:ftr, found {}",
                    crate::codec::qualified_name(&root)
                )))
            }
        }
        let content = decode_blocks(&mut decoder, &root, empty)?;
        Ok(Self {
            root: RootTag::from_start(&root)?,
            content,
        })
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;
        for block in &self.content {
            block.write_to(&mut writer)?;
        }
        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_kind_keeps_prefix() {
        let mut part = HeaderFooter::with_text(HeaderFooterKind::Header, "x");
        part.set_kind(HeaderFooterKind::Footer);
        assert_eq!(part.kind(), HeaderFooterKind::Footer);
        assert_eq!(part.root.name, "w:ftr");
        assert!(String::from_utf8(part.to_xml().unwrap()).unwrap().ends_with("</w:ftr>"));
    }

    #[test]
    fn test_header_round_trip() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Page header</w:t></w:r></w:p><w:sdt><w:sdtContent/></w:sdt></w:hdr>"#;
        let header = HeaderFooter::parse(xml.as_bytes(), &Registry::with_builtins()).unwrap();

        assert_eq!(header.kind(), HeaderFooterKind::Header);
        assert_eq!(header.text(), "Page header");
        assert_eq!(String::from_utf8(header.to_xml().unwrap()).unwrap(), xml);
    }

    #[test]
    fn test_footer_with_text() {
        let footer = HeaderFooter::with_text(HeaderFooterKind::Footer, "Confidential");
        let out = String::from_utf8(footer.to_xml().unwrap()).unwrap();
        assert!(out.contains("<w:ftr "));
        assert!(out.contains("<w:t>Confidential</w:t>"));
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = HeaderFooter::parse(b"<w:document/>", &Registry::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }
}
