//! Main document part (document.xml), body and block-level content

use crate::codec::{BlockLevel, Decoder, Registry};
use crate::document::{Paragraph, Table};
use crate::error::{Error, Result};
use crate::xml::{self, RawXml, RootTag, XmlWriter};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// Block-level content (body, table cells, headers, notes, comments)
#[derive(Debug)]
pub enum BlockContent {
    /// Paragraph
    Paragraph(Paragraph),
    /// Element decoded by a registered block-level module
    Element(Box<dyn BlockLevel>),
    /// Unrecognized element, preserved verbatim
    Raw(RawXml),
}

impl BlockContent {
    /// Decode one block-level child
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        if start.name().local_name().as_ref() == b"p" {
            return Ok(BlockContent::Paragraph(Paragraph::decode(decoder, start, empty)?));
        }
        decoder.block(start, empty)
    }

    /// Write to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        match self {
            BlockContent::Paragraph(para) => para.write_to(writer),
            BlockContent::Element(element) => element.encode(writer),
            BlockContent::Raw(raw) => raw.write_to(writer),
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            BlockContent::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            BlockContent::Element(e) => e.downcast_ref::<Table>(),
            _ => None,
        }
    }

    /// Plain text of this block ("" for raw content)
    pub fn text(&self) -> String {
        match self {
            BlockContent::Paragraph(p) => p.text(),
            BlockContent::Element(e) => e
                .downcast_ref::<Table>()
                .map(Table::text)
                .unwrap_or_default(),
            BlockContent::Raw(_) => String::new(),
        }
    }
}

/// Decode every block-level child of `parent`
pub fn decode_blocks(
    decoder: &mut Decoder<'_>,
    parent: &BytesStart<'_>,
    empty: bool,
) -> Result<Vec<BlockContent>> {
    let mut content = Vec::new();
    if empty {
        return Ok(content);
    }
    while let Some((child, child_empty)) = decoder.next_child(parent)? {
        content.push(BlockContent::decode(decoder, &child, child_empty)?);
    }
    Ok(content)
}

/// Joined text of a block sequence, one line per paragraph
pub fn blocks_text(content: &[BlockContent]) -> String {
    content
        .iter()
        .filter(|c| !matches!(c, BlockContent::Raw(_)))
        .map(BlockContent::text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Document body (w:body)
#[derive(Debug, Default)]
pub struct Body {
    /// Block-level content
    pub content: Vec<BlockContent>,
    /// Final section properties, always written last
    pub section_properties: Option<RawXml>,
}

impl Body {
    /// Decode the body (after the w:body start tag)
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut body = Body::default();
        if empty {
            return Ok(body);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            if child.name().local_name().as_ref() == b"sectPr" {
                body.section_properties = Some(decoder.capture(&child, child_empty)?);
            } else {
                body.content
                    .push(BlockContent::decode(decoder, &child, child_empty)?);
            }
        }

        Ok(body)
    }

    /// Get all paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(BlockContent::as_paragraph)
    }

    /// Get all paragraphs mutably
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.content.iter_mut().filter_map(|c| match c {
            BlockContent::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Get all top-level tables
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.content.iter().filter_map(BlockContent::as_table)
    }

    /// Write body to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:body")))?;

        for content in &self.content {
            content.write_to(writer)?;
        }

        if let Some(sect_pr) = &self.section_properties {
            sect_pr.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:body")))?;
        Ok(())
    }

    /// Add a paragraph and return it
    pub fn add_paragraph(&mut self, para: Paragraph) -> &mut Paragraph {
        self.content.push(BlockContent::Paragraph(para));
        match self.content.last_mut() {
            Some(BlockContent::Paragraph(p)) => p,
            _ => unreachable!("a paragraph was just pushed"),
        }
    }

    /// Add a table
    pub fn add_table(&mut self, table: Table) {
        self.content.push(BlockContent::Element(Box::new(table)));
    }
}

/// The main document part
#[derive(Debug)]
pub struct DocumentPart {
    /// Root element with its namespace declarations
    pub root: RootTag,
    /// Children of the root before the body (e.g. w:background)
    pub prelude: Vec<RawXml>,
    pub body: Body,
}

impl Default for DocumentPart {
    fn default() -> Self {
        Self {
            root: RootTag::new("w:document", &xml::document_namespaces()),
            prelude: Vec::new(),
            body: Body::default(),
        }
    }
}

impl DocumentPart {
    /// Parse document.xml content
    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;

        let mut prelude = Vec::new();
        let mut body = None;
        if !empty {
            while let Some((child, child_empty)) = decoder.next_child(&root)? {
                if child.name().local_name().as_ref() == b"body" && body.is_none() {
                    body = Some(Body::decode(&mut decoder, &child, child_empty)?);
                } else {
                    prelude.push(decoder.capture(&child, child_empty)?);
                }
            }
        }

        Ok(Self {
            root: RootTag::from_start(&root)?,
            prelude,
            body: body.ok_or_else(|| Error::InvalidDocument("Missing w:body element".into()))?,
        })
    }

    /// Serialize to document.xml content
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;
        for raw in &self.prelude {
            raw.write_to(&mut writer)?;
        }
        self.body.write_to(&mut writer)?;
        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}
