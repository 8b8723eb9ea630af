//! Document model - high-level API for DOCX documents
//!
//! A [`Document`] holds the main document part, one optional slot per known
//! secondary part, headers and footers, media, and everything the package
//! contained that this crate does not model. Loading walks the relationship
//! graph of a [`Package`](crate::opc::Package); saving builds a fresh one.

mod alloc;
mod body;
mod bookmark;
mod breaks;
mod hyperlink;
mod load;
mod paragraph;
mod run;
mod save;
mod table;

pub use alloc::{Media, BOOKMARK_ID_SEED};
pub use body::{blocks_text, decode_blocks, BlockContent, Body, DocumentPart};
pub use bookmark::{BookmarkEnd, BookmarkStart};
pub use breaks::{Break, BreakType, Tab};
pub use hyperlink::Hyperlink;
pub use paragraph::{NumberingRef, Paragraph, ParagraphContent, ParagraphProperties};
pub use run::{Run, RunContent, RunFonts, RunProperties};
pub use table::{
    GridColumn, RowContent, Table, TableCell, TableCellProperties, TableContent, TableGrid,
    TableRow, VMerge,
};

use crate::codec::Registry;
use crate::opc::{content_types, rel_types, well_known, TargetMode};
use crate::parts::{
    Comments, CoreProperties, FontTable, HeaderFooter, HeaderFooterKind, Notes, Numbering,
    PartSlot, Settings, Styles,
};
use alloc::Resources;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Register the element modules shipped with this crate
pub fn register_builtins(registry: &Registry) {
    table::register(registry);
    bookmark::register(registry);
    hyperlink::register(registry);
    breaks::register(registry);
}

/// A part of the document that relationships can start from or point at
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartRef {
    /// The main document part
    Document,
    /// A typed secondary part
    Slot(PartSlot),
    /// A header, by its relationship ID from the main part
    Header(String),
    /// A footer, by its relationship ID from the main part
    Footer(String),
    /// A preserved part, by its key in [`Document::unknown_parts`]
    Unknown(String),
}

/// Where a preserved relationship points
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelTarget {
    /// URI outside the package, written back verbatim
    External(String),
    /// A part of this document
    Part(PartRef),
    /// A media file, by name
    Media(String),
}

/// A relationship this crate does not interpret, replayed on save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownRel {
    /// Source part; `None` for package-level relationships
    pub owner: Option<PartRef>,
    pub id: String,
    pub rel_type: String,
    pub target: RelTarget,
}

impl UnknownRel {
    pub fn target_mode(&self) -> TargetMode {
        match self.target {
            RelTarget::External(_) => TargetMode::External,
            _ => TargetMode::Internal,
        }
    }
}

/// A DOCX document
#[derive(Debug)]
pub struct Document {
    /// Main document part
    pub document: DocumentPart,
    pub styles: Option<Styles>,
    pub settings: Option<Settings>,
    pub font_table: Option<FontTable>,
    pub numbering: Option<Numbering>,
    pub footnotes: Option<Notes>,
    pub endnotes: Option<Notes>,
    pub comments: Option<Comments>,
    /// Web settings part, kept as bytes
    pub web_settings: Option<Vec<u8>>,
    /// Theme part, kept as bytes
    pub theme: Option<Vec<u8>>,
    pub core_properties: Option<CoreProperties>,
    /// Extended (application) properties, kept as bytes
    pub app_properties: Option<Vec<u8>>,
    /// Headers by relationship ID
    pub headers: BTreeMap<String, HeaderFooter>,
    /// Footers by relationship ID
    pub footers: BTreeMap<String, HeaderFooter>,
    /// Parts nothing else models, by package path
    pub unknown_parts: BTreeMap<String, Vec<u8>>,
    pub unknown_rels: Vec<UnknownRel>,
    /// Declared content types of preserved parts
    unknown_content_types: BTreeMap<String, String>,
    /// Relationship IDs the typed parts were loaded with
    part_rel_ids: BTreeMap<PartSlot, String>,
    /// Package path of the main document part
    document_path: String,
    document_content_type: String,
    resources: Mutex<Resources>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            document: DocumentPart::default(),
            styles: None,
            settings: None,
            font_table: None,
            numbering: None,
            footnotes: None,
            endnotes: None,
            comments: None,
            web_settings: None,
            theme: None,
            core_properties: None,
            app_properties: None,
            headers: BTreeMap::new(),
            footers: BTreeMap::new(),
            unknown_parts: BTreeMap::new(),
            unknown_rels: Vec::new(),
            unknown_content_types: BTreeMap::new(),
            part_rel_ids: BTreeMap::new(),
            document_path: well_known::DOCUMENT.to_string(),
            document_content_type: content_types::MAIN_DOCUMENT.to_string(),
            resources: Mutex::new(Resources::default()),
        }
    }

    /// Package path of the main document part
    pub fn document_path(&self) -> &str {
        &self.document_path
    }

    /// Declared content type of a preserved part
    pub fn unknown_content_type(&self, path: &str) -> Option<&str> {
        self.unknown_content_types.get(path).map(String::as_str)
    }

    /// Keep an extra part in the package, optionally with its content type
    pub fn add_unknown_part(
        &mut self,
        path: impl Into<String>,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) {
        let path = path.into();
        if let Some(content_type) = content_type {
            self.unknown_content_types
                .insert(path.clone(), content_type.to_string());
        }
        self.unknown_parts.insert(path, data);
    }

    /// Get the body
    pub fn body(&self) -> &Body {
        &self.document.body
    }

    /// Get mutable body
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.document.body
    }

    /// Get all paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.document.body.paragraphs()
    }

    /// Get paragraph count
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Get paragraph by index
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs().nth(index)
    }

    /// Get all tables
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.document.body.tables()
    }

    /// Get table count
    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Get table by index
    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables().nth(index)
    }

    /// Get all text in the document, one line per paragraph
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Add a paragraph with text
    pub fn add_paragraph(&mut self, text: impl Into<String>) -> &mut Paragraph {
        self.document.body.add_paragraph(Paragraph::new(text))
    }

    /// Add an empty paragraph
    pub fn add_empty_paragraph(&mut self) -> &mut Paragraph {
        self.document.body.add_paragraph(Paragraph::default())
    }

    /// Add a table
    pub fn add_table(&mut self, table: Table) {
        self.document.body.add_table(table);
    }

    /// Add a header part, returning its relationship ID.
    ///
    /// The part is written as w:hdr whatever kind it was built with.
    pub fn add_header(&mut self, mut header: HeaderFooter) -> String {
        header.set_kind(HeaderFooterKind::Header);
        let id = self.next_rel_id();
        self.headers.insert(id.clone(), header);
        id
    }

    /// Add a footer part, returning its relationship ID.
    ///
    /// The part is written as w:ftr whatever kind it was built with.
    pub fn add_footer(&mut self, mut footer: HeaderFooter) -> String {
        footer.set_kind(HeaderFooterKind::Footer);
        let id = self.next_rel_id();
        self.footers.insert(id.clone(), footer);
        id
    }

    /// Add an external hyperlink relationship, returning its ID
    pub fn add_hyperlink(&mut self, url: impl Into<String>) -> String {
        let id = self.next_rel_id();
        self.unknown_rels.push(UnknownRel {
            owner: Some(PartRef::Document),
            id: id.clone(),
            rel_type: rel_types::HYPERLINK.to_string(),
            target: RelTarget::External(url.into()),
        });
        id
    }

    /// Target of a hyperlink relationship of the main document part
    pub fn hyperlink_target(&self, rel_id: &str) -> Option<&str> {
        self.unknown_rels
            .iter()
            .filter(|rel| rel.owner == Some(PartRef::Document) && rel.id == rel_id)
            .find_map(|rel| match &rel.target {
                RelTarget::External(url) => Some(url.as_str()),
                _ => None,
            })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document() {
        let mut doc = Document::new();
        doc.add_paragraph("Hello");
        doc.add_paragraph("World").add_run(Run::new("!"));
        doc.add_table(Table::from_data(&[&["a", "b"][..]]));

        assert_eq!(doc.paragraph_count(), 2);
        assert_eq!(doc.table_count(), 1);
        assert_eq!(doc.text(), "Hello\nWorld!");
        assert_eq!(doc.document_path(), "/word/document.xml");

        doc.add_empty_paragraph().set_style("Heading2");
        assert_eq!(doc.paragraph_count(), 3);
        assert_eq!(doc.paragraph(2).unwrap().text(), "");
    }

    #[test]
    fn test_unknown_part_content_type() {
        let mut doc = Document::new();
        doc.add_unknown_part("/custom/data.bin", vec![1, 2], Some("application/x-custom"));
        doc.add_unknown_part("/custom/other.xml", vec![3], None);

        assert_eq!(doc.unknown_parts.len(), 2);
        assert_eq!(
            doc.unknown_content_type("/custom/data.bin"),
            Some("application/x-custom")
        );
        assert_eq!(doc.unknown_content_type("/custom/other.xml"), None);
    }

    #[test]
    fn test_headers_and_hyperlinks_get_fresh_ids() {
        let mut doc = Document::new();
        let header = doc.add_header(HeaderFooter::with_text(HeaderFooterKind::Header, "Top"));
        let footer = doc.add_footer(HeaderFooter::with_text(HeaderFooterKind::Footer, "Bottom"));
        let link = doc.add_hyperlink("https://example.com");

        assert_eq!(header, "rId1");
        assert_eq!(footer, "rId2");
        assert_eq!(link, "rId3");
        assert_eq!(doc.headers["rId1"].text(), "Top");
        assert_eq!(doc.footers["rId2"].text(), "Bottom");

        let misbuilt = doc.add_footer(HeaderFooter::with_text(HeaderFooterKind::Header, "Foot"));
        assert!(!doc.headers.contains_key(&misbuilt));
        assert_eq!(doc.footers[&misbuilt].kind(), HeaderFooterKind::Footer);
        assert_eq!(doc.hyperlink_target(&link), Some("https://example.com"));
    }
}
