//! OPC Package implementation
//!
//! Handles reading and writing DOCX files as ZIP packages

use crate::error::{Error, Result};
use crate::opc::relationships::{rel_types, TargetMode};
use crate::opc::{content_types, ContentTypes, Part, PartUri, Relationships};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

const CONTENT_TYPES_NAME: &str = "[Content_Types].xml";
const PACKAGE_RELS_NAME: &str = "_rels/.rels";

/// An OPC package (ZIP-based container for DOCX, XLSX, PPTX, etc.)
#[derive(Debug)]
pub struct Package {
    /// All parts in the package, ordered by path
    parts: BTreeMap<PartUri, Part>,
    /// Package-level relationships (/_rels/.rels)
    relationships: Relationships,
    /// Content types ([Content_Types].xml)
    content_types: ContentTypes,
}

impl Package {
    /// Create a new empty package
    pub fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
            relationships: Relationships::new(),
            content_types: ContentTypes::new(),
        }
    }

    /// Open a package from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a package from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Open a package from a reader
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut package = Self::new();

        package.content_types = match read_entry(&mut archive, CONTENT_TYPES_NAME)? {
            Some(data) => ContentTypes::from_xml(&data)?,
            None => return Err(Error::MissingPart(CONTENT_TYPES_NAME.into())),
        };

        if let Some(data) = read_entry(&mut archive, PACKAGE_RELS_NAME)? {
            package.relationships = Relationships::from_xml(&data)?;
        }

        package.read_parts(&mut archive)?;
        package.read_part_relationships(&mut archive)?;

        log::debug!(
            "read package: {} parts, {} package relationships",
            package.parts.len(),
            package.relationships.len()
        );
        Ok(package)
    }

    /// Save the package to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Save the package to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the package to a writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(CONTENT_TYPES_NAME, options)?;
        self.content_types.write_to(&mut zip)?;

        if !self.relationships.is_empty() {
            zip.start_file(PACKAGE_RELS_NAME, options)?;
            self.relationships.write_to(&mut zip)?;
        }

        for (uri, part) in &self.parts {
            zip.start_file(uri.zip_name(), options)?;
            zip.write_all(part.data())?;

            if !part.relationships().is_empty() {
                zip.start_file(uri.relationships_uri().zip_name(), options)?;
                part.relationships().write_to(&mut zip)?;
            }
        }

        zip.finish()?;
        Ok(())
    }

    /// Get a part by URI
    pub fn part(&self, uri: &PartUri) -> Option<&Part> {
        self.parts.get(uri)
    }

    /// Add a part to the package, replacing any part at the same URI
    pub fn add_part(&mut self, part: Part) {
        let uri = part.uri().clone();
        self.content_types.register(&uri, part.content_type());
        self.parts.insert(uri, part);
    }

    /// Get all part URIs
    pub fn part_uris(&self) -> impl Iterator<Item = &PartUri> {
        self.parts.keys()
    }

    /// Get all parts
    pub fn parts(&self) -> impl Iterator<Item = (&PartUri, &Part)> {
        self.parts.iter()
    }

    /// Number of parts
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Get package-level relationships
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Get mutable package-level relationships
    pub fn relationships_mut(&mut self) -> &mut Relationships {
        &mut self.relationships
    }

    /// Relationships sourced at a part (empty when the part does not exist)
    pub fn part_relationships(&self, uri: &PartUri) -> Option<&Relationships> {
        self.parts.get(uri).map(Part::relationships)
    }

    /// Add a relationship sourced at an existing part
    pub fn add_part_relationship(
        &mut self,
        source: &PartUri,
        id: &str,
        rel_type: &str,
        target: &str,
        mode: TargetMode,
    ) -> Result<()> {
        let part = self
            .parts
            .get_mut(source)
            .ok_or_else(|| Error::PartNotFound(source.to_string()))?;
        part.relationships_mut().add_with_id(id, rel_type, target, mode);
        Ok(())
    }

    /// Get content types
    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// Get the main document part
    pub fn main_document_part(&self) -> Option<&Part> {
        let rel = self.relationships.by_type(rel_types::OFFICE_DOCUMENT)?;
        let uri = PartUri::new(&rel.target).ok()?;
        self.parts.get(&uri)
    }

    // === Private methods ===

    fn read_parts<R: Read + Seek>(&mut self, archive: &mut ZipArchive<R>) -> Result<()> {
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            if name.ends_with('/') || name == CONTENT_TYPES_NAME {
                continue;
            }

            let uri = PartUri::new(&name)?;
            // Relationship parts are attached to their source part instead
            if uri.is_relationships() {
                continue;
            }

            let content_type = self
                .content_types
                .get(&uri)
                .unwrap_or(content_types::OCTET_STREAM)
                .to_string();

            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            self.parts.insert(uri.clone(), Part::new(uri, content_type, data));
        }

        Ok(())
    }

    fn read_part_relationships<R: Read + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
    ) -> Result<()> {
        for part in self.parts.values_mut() {
            let rels_uri = part.uri().relationships_uri();
            if let Some(data) = read_entry(archive, rels_uri.zip_name())? {
                part.set_relationships(Relationships::from_xml(&data)?);
            }
        }

        Ok(())
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a whole archive entry, `None` when it does not exist
fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_package() {
        let pkg = Package::new();
        assert_eq!(pkg.part_count(), 0);
        assert!(pkg.relationships().is_empty());
    }

    #[test]
    fn test_add_part() {
        let mut pkg = Package::new();
        let uri = PartUri::new("/word/document.xml").unwrap();
        pkg.add_part(Part::new(uri.clone(), content_types::MAIN_DOCUMENT, b"<doc/>".to_vec()));

        assert_eq!(pkg.part(&uri).unwrap().data(), b"<doc/>");
        assert_eq!(pkg.content_types().get(&uri), Some(content_types::MAIN_DOCUMENT));
    }

    #[test]
    fn test_add_part_relationship_requires_part() {
        let mut pkg = Package::new();
        let uri = PartUri::new("/word/document.xml").unwrap();
        let err = pkg
            .add_part_relationship(
                &uri,
                "rId1",
                rel_types::STYLES,
                "styles.xml",
                TargetMode::Internal,
            )
            .unwrap_err();
        assert!(matches!(err, Error::PartNotFound(_)));
    }

    #[test]
    fn test_roundtrip_empty() {
        let pkg = Package::new();
        let bytes = pkg.to_bytes().unwrap();

        let pkg2 = Package::from_bytes(&bytes).unwrap();
        assert_eq!(pkg2.part_count(), 0);
    }

    #[test]
    fn test_roundtrip_with_parts_and_relationships() {
        let mut pkg = Package::new();

        let doc_uri = PartUri::new("/word/document.xml").unwrap();
        pkg.add_part(Part::new(
            doc_uri.clone(),
            content_types::MAIN_DOCUMENT,
            b"<?xml version=\"1.0\"?><document/>".to_vec(),
        ));
        let styles_uri = PartUri::new("/word/styles.xml").unwrap();
        pkg.add_part(Part::new(styles_uri.clone(), content_types::STYLES, b"<styles/>".to_vec()));

        pkg.relationships_mut()
            .add(rel_types::OFFICE_DOCUMENT, "word/document.xml");
        pkg.add_part_relationship(
            &doc_uri,
            "rId7",
            rel_types::STYLES,
            "styles.xml",
            TargetMode::Internal,
        )
        .unwrap();

        let bytes = pkg.to_bytes().unwrap();
        let pkg2 = Package::from_bytes(&bytes).unwrap();

        assert_eq!(pkg2.part_count(), 2);
        assert!(pkg2.main_document_part().is_some());
        let rels = pkg2.part_relationships(&doc_uri).unwrap();
        assert_eq!(rels.get("rId7").unwrap().target, "styles.xml");
        assert_eq!(pkg2.part(&styles_uri).unwrap().content_type(), content_types::STYLES);
    }

    #[test]
    fn test_missing_content_types_is_an_error() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options: FileOptions<()> = FileOptions::default();
            zip.start_file("word/document.xml", options).unwrap();
            zip.write_all(b"<doc/>").unwrap();
            zip.finish().unwrap();
        }

        let err = Package::from_bytes(cursor.get_ref()).unwrap_err();
        assert!(matches!(err, Error::MissingPart(_)));
    }
}
