//! Part URI handling for OPC packages

use crate::error::{Error, Result};
use std::fmt;

/// Represents a URI to a part within an OPC package.
///
/// Part URIs are always absolute paths starting with '/'.
/// Example: `/word/document.xml`
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartUri {
    path: String,
}

impl PartUri {
    /// Create a new PartUri from a string.
    ///
    /// The path is normalized: leading '/' ensured, trailing '/' removed,
    /// `.` and `..` segments collapsed.
    pub fn new(path: &str) -> Result<Self> {
        let path = path.trim();

        if path.is_empty() {
            return Err(Error::InvalidPartUri("empty path".into()));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(Error::InvalidPartUri(format!(
                            "invalid path '{}': escapes the package root",
                            path
                        )));
                    }
                }
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(Error::InvalidPartUri(format!("invalid path '{}'", path)));
        }

        Ok(Self {
            path: format!("/{}", segments.join("/")),
        })
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Path inside the ZIP archive (no leading '/')
    pub fn zip_name(&self) -> &str {
        &self.path[1..]
    }

    /// Get the file name portion
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Get the file extension
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        let dot = name.rfind('.')?;
        let ext = &name[dot + 1..];
        (!ext.is_empty()).then_some(ext)
    }

    /// Directory containing this part, without trailing '/' ("" for the root)
    pub fn directory(&self) -> &str {
        match self.path.rfind('/') {
            Some(pos) => &self.path[..pos],
            None => "",
        }
    }

    /// Get the relationships URI for this part.
    ///
    /// For `/word/document.xml`, returns `/word/_rels/document.xml.rels`
    pub fn relationships_uri(&self) -> PartUri {
        PartUri {
            path: format!("{}/_rels/{}.rels", self.directory(), self.file_name()),
        }
    }

    /// Resolve a relationship target against this part.
    ///
    /// For `/word/document.xml` and `../media/image1.png`, returns `/media/image1.png`
    pub fn resolve(&self, target: &str) -> Result<PartUri> {
        if target.starts_with('/') {
            return PartUri::new(target);
        }
        PartUri::new(&format!("{}/{}", self.directory(), target))
    }

    /// Relationship target pointing at this part, relative to `source`.
    ///
    /// `None` means the package root (package-level relationships).
    pub fn relative_from(&self, source: Option<&PartUri>) -> String {
        let base: Vec<&str> = source
            .map(|s| s.directory().split('/').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let target: Vec<&str> = self.path.split('/').filter(|s| !s.is_empty()).collect();

        // The file name itself never counts as a shared directory
        let dirs = &target[..target.len() - 1];
        let common = base
            .iter()
            .zip(dirs.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = std::iter::repeat("..").take(base.len() - common).collect();
        parts.extend_from_slice(&target[common..]);
        parts.join("/")
    }

    /// Sibling URI in the same directory with a different file name
    pub fn with_file_name(&self, name: &str) -> Result<PartUri> {
        PartUri::new(&format!("{}/{}", self.directory(), name))
    }

    /// Check if this URI points to a relationships file
    pub fn is_relationships(&self) -> bool {
        self.path.contains("/_rels/") && self.path.ends_with(".rels")
    }
}

impl fmt::Display for PartUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl std::str::FromStr for PartUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PartUri::new(s)
    }
}

/// Well-known part locations used when writing a package
pub mod well_known {
    pub const DOCUMENT: &str = "/word/document.xml";
    pub const CORE_PROPERTIES: &str = "/docProps/core.xml";
    pub const APP_PROPERTIES: &str = "/docProps/app.xml";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_leading_slash() {
        let uri = PartUri::new("word/document.xml").unwrap();
        assert_eq!(uri.as_str(), "/word/document.xml");
        assert_eq!(uri.zip_name(), "word/document.xml");
    }

    #[test]
    fn test_new_normalizes_dots() {
        let uri = PartUri::new("/word/./sub/../styles.xml").unwrap();
        assert_eq!(uri.as_str(), "/word/styles.xml");
        assert!(PartUri::new("/../escape.xml").is_err());
        assert!(PartUri::new("  ").is_err());
    }

    #[test]
    fn test_file_name_and_extension() {
        let uri = PartUri::new("/word/media/image1.PNG").unwrap();
        assert_eq!(uri.file_name(), "image1.PNG");
        assert_eq!(uri.extension(), Some("PNG"));
        assert_eq!(uri.directory(), "/word/media");

        let bare = PartUri::new("/word/noext").unwrap();
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn test_relationships_uri() {
        let uri = PartUri::new("/word/document.xml").unwrap();
        assert_eq!(uri.relationships_uri().as_str(), "/word/_rels/document.xml.rels");
        assert!(uri.relationships_uri().is_relationships());

        let root = PartUri::new("/content.xml").unwrap();
        assert_eq!(root.relationships_uri().as_str(), "/_rels/content.xml.rels");
    }

    #[test]
    fn test_resolve() {
        let uri = PartUri::new("/word/document.xml").unwrap();
        assert_eq!(uri.resolve("../media/image1.png").unwrap().as_str(), "/media/image1.png");
        assert_eq!(uri.resolve("styles.xml").unwrap().as_str(), "/word/styles.xml");
        assert_eq!(uri.resolve("/customXml/item1.xml").unwrap().as_str(), "/customXml/item1.xml");
    }

    #[test]
    fn test_relative_from() {
        let doc = PartUri::new("/word/document.xml").unwrap();

        let styles = PartUri::new("/word/styles.xml").unwrap();
        assert_eq!(styles.relative_from(Some(&doc)), "styles.xml");

        let media = PartUri::new("/word/media/image1.png").unwrap();
        assert_eq!(media.relative_from(Some(&doc)), "media/image1.png");

        let custom = PartUri::new("/customXml/item1.xml").unwrap();
        assert_eq!(custom.relative_from(Some(&doc)), "../customXml/item1.xml");

        assert_eq!(doc.relative_from(None), "word/document.xml");
    }

    #[test]
    fn test_relative_roundtrips_through_resolve() {
        let source = PartUri::new("/word/glossary/document.xml").unwrap();
        let target = PartUri::new("/word/media/image7.emf").unwrap();

        let relative = target.relative_from(Some(&source));
        assert_eq!(relative, "../media/image7.emf");
        assert_eq!(source.resolve(&relative).unwrap(), target);
    }
}
