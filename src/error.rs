//! Error types for linch-docx-roundtrip

use std::fmt;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML encoding error: {0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("XML escape error: {0}")]
    XmlEscape(#[from] quick_xml::escape::EscapeError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Invalid part URI: {0}")]
    InvalidPartUri(String),

    #[error("Missing attribute '{attr}' on element '{element}'")]
    MissingAttribute { element: String, attr: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("Unexpected end of XML inside '{0}'")]
    UnexpectedEof(String),

    /// A failure localized to one part of the package
    #[error("Failed to {operation} part '{part}': {source}")]
    Part {
        part: String,
        operation: Operation,
        #[source]
        source: Box<Error>,
    },
}

/// The step that was running when a part-level error occurred
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Parse,
    Serialize,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Parse => f.write_str("parse"),
            Operation::Serialize => f.write_str("serialize"),
        }
    }
}

impl Error {
    /// Wrap this error with the part path and operation it belongs to
    pub fn in_part(self, part: impl Into<String>, operation: Operation) -> Self {
        Error::Part {
            part: part.into(),
            operation,
            source: Box::new(self),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
