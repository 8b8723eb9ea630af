//! # linch-docx-roundtrip
//!
//! Lossless reading and rewriting of DOCX (WordprocessingML) packages.
//!
//! ## Features
//!
//! - Load a package into a [`Document`] by walking its relationship graph
//! - Typed access to the body, styles, settings, numbering, notes, comments,
//!   headers, footers and core properties
//! - Round-trip preservation: unknown elements, parts and relationships are
//!   kept and written back
//! - Pluggable element modules through a [`Registry`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linch_docx_roundtrip::Document;
//!
//! // Open a document
//! let doc = Document::open("example.docx")?;
//!
//! // Read paragraphs
//! for para in doc.paragraphs() {
//!     println!("{}", para.text());
//! }
//!
//! // Create a new document
//! let mut doc = Document::new();
//! doc.add_paragraph("Hello World!");
//! doc.save("output.docx")?;
//! ```

pub mod codec;
pub mod document;
pub mod error;
pub mod opc;
pub mod parts;
pub mod xml;

pub use codec::Registry;
pub use document::{Document, Paragraph, Run, Table};
pub use error::{Error, Result};
pub use opc::{Package, Part, PartUri};
pub use xml::RawXml;
