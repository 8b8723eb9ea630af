//! In-memory DOCX packages for the integration tests

#![allow(dead_code)]

use linch_docx_roundtrip::opc::{content_types, rel_types};
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const CUSTOM_XML_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXmlProps";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A `.rels` entry
pub struct Rel<'a> {
    pub id: &'a str,
    pub rel_type: &'a str,
    pub target: &'a str,
    pub external: bool,
}

pub fn rel<'a>(id: &'a str, rel_type: &'a str, target: &'a str) -> Rel<'a> {
    Rel {
        id,
        rel_type,
        target,
        external: false,
    }
}

pub fn external_rel<'a>(id: &'a str, rel_type: &'a str, target: &'a str) -> Rel<'a> {
    Rel {
        id,
        rel_type,
        target,
        external: true,
    }
}

pub fn rels_xml(rels: &[Rel<'_>]) -> Vec<u8> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            rel.id,
            rel.rel_type,
            rel.target,
            if rel.external { r#" TargetMode="External""# } else { "" }
        ));
    }
    xml.push_str("</Relationships>");
    xml.into_bytes()
}

pub fn content_types_xml(overrides: &[(&str, &str)]) -> Vec<u8> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    for (ext, content_type) in [
        ("rels", content_types::RELATIONSHIPS),
        ("xml", content_types::XML),
        ("png", content_types::PNG),
    ] {
        xml.push_str(&format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            ext, content_type
        ));
    }
    for (part, content_type) in overrides {
        xml.push_str(&format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            part, content_type
        ));
    }
    xml.push_str("</Types>");
    xml.into_bytes()
}

/// Main document part wrapping `body` (the inner XML of w:body)
pub fn document_xml(body: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}" xmlns:r="{}"><w:body>{}</w:body></w:document>"#,
        W_NS, R_NS, body
    )
    .into_bytes()
}

pub fn styles_xml() -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/></w:style></w:styles>"#,
        W_NS
    )
    .into_bytes()
}

pub fn header_xml(text: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr xmlns:w="{}" xmlns:r="{}"><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:hdr>"#,
        W_NS, R_NS, text
    )
    .into_bytes()
}

/// Package-level relationships pointing at /word/document.xml
pub fn package_rels() -> Vec<u8> {
    rels_xml(&[rel("rId1", rel_types::OFFICE_DOCUMENT, "word/document.xml")])
}

/// Zip the given entries into a package
pub fn zip_package(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options: FileOptions<()> = FileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Package with a document and a styles part, nothing else
pub fn document_with_styles(body: &str) -> Vec<u8> {
    zip_package(&[
        (
            "[Content_Types].xml",
            content_types_xml(&[
                ("/word/document.xml", content_types::MAIN_DOCUMENT),
                ("/word/styles.xml", content_types::STYLES),
            ]),
        ),
        ("_rels/.rels", package_rels()),
        ("word/document.xml", document_xml(body)),
        (
            "word/_rels/document.xml.rels",
            rels_xml(&[rel("rId1", rel_types::STYLES, "styles.xml")]),
        ),
        ("word/styles.xml", styles_xml()),
    ])
}
