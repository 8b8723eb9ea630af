//! Integration test: load, save and reload whole packages

mod common;

use common::*;
use linch_docx_roundtrip::document::{PartRef, RelTarget, BOOKMARK_ID_SEED};
use linch_docx_roundtrip::error::Operation;
use linch_docx_roundtrip::opc::{content_types, rel_types, Package, PartUri, TargetMode};
use linch_docx_roundtrip::parts::{HeaderFooter, HeaderFooterKind};
use linch_docx_roundtrip::{Document, Error};
use pretty_assertions::assert_eq;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

const CUSTOM_PROPS_CT: &str = "application/vnd.openxmlformats-officedocument.customXmlProperties+xml";
const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 1, 2, 3];

const RICH_BODY: &str = concat!(
    r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Report</w:t></w:r></w:p>"#,
    r#"<w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink r:id="rId6"><w:r><w:t>the docs</w:t></w:r></w:hyperlink></w:p>"#,
    r#"<w:sdt><w:sdtPr><w:alias w:val="Box"/></w:sdtPr><w:sdtContent><w:p><w:r><w:t>In a control</w:t></w:r></w:p></w:sdtContent></w:sdt>"#,
    r#"<w:sectPr><w:headerReference w:type="default" r:id="rId3"/><w:pgSz w:w="12240" w:h="15840"/></w:sectPr>"#
);

fn rich_package() -> Vec<u8> {
    let settings = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:settings xmlns:w="{}"><w:zoom w:percent="100"/><w:defaultTabStop w:val="720"/></w:settings>"#,
        W_NS
    );
    let styles2 = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}"><w:style w:type="paragraph" w:styleId="Other"><w:name w:val="Other"/></w:style></w:styles>"#,
        W_NS
    );
    let core = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
        r#"<dc:title>Quarterly</dc:title><dc:creator>Sam</dc:creator></cp:coreProperties>"#
    );
    let app = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Pages>1</Pages></Properties>"#;

    zip_package(&[
        (
            "[Content_Types].xml",
            content_types_xml(&[
                ("/word/document.xml", content_types::MAIN_DOCUMENT),
                ("/word/styles.xml", content_types::STYLES),
                ("/word/styles2.xml", content_types::STYLES),
                ("/word/settings.xml", content_types::SETTINGS),
                ("/word/header1.xml", content_types::HEADER),
                ("/customXml/itemProps1.xml", CUSTOM_PROPS_CT),
                ("/docProps/core.xml", content_types::CORE_PROPERTIES),
                ("/docProps/app.xml", content_types::EXTENDED_PROPERTIES),
            ]),
        ),
        (
            "_rels/.rels",
            rels_xml(&[
                rel("rId1", rel_types::OFFICE_DOCUMENT, "word/document.xml"),
                rel("rId2", rel_types::CORE_PROPERTIES, "docProps/core.xml"),
                rel("rId3", rel_types::EXTENDED_PROPERTIES, "docProps/app.xml"),
                rel("rId4", rel_types::THUMBNAIL, "docProps/thumbnail.png"),
            ]),
        ),
        ("word/document.xml", document_xml(RICH_BODY)),
        (
            "word/_rels/document.xml.rels",
            rels_xml(&[
                rel("rId1", rel_types::STYLES, "styles.xml"),
                rel("rId2", rel_types::SETTINGS, "settings.xml"),
                rel("rId3", rel_types::HEADER, "header1.xml"),
                rel("rId4", rel_types::IMAGE, "media/image1.png"),
                rel("rId5", rel_types::CUSTOM_XML, "../customXml/item1.xml"),
                external_rel("rId6", rel_types::HYPERLINK, "https://example.com/docs"),
                rel("rId7", rel_types::STYLES, "styles2.xml"),
            ]),
        ),
        ("word/styles.xml", styles_xml()),
        ("word/styles2.xml", styles2.into_bytes()),
        ("word/settings.xml", settings.into_bytes()),
        ("word/header1.xml", header_xml("Top of page")),
        (
            "word/_rels/header1.xml.rels",
            rels_xml(&[
                rel("rId1", rel_types::IMAGE, "media/image1.png"),
                external_rel("rId2", rel_types::HYPERLINK, "https://example.com/header"),
            ]),
        ),
        ("word/media/image1.png", PNG_BYTES.to_vec()),
        ("customXml/item1.xml", b"<b:Sources xmlns:b=\"urn:test\"/>".to_vec()),
        (
            "customXml/_rels/item1.xml.rels",
            rels_xml(&[rel("rId1", CUSTOM_XML_PROPS, "itemProps1.xml")]),
        ),
        ("customXml/itemProps1.xml", b"<ds:datastoreItem xmlns:ds=\"urn:ds\"/>".to_vec()),
        ("docProps/core.xml", core.as_bytes().to_vec()),
        ("docProps/app.xml", app.as_bytes().to_vec()),
        ("docProps/thumbnail.png", PNG_BYTES.to_vec()),
    ])
}

fn uri(path: &str) -> PartUri {
    PartUri::new(path).unwrap()
}

/// (id, type, target, external) of a part's relationships
fn part_rels(package: &Package, path: &str) -> Vec<(String, String, String, bool)> {
    package
        .part_relationships(&uri(path))
        .map(|rels| {
            rels.iter()
                .map(|r| (r.id.clone(), r.rel_type.clone(), r.target.clone(), r.is_external()))
                .collect()
        })
        .unwrap_or_default()
}

fn find_rel<'a>(
    rels: &'a [(String, String, String, bool)],
    id: &str,
) -> &'a (String, String, String, bool) {
    rels.iter()
        .find(|r| r.0 == id)
        .unwrap_or_else(|| panic!("relationship {} missing", id))
}

fn assert_rich_document(doc: &Document) {
    let styles = doc.styles.as_ref().expect("styles loaded");
    assert!(styles.get("Heading1").is_some());
    assert!(styles.get("Other").is_none());
    assert_eq!(doc.settings.as_ref().and_then(|s| s.default_tab_stop), Some(720));
    assert_eq!(doc.headers.get("rId3").map(|h| h.text()).as_deref(), Some("Top of page"));
    assert_eq!(doc.media_names(), vec!["image1.png".to_string()]);
    assert_eq!(doc.media_for_rel("rId4").as_deref(), Some("image1.png"));
    assert_eq!(doc.media("image1.png").as_deref(), Some(PNG_BYTES));
    assert_eq!(
        doc.core_properties.as_ref().and_then(|c| c.title.as_deref()),
        Some("Quarterly")
    );
    assert!(doc.app_properties.is_some());

    assert_eq!(doc.paragraph_count(), 2);
    assert_eq!(doc.paragraph(0).unwrap().style(), Some("Heading1"));
    assert_eq!(doc.text(), "Report\nSee the docs");
    assert_eq!(doc.hyperlink_target("rId6"), Some("https://example.com/docs"));

    let parts: BTreeSet<&str> = doc.unknown_parts.keys().map(String::as_str).collect();
    assert_eq!(
        parts,
        [
            "/customXml/item1.xml",
            "/customXml/itemProps1.xml",
            "/docProps/thumbnail.png",
            "/word/styles2.xml",
        ]
        .into_iter()
        .collect()
    );
    assert_eq!(
        doc.unknown_content_type("/customXml/itemProps1.xml"),
        Some(CUSTOM_PROPS_CT)
    );
}

#[test]
fn test_load_rich_package() {
    init_logging();
    let doc = Document::from_bytes(&rich_package()).unwrap();
    assert_rich_document(&doc);

    // Only the first styles relationship is parsed; the second is carried along
    let second = doc
        .unknown_rels
        .iter()
        .find(|r| r.rel_type == rel_types::STYLES)
        .unwrap();
    assert_eq!(second.id, "rId7");
    assert_eq!(second.owner, Some(PartRef::Document));
    assert_eq!(
        second.target,
        RelTarget::Part(PartRef::Unknown("/word/styles2.xml".into()))
    );

    // Relationships of typed parts point at what was loaded for them
    let header_image = doc
        .unknown_rels
        .iter()
        .find(|r| r.owner == Some(PartRef::Header("rId3".into())) && r.id == "rId1")
        .unwrap();
    assert_eq!(header_image.target, RelTarget::Media("image1.png".into()));

    let nested = doc
        .unknown_rels
        .iter()
        .find(|r| r.owner == Some(PartRef::Unknown("/customXml/item1.xml".into())))
        .unwrap();
    assert_eq!(nested.rel_type, CUSTOM_XML_PROPS);

    assert!(doc
        .unknown_rels
        .iter()
        .any(|r| r.owner.is_none() && r.rel_type == rel_types::THUMBNAIL));

    assert_eq!(doc.next_rel_id(), "rId8");
}

#[test]
fn test_save_reproduces_relationship_graph() {
    init_logging();
    let doc = Document::from_bytes(&rich_package()).unwrap();
    let package = doc.build_package().unwrap();

    let doc_rels = part_rels(&package, "/word/document.xml");
    assert_eq!(doc_rels.len(), 7);
    assert_eq!(find_rel(&doc_rels, "rId1").2, "styles.xml");
    assert_eq!(find_rel(&doc_rels, "rId3").1, rel_types::HEADER);
    assert_eq!(find_rel(&doc_rels, "rId3").2, "header1.xml");
    assert_eq!(find_rel(&doc_rels, "rId4").2, "media/image1.png");
    assert_eq!(find_rel(&doc_rels, "rId5").2, "../customXml/item1.xml");
    assert_eq!(find_rel(&doc_rels, "rId6").2, "https://example.com/docs");
    assert!(find_rel(&doc_rels, "rId6").3);
    assert_eq!(find_rel(&doc_rels, "rId7").2, "styles2.xml");

    let header_rels = part_rels(&package, "/word/header1.xml");
    assert_eq!(find_rel(&header_rels, "rId1").2, "media/image1.png");
    assert!(find_rel(&header_rels, "rId2").3);

    let item_rels = part_rels(&package, "/customXml/item1.xml");
    assert_eq!(
        item_rels,
        vec![(
            "rId1".to_string(),
            CUSTOM_XML_PROPS.to_string(),
            "itemProps1.xml".to_string(),
            false
        )]
    );

    let props = package.part(&uri("/customXml/itemProps1.xml")).unwrap();
    assert_eq!(props.data(), b"<ds:datastoreItem xmlns:ds=\"urn:ds\"/>");
    assert_eq!(props.content_type(), CUSTOM_PROPS_CT);

    let image = package.part(&uri("/word/media/image1.png")).unwrap();
    assert_eq!(image.data(), PNG_BYTES);
    assert_eq!(image.content_type(), content_types::PNG);

    let package_types: HashSet<&str> = package
        .relationships()
        .iter()
        .map(|r| r.rel_type.as_str())
        .collect();
    assert!(package_types.contains(rel_types::OFFICE_DOCUMENT));
    assert!(package_types.contains(rel_types::CORE_PROPERTIES));
    assert!(package_types.contains(rel_types::EXTENDED_PROPERTIES));
    assert!(package_types.contains(rel_types::THUMBNAIL));

    let main = package.main_document_part().unwrap();
    let xml = main.data_as_str().unwrap();
    assert!(xml.contains(
        r#"<w:sdtContent><w:p><w:r><w:t>In a control</w:t></w:r></w:p></w:sdtContent>"#
    ));
    assert!(xml.contains(r#"<w:headerReference w:type="default" r:id="rId3"/>"#));
    assert!(xml.contains(r#"<w:hyperlink r:id="rId6">"#));
}

#[test]
fn test_reload_after_save() {
    init_logging();
    let doc = Document::from_bytes(&rich_package()).unwrap();
    let reloaded = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_rich_document(&reloaded);
    assert_eq!(reloaded.unknown_rels.len(), doc.unknown_rels.len());
}

#[test]
fn test_save_is_a_fixpoint() {
    init_logging();
    let first = Document::from_bytes(&rich_package())
        .unwrap()
        .build_package()
        .unwrap();
    let second = Document::load(&first).unwrap().build_package().unwrap();

    let first_uris: Vec<_> = first.part_uris().collect();
    let second_uris: Vec<_> = second.part_uris().collect();
    assert_eq!(first_uris, second_uris);

    for (uri, part) in first.parts() {
        let other = second.part(uri).unwrap();
        assert_eq!(part.content_type(), other.content_type(), "{}", uri);
        assert_eq!(
            String::from_utf8_lossy(part.data()),
            String::from_utf8_lossy(other.data()),
            "{}",
            uri
        );
        assert_eq!(
            part_rels(&first, uri.as_str()),
            part_rels(&second, uri.as_str()),
            "{}",
            uri
        );
    }
    assert_eq!(
        first.relationships().iter().collect::<Vec<_>>(),
        second.relationships().iter().collect::<Vec<_>>()
    );
}

#[test]
fn test_scenario_only_styles() {
    let doc = Document::from_bytes(&document_with_styles("<w:p/>")).unwrap();

    assert!(doc.styles.is_some());
    assert!(doc.settings.is_none());
    assert!(doc.font_table.is_none());
    assert!(doc.theme.is_none());
    assert!(doc.web_settings.is_none());
    assert!(doc.unknown_parts.is_empty());
    assert!(doc.unknown_rels.is_empty());
}

#[test]
fn test_scenario_rel_id_after_load() {
    let doc = Document::from_bytes(&document_with_styles("<w:p/>")).unwrap();
    assert_eq!(doc.next_rel_id(), "rId2");
    assert_eq!(doc.next_rel_id(), "rId3");
}

#[test]
fn test_scenario_media_dedup_survives_save() {
    let doc = Document::from_bytes(&document_with_styles("<w:p/>")).unwrap();
    let first = doc.add_media("logo.png", b"first".to_vec());
    let second = doc.add_media("logo.png", b"second".to_vec());
    assert_ne!(first, second);

    let package = doc.build_package().unwrap();
    assert_eq!(package.part(&uri("/word/media/logo.png")).unwrap().data(), b"first");
    assert_eq!(package.part(&uri("/word/media/logo1.png")).unwrap().data(), b"second");

    let doc_rels = part_rels(&package, "/word/document.xml");
    assert_eq!(find_rel(&doc_rels, &first).2, "media/logo.png");
    assert_eq!(find_rel(&doc_rels, &second).2, "media/logo1.png");

    let reloaded = Document::load(&package).unwrap();
    assert_eq!(reloaded.media("logo1.png").as_deref(), Some(&b"second"[..]));
    assert_eq!(reloaded.media_for_rel(&second).as_deref(), Some("logo1.png"));
}

#[test]
fn test_scenario_unknown_relationship_survives() {
    const CUSTOM_TYPE: &str = "http://example.com/relationships/custom";
    let data = vec![0u8, 1, 2, 255];
    let bytes = zip_package(&[
        (
            "[Content_Types].xml",
            content_types_xml(&[
                ("/word/document.xml", content_types::MAIN_DOCUMENT),
                ("/word/custom/data.bin", "application/x-custom"),
            ]),
        ),
        ("_rels/.rels", package_rels()),
        ("word/document.xml", document_xml("<w:p/>")),
        (
            "word/_rels/document.xml.rels",
            rels_xml(&[rel("rId2", CUSTOM_TYPE, "custom/data.bin")]),
        ),
        ("word/custom/data.bin", data.clone()),
    ]);

    let doc = Document::from_bytes(&bytes).unwrap();
    let reloaded = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();

    assert_eq!(reloaded.unknown_parts.get("/word/custom/data.bin"), Some(&data));
    assert_eq!(
        reloaded.unknown_content_type("/word/custom/data.bin"),
        Some("application/x-custom")
    );
    let rel = &reloaded.unknown_rels[0];
    assert_eq!(rel.id, "rId2");
    assert_eq!(rel.rel_type, CUSTOM_TYPE);
    assert_eq!(rel.target_mode(), TargetMode::Internal);
}

#[test]
fn test_scenario_repeated_builds_match() {
    let doc = Document::from_bytes(&rich_package()).unwrap();
    let a = doc.build_package().unwrap();
    let b = doc.build_package().unwrap();

    let rel_types_of = |package: &Package| -> BTreeSet<String> {
        let mut types: BTreeSet<String> = package
            .relationships()
            .iter()
            .map(|r| r.rel_type.clone())
            .collect();
        for (_, part) in package.parts() {
            types.extend(part.relationships().iter().map(|r| r.rel_type.clone()));
        }
        types
    };

    assert_eq!(a.part_count(), b.part_count());
    assert_eq!(rel_types_of(&a), rel_types_of(&b));
}

#[test]
fn test_missing_office_document() {
    let bytes = zip_package(&[
        ("[Content_Types].xml", content_types_xml(&[])),
        ("word/document.xml", document_xml("<w:p/>")),
    ]);
    let err = Document::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, Error::MissingPart(_)));
}

#[test]
fn test_body_errors_name_the_part() {
    let bytes = zip_package(&[
        (
            "[Content_Types].xml",
            content_types_xml(&[("/word/document.xml", content_types::MAIN_DOCUMENT)]),
        ),
        ("_rels/.rels", package_rels()),
        (
            "word/document.xml",
            format!(r#"<w:document xmlns:w="{}"><w:background/></w:document>"#, W_NS).into_bytes(),
        ),
    ]);

    match Document::from_bytes(&bytes).unwrap_err() {
        Error::Part {
            part, operation, ..
        } => {
            assert_eq!(part, "/word/document.xml");
            assert_eq!(operation, Operation::Parse);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_corrupt_styles_is_fatal_but_missing_is_not() {
    let missing = zip_package(&[
        (
            "[Content_Types].xml",
            content_types_xml(&[("/word/document.xml", content_types::MAIN_DOCUMENT)]),
        ),
        ("_rels/.rels", package_rels()),
        ("word/document.xml", document_xml("<w:p/>")),
        (
            "word/_rels/document.xml.rels",
            rels_xml(&[rel("rId1", rel_types::STYLES, "styles.xml")]),
        ),
    ]);
    let doc = Document::from_bytes(&missing).unwrap();
    assert!(doc.styles.is_none());
    assert!(doc.unknown_rels.is_empty());

    let corrupt = zip_package(&[
        (
            "[Content_Types].xml",
            content_types_xml(&[("/word/document.xml", content_types::MAIN_DOCUMENT)]),
        ),
        ("_rels/.rels", package_rels()),
        ("word/document.xml", document_xml("<w:p/>")),
        (
            "word/_rels/document.xml.rels",
            rels_xml(&[rel("rId1", rel_types::STYLES, "styles.xml")]),
        ),
        (
            "word/styles.xml",
            format!(r#"<w:styles xmlns:w="{}"><w:style>"#, W_NS).into_bytes(),
        ),
    ]);
    let err = Document::from_bytes(&corrupt).unwrap_err();
    assert!(err.to_string().contains("/word/styles.xml"));
}

#[test]
fn test_concurrent_allocation_on_loaded_document() {
    let doc = Arc::new(Document::from_bytes(&rich_package()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let doc = Arc::clone(&doc);
            std::thread::spawn(move || {
                let mut rel_ids = vec![doc.add_media("chart.png", vec![i as u8])];
                let mut bookmarks = Vec::new();
                for _ in 0..25 {
                    rel_ids.push(doc.next_rel_id());
                    bookmarks.push(doc.next_bookmark_id());
                }
                (rel_ids, bookmarks)
            })
        })
        .collect();

    let mut rel_ids = HashSet::new();
    let mut bookmarks = HashSet::new();
    for handle in handles {
        let (ids, marks) = handle.join().unwrap();
        assert!(marks.windows(2).all(|w| w[0] < w[1]));
        rel_ids.extend(ids);
        bookmarks.extend(marks);
    }
    assert_eq!(rel_ids.len(), 4 * 26);
    assert_eq!(bookmarks.len(), 4 * 25);
    assert!(bookmarks.iter().all(|&id| id >= BOOKMARK_ID_SEED));
    for existing in ["rId1", "rId2", "rId3", "rId4", "rId5", "rId6", "rId7"] {
        assert!(!rel_ids.contains(existing));
    }

    let package = doc.build_package().unwrap();
    let doc_rels = part_rels(&package, "/word/document.xml");
    let unique: HashSet<_> = doc_rels.iter().map(|r| r.0.clone()).collect();
    assert_eq!(unique.len(), doc_rels.len());
    assert_eq!(doc.media_names().len(), 5);
}

fn document_with_rels(rels: &[Rel<'_>]) -> Vec<u8> {
    zip_package(&[
        (
            "[Content_Types].xml",
            content_types_xml(&[
                ("/word/document.xml", content_types::MAIN_DOCUMENT),
                ("/word/styles.xml", content_types::STYLES),
            ]),
        ),
        ("_rels/.rels", package_rels()),
        ("word/document.xml", document_xml("<w:p/>")),
        ("word/_rels/document.xml.rels", rels_xml(rels)),
        ("word/styles.xml", styles_xml()),
    ])
}

#[test]
fn test_largest_rel_id_does_not_overflow() {
    let bytes = document_with_rels(&[external_rel(
        "rId4294967295",
        rel_types::HYPERLINK,
        "https://example.com/",
    )]);
    let doc = Document::from_bytes(&bytes).unwrap();

    let fresh = doc.next_rel_id();
    assert_eq!(fresh, "rId4294967296");
    assert_eq!(doc.hyperlink_target("rId4294967295"), Some("https://example.com/"));

    let mut doc = doc;
    let header_id = doc.add_header(HeaderFooter::with_text(HeaderFooterKind::Header, "Top"));
    let reopened = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(reopened.hyperlink_target("rId4294967295"), Some("https://example.com/"));
    assert_eq!(reopened.headers[&header_id].text(), "Top");
    assert_eq!(reopened.next_rel_id(), "rId4294967298");

    let edge = document_with_rels(&[external_rel(
        "rId18446744073709551615",
        rel_types::HYPERLINK,
        "https://example.com/",
    )]);
    let doc = Document::from_bytes(&edge).unwrap();
    assert_eq!(doc.next_rel_id(), "rId1");
    assert!(doc.to_bytes().is_ok());
}

#[test]
fn test_unresolvable_targets_are_dropped() {
    init_logging();
    let bytes = document_with_rels(&[
        rel("rId1", rel_types::STYLES, "../../styles.xml"),
        rel("rId2", rel_types::HEADER, "../../header1.xml"),
        rel("rId3", rel_types::IMAGE, "../../media/image1.png"),
        rel("rId4", rel_types::STYLES, "styles.xml"),
    ]);
    let doc = Document::from_bytes(&bytes).unwrap();

    assert!(doc.styles.is_none());
    assert!(doc.headers.is_empty());
    assert!(doc.media_names().is_empty());
    // The second styles relationship is not typed but still carried
    assert_eq!(doc.unknown_rels.len(), 1);
    assert_eq!(doc.unknown_rels[0].id, "rId4");
    assert_eq!(doc.next_rel_id(), "rId5");
}
