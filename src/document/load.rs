//! Building a [`Document`] from a package

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::alloc::{unique_name, Media};
use super::{Document, DocumentPart, PartRef, RelTarget, UnknownRel};
use crate::codec::Registry;
use crate::error::{Error, Operation, Result};
use crate::opc::{rel_types, Package, Part, PartUri, Relationship};
use crate::parts::{
    Comments, CoreProperties, FontTable, HeaderFooter, Notes, Numbering, PartSlot, Settings,
    Styles,
};

impl Document {
    /// Open a document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(&Package::open(path)?)
    }

    /// Open a document from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load(&Package::from_bytes(bytes)?)
    }

    /// Load a document with the process-wide element registry
    pub fn load(package: &Package) -> Result<Self> {
        Self::load_with(package, Registry::global())
    }

    /// Load a document, decoding extension elements with `registry`
    pub fn load_with(package: &Package, registry: &Registry) -> Result<Self> {
        Loader {
            package,
            registry,
            doc: Document::new(),
            typed: BTreeMap::new(),
            media_origins: BTreeMap::new(),
        }
        .run()
    }
}

/// Core properties are sometimes referenced with an older namespace spelling
fn is_core_properties(rel_type: &str) -> bool {
    rel_type == rel_types::CORE_PROPERTIES || rel_type.ends_with("metadata/core-properties")
}

/// Target of an internal relationship, or `None` (logged) when it does not
/// resolve to a package path
fn resolve_target(source: &PartUri, rel: &Relationship) -> Option<PartUri> {
    match source.resolve(&rel.target) {
        Ok(uri) => Some(uri),
        Err(e) => {
            log::warn!("dropping relationship {} with bad target: {}", rel.id, e);
            None
        }
    }
}

fn parse_part<T>(
    part: &Part,
    registry: &Registry,
    parse: fn(&[u8], &Registry) -> Result<T>,
) -> Result<T> {
    parse(part.data(), registry).map_err(|e| e.in_part(part.uri().as_str(), Operation::Parse))
}

struct Loader<'a> {
    package: &'a Package,
    registry: &'a Registry,
    doc: Document,
    /// Parts held by a typed field, by package path
    typed: BTreeMap<PartUri, PartRef>,
    /// Media names by the package path they were loaded from
    media_origins: BTreeMap<PartUri, String>,
}

impl<'a> Loader<'a> {
    fn run(mut self) -> Result<Document> {
        let package = self.package;

        let main_rel = package
            .relationships()
            .by_type(rel_types::OFFICE_DOCUMENT)
            .ok_or_else(|| Error::MissingPart("officeDocument relationship".into()))?;
        let doc_uri = PartUri::new(&main_rel.target)?;
        let doc_part = package
            .part(&doc_uri)
            .ok_or_else(|| Error::MissingPart(doc_uri.to_string()))?;

        self.doc.document = parse_part(doc_part, self.registry, DocumentPart::parse)?;
        self.doc.document_path = doc_uri.to_string();
        self.doc.document_content_type = doc_part.content_type().to_string();
        self.typed.insert(doc_uri.clone(), PartRef::Document);
        log::debug!("loaded main document part {}", doc_uri);

        let doc_rels = doc_part.relationships();
        let mut known: HashSet<&str> = HashSet::new();
        let mut owners: Vec<(PartUri, PartRef)> = Vec::new();

        for slot in PartSlot::ALL {
            let Some(rel) = doc_rels.by_type(slot.rel_type()) else {
                continue;
            };
            if rel.is_external() {
                continue;
            }
            known.insert(&rel.id);
            let Some(uri) = resolve_target(&doc_uri, rel) else {
                continue;
            };
            let Some(part) = package.part(&uri) else {
                log::warn!("{:?} relationship {} points at missing part {}", slot, rel.id, uri);
                continue;
            };
            self.load_slot(slot, part)?;
            self.doc.part_rel_ids.insert(slot, rel.id.clone());
            self.typed.insert(uri.clone(), PartRef::Slot(slot));
            owners.push((uri, PartRef::Slot(slot)));
        }

        for rel in doc_rels.iter().filter(|r| !r.is_external()) {
            let is_header = rel.rel_type == rel_types::HEADER;
            if !is_header && rel.rel_type != rel_types::FOOTER {
                continue;
            }
            known.insert(&rel.id);
            let Some(uri) = resolve_target(&doc_uri, rel) else {
                continue;
            };
            let Some(part) = package.part(&uri) else {
                log::warn!("relationship {} points at missing part {}", rel.id, uri);
                continue;
            };
            let content = parse_part(part, self.registry, HeaderFooter::parse)?;
            let owner = if is_header {
                self.doc.headers.insert(rel.id.clone(), content);
                PartRef::Header(rel.id.clone())
            } else {
                self.doc.footers.insert(rel.id.clone(), content);
                PartRef::Footer(rel.id.clone())
            };
            log::debug!("loaded {}", uri);
            self.typed.insert(uri.clone(), owner.clone());
            owners.push((uri, owner));
        }

        for rel in doc_rels.iter() {
            if rel.rel_type != rel_types::IMAGE || rel.is_external() {
                continue;
            }
            known.insert(&rel.id);
            let Some(uri) = resolve_target(&doc_uri, rel) else {
                continue;
            };
            match package.part(&uri) {
                Some(part) => {
                    self.load_media(&uri, part, Some(rel.id.as_str()));
                }
                None => log::warn!("image relationship {} points at missing part {}", rel.id, uri),
            }
        }

        for rel in doc_rels.iter().filter(|r| !known.contains(r.id.as_str())) {
            self.preserve(Some(PartRef::Document), rel, Some(&doc_uri))?;
        }

        // Relationships of typed parts can point back at anything loaded above
        for (uri, owner) in owners {
            if let Some(rels) = package.part_relationships(&uri) {
                for rel in rels.iter() {
                    self.preserve(Some(owner.clone()), rel, Some(&uri))?;
                }
            }
        }

        self.load_package_relationships(&main_rel.id)?;

        let resources = self.doc.resources.get_mut();
        resources.next_rel_id = doc_rels.max_numeric_id() + 1;
        let media_count = resources.media.len();
        log::debug!(
            "loaded document: {} headers, {} footers, {} media, {} preserved parts, {} preserved relationships",
            self.doc.headers.len(),
            self.doc.footers.len(),
            media_count,
            self.doc.unknown_parts.len(),
            self.doc.unknown_rels.len()
        );
        Ok(self.doc)
    }

    fn load_slot(&mut self, slot: PartSlot, part: &Part) -> Result<()> {
        let registry = self.registry;
        let doc = &mut self.doc;
        match slot {
            PartSlot::Styles => doc.styles = Some(parse_part(part, registry, Styles::parse)?),
            PartSlot::Settings => doc.settings = Some(parse_part(part, registry, Settings::parse)?),
            PartSlot::FontTable => {
                doc.font_table = Some(parse_part(part, registry, FontTable::parse)?)
            }
            PartSlot::Numbering => {
                doc.numbering = Some(parse_part(part, registry, Numbering::parse)?)
            }
            PartSlot::Footnotes => doc.footnotes = Some(parse_part(part, registry, Notes::parse)?),
            PartSlot::Endnotes => doc.endnotes = Some(parse_part(part, registry, Notes::parse)?),
            PartSlot::Comments => doc.comments = Some(parse_part(part, registry, Comments::parse)?),
            PartSlot::WebSettings => doc.web_settings = Some(part.data().to_vec()),
            PartSlot::Theme => doc.theme = Some(part.data().to_vec()),
        }
        log::debug!("loaded {:?} from {}", slot, part.uri());
        Ok(())
    }

    /// Add a media part, or another relationship ID to one already loaded
    fn load_media(&mut self, uri: &PartUri, part: &Part, rel_id: Option<&str>) -> String {
        let media = &mut self.doc.resources.get_mut().media;
        if let Some(name) = self.media_origins.get(uri) {
            if let (Some(entry), Some(id)) = (media.get_mut(name), rel_id) {
                entry.rel_ids.push(id.to_string());
            }
            return name.clone();
        }

        let name = unique_name(uri.file_name(), |candidate| media.contains_key(candidate));
        media.insert(
            name.clone(),
            Media {
                data: part.data().to_vec(),
                rel_ids: rel_id.map(str::to_string).into_iter().collect(),
                origin: Some(uri.to_string()),
            },
        );
        self.media_origins.insert(uri.clone(), name.clone());
        log::debug!("loaded media {} as {}", uri, name);
        name
    }

    /// What an internal relationship target already maps to, if anything
    fn locate(&self, uri: &PartUri) -> Option<RelTarget> {
        if let Some(part) = self.typed.get(uri) {
            return Some(RelTarget::Part(part.clone()));
        }
        if let Some(name) = self.media_origins.get(uri) {
            return Some(RelTarget::Media(name.clone()));
        }
        self.doc
            .unknown_parts
            .contains_key(uri.as_str())
            .then(|| RelTarget::Part(PartRef::Unknown(uri.to_string())))
    }

    /// Keep a relationship this crate does not interpret, together with the
    /// part it points at and everything reachable from that part
    fn preserve(
        &mut self,
        owner: Option<PartRef>,
        rel: &Relationship,
        source: Option<&PartUri>,
    ) -> Result<()> {
        let target = if rel.is_external() {
            RelTarget::External(rel.target.clone())
        } else {
            let resolved = match source {
                Some(source) => resolve_target(source, rel),
                None => PartUri::new(&rel.target)
                    .map_err(|e| {
                        log::warn!("dropping relationship {} with bad target: {}", rel.id, e)
                    })
                    .ok(),
            };
            let Some(uri) = resolved else {
                return Ok(());
            };
            match self.locate(&uri) {
                Some(target) => target,
                None => match self.package.part(&uri) {
                    Some(part) => self.keep_part(&uri, part, &rel.rel_type)?,
                    None => {
                        log::warn!("relationship {} points at missing part {}", rel.id, uri);
                        return Ok(());
                    }
                },
            }
        };

        log::trace!("preserving relationship {} ({}) from {:?}", rel.id, rel.rel_type, owner);
        self.doc.unknown_rels.push(UnknownRel {
            owner,
            id: rel.id.clone(),
            rel_type: rel.rel_type.clone(),
            target,
        });
        Ok(())
    }

    fn keep_part(&mut self, uri: &PartUri, part: &Part, rel_type: &str) -> Result<RelTarget> {
        if rel_type == rel_types::IMAGE {
            return Ok(RelTarget::Media(self.load_media(uri, part, None)));
        }

        let path = uri.to_string();
        self.doc.unknown_parts.insert(path.clone(), part.data().to_vec());
        if let Some(content_type) = self.package.content_types().get(uri) {
            self.doc
                .unknown_content_types
                .insert(path.clone(), content_type.to_string());
        }
        log::debug!("preserving part {}", uri);

        for rel in part.relationships().iter() {
            self.preserve(Some(PartRef::Unknown(path.clone())), rel, Some(uri))?;
        }
        Ok(RelTarget::Part(PartRef::Unknown(path)))
    }

    fn load_package_relationships(&mut self, main_rel_id: &str) -> Result<()> {
        let package = self.package;
        for rel in package.relationships().iter() {
            if rel.id == main_rel_id {
                continue;
            }

            if !rel.is_external() {
                let core = is_core_properties(&rel.rel_type) && self.doc.core_properties.is_none();
                let app = rel.rel_type == rel_types::EXTENDED_PROPERTIES
                    && self.doc.app_properties.is_none();
                if core || app {
                    let uri = match PartUri::new(&rel.target) {
                        Ok(uri) => uri,
                        Err(e) => {
                            log::warn!(
                                "dropping package relationship {} with bad target: {}",
                                rel.id,
                                e
                            );
                            continue;
                        }
                    };
                    let Some(part) = package.part(&uri) else {
                        log::warn!(
                            "package relationship {} points at missing part {}",
                            rel.id,
                            uri
                        );
                        continue;
                    };
                    if core {
                        self.doc.core_properties =
                            Some(parse_part(part, self.registry, CoreProperties::parse)?);
                    } else {
                        self.doc.app_properties = Some(part.data().to_vec());
                    }
                    log::debug!("loaded {}", uri);
                    continue;
                }
            }

            self.preserve(None, rel, None)?;
        }
        Ok(())
    }
}
