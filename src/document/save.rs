//! Building a fresh package from a [`Document`]

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::alloc::{unique_name, Resources};
use super::{Document, PartRef, RelTarget};
use crate::error::{Operation, Result};
use crate::opc::{
    content_types, rel_types, rid_number, well_known, Package, Part, PartUri, TargetMode,
};
use crate::parts::PartSlot;

impl Document {
    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.build_package()?.save(path)
    }

    /// Save the document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.build_package()?.to_bytes()
    }

    /// Serialize every part into a new package.
    ///
    /// The document is not modified, so calling this twice yields the same
    /// package. Nothing is returned when any part fails to serialize.
    pub fn build_package(&self) -> Result<Package> {
        let resources = self.resources.lock();
        let package = PackageBuilder::new(self, &resources)?.build()?;
        log::debug!("built package with {} parts", package.part_count());
        Ok(package)
    }

    fn slot_xml(&self, slot: PartSlot) -> Option<Result<Vec<u8>>> {
        match slot {
            PartSlot::Styles => self.styles.as_ref().map(|p| p.to_xml()),
            PartSlot::Settings => self.settings.as_ref().map(|p| p.to_xml()),
            PartSlot::FontTable => self.font_table.as_ref().map(|p| p.to_xml()),
            PartSlot::Numbering => self.numbering.as_ref().map(|p| p.to_xml()),
            PartSlot::Footnotes => self.footnotes.as_ref().map(|p| p.to_xml()),
            PartSlot::Endnotes => self.endnotes.as_ref().map(|p| p.to_xml()),
            PartSlot::Comments => self.comments.as_ref().map(|p| p.to_xml()),
            PartSlot::WebSettings => self.web_settings.clone().map(Ok),
            PartSlot::Theme => self.theme.clone().map(Ok),
        }
    }
}

/// Relationship IDs of one source part.
///
/// IDs carried over from the loaded package are reserved up front so that
/// parts created since then never take one of them.
struct IdPool {
    reserved: HashSet<String>,
    claimed: HashSet<String>,
    next: u64,
}

impl IdPool {
    fn new<'s>(reserved: impl IntoIterator<Item = &'s str>, floor: u64) -> Self {
        let reserved: HashSet<String> = reserved.into_iter().map(str::to_string).collect();
        let above = reserved
            .iter()
            .filter_map(|id| rid_number(id))
            .max()
            .map_or(1, |n| n + 1);
        Self {
            reserved,
            claimed: HashSet::new(),
            next: above.max(floor),
        }
    }

    /// `preferred` when it is still free, otherwise a fresh `rIdN`
    fn take(&mut self, preferred: Option<&str>) -> String {
        if let Some(id) = preferred {
            if self.claimed.insert(id.to_string()) {
                return id.to_string();
            }
        }
        loop {
            let id = format!("rId{}", self.next);
            self.next = self.next.saturating_add(1);
            if !self.reserved.contains(&id) && self.claimed.insert(id.clone()) {
                return id;
            }
        }
    }
}

struct PackageBuilder<'a> {
    doc: &'a Document,
    resources: &'a Resources,
    package: Package,
    doc_uri: PartUri,
    doc_ids: IdPool,
    package_ids: IdPool,
    /// Where each part a relationship can start from or point at was written
    locations: BTreeMap<PartRef, PartUri>,
    media_locations: BTreeMap<&'a str, PartUri>,
}

impl<'a> PackageBuilder<'a> {
    fn new(doc: &'a Document, resources: &'a Resources) -> Result<Self> {
        let doc_reserved = doc
            .part_rel_ids
            .values()
            .chain(doc.headers.keys())
            .chain(doc.footers.keys())
            .chain(resources.media.values().flat_map(|m| m.rel_ids.iter()))
            .map(String::as_str)
            .chain(
                doc.unknown_rels
                    .iter()
                    .filter(|r| r.owner == Some(PartRef::Document))
                    .map(|r| r.id.as_str()),
            );
        let package_reserved = doc
            .unknown_rels
            .iter()
            .filter(|r| r.owner.is_none())
            .map(|r| r.id.as_str());

        Ok(Self {
            doc,
            resources,
            package: Package::new(),
            doc_uri: PartUri::new(&doc.document_path)?,
            doc_ids: IdPool::new(doc_reserved, resources.next_rel_id),
            package_ids: IdPool::new(package_reserved, 1),
            locations: BTreeMap::new(),
            media_locations: BTreeMap::new(),
        })
    }

    fn build(mut self) -> Result<Package> {
        self.write_main()?;
        self.write_slots()?;
        self.write_headers_footers()?;
        self.write_media()?;
        self.write_properties()?;
        self.write_unknown_parts()?;
        self.replay_relationships()?;
        Ok(self.package)
    }

    fn add_part(&mut self, uri: &PartUri, content_type: &str, data: Vec<u8>) {
        log::trace!("writing {} ({} bytes)", uri, data.len());
        self.package.add_part(Part::new(uri.clone(), content_type, data));
    }

    /// Add a relationship from the main document part
    fn relate(&mut self, id: &str, rel_type: &str, target: &PartUri) -> Result<()> {
        let relative = target.relative_from(Some(&self.doc_uri));
        self.package
            .add_part_relationship(&self.doc_uri, id, rel_type, &relative, TargetMode::Internal)
    }

    fn write_main(&mut self) -> Result<()> {
        let doc = self.doc;
        let uri = self.doc_uri.clone();
        let xml = doc
            .document
            .to_xml()
            .map_err(|e| e.in_part(uri.as_str(), Operation::Serialize))?;
        self.add_part(&uri, &doc.document_content_type, xml);

        let id = self.package_ids.take(None);
        self.package.relationships_mut().add_with_id(
            &id,
            rel_types::OFFICE_DOCUMENT,
            &uri.relative_from(None),
            TargetMode::Internal,
        );
        self.locations.insert(PartRef::Document, uri);
        Ok(())
    }

    fn write_slots(&mut self) -> Result<()> {
        let doc = self.doc;
        for slot in PartSlot::ALL {
            let Some(xml) = doc.slot_xml(slot) else {
                continue;
            };
            let uri = self.doc_uri.with_file_name(slot.file_name())?;
            let xml = xml.map_err(|e| e.in_part(uri.as_str(), Operation::Serialize))?;
            self.add_part(&uri, slot.content_type(), xml);

            let preferred = doc.part_rel_ids.get(&slot).map(String::as_str);
            let id = self.doc_ids.take(preferred);
            self.relate(&id, slot.rel_type(), &uri)?;
            self.locations.insert(PartRef::Slot(slot), uri);
        }
        Ok(())
    }

    fn write_headers_footers(&mut self) -> Result<()> {
        let doc = self.doc;
        let groups = [
            (&doc.headers, "header", content_types::HEADER, rel_types::HEADER),
            (&doc.footers, "footer", content_types::FOOTER, rel_types::FOOTER),
        ];
        for (parts, stem, content_type, rel_type) in groups {
            for (n, (rel_id, part)) in parts.iter().enumerate() {
                let uri = self
                    .doc_uri
                    .with_file_name(&format!("{}{}.xml", stem, n + 1))?;
                let xml = part
                    .to_xml()
                    .map_err(|e| e.in_part(uri.as_str(), Operation::Serialize))?;
                self.add_part(&uri, content_type, xml);

                let id = self.doc_ids.take(Some(rel_id.as_str()));
                self.relate(&id, rel_type, &uri)?;
                let owner = if stem == "header" {
                    PartRef::Header(rel_id.clone())
                } else {
                    PartRef::Footer(rel_id.clone())
                };
                self.locations.insert(owner, uri);
            }
        }
        Ok(())
    }

    fn write_media(&mut self) -> Result<()> {
        let resources = self.resources;
        for (name, media) in &resources.media {
            let uri = self.doc_uri.with_file_name(&format!("media/{}", name))?;
            self.add_part(
                &uri,
                content_types::media_content_type(name),
                media.data.clone(),
            );
            for rel_id in &media.rel_ids {
                let id = self.doc_ids.take(Some(rel_id.as_str()));
                self.relate(&id, rel_types::IMAGE, &uri)?;
            }
            self.media_locations.insert(name.as_str(), uri);
        }
        Ok(())
    }

    fn write_properties(&mut self) -> Result<()> {
        let doc = self.doc;
        if let Some(core) = &doc.core_properties {
            let uri = PartUri::new(well_known::CORE_PROPERTIES)?;
            let xml = core
                .to_xml()
                .map_err(|e| e.in_part(uri.as_str(), Operation::Serialize))?;
            self.add_part(&uri, content_types::CORE_PROPERTIES, xml);
            self.relate_package(rel_types::CORE_PROPERTIES, &uri);
        }
        if let Some(app) = &doc.app_properties {
            let uri = PartUri::new(well_known::APP_PROPERTIES)?;
            self.add_part(&uri, content_types::EXTENDED_PROPERTIES, app.clone());
            self.relate_package(rel_types::EXTENDED_PROPERTIES, &uri);
        }
        Ok(())
    }

    fn relate_package(&mut self, rel_type: &str, target: &PartUri) {
        let id = self.package_ids.take(None);
        self.package.relationships_mut().add_with_id(
            &id,
            rel_type,
            &target.relative_from(None),
            TargetMode::Internal,
        );
    }

    /// Write preserved parts at their original paths.
    ///
    /// A path already taken by a generated part is shared when the bytes are
    /// identical and renamed otherwise.
    fn write_unknown_parts(&mut self) -> Result<()> {
        let doc = self.doc;
        for (path, data) in &doc.unknown_parts {
            let mut uri = PartUri::new(path)?;
            if let Some(existing) = self.package.part(&uri) {
                if existing.data() != data.as_slice() {
                    let name = unique_name(uri.file_name(), |candidate| {
                        uri.with_file_name(candidate)
                            .map_or(true, |u| self.package.part(&u).is_some())
                    });
                    uri = uri.with_file_name(&name)?;
                    log::debug!("preserved part {} renamed to {}", path, uri);
                }
            }
            if self.package.part(&uri).is_none() {
                let content_type = doc
                    .unknown_content_types
                    .get(path)
                    .map(String::as_str)
                    .unwrap_or_else(|| content_types::guess_content_type(path));
                self.add_part(&uri, content_type, data.clone());
            }
            self.locations.insert(PartRef::Unknown(path.clone()), uri);
        }
        Ok(())
    }

    fn replay_relationships(&mut self) -> Result<()> {
        let doc = self.doc;
        for rel in &doc.unknown_rels {
            let source = match &rel.owner {
                None => None,
                Some(owner) => match self.locations.get(owner) {
                    Some(uri) => Some(uri.clone()),
                    None => {
                        log::warn!("dropping relationship {}: {:?} is gone", rel.id, owner);
                        continue;
                    }
                },
            };

            let target = match &rel.target {
                RelTarget::External(url) => url.clone(),
                RelTarget::Part(part) => match self.locations.get(part) {
                    Some(uri) => uri.relative_from(source.as_ref()),
                    None => {
                        log::warn!("dropping relationship {}: {:?} is gone", rel.id, part);
                        continue;
                    }
                },
                RelTarget::Media(name) => match self.media_locations.get(name.as_str()) {
                    Some(uri) => uri.relative_from(source.as_ref()),
                    None => {
                        log::warn!("dropping relationship {}: media {} is gone", rel.id, name);
                        continue;
                    }
                },
            };

            let mode = rel.target_mode();
            match (&rel.owner, source) {
                (None, _) => {
                    let id = self.package_ids.take(Some(rel.id.as_str()));
                    self.package
                        .relationships_mut()
                        .add_with_id(&id, &rel.rel_type, &target, mode);
                }
                (Some(PartRef::Document), _) => {
                    let id = self.doc_ids.take(Some(rel.id.as_str()));
                    self.package.add_part_relationship(
                        &self.doc_uri,
                        &id,
                        &rel.rel_type,
                        &target,
                        mode,
                    )?;
                }
                (Some(_), Some(source)) => {
                    self.package
                        .add_part_relationship(&source, &rel.id, &rel.rel_type, &target, mode)?;
                }
                (Some(_), None) => {}
            }
            log::trace!("replayed relationship {} ({})", rel.id, rel.rel_type);
        }
        Ok(())
    }
}
