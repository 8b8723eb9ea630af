//! Core document properties (docProps/core.xml)

use crate::codec::{Decoder, Registry};
use crate::error::Result;
use crate::xml::{self, write_text_element, RawXml, RootTag, XmlWriter};

/// Core properties (Dublin Core metadata)
#[derive(Clone, Debug)]
pub struct CoreProperties {
    pub root: RootTag,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub last_modified_by: Option<String>,
    pub revision: Option<String>,
    /// W3CDTF timestamp
    pub created: Option<String>,
    /// W3CDTF timestamp
    pub modified: Option<String>,
    /// Other properties (category, contentStatus, lastPrinted, ...)
    pub extras: Vec<RawXml>,
}

impl Default for CoreProperties {
    fn default() -> Self {
        Self {
            root: RootTag::new("cp:coreProperties", &xml::core_properties_namespaces()),
            title: None,
            subject: None,
            creator: None,
            keywords: None,
            description: None,
            last_modified_by: None,
            revision: None,
            created: None,
            modified: None,
            extras: Vec::new(),
        }
    }
}

impl CoreProperties {
    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        let mut props = CoreProperties {
            root: RootTag::from_start(&root)?,
            ..Default::default()
        };
        if empty {
            return Ok(props);
        }

        while let Some((child, child_empty)) = decoder.next_child(&root)? {
            let slot = match child.name().local_name().as_ref() {
                b"title" => &mut props.title,
                b"subject" => &mut props.subject,
                b"creator" => &mut props.creator,
                b"keywords" => &mut props.keywords,
                b"description" => &mut props.description,
                b"lastModifiedBy" => &mut props.last_modified_by,
                b"revision" => &mut props.revision,
                b"created" => &mut props.created,
                b"modified" => &mut props.modified,
                _ => {
                    props.extras.push(decoder.capture(&child, child_empty)?);
                    continue;
                }
            };
            *slot = Some(decoder.read_text(&child, child_empty)?);
        }

        Ok(props)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut root = self.root.clone();
        for (key, value) in xml::core_properties_namespaces() {
            if !root.attributes.iter().any(|(k, _)| k == key) {
                root.attributes.push((key.to_string(), value.to_string()));
            }
        }

        let mut writer = xml::new_writer()?;
        root.write_start(&mut writer)?;
        let fields = [
            ("dc:title", &self.title),
            ("dc:subject", &self.subject),
            ("dc:creator", &self.creator),
            ("cp:keywords", &self.keywords),
            ("dc:description", &self.description),
            ("cp:lastModifiedBy", &self.last_modified_by),
            ("cp:revision", &self.revision),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                write_text_element(&mut writer, name, &[], value)?;
            }
        }
        write_timestamp(&mut writer, "dcterms:created", self.created.as_deref())?;
        write_timestamp(&mut writer, "dcterms:modified", self.modified.as_deref())?;
        for extra in &self.extras {
            extra.write_to(&mut writer)?;
        }
        root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}

fn write_timestamp(writer: &mut XmlWriter, name: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => write_text_element(writer, name, &[("xsi:type", "dcterms:W3CDTF")], value),
        None => Ok(()),
    }
}
