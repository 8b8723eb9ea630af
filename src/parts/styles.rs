//! Style definitions part (w:styles)

use crate::codec::{ChildOrder, Decoder, Registry, SchemaField, Slot};
use crate::error::Result;
use crate::xml::{self, read_attributes, sole_w_val, write_val, RawXml, RootTag, XmlWriter};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// Style type (w:type)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleType {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "paragraph" => Some(StyleType::Paragraph),
            "character" => Some(StyleType::Character),
            "table" => Some(StyleType::Table),
            "numbering" => Some(StyleType::Numbering),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            StyleType::Paragraph => "paragraph",
            StyleType::Character => "character",
            StyleType::Table => "table",
            StyleType::Numbering => "numbering",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StyleField {
    Name,
    BasedOn,
    Next,
}

impl SchemaField for StyleField {
    fn rank(self) -> u16 {
        match self {
            StyleField::Name => 0,
            StyleField::BasedOn => 2,
            StyleField::Next => 3,
        }
    }
}

/// A single style (w:style)
#[derive(Clone, Debug, Default)]
pub struct Style {
    pub style_type: Option<StyleType>,
    pub style_id: String,
    /// w:default="1"
    pub default: bool,
    /// Other attributes (w:customStyle, ...)
    pub attributes: Vec<(String, String)>,
    pub name: Option<String>,
    pub based_on: Option<String>,
    pub next: Option<String>,
    /// Everything else (pPr, rPr, tblPr, uiPriority, ...), in place
    pub extras: Vec<RawXml>,
    order: ChildOrder<StyleField>,
}

impl Style {
    pub fn new(style_type: StyleType, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            style_type: Some(style_type),
            style_id: id.into(),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut style = Style::default();
        for (key, value) in read_attributes(start)? {
            match key.as_str() {
                "w:type" if StyleType::parse(&value).is_some() => {
                    style.style_type = StyleType::parse(&value)
                }
                "w:styleId" => style.style_id = value,
                "w:default" if matches!(value.as_str(), "1" | "true" | "on") => style.default = true,
                _ => style.attributes.push((key, value)),
            }
        }
        if empty {
            return Ok(style);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            let field = match child.name().local_name().as_ref() {
                b"name" => sole_w_val(&child).map(|name| {
                    style.name = Some(name);
                    StyleField::Name
                }),
                b"basedOn" => sole_w_val(&child).map(|id| {
                    style.based_on = Some(id);
                    StyleField::BasedOn
                }),
                b"next" => sole_w_val(&child).map(|id| {
                    style.next = Some(id);
                    StyleField::Next
                }),
                _ => None,
            };
            match field {
                Some(field) => {
                    decoder.skip(&child, child_empty)?;
                    style.order.push_field(field);
                }
                None => {
                    style.order.push_extra(style.extras.len());
                    style.extras.push(decoder.capture(&child, child_empty)?);
                }
            }
        }

        Ok(style)
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new("w:style");
        if let Some(style_type) = &self.style_type {
            start.push_attribute(("w:type", style_type.as_str()));
        }
        if self.default {
            start.push_attribute(("w:default", "1"));
        }
        start.push_attribute(("w:styleId", self.style_id.as_str()));
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        let mut present = Vec::new();
        if self.name.is_some() {
            present.push(StyleField::Name);
        }
        if self.based_on.is_some() {
            present.push(StyleField::BasedOn);
        }
        if self.next.is_some() {
            present.push(StyleField::Next);
        }
        if present.is_empty() && self.extras.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for slot in self.order.resolve(&present, self.extras.len()) {
            match slot {
                Slot::Field(StyleField::Name) => {
                    if let Some(name) = &self.name {
                        write_val(writer, "w:name", name)?;
                    }
                }
                Slot::Field(StyleField::BasedOn) => {
                    if let Some(based_on) = &self.based_on {
                        write_val(writer, "w:basedOn", based_on)?;
                    }
                }
                Slot::Field(StyleField::Next) => {
                    if let Some(next) = &self.next {
                        write_val(writer, "w:next", next)?;
                    }
                }
                Slot::Extra(i) => self.extras[i].write_to(writer)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:style")))?;
        Ok(())
    }
}

/// The styles part.
///
/// Children are written in schema order: docDefaults, latentStyles, the
/// styles, then anything unrecognized.
#[derive(Clone, Debug)]
pub struct Styles {
    pub root: RootTag,
    pub doc_defaults: Option<RawXml>,
    pub latent_styles: Option<RawXml>,
    pub styles: Vec<Style>,
    pub extras: Vec<RawXml>,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            root: RootTag::new("w:styles", &xml::minimal_document_namespaces()),
            doc_defaults: None,
            latent_styles: None,
            styles: Vec::new(),
            extras: Vec::new(),
        }
    }
}

impl Styles {
    /// Find a style by ID
    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.style_id == id)
    }

    /// Find a style by display name
    pub fn by_name(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name.as_deref() == Some(name))
    }

    /// Default style of a type
    pub fn default_style(&self, style_type: &StyleType) -> Option<&Style> {
        self.styles
            .iter()
            .find(|s| s.default && s.style_type.as_ref() == Some(style_type))
    }

    /// Add a style, replacing any style with the same ID
    pub fn add(&mut self, style: Style) {
        match self.styles.iter_mut().find(|s| s.style_id == style.style_id) {
            Some(existing) => *existing = style,
            None => self.styles.push(style),
        }
    }

    /// Chain of IDs from `id` through its basedOn ancestors
    pub fn inheritance_chain(&self, id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(id.to_string());
        while let Some(id) = current {
            if chain.contains(&id) {
                break;
            }
            current = self.get(&id).and_then(|s| s.based_on.clone());
            chain.push(id);
        }
        chain
    }

    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        let mut styles = Styles {
            root: RootTag::from_start(&root)?,
            ..Default::default()
        };
        if empty {
            return Ok(styles);
        }

        while let Some((child, child_empty)) = decoder.next_child(&root)? {
            match child.name().local_name().as_ref() {
                b"docDefaults" if styles.doc_defaults.is_none() => {
                    styles.doc_defaults = Some(decoder.capture(&child, child_empty)?);
                }
                b"latentStyles" if styles.latent_styles.is_none() => {
                    styles.latent_styles = Some(decoder.capture(&child, child_empty)?);
                }
                b"style" => styles
                    .styles
                    .push(Style::decode(&mut decoder, &child, child_empty)?),
                _ => styles.extras.push(decoder.capture(&child, child_empty)?),
            }
        }

        Ok(styles)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;
        if let Some(defaults) = &self.doc_defaults {
            defaults.write_to(&mut writer)?;
        }
        if let Some(latent) = &self.latent_styles {
            latent.write_to(&mut writer)?;
        }
        for style in &self.styles {
            style.write_to(&mut writer)?;
        }
        for extra in &self.extras {
            extra.write_to(&mut writer)?;
        }
        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}
