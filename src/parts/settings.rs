//! Document settings part (w:settings)

use crate::codec::{ChildOrder, Decoder, Registry, SchemaField, Slot};
use crate::error::Result;
use crate::xml::{
    self, attrs_within, get_w_val, parse_attr, parse_bool, sole_w_val, write_on_off, write_val,
    RawXml, RootTag, XmlWriter,
};
use quick_xml::events::{BytesEnd, BytesStart, Event};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SettingsField {
    Zoom,
    TrackRevisions,
    DefaultTabStop,
    EvenAndOddHeaders,
    CharacterSpacingControl,
    Compat,
    Rsids,
    DecimalSymbol,
    ListSeparator,
}

impl SchemaField for SettingsField {
    fn rank(self) -> u16 {
        match self {
            SettingsField::Zoom => 2,
            SettingsField::TrackRevisions => 31,
            SettingsField::DefaultTabStop => 38,
            SettingsField::EvenAndOddHeaders => 47,
            SettingsField::CharacterSpacingControl => 60,
            SettingsField::Compat => 80,
            SettingsField::Rsids => 82,
            SettingsField::DecimalSymbol => 96,
            SettingsField::ListSeparator => 97,
        }
    }
}

/// Zoom setting (w:zoom)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Zoom {
    pub percent: Option<u32>,
    /// Preset ("bestFit", "fullPage", ...)
    pub preset: Option<String>,
}

/// Revision save IDs (w:rsids)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rsids {
    pub root: Option<String>,
    pub values: Vec<String>,
}

/// The settings part.
///
/// Only a handful of settings have typed fields; the rest stay in
/// `extras` and keep their position between the typed ones.
#[derive(Clone, Debug)]
pub struct Settings {
    pub root: RootTag,
    pub zoom: Option<Zoom>,
    pub track_revisions: Option<bool>,
    /// Default tab stop in twips
    pub default_tab_stop: Option<u32>,
    pub even_and_odd_headers: Option<bool>,
    pub character_spacing_control: Option<String>,
    /// Compatibility options, kept as-is
    pub compat: Option<RawXml>,
    pub rsids: Option<Rsids>,
    pub decimal_symbol: Option<String>,
    pub list_separator: Option<String>,
    pub extras: Vec<RawXml>,
    order: ChildOrder<SettingsField>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: RootTag::new("w:settings", &xml::minimal_document_namespaces()),
            zoom: None,
            track_revisions: None,
            default_tab_stop: None,
            even_and_odd_headers: None,
            character_spacing_control: None,
            compat: None,
            rsids: None,
            decimal_symbol: None,
            list_separator: None,
            extras: Vec::new(),
            order: ChildOrder::new(),
        }
    }
}

impl Settings {
    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        let mut settings = Settings {
            root: RootTag::from_start(&root)?,
            ..Default::default()
        };
        if empty {
            return Ok(settings);
        }

        // Children whose values do not fit the typed fields fall through to extras
        while let Some((child, child_empty)) = decoder.next_child(&root)? {
            let field = match child.name().local_name().as_ref() {
                b"zoom" => decode_zoom(&child).map(|zoom| {
                    settings.zoom = Some(zoom);
                    SettingsField::Zoom
                }),
                b"trackRevisions" => {
                    settings.track_revisions = Some(parse_bool(&child));
                    Some(SettingsField::TrackRevisions)
                }
                b"defaultTabStop" => sole_w_val(&child)
                    .and_then(|v| v.parse().ok())
                    .map(|stop| {
                        settings.default_tab_stop = Some(stop);
                        SettingsField::DefaultTabStop
                    }),
                b"evenAndOddHeaders" => {
                    settings.even_and_odd_headers = Some(parse_bool(&child));
                    Some(SettingsField::EvenAndOddHeaders)
                }
                b"characterSpacingControl" => sole_w_val(&child).map(|v| {
                    settings.character_spacing_control = Some(v);
                    SettingsField::CharacterSpacingControl
                }),
                b"decimalSymbol" => sole_w_val(&child).map(|v| {
                    settings.decimal_symbol = Some(v);
                    SettingsField::DecimalSymbol
                }),
                b"listSeparator" => sole_w_val(&child).map(|v| {
                    settings.list_separator = Some(v);
                    SettingsField::ListSeparator
                }),
                b"compat" => {
                    settings.compat = Some(decoder.capture(&child, child_empty)?);
                    settings.order.push_field(SettingsField::Compat);
                    continue;
                }
                b"rsids" => {
                    settings.rsids = Some(decode_rsids(&mut decoder, &child, child_empty)?);
                    settings.order.push_field(SettingsField::Rsids);
                    continue;
                }
                _ => None,
            };

            match field {
                Some(field) => {
                    decoder.skip(&child, child_empty)?;
                    settings.order.push_field(field);
                }
                None => {
                    settings.order.push_extra(settings.extras.len());
                    settings.extras.push(decoder.capture(&child, child_empty)?);
                }
            }
        }

        Ok(settings)
    }

    fn present(&self) -> Vec<SettingsField> {
        [
            (self.zoom.is_some(), SettingsField::Zoom),
            (self.track_revisions.is_some(), SettingsField::TrackRevisions),
            (self.default_tab_stop.is_some(), SettingsField::DefaultTabStop),
            (self.even_and_odd_headers.is_some(), SettingsField::EvenAndOddHeaders),
            (
                self.character_spacing_control.is_some(),
                SettingsField::CharacterSpacingControl,
            ),
            (self.compat.is_some(), SettingsField::Compat),
            (self.rsids.is_some(), SettingsField::Rsids),
            (self.decimal_symbol.is_some(), SettingsField::DecimalSymbol),
            (self.list_separator.is_some(), SettingsField::ListSeparator),
        ]
        .into_iter()
        .filter_map(|(set, field)| set.then_some(field))
        .collect()
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;
        for slot in self.order.resolve(&self.present(), self.extras.len()) {
            match slot {
                Slot::Field(field) => self.write_field(&mut writer, field)?,
                Slot::Extra(i) => self.extras[i].write_to(&mut writer)?,
            }
        }
        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }

    fn write_field(&self, writer: &mut XmlWriter, field: SettingsField) -> Result<()> {
        match field {
            SettingsField::Zoom => {
                if let Some(zoom) = &self.zoom {
                    let mut elem = BytesStart::new("w:zoom");
                    if let Some(preset) = &zoom.preset {
                        elem.push_attribute(("w:val", preset.as_str()));
                    }
                    if let Some(percent) = zoom.percent {
                        elem.push_attribute(("w:percent", percent.to_string().as_str()));
                    }
                    writer.write_event(Event::Empty(elem))?;
                }
            }
            SettingsField::TrackRevisions => {
                if let Some(on) = self.track_revisions {
                    write_on_off(writer, "w:trackRevisions", on)?;
                }
            }
            SettingsField::DefaultTabStop => {
                if let Some(stop) = self.default_tab_stop {
                    write_val(writer, "w:defaultTabStop", &stop.to_string())?;
                }
            }
            SettingsField::EvenAndOddHeaders => {
                if let Some(on) = self.even_and_odd_headers {
                    write_on_off(writer, "w:evenAndOddHeaders", on)?;
                }
            }
            SettingsField::CharacterSpacingControl => {
                if let Some(value) = &self.character_spacing_control {
                    write_val(writer, "w:characterSpacingControl", value)?;
                }
            }
            SettingsField::Compat => {
                if let Some(compat) = &self.compat {
                    compat.write_to(writer)?;
                }
            }
            SettingsField::Rsids => {
                if let Some(rsids) = &self.rsids {
                    writer.write_event(Event::Start(BytesStart::new("w:rsids")))?;
                    if let Some(root) = &rsids.root {
                        write_val(writer, "w:rsidRoot", root)?;
                    }
                    for value in &rsids.values {
                        write_val(writer, "w:rsid", value)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("w:rsids")))?;
                }
            }
            SettingsField::DecimalSymbol => {
                if let Some(value) = &self.decimal_symbol {
                    write_val(writer, "w:decimalSymbol", value)?;
                }
            }
            SettingsField::ListSeparator => {
                if let Some(value) = &self.list_separator {
                    write_val(writer, "w:listSeparator", value)?;
                }
            }
        }
        Ok(())
    }
}

fn decode_zoom(start: &BytesStart<'_>) -> Option<Zoom> {
    if !attrs_within(start, &["w:val", "w:percent"]) {
        return None;
    }
    Some(Zoom {
        percent: parse_attr(start, "w:percent")?,
        preset: get_w_val(start),
    })
}

fn decode_rsids(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Rsids> {
    let mut rsids = Rsids::default();
    if empty {
        return Ok(rsids);
    }
    while let Some((child, child_empty)) = decoder.next_child(start)? {
        match child.name().local_name().as_ref() {
            b"rsidRoot" => rsids.root = get_w_val(&child),
            b"rsid" => rsids.values.extend(get_w_val(&child)),
            _ => {}
        }
        decoder.skip(&child, child_empty)?;
    }
    Ok(rsids)
}
