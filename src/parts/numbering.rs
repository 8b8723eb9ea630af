//! Numbering definitions part (w:numbering)
//!
//! Abstract definitions hold the level formats; concrete `w:num` entries
//! point at an abstract definition and are what paragraphs reference.

use crate::codec::{ChildOrder, Decoder, Registry, SchemaField, Slot};
use crate::error::Result;
use crate::xml::{self, read_attributes, sole_w_val, write_val, RawXml, RootTag, XmlWriter};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// Number format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumberFormat {
    /// 1, 2, 3
    Decimal,
    /// I, II, III
    UpperRoman,
    /// i, ii, iii
    LowerRoman,
    /// A, B, C
    UpperLetter,
    /// a, b, c
    LowerLetter,
    /// •
    Bullet,
    /// 01, 02, 03
    DecimalZero,
    /// No number
    None,
    /// Other format, kept as written
    Other(String),
}

impl NumberFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "decimal" => NumberFormat::Decimal,
            "upperRoman" => NumberFormat::UpperRoman,
            "lowerRoman" => NumberFormat::LowerRoman,
            "upperLetter" => NumberFormat::UpperLetter,
            "lowerLetter" => NumberFormat::LowerLetter,
            "bullet" => NumberFormat::Bullet,
            "decimalZero" => NumberFormat::DecimalZero,
            "none" => NumberFormat::None,
            other => NumberFormat::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NumberFormat::Decimal => "decimal",
            NumberFormat::UpperRoman => "upperRoman",
            NumberFormat::LowerRoman => "lowerRoman",
            NumberFormat::UpperLetter => "upperLetter",
            NumberFormat::LowerLetter => "lowerLetter",
            NumberFormat::Bullet => "bullet",
            NumberFormat::DecimalZero => "decimalZero",
            NumberFormat::None => "none",
            NumberFormat::Other(s) => s,
        }
    }

    pub fn is_bullet(&self) -> bool {
        matches!(self, NumberFormat::Bullet)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LevelField {
    Start,
    Format,
    Text,
    Justification,
}

impl SchemaField for LevelField {
    fn rank(self) -> u16 {
        match self {
            LevelField::Start => 0,
            LevelField::Format => 1,
            LevelField::Text => 6,
            LevelField::Justification => 9,
        }
    }
}

/// Level definition (w:lvl)
#[derive(Clone, Debug, Default)]
pub struct Level {
    pub ilvl: u8,
    pub start: Option<u32>,
    pub format: Option<NumberFormat>,
    pub text: Option<String>,
    pub justification: Option<String>,
    /// Attributes in source order (w:tplc, w:tentative); a `w:ilvl` entry
    /// is written with the value of `ilvl`
    pub attributes: Vec<(String, String)>,
    /// Other children (pPr, rPr, suff, ...), in place
    pub extras: Vec<RawXml>,
    order: ChildOrder<LevelField>,
}

impl Level {
    pub fn new(ilvl: u8) -> Self {
        Self {
            ilvl,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: NumberFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_justification(mut self, jc: impl Into<String>) -> Self {
        self.justification = Some(jc.into());
        self
    }

    /// `None` when `w:ilvl` is missing or not a number
    fn decode(
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<Option<Self>> {
        let attributes = read_attributes(start)?;
        let Some(ilvl) = numeric_id(&attributes, "w:ilvl") else {
            return Ok(None);
        };
        let mut level = Level {
            ilvl,
            attributes,
            ..Default::default()
        };
        if empty {
            return Ok(Some(level));
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            // Custom formats (w:format) and values that do not parse stay raw
            let field = match child.name().local_name().as_ref() {
                b"start" => sole_w_val(&child)
                    .and_then(|v| v.parse().ok())
                    .map(|value| {
                        level.start = Some(value);
                        LevelField::Start
                    }),
                b"numFmt" => sole_w_val(&child).map(|v| {
                    level.format = Some(NumberFormat::parse(&v));
                    LevelField::Format
                }),
                b"lvlText" => sole_w_val(&child).map(|text| {
                    level.text = Some(text);
                    LevelField::Text
                }),
                b"lvlJc" => sole_w_val(&child).map(|jc| {
                    level.justification = Some(jc);
                    LevelField::Justification
                }),
                _ => None,
            };
            match field {
                Some(field) => {
                    decoder.skip(&child, child_empty)?;
                    level.order.push_field(field);
                }
                None => {
                    level.order.push_extra(level.extras.len());
                    level.extras.push(decoder.capture(&child, child_empty)?);
                }
            }
        }

        Ok(Some(level))
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let ilvl = self.ilvl.to_string();
        let start = start_with_id("w:lvl", "w:ilvl", &ilvl, &self.attributes);
        writer.write_event(Event::Start(start))?;

        let mut present = Vec::new();
        if self.start.is_some() {
            present.push(LevelField::Start);
        }
        if self.format.is_some() {
            present.push(LevelField::Format);
        }
        if self.text.is_some() {
            present.push(LevelField::Text);
        }
        if self.justification.is_some() {
            present.push(LevelField::Justification);
        }

        for slot in self.order.resolve(&present, self.extras.len()) {
            match slot {
                Slot::Field(LevelField::Start) => {
                    if let Some(start) = self.start {
                        write_val(writer, "w:start", &start.to_string())?;
                    }
                }
                Slot::Field(LevelField::Format) => {
                    if let Some(format) = &self.format {
                        write_val(writer, "w:numFmt", format.as_str())?;
                    }
                }
                Slot::Field(LevelField::Text) => {
                    if let Some(text) = &self.text {
                        write_val(writer, "w:lvlText", text)?;
                    }
                }
                Slot::Field(LevelField::Justification) => {
                    if let Some(jc) = &self.justification {
                        write_val(writer, "w:lvlJc", jc)?;
                    }
                }
                Slot::Extra(i) => self.extras[i].write_to(writer)?,
            }
        }

        writer.write_event(Event::End(BytesEnd::new("w:lvl")))?;
        Ok(())
    }
}

/// Child of an abstract definition
#[derive(Clone, Debug)]
pub enum AbstractNumChild {
    Level(Level),
    Raw(RawXml),
}

/// Abstract numbering definition (w:abstractNum)
#[derive(Clone, Debug, Default)]
pub struct AbstractNum {
    pub id: u32,
    /// Attributes in source order, `w:abstractNumId` included when parsed
    pub attributes: Vec<(String, String)>,
    /// nsid, multiLevelType, ... and the levels, in document order
    pub children: Vec<AbstractNumChild>,
}

impl AbstractNum {
    pub fn new(id: u32) -> Self {
        AbstractNum {
            id,
            attributes: Vec::new(),
            children: vec![AbstractNumChild::Raw(
                RawXml::new("w:multiLevelType").with_attr("w:val", "hybridMultilevel"),
            )],
        }
    }

    /// Simple bullet list definition
    pub fn bullet_list(id: u32) -> Self {
        let mut abs = Self::new(id);
        abs.add_level(
            Level::new(0)
                .with_start(1)
                .with_format(NumberFormat::Bullet)
                .with_text("•")
                .with_justification("left"),
        );
        abs
    }

    /// Simple decimal numbered list definition
    pub fn decimal_list(id: u32) -> Self {
        let mut abs = Self::new(id);
        abs.add_level(
            Level::new(0)
                .with_start(1)
                .with_format(NumberFormat::Decimal)
                .with_text("%1.")
                .with_justification("left"),
        );
        abs
    }

    pub fn add_level(&mut self, level: Level) {
        self.children.push(AbstractNumChild::Level(level));
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.children.iter().filter_map(|c| match c {
            AbstractNumChild::Level(level) => Some(level),
            AbstractNumChild::Raw(_) => None,
        })
    }

    pub fn level(&self, ilvl: u8) -> Option<&Level> {
        self.levels().find(|l| l.ilvl == ilvl)
    }

    /// `None` when `w:abstractNumId` is missing or not a number
    fn decode(
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<Option<Self>> {
        let attributes = read_attributes(start)?;
        let Some(id) = numeric_id(&attributes, "w:abstractNumId") else {
            return Ok(None);
        };
        let mut abs = AbstractNum {
            id,
            attributes,
            children: Vec::new(),
        };
        if empty {
            return Ok(Some(abs));
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            if child.name().local_name().as_ref() == b"lvl" {
                let mut lookahead = decoder.clone();
                if let Some(level) = Level::decode(&mut lookahead, &child, child_empty)? {
                    *decoder = lookahead;
                    abs.children.push(AbstractNumChild::Level(level));
                    continue;
                }
            }
            abs.children
                .push(AbstractNumChild::Raw(decoder.capture(&child, child_empty)?));
        }

        Ok(Some(abs))
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let id = self.id.to_string();
        let start = start_with_id("w:abstractNum", "w:abstractNumId", &id, &self.attributes);
        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                AbstractNumChild::Level(level) => level.write_to(writer)?,
                AbstractNumChild::Raw(raw) => raw.write_to(writer)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:abstractNum")))?;
        Ok(())
    }
}

/// Numbering instance (w:num)
#[derive(Clone, Debug, Default)]
pub struct Num {
    pub id: u32,
    pub abstract_num_id: u32,
    pub attributes: Vec<(String, String)>,
    /// Level overrides (w:lvlOverride), kept as-is
    pub overrides: Vec<RawXml>,
}

impl Num {
    pub fn new(id: u32, abstract_num_id: u32) -> Self {
        Self {
            id,
            abstract_num_id,
            ..Default::default()
        }
    }

    /// `None` unless both IDs are numbers and w:abstractNumId is the first
    /// child, which is how the entry is written back
    fn decode(
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<Option<Self>> {
        let attributes = read_attributes(start)?;
        let Some(id) = numeric_id(&attributes, "w:numId") else {
            return Ok(None);
        };
        if empty {
            return Ok(None);
        }

        let mut abstract_num_id = None;
        let mut overrides = Vec::new();
        while let Some((child, child_empty)) = decoder.next_child(start)? {
            if abstract_num_id.is_none() {
                if child.name().local_name().as_ref() != b"abstractNumId" {
                    return Ok(None);
                }
                abstract_num_id = sole_w_val(&child).and_then(|v| v.parse().ok());
                if abstract_num_id.is_none() {
                    return Ok(None);
                }
                decoder.skip(&child, child_empty)?;
            } else {
                overrides.push(decoder.capture(&child, child_empty)?);
            }
        }

        Ok(abstract_num_id.map(|abstract_num_id| Num {
            id,
            abstract_num_id,
            attributes,
            overrides,
        }))
    }

    fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let id = self.id.to_string();
        let start = start_with_id("w:num", "w:numId", &id, &self.attributes);
        writer.write_event(Event::Start(start))?;
        write_val(writer, "w:abstractNumId", &self.abstract_num_id.to_string())?;
        for over in &self.overrides {
            over.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:num")))?;
        Ok(())
    }
}

/// Numeric value of the ID attribute `name`
fn numeric_id<T: std::str::FromStr>(attributes: &[(String, String)], name: &str) -> Option<T> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .and_then(|(_, value)| value.parse().ok())
}

/// Start tag with the attributes in their original order and the ID
/// attribute carrying `id`; the ID goes first when it was not there before
fn start_with_id<'a>(
    tag: &'a str,
    name: &'a str,
    id: &'a str,
    attributes: &'a [(String, String)],
) -> BytesStart<'a> {
    let mut start = BytesStart::new(tag);
    if !attributes.iter().any(|(key, _)| key == name) {
        start.push_attribute((name, id));
    }
    for (key, value) in attributes {
        let value = if key == name { id } else { value.as_str() };
        start.push_attribute((key.as_str(), value));
    }
    start
}

/// The numbering part
#[derive(Clone, Debug)]
pub struct Numbering {
    pub root: RootTag,
    /// Picture bullet definitions (w:numPicBullet)
    pub pic_bullets: Vec<RawXml>,
    pub abstract_nums: Vec<AbstractNum>,
    /// Abstract definitions without a numeric ID, written after the typed ones
    pub raw_abstract_nums: Vec<RawXml>,
    pub nums: Vec<Num>,
    /// Numbering instances without numeric IDs, written after the typed ones
    pub raw_nums: Vec<RawXml>,
    pub extras: Vec<RawXml>,
}

impl Default for Numbering {
    fn default() -> Self {
        Self {
            root: RootTag::new("w:numbering", &xml::minimal_document_namespaces()),
            pic_bullets: Vec::new(),
            abstract_nums: Vec::new(),
            raw_abstract_nums: Vec::new(),
            nums: Vec::new(),
            raw_nums: Vec::new(),
            extras: Vec::new(),
        }
    }
}

impl Numbering {
    pub fn abstract_num(&self, id: u32) -> Option<&AbstractNum> {
        self.abstract_nums.iter().find(|a| a.id == id)
    }

    pub fn num(&self, id: u32) -> Option<&Num> {
        self.nums.iter().find(|n| n.id == id)
    }

    /// Level definition used by a paragraph with `num_id` at `ilvl`
    pub fn level(&self, num_id: u32, ilvl: u8) -> Option<&Level> {
        let num = self.num(num_id)?;
        self.abstract_num(num.abstract_num_id)?.level(ilvl)
    }

    pub fn format(&self, num_id: u32, ilvl: u8) -> Option<&NumberFormat> {
        self.level(num_id, ilvl)?.format.as_ref()
    }

    pub fn level_text(&self, num_id: u32, ilvl: u8) -> Option<&str> {
        self.level(num_id, ilvl)?.text.as_deref()
    }

    pub fn is_bullet_list(&self, num_id: u32) -> bool {
        self.format(num_id, 0).is_some_and(NumberFormat::is_bullet)
    }

    /// Add an abstract definition under a fresh ID plus a num pointing at
    /// it; returns the numId
    pub fn add_abstract_num(&mut self, mut abs: AbstractNum) -> u32 {
        let abs_id = self.abstract_nums.iter().map(|a| a.id + 1).max().unwrap_or(0);
        let num_id = self.nums.iter().map(|n| n.id + 1).max().unwrap_or(1);
        abs.id = abs_id;
        self.abstract_nums.push(abs);
        self.nums.push(Num::new(num_id, abs_id));
        num_id
    }

    /// Add a bullet list definition and return the numId
    pub fn add_bullet_list(&mut self) -> u32 {
        self.add_abstract_num(AbstractNum::bullet_list(0))
    }

    /// Add a decimal numbered list definition and return the numId
    pub fn add_decimal_list(&mut self) -> u32 {
        self.add_abstract_num(AbstractNum::decimal_list(0))
    }

    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        let mut numbering = Numbering {
            root: RootTag::from_start(&root)?,
            ..Default::default()
        };
        if empty {
            return Ok(numbering);
        }

        while let Some((child, child_empty)) = decoder.next_child(&root)? {
            match child.name().local_name().as_ref() {
                b"numPicBullet" => numbering
                    .pic_bullets
                    .push(decoder.capture(&child, child_empty)?),
                b"abstractNum" => {
                    let mut lookahead = decoder.clone();
                    match AbstractNum::decode(&mut lookahead, &child, child_empty)? {
                        Some(abs) => {
                            decoder = lookahead;
                            numbering.abstract_nums.push(abs);
                        }
                        None => numbering
                            .raw_abstract_nums
                            .push(decoder.capture(&child, child_empty)?),
                    }
                }
                b"num" => {
                    let mut lookahead = decoder.clone();
                    match Num::decode(&mut lookahead, &child, child_empty)? {
                        Some(num) => {
                            decoder = lookahead;
                            numbering.nums.push(num);
                        }
                        None => numbering
                            .raw_nums
                            .push(decoder.capture(&child, child_empty)?),
                    }
                }
                _ => numbering.extras.push(decoder.capture(&child, child_empty)?),
            }
        }

        Ok(numbering)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;
        for bullet in &self.pic_bullets {
            bullet.write_to(&mut writer)?;
        }
        for abs in &self.abstract_nums {
            abs.write_to(&mut writer)?;
        }
        for raw in &self.raw_abstract_nums {
            raw.write_to(&mut writer)?;
        }
        for num in &self.nums {
            num.write_to(&mut writer)?;
        }
        for raw in &self.raw_nums {
            raw.write_to(&mut writer)?;
        }
        for extra in &self.extras {
            extra.write_to(&mut writer)?;
        }
        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}
