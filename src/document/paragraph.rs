//! Paragraph element (w:p)

use crate::codec::{ChildOrder, Decoder, ParagraphLevel, SchemaField, Slot};
use crate::document::{BookmarkEnd, BookmarkStart, Hyperlink, Run};
use crate::error::Result;
use crate::xml::{
    parse_bool, read_attributes, sole_w_val, write_on_off, write_val, RawXml, XmlWriter,
};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// Paragraph element (w:p)
#[derive(Debug, Default)]
pub struct Paragraph {
    /// Attributes (rsid* and friends), kept for round-trip
    pub attributes: Vec<(String, String)>,
    /// Paragraph properties
    pub properties: Option<ParagraphProperties>,
    /// Paragraph content (runs, hyperlinks, bookmarks, etc.)
    pub content: Vec<ParagraphContent>,
}

/// Content within a paragraph
#[derive(Debug)]
pub enum ParagraphContent {
    /// Text run
    Run(Run),
    /// Element decoded by a registered paragraph-level module
    Element(Box<dyn ParagraphLevel>),
    /// Unknown element (preserved)
    Raw(RawXml),
}

impl ParagraphContent {
    /// Decode one paragraph-level child
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        if start.name().local_name().as_ref() == b"r" {
            return Ok(ParagraphContent::Run(Run::decode(decoder, start, empty)?));
        }
        decoder.paragraph_content(start, empty)
    }

    /// Write to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        match self {
            ParagraphContent::Run(run) => run.write_to(writer),
            ParagraphContent::Element(element) => element.encode(writer),
            ParagraphContent::Raw(raw) => raw.write_to(writer),
        }
    }

    /// Text of this item; hyperlinks contribute the text of their runs
    pub fn text(&self) -> String {
        match self {
            ParagraphContent::Run(run) => run.text(),
            ParagraphContent::Element(e) => e
                .downcast_ref::<Hyperlink>()
                .map(Hyperlink::text)
                .unwrap_or_default(),
            ParagraphContent::Raw(_) => String::new(),
        }
    }
}

/// Decode every paragraph-level child of `parent`
pub fn decode_paragraph_content(
    decoder: &mut Decoder<'_>,
    parent: &BytesStart<'_>,
    empty: bool,
) -> Result<Vec<ParagraphContent>> {
    let mut content = Vec::new();
    if empty {
        return Ok(content);
    }
    while let Some((child, child_empty)) = decoder.next_child(parent)? {
        content.push(ParagraphContent::decode(decoder, &child, child_empty)?);
    }
    Ok(content)
}

impl Paragraph {
    /// Create a new paragraph with text
    pub fn new(text: impl Into<String>) -> Self {
        Paragraph {
            content: vec![ParagraphContent::Run(Run::new(text))],
            ..Default::default()
        }
    }

    /// Decode a paragraph (the decoder sits after the w:p start tag)
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut para = Paragraph {
            attributes: read_attributes(start)?,
            ..Default::default()
        };
        if empty {
            return Ok(para);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            if child.name().local_name().as_ref() == b"pPr" && para.properties.is_none() {
                para.properties = Some(ParagraphProperties::decode(decoder, &child, child_empty)?);
            } else {
                para.content
                    .push(ParagraphContent::decode(decoder, &child, child_empty)?);
            }
        }

        Ok(para)
    }

    /// Get all text in this paragraph
    pub fn text(&self) -> String {
        self.content.iter().map(ParagraphContent::text).collect()
    }

    /// Get style ID
    pub fn style(&self) -> Option<&str> {
        self.properties.as_ref()?.style.as_deref()
    }

    /// Set style
    pub fn set_style(&mut self, style: impl Into<String>) {
        self.properties
            .get_or_insert_with(Default::default)
            .style = Some(style.into());
    }

    /// Get all runs directly in this paragraph
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|c| {
            if let ParagraphContent::Run(r) = c {
                Some(r)
            } else {
                None
            }
        })
    }

    /// Hyperlinks in this paragraph
    pub fn hyperlinks(&self) -> impl Iterator<Item = &Hyperlink> {
        self.content.iter().filter_map(|c| match c {
            ParagraphContent::Element(e) => e.downcast_ref::<Hyperlink>(),
            _ => None,
        })
    }

    /// Check if this is a heading (has outline level or heading style)
    pub fn is_heading(&self) -> bool {
        if let Some(ref props) = self.properties {
            if props.outline_level.is_some() {
                return true;
            }
            if let Some(ref style) = props.style {
                return style.starts_with("Heading") || style.starts_with("heading");
            }
        }
        false
    }

    /// Add a run to this paragraph
    pub fn add_run(&mut self, run: Run) {
        self.content.push(ParagraphContent::Run(run));
    }

    /// Add any paragraph-level element
    pub fn add_element(&mut self, element: impl ParagraphLevel) {
        self.content.push(ParagraphContent::Element(Box::new(element)));
    }

    /// Surround the current content with a bookmark
    pub fn bookmark(&mut self, id: u32, name: impl Into<String>) {
        self.content.insert(
            0,
            ParagraphContent::Element(Box::new(BookmarkStart::new(id, name))),
        );
        self.add_element(BookmarkEnd::new(id));
    }

    /// Write to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new("w:p");
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        let props = self.properties.as_ref().filter(|p| !p.is_empty());
        if props.is_none() && self.content.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(props) = props {
            props.write_to(writer)?;
        }
        for content in &self.content {
            content.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:p")))?;

        Ok(())
    }
}

/// Typed children of w:pPr
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphField {
    Style,
    KeepNext,
    KeepLines,
    PageBreakBefore,
    Numbering,
    Justification,
    OutlineLevel,
}

impl SchemaField for ParagraphField {
    fn rank(self) -> u16 {
        match self {
            ParagraphField::Style => 0,
            ParagraphField::KeepNext => 1,
            ParagraphField::KeepLines => 2,
            ParagraphField::PageBreakBefore => 3,
            ParagraphField::Numbering => 6,
            ParagraphField::Justification => 26,
            ParagraphField::OutlineLevel => 30,
        }
    }
}

/// Numbering reference (w:numPr)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NumberingRef {
    pub level: Option<u32>,
    pub num_id: Option<u32>,
    /// Other children (revision marks), written after numId
    pub extras: Vec<RawXml>,
}

/// Paragraph properties (w:pPr)
#[derive(Clone, Debug, Default)]
pub struct ParagraphProperties {
    /// Style ID
    pub style: Option<String>,
    pub keep_next: Option<bool>,
    pub keep_lines: Option<bool>,
    pub page_break_before: Option<bool>,
    /// Numbering properties
    pub numbering: Option<NumberingRef>,
    /// Justification/alignment
    pub justification: Option<String>,
    /// Outline level (for headings)
    pub outline_level: Option<u8>,
    /// Children without a typed field, preserved
    pub extras: Vec<RawXml>,
    order: ChildOrder<ParagraphField>,
}

impl ParagraphProperties {
    /// Decode from the w:pPr element
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut props = ParagraphProperties::default();
        if empty {
            return Ok(props);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            let field = match child.name().local_name().as_ref() {
                b"pStyle" => sole_w_val(&child).map(|style| {
                    props.style = Some(style);
                    ParagraphField::Style
                }),
                b"keepNext" => {
                    props.keep_next = Some(parse_bool(&child));
                    Some(ParagraphField::KeepNext)
                }
                b"keepLines" => {
                    props.keep_lines = Some(parse_bool(&child));
                    Some(ParagraphField::KeepLines)
                }
                b"pageBreakBefore" => {
                    props.page_break_before = Some(parse_bool(&child));
                    Some(ParagraphField::PageBreakBefore)
                }
                b"jc" => sole_w_val(&child).map(|jc| {
                    props.justification = Some(jc);
                    ParagraphField::Justification
                }),
                b"outlineLvl" => sole_w_val(&child)
                    .and_then(|v| v.parse().ok())
                    .map(|level| {
                        props.outline_level = Some(level);
                        ParagraphField::OutlineLevel
                    }),
                b"numPr" => {
                    let mut lookahead = decoder.clone();
                    match decode_num_pr(&mut lookahead, &child, child_empty)? {
                        Some(num) => {
                            *decoder = lookahead;
                            props.numbering = Some(num);
                            props.order.push_field(ParagraphField::Numbering);
                            continue;
                        }
                        None => None,
                    }
                }
                _ => None,
            };

            match field {
                Some(field) => {
                    decoder.skip(&child, child_empty)?;
                    props.order.push_field(field);
                }
                None => {
                    props.order.push_extra(props.extras.len());
                    props.extras.push(decoder.capture(&child, child_empty)?);
                }
            }
        }

        Ok(props)
    }

    fn present(&self) -> Vec<ParagraphField> {
        let mut present = Vec::new();
        if self.style.is_some() {
            present.push(ParagraphField::Style);
        }
        if self.keep_next.is_some() {
            present.push(ParagraphField::KeepNext);
        }
        if self.keep_lines.is_some() {
            present.push(ParagraphField::KeepLines);
        }
        if self.page_break_before.is_some() {
            present.push(ParagraphField::PageBreakBefore);
        }
        if self.numbering.is_some() {
            present.push(ParagraphField::Numbering);
        }
        if self.justification.is_some() {
            present.push(ParagraphField::Justification);
        }
        if self.outline_level.is_some() {
            present.push(ParagraphField::OutlineLevel);
        }
        present
    }

    /// True when nothing would be written
    pub fn is_empty(&self) -> bool {
        self.present().is_empty() && self.extras.is_empty()
    }

    /// Write to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let present = self.present();
        if present.is_empty() && self.extras.is_empty() {
            return Ok(());
        }

        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        for slot in self.order.resolve(&present, self.extras.len()) {
            match slot {
                Slot::Field(field) => self.write_field(writer, field)?,
                Slot::Extra(i) => self.extras[i].write_to(writer)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
        Ok(())
    }

    fn write_field(&self, writer: &mut XmlWriter, field: ParagraphField) -> Result<()> {
        match field {
            ParagraphField::Style => {
                if let Some(style) = &self.style {
                    write_val(writer, "w:pStyle", style)?;
                }
            }
            ParagraphField::KeepNext => {
                if let Some(on) = self.keep_next {
                    write_on_off(writer, "w:keepNext", on)?;
                }
            }
            ParagraphField::KeepLines => {
                if let Some(on) = self.keep_lines {
                    write_on_off(writer, "w:keepLines", on)?;
                }
            }
            ParagraphField::PageBreakBefore => {
                if let Some(on) = self.page_break_before {
                    write_on_off(writer, "w:pageBreakBefore", on)?;
                }
            }
            ParagraphField::Numbering => {
                if let Some(num) = &self.numbering {
                    writer.write_event(Event::Start(BytesStart::new("w:numPr")))?;
                    if let Some(level) = num.level {
                        write_val(writer, "w:ilvl", &level.to_string())?;
                    }
                    if let Some(num_id) = num.num_id {
                        write_val(writer, "w:numId", &num_id.to_string())?;
                    }
                    for extra in &num.extras {
                        extra.write_to(writer)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new("w:numPr")))?;
                }
            }
            ParagraphField::Justification => {
                if let Some(jc) = &self.justification {
                    write_val(writer, "w:jc", jc)?;
                }
            }
            ParagraphField::OutlineLevel => {
                if let Some(level) = self.outline_level {
                    write_val(writer, "w:outlineLvl", &level.to_string())?;
                }
            }
        }
        Ok(())
    }
}

/// Parse numbering properties.
///
/// `None` when the children would not be written back the same way: a
/// non-numeric or repeated ilvl/numId, or one that follows other children.
fn decode_num_pr(
    decoder: &mut Decoder<'_>,
    start: &BytesStart<'_>,
    empty: bool,
) -> Result<Option<NumberingRef>> {
    let mut num = NumberingRef::default();
    if empty {
        return Ok(Some(num));
    }

    while let Some((child, child_empty)) = decoder.next_child(start)? {
        match child.name().local_name().as_ref() {
            b"ilvl" if num.level.is_none() && num.num_id.is_none() && num.extras.is_empty() => {
                let Some(level) = sole_w_val(&child).and_then(|v| v.parse().ok()) else {
                    return Ok(None);
                };
                num.level = Some(level);
                decoder.skip(&child, child_empty)?;
            }
            b"numId" if num.num_id.is_none() && num.extras.is_empty() => {
                let Some(id) = sole_w_val(&child).and_then(|v| v.parse().ok()) else {
                    return Ok(None);
                };
                num.num_id = Some(id);
                decoder.skip(&child, child_empty)?;
            }
            b"ilvl" | b"numId" => return Ok(None),
            _ => num.extras.push(decoder.capture(&child, child_empty)?),
        }
    }

    Ok(Some(num))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Registry;
    use pretty_assertions::assert_eq;

    fn decode(xml: &str) -> Paragraph {
        let registry = Registry::with_builtins();
        let mut decoder = Decoder::new(xml.as_bytes(), &registry);
        let (start, empty) = decoder.root().unwrap();
        Paragraph::decode(&mut decoder, &start, empty).unwrap()
    }

    fn encode(para: &Paragraph) -> String {
        let mut writer = quick_xml::Writer::new(Vec::new());
        para.write_to(&mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_paragraph_text_includes_hyperlinks() {
        let para = decode(
            r#"<w:p w:rsidR="00AB"><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink r:id="rId4"><w:r><w:t>here</w:t></w:r></w:hyperlink><w:proofErr w:type="spellStart"/></w:p>"#,
        );

        assert_eq!(para.text(), "See here");
        assert_eq!(para.attributes, vec![("w:rsidR".to_string(), "00AB".to_string())]);
        assert_eq!(para.hyperlinks().count(), 1);
        assert!(matches!(para.content[2], ParagraphContent::Raw(_)));
    }

    #[test]
    fn test_properties_keep_unknown_children_in_place() {
        let xml = r#"<w:p><w:pPr><w:pStyle w:val="Title"/><w:spacing w:after="0"/><w:jc w:val="center"/><w:rPr><w:b/></w:rPr></w:pPr></w:p>"#;
        let para = decode(xml);
        let props = para.properties.as_ref().unwrap();

        assert_eq!(props.style.as_deref(), Some("Title"));
        assert_eq!(props.justification.as_deref(), Some("center"));
        assert_eq!(props.extras.len(), 2);
        assert_eq!(encode(&para), xml);
    }

    #[test]
    fn test_new_field_lands_in_schema_position() {
        let mut para = decode(
            r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:spacing w:after="0"/><w:jc w:val="left"/></w:pPr></w:p>"#,
        );
        let props = para.properties.as_mut().unwrap();
        props.keep_next = Some(true);
        props.numbering = Some(NumberingRef {
            level: Some(0),
            num_id: Some(3),
            extras: Vec::new(),
        });
        props.justification = None;

        assert_eq!(
            encode(&para),
            r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:keepNext/><w:numPr><w:ilvl w:val="0"/><w:numId w:val="3"/></w:numPr><w:spacing w:after="0"/></w:pPr></w:p>"#
        );
    }

    #[test]
    fn test_unparseable_properties_stay_verbatim() {
        let xml = concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Body"/><w:numPr><w:ilvl w:val="first"/><w:numId w:val="3"/></w:numPr>"#,
            r#"<w:jc w:val="both" w:other="1"/><w:outlineLvl w:val="9x"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#
        );
        let para = decode(xml);

        let props = para.properties.as_ref().unwrap();
        assert_eq!(props.style.as_deref(), Some("Body"));
        assert!(props.numbering.is_none());
        assert_eq!(props.justification, None);
        assert_eq!(props.outline_level, None);
        assert_eq!(props.extras.len(), 3);
        assert_eq!(para.text(), "x");
        assert_eq!(encode(&para), xml);
    }

    #[test]
    fn test_num_pr_out_of_order_stays_verbatim() {
        let xml = r#"<w:p><w:pPr><w:numPr><w:numId w:val="3"/><w:ilvl w:val="1"/></w:numPr></w:pPr></w:p>"#;
        let para = decode(xml);

        assert!(para.properties.as_ref().unwrap().numbering.is_none());
        assert_eq!(encode(&para), xml);
    }

    #[test]
    fn test_empty_paragraph_and_heading() {
        assert_eq!(encode(&Paragraph::default()), "<w:p/>");

        let mut para = Paragraph::new("Intro");
        para.set_style("Heading2");
        assert!(para.is_heading());
        assert_eq!(
            encode(&para),
            r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_bookmark_wraps_content() {
        let mut para = Paragraph::new("Anchor");
        para.bookmark(100_000, "_Ref1");
        assert_eq!(
            encode(&para),
            r#"<w:p><w:bookmarkStart w:id="100000" w:name="_Ref1"/><w:r><w:t>Anchor</w:t></w:r><w:bookmarkEnd w:id="100000"/></w:p>"#
        );
    }
}
