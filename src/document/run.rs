//! Run element (w:r)

use crate::codec::{ChildOrder, Decoder, RunLevel, SchemaField, Slot};
use crate::document::{Break, BreakType, Tab};
use crate::error::Result;
use crate::xml::{
    parse_bool, read_attributes, sole_w_val, write_on_off, write_val, RawXml, XmlWriter,
};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Run element (w:r)
#[derive(Debug, Default)]
pub struct Run {
    /// Run properties
    pub properties: Option<RunProperties>,
    /// Run content (text, breaks, tabs, etc.)
    pub content: Vec<RunContent>,
    /// Attributes (rsid*), kept for round-trip
    pub attributes: Vec<(String, String)>,
}

/// Content within a run
#[derive(Debug)]
pub enum RunContent {
    /// Text (w:t)
    Text(String),
    /// Element decoded by a registered run-level module
    Element(Box<dyn RunLevel>),
    /// Unknown (preserved)
    Raw(RawXml),
}

impl RunContent {
    /// Decode one run-level child
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        if start.name().local_name().as_ref() == b"t" {
            return Ok(RunContent::Text(decoder.read_text(start, empty)?));
        }
        decoder.run_content(start, empty)
    }

    /// Write to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        match self {
            RunContent::Text(text) => {
                let mut start = BytesStart::new("w:t");
                if needs_preserve(text) {
                    start.push_attribute(("xml:space", "preserve"));
                }
                writer.write_event(Event::Start(start))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                writer.write_event(Event::End(BytesEnd::new("w:t")))?;
                Ok(())
            }
            RunContent::Element(element) => element.encode(writer),
            RunContent::Raw(raw) => raw.write_to(writer),
        }
    }
}

/// Whitespace Word would otherwise collapse
fn needs_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.contains("  ")
        || text.contains(['\t', '\n'])
}

impl Run {
    /// Create a new run with text
    pub fn new(text: impl Into<String>) -> Self {
        Run {
            content: vec![RunContent::Text(text.into())],
            ..Default::default()
        }
    }

    /// Decode a run (the decoder sits after the w:r start tag)
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut run = Run {
            attributes: read_attributes(start)?,
            ..Default::default()
        };
        if empty {
            return Ok(run);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            if child.name().local_name().as_ref() == b"rPr" && run.properties.is_none() {
                run.properties = Some(RunProperties::decode(decoder, &child, child_empty)?);
            } else {
                run.content
                    .push(RunContent::decode(decoder, &child, child_empty)?);
            }
        }

        Ok(run)
    }

    /// Get all text in this run
    pub fn text(&self) -> String {
        let mut result = String::new();
        for content in &self.content {
            match content {
                RunContent::Text(t) => result.push_str(t),
                RunContent::Element(e) => {
                    if e.is::<Tab>() {
                        result.push('\t');
                    } else if let Some(br) = e.downcast_ref::<Break>() {
                        if br.kind == BreakType::TextWrapping {
                            result.push('\n');
                        }
                    }
                }
                RunContent::Raw(_) => {}
            }
        }
        result
    }

    /// Check if bold
    pub fn bold(&self) -> bool {
        self.properties.as_ref().and_then(|p| p.bold).unwrap_or(false)
    }

    /// Check if italic
    pub fn italic(&self) -> bool {
        self.properties.as_ref().and_then(|p| p.italic).unwrap_or(false)
    }

    /// Get font size in points (None if not specified)
    pub fn font_size_pt(&self) -> Option<f32> {
        self.properties.as_ref()?.size.map(|s| s as f32 / 2.0)
    }

    /// Get color (RGB hex string)
    pub fn color(&self) -> Option<&str> {
        self.properties.as_ref()?.color.as_deref()
    }

    /// Get underline type
    pub fn underline(&self) -> Option<&str> {
        self.properties.as_ref()?.underline.as_deref()
    }

    /// Check if has strike-through
    pub fn strike(&self) -> bool {
        self.properties.as_ref().and_then(|p| p.strike).unwrap_or(false)
    }

    /// Set bold
    pub fn set_bold(&mut self, bold: bool) {
        self.properties.get_or_insert_with(Default::default).bold = Some(bold);
    }

    /// Set italic
    pub fn set_italic(&mut self, italic: bool) {
        self.properties.get_or_insert_with(Default::default).italic = Some(italic);
    }

    /// Set font size in points
    pub fn set_font_size_pt(&mut self, size: f32) {
        self.properties.get_or_insert_with(Default::default).size = Some((size * 2.0) as u32);
    }

    /// Set color (RGB hex string)
    pub fn set_color(&mut self, color: impl Into<String>) {
        self.properties.get_or_insert_with(Default::default).color = Some(color.into());
    }

    /// Append a run-level element (break, tab, ...)
    pub fn add_element(&mut self, element: impl RunLevel) {
        self.content.push(RunContent::Element(Box::new(element)));
    }

    /// Write to XML writer
    pub fn write_to(&self, writer: &mut XmlWriter) -> Result<()> {
        let mut start = BytesStart::new("w:r");
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
        writer.write_event(Event::End(BytesEnd::new("w:r")))?;

        Ok(())
    }
}

/// Typed children of w:rPr
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunField {
    Style,
    Fonts,
    Bold,
    Italic,
    Strike,
    DoubleStrike,
    Color,
    Size,
    Highlight,
    Underline,
    VerticalAlign,
}

impl SchemaField for RunField {
    fn rank(self) -> u16 {
        match self {
            RunField::Style => 0,
            RunField::Fonts => 1,
            RunField::Bold => 2,
            RunField::Italic => 4,
            RunField::Strike => 8,
            RunField::DoubleStrike => 9,
            RunField::Color => 18,
            RunField::Size => 23,
            RunField::Highlight => 25,
            RunField::Underline => 26,
            RunField::VerticalAlign => 31,
        }
    }
}

/// Font selection (w:rFonts)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunFonts {
    pub ascii: Option<String>,
    pub h_ansi: Option<String>,
    pub east_asia: Option<String>,
    /// Other attributes (cs, theme fonts, hint)
    pub attributes: Vec<(String, String)>,
}

/// Run properties (w:rPr)
#[derive(Clone, Debug, Default)]
pub struct RunProperties {
    /// Style ID
    pub style: Option<String>,
    pub fonts: Option<RunFonts>,
    /// Bold
    pub bold: Option<bool>,
    /// Italic
    pub italic: Option<bool>,
    /// Strike-through
    pub strike: Option<bool>,
    /// Double strike-through
    pub double_strike: Option<bool>,
    /// Color (RGB hex)
    pub color: Option<String>,
    /// Font size in half-points
    pub size: Option<u32>,
    /// Highlight color
    pub highlight: Option<String>,
    /// Underline type
    pub underline: Option<String>,
    /// Vertical alignment (superscript/subscript)
    pub vertical_align: Option<String>,
    /// Children without a typed field, preserved
    pub extras: Vec<RawXml>,
    order: ChildOrder<RunField>,
}

impl RunProperties {
    /// Decode from the w:rPr element
    pub fn decode(decoder: &mut Decoder<'_>, start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let mut props = RunProperties::default();
        if empty {
            return Ok(props);
        }

        while let Some((child, child_empty)) = decoder.next_child(start)? {
            let field = match child.name().local_name().as_ref() {
                b"rStyle" => sole_w_val(&child).map(|style| {
                    props.style = Some(style);
                    RunField::Style
                }),
                b"rFonts" => {
                    let mut fonts = RunFonts::default();
                    for (key, value) in read_attributes(&child)? {
                        match key.as_str() {
                            "w:ascii" => fonts.ascii = Some(value),
                            "w:hAnsi" => fonts.h_ansi = Some(value),
                            "w:eastAsia" => fonts.east_asia = Some(value),
                            _ => fonts.attributes.push((key, value)),
                        }
                    }
                    props.fonts = Some(fonts);
                    Some(RunField::Fonts)
                }
                b"b" => {
                    props.bold = Some(parse_bool(&child));
                    Some(RunField::Bold)
                }
                b"i" => {
                    props.italic = Some(parse_bool(&child));
                    Some(RunField::Italic)
                }
                b"strike" => {
                    props.strike = Some(parse_bool(&child));
                    Some(RunField::Strike)
                }
                b"dstrike" => {
                    props.double_strike = Some(parse_bool(&child));
                    Some(RunField::DoubleStrike)
                }
                // Theme colors and other attributes have no typed field; keep those raw
                b"color" => sole_w_val(&child).map(|color| {
                    props.color = Some(color);
                    RunField::Color
                }),
                b"sz" => sole_w_val(&child)
                    .and_then(|v| v.parse().ok())
                    .map(|size| {
                        props.size = Some(size);
                        RunField::Size
                    }),
                b"highlight" => sole_w_val(&child).map(|value| {
                    props.highlight = Some(value);
                    RunField::Highlight
                }),
                b"u" => sole_w_val(&child).map(|value| {
                    props.underline = Some(value);
                    RunField::Underline
                }),
                b"vertAlign" => sole_w_val(&child).map(|value| {
                    props.vertical_align = Some(value);
                    RunField::VerticalAlign
                }),
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

    fn present(&self) -> Vec<RunField> {
        [
            (self.style.is_some(), RunField::Style),
            (self.fonts.is_some(), RunField::Fonts),
            (self.bold.is_some(), RunField::Bold),
            (self.italic.is_some(), RunField::Italic),
            (self.strike.is_some(), RunField::Strike),
            (self.double_strike.is_some(), RunField::DoubleStrike),
            (self.color.is_some(), RunField::Color),
            (self.size.is_some(), RunField::Size),
            (self.highlight.is_some(), RunField::Highlight),
            (self.underline.is_some(), RunField::Underline),
            (self.vertical_align.is_some(), RunField::VerticalAlign),
        ]
        .into_iter()
        .filter_map(|(set, field)| set.then_some(field))
        .collect()
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

        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        for slot in self.order.resolve(&present, self.extras.len()) {
            match slot {
                Slot::Field(field) => self.write_field(writer, field)?,
                Slot::Extra(i) => self.extras[i].write_to(writer)?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
        Ok(())
    }

    fn write_field(&self, writer: &mut XmlWriter, field: RunField) -> Result<()> {
        let on_off = |writer: &mut XmlWriter, name: &str, value: Option<bool>| match value {
            Some(on) => write_on_off(writer, name, on),
            None => Ok(()),
        };
        let val = |writer: &mut XmlWriter, name: &str, value: Option<&str>| match value {
            Some(v) => write_val(writer, name, v),
            None => Ok(()),
        };

        match field {
            RunField::Style => val(writer, "w:rStyle", self.style.as_deref()),
            RunField::Fonts => {
                if let Some(fonts) = &self.fonts {
                    let mut elem = BytesStart::new("w:rFonts");
                    if let Some(font) = &fonts.ascii {
                        elem.push_attribute(("w:ascii", font.as_str()));
                    }
                    if let Some(font) = &fonts.h_ansi {
                        elem.push_attribute(("w:hAnsi", font.as_str()));
                    }
                    if let Some(font) = &fonts.east_asia {
                        elem.push_attribute(("w:eastAsia", font.as_str()));
                    }
                    for (key, value) in &fonts.attributes {
                        elem.push_attribute((key.as_str(), value.as_str()));
                    }
                    writer.write_event(Event::Empty(elem))?;
                }
                Ok(())
            }
            RunField::Bold => on_off(writer, "w:b", self.bold),
            RunField::Italic => on_off(writer, "w:i", self.italic),
            RunField::Strike => on_off(writer, "w:strike", self.strike),
            RunField::DoubleStrike => on_off(writer, "w:dstrike", self.double_strike),
            RunField::Color => val(writer, "w:color", self.color.as_deref()),
            RunField::Size => val(writer, "w:sz", self.size.map(|s| s.to_string()).as_deref()),
            RunField::Highlight => val(writer, "w:highlight", self.highlight.as_deref()),
            RunField::Underline => val(writer, "w:u", self.underline.as_deref()),
            RunField::VerticalAlign => val(writer, "w:vertAlign", self.vertical_align.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Registry;
    use pretty_assertions::assert_eq;

    fn decode(xml: &str) -> Run {
        let registry = Registry::with_builtins();
        let mut decoder = Decoder::new(xml.as_bytes(), &registry);
        let (start, empty) = decoder.root().unwrap();
        Run::decode(&mut decoder, &start, empty).unwrap()
    }

    fn encode(run: &Run) -> String {
        let mut writer = quick_xml::Writer::new(Vec::new());
        run.write_to(&mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_run_text_with_tabs_and_breaks() {
        let run = decode(r#"<w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t><w:br w:type="page"/><w:lastRenderedPageBreak/></w:r>"#);
        assert_eq!(run.text(), "a\tb\nc");
        assert!(matches!(run.content.last(), Some(RunContent::Raw(_))));
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let xml = r#"<w:r><w:t xml:space="preserve"> padded  text </w:t></w:r>"#;
        let run = decode(xml);
        assert_eq!(run.text(), " padded  text ");
        assert_eq!(encode(&run), xml);
    }

    #[test]
    fn test_properties_round_trip_in_order() {
        let xml = r#"<w:r w:rsidRPr="001"><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial" w:cs="Arial"/><w:b/><w:noProof/><w:color w:val="FF0000"/><w:sz w:val="28"/><w:lang w:val="en-US"/></w:rPr><w:t>Red</w:t></w:r>"#;
        let run = decode(xml);

        assert!(run.bold());
        assert_eq!(run.color(), Some("FF0000"));
        assert_eq!(run.font_size_pt(), Some(14.0));
        assert_eq!(encode(&run), xml);
    }

    #[test]
    fn test_setters_follow_schema_order() {
        let mut run = Run::new("x");
        run.set_color("00FF00");
        run.set_italic(true);
        run.set_font_size_pt(10.5);
        run.set_bold(false);
        assert_eq!(run.font_size_pt(), Some(10.5));
        assert_eq!(
            encode(&run),
            r#"<w:r><w:rPr><w:b w:val="0"/><w:i/><w:color w:val="00FF00"/><w:sz w:val="21"/></w:rPr><w:t>x</w:t></w:r>"#
        );
    }

    #[test]
    fn test_fractional_size_stays_raw() {
        let xml = r#"<w:r><w:rPr><w:b/><w:sz w:val="10.5"/></w:rPr><w:t>t</w:t></w:r>"#;
        let run = decode(xml);
        assert_eq!(run.font_size_pt(), None);
        assert!(run.bold());
        assert_eq!(encode(&run), xml);
    }

    #[test]
    fn test_theme_color_stays_raw() {
        let xml = r#"<w:r><w:rPr><w:color w:val="1F3864" w:themeColor="accent1"/></w:rPr><w:t>t</w:t></w:r>"#;
        let run = decode(xml);
        assert_eq!(run.color(), None);
        assert_eq!(encode(&run), xml);
    }
}
