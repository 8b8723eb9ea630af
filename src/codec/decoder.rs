//! Streaming decoder shared by every typed part

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{qualified_name, Registry};
use crate::document::{BlockContent, ParagraphContent, RunContent};
use crate::error::{Error, Result};
use crate::xml::RawXml;

/// Pull decoder over one part's bytes.
///
/// Wraps a borrowed quick-xml reader together with the source buffer, so
/// unknown elements can be captured as exact byte ranges, and the registry
/// that decides which element names are typed. A clone is an independent
/// cursor at the same position.
#[derive(Clone)]
pub struct Decoder<'a> {
    reader: Reader<&'a [u8]>,
    source: &'a [u8],
    registry: &'a Registry,
}

impl<'a> Decoder<'a> {
    pub fn new(source: &'a [u8], registry: &'a Registry) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            source,
            registry,
        }
    }

    /// Registry used for extension dispatch
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Read up to the root element of the part
    pub fn root(&mut self) -> Result<(BytesStart<'a>, bool)> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => return Ok((e, false)),
                Event::Empty(e) => return Ok((e, true)),
                Event::Eof => return Err(Error::InvalidDocument("no root element".into())),
                _ => {}
            }
        }
    }

    /// Next child element of `parent`, or `None` once its end tag is reached.
    ///
    /// Text, comments and processing instructions between children are
    /// skipped. Every returned child must be fully consumed before the next
    /// call.
    pub fn next_child(
        &mut self,
        parent: &BytesStart<'_>,
    ) -> Result<Option<(BytesStart<'a>, bool)>> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => return Ok(Some((e, false))),
                Event::Empty(e) => return Ok(Some((e, true))),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(Error::UnexpectedEof(qualified_name(parent))),
                _ => {}
            }
        }
    }

    /// Exact bytes between the start tag and its end tag; consumes the element
    pub fn inner_bytes(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<&'a [u8]> {
        if empty {
            return Ok(&[]);
        }
        let span = self.reader.read_to_end(start.name())?;
        Ok(&self.source[span.start as usize..span.end as usize])
    }

    /// Capture the element verbatim
    pub fn capture(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<RawXml> {
        let inner = self.inner_bytes(start, empty)?;
        RawXml::from_start(start, inner.to_vec())
    }

    /// Consume the element without keeping it
    pub fn skip(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<()> {
        self.inner_bytes(start, empty).map(|_| ())
    }

    /// Text content of a simple element, whitespace kept exactly
    pub fn read_text(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<String> {
        let inner = std::str::from_utf8(self.inner_bytes(start, empty)?)?;
        Ok(unescape(inner)?.into_owned())
    }

    /// Decode a block-level element no core type handles.
    ///
    /// Factories are tried in registration order; the first claimant decodes
    /// the element, otherwise it is captured raw.
    pub fn block(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<BlockContent> {
        let name = qualified_name(start);
        match self.registry.new_block(&name) {
            Some(mut element) => {
                element.decode(self, start, empty)?;
                Ok(BlockContent::Element(element))
            }
            None => {
                log::trace!("block element {} kept raw", name);
                Ok(BlockContent::Raw(self.capture(start, empty)?))
            }
        }
    }

    /// Decode a paragraph-level element no core type handles
    pub fn paragraph_content(
        &mut self,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<ParagraphContent> {
        let name = qualified_name(start);
        match self.registry.new_paragraph_content(&name) {
            Some(mut element) => {
                element.decode(self, start, empty)?;
                Ok(ParagraphContent::Element(element))
            }
            None => {
                log::trace!("paragraph element {} kept raw", name);
                Ok(ParagraphContent::Raw(self.capture(start, empty)?))
            }
        }
    }

    /// Decode a run-level element no core type handles
    pub fn run_content(&mut self, start: &BytesStart<'_>, empty: bool) -> Result<RunContent> {
        let name = qualified_name(start);
        match self.registry.new_run_content(&name) {
            Some(mut element) => {
                element.decode(self, start, empty)?;
                Ok(RunContent::Element(element))
            }
            None => {
                log::trace!("run element {} kept raw", name);
                Ok(RunContent::Raw(self.capture(start, empty)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse XML text into (name, attributes, children-or-text) for comparison
    fn structure(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut out = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => {
                    let mut line = qualified_name(&e);
                    for attr in e.attributes() {
                        let attr = attr.unwrap();
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        if !key.starts_with("xmlns") {
                            line.push_str(&format!(" {}={}", key, attr.unescape_value().unwrap()));
                        }
                    }
                    out.push(line);
                }
                Event::Text(t) => out.push(format!("text:{}", t.unescape().unwrap())),
                Event::End(e) => {
                    out.push(format!("/{}", String::from_utf8_lossy(e.name().as_ref())))
                }
                Event::Eof => break,
                _ => {}
            }
        }
        out
    }

    #[test]
    fn test_capture_is_verbatim() {
        let xml = br#"<root><w:custom foo="bar" xmlns:x="urn:x"><w:child a="1">t &amp; u</w:child><x:y/></w:custom><w:next/></root>"#;
        let registry = Registry::new();
        let mut dec = Decoder::new(xml, &registry);

        let (root, _) = dec.root().unwrap();
        let (child, empty) = dec.next_child(&root).unwrap().unwrap();
        let raw = dec.capture(&child, empty).unwrap();

        assert_eq!(raw.name, "w:custom");
        assert_eq!(raw.attributes, vec![("foo".to_string(), "bar".to_string())]);
        assert_eq!(raw.namespaces.len(), 1);
        assert_eq!(raw.inner(), br#"<w:child a="1">t &amp; u</w:child><x:y/>"#);

        // The decoder is positioned after the captured element
        let (next, empty) = dec.next_child(&root).unwrap().unwrap();
        assert_eq!(qualified_name(&next), "w:next");
        assert!(empty);
        assert!(dec.next_child(&root).unwrap().is_none());
    }

    #[test]
    fn test_unknown_element_fidelity() {
        let original = r#"<w:unknownThing w:a="1" w:b="x&lt;y" xmlns:v="urn:v"><v:shape id="s1"><v:fill/>keep  this</v:shape><w:p/></w:unknownThing>"#;
        let registry = Registry::new();
        let mut dec = Decoder::new(original.as_bytes(), &registry);
        let (start, empty) = dec.root().unwrap();
        let raw = dec.capture(&start, empty).unwrap();

        let mut writer = crate::xml::new_writer().unwrap();
        raw.write_to(&mut writer).unwrap();
        let written = String::from_utf8(writer.into_inner()).unwrap();

        assert_eq!(structure(&written), structure(original));
        assert!(written.contains("keep  this"));
    }

    #[test]
    fn test_read_text_keeps_whitespace() {
        let xml = br#"<w:t xml:space="preserve">  two  &amp; spaces </w:t>"#;
        let registry = Registry::new();
        let mut dec = Decoder::new(xml, &registry);
        let (start, empty) = dec.root().unwrap();
        assert_eq!(dec.read_text(&start, empty).unwrap(), "  two  & spaces ");
    }

    #[test]
    fn test_unexpected_eof() {
        let xml = b"<w:body><w:p>";
        let registry = Registry::new();
        let mut dec = Decoder::new(xml, &registry);
        let (root, _) = dec.root().unwrap();
        let (p, _) = dec.next_child(&root).unwrap().unwrap();
        assert!(dec.next_child(&p).is_err());
    }

    #[test]
    fn test_empty_registry_keeps_everything_raw() {
        let xml = br#"<w:body><w:tbl><w:tr/></w:tbl></w:body>"#;
        let registry = Registry::new();
        let mut dec = Decoder::new(xml, &registry);
        let (root, _) = dec.root().unwrap();
        let (tbl, empty) = dec.next_child(&root).unwrap().unwrap();

        match dec.block(&tbl, empty).unwrap() {
            BlockContent::Raw(raw) => assert_eq!(raw.inner(), b"<w:tr/>"),
            other => panic!("expected raw block, got {:?}", other),
        }
    }
}
