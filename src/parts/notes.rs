//! Footnotes and endnotes parts

use crate::codec::{Decoder, Registry};
use crate::document::{blocks_text, decode_blocks, BlockContent, Paragraph};
use crate::error::Result;
use crate::xml::{self, read_attributes, RawXml, RootTag};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// Footnotes or endnotes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteKind {
    Footnote,
    Endnote,
}

impl NoteKind {
    fn root_name(self) -> &'static str {
        match self {
            NoteKind::Footnote => "w:footnotes",
            NoteKind::Endnote => "w:endnotes",
        }
    }

    fn element_name(self) -> &'static str {
        match self {
            NoteKind::Footnote => "w:footnote",
            NoteKind::Endnote => "w:endnote",
        }
    }
}

/// A single footnote or endnote
#[derive(Debug, Default)]
pub struct Note {
    pub id: String,
    /// Special notes ("separator", "continuationSeparator", ...)
    pub note_type: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub content: Vec<BlockContent>,
}

impl Note {
    pub fn new(id: i32, text: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            content: vec![BlockContent::Paragraph(Paragraph::new(text))],
            ..Default::default()
        }
    }

    /// True for separator notes rather than real ones
    pub fn is_separator(&self) -> bool {
        self.note_type.is_some()
    }

    pub fn text(&self) -> String {
        blocks_text(&self.content)
    }
}

/// A footnotes or endnotes part
#[derive(Debug)]
pub struct Notes {
    pub root: RootTag,
    pub notes: Vec<Note>,
    /// Root children that are not notes
    pub extras: Vec<RawXml>,
}

impl Notes {
    pub fn new(kind: NoteKind) -> Self {
        Self {
            root: RootTag::new(kind.root_name(), &xml::document_namespaces()),
            notes: Vec::new(),
            extras: Vec::new(),
        }
    }

    pub fn kind(&self) -> NoteKind {
        if self.root.name.ends_with("endnotes") {
            NoteKind::Endnote
        } else {
            NoteKind::Footnote
        }
    }

    /// Find a note by ID
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    /// Append a note with the next free numeric ID and return that ID
    pub fn add(&mut self, text: impl Into<String>) -> i32 {
        let id = self
            .notes
            .iter()
            .filter_map(|n| n.id.parse::<i32>().ok())
            .max()
            .map_or(1, |max| max.max(0) + 1);
        self.notes.push(Note::new(id, text));
        id
    }

    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        let mut notes = Notes {
            root: RootTag::from_start(&root)?,
            notes: Vec::new(),
            extras: Vec::new(),
        };
        if empty {
            return Ok(notes);
        }

        while let Some((child, child_empty)) = decoder.next_child(&root)? {
            match child.name().local_name().as_ref() {
                b"footnote" | b"endnote" => {
                    let mut note = Note::default();
                    for (key, value) in read_attributes(&child)? {
                        match key.as_str() {
                            "w:id" => note.id = value,
                            "w:type" => note.note_type = Some(value),
                            _ => note.attributes.push((key, value)),
                        }
                    }
                    note.content = decode_blocks(&mut decoder, &child, child_empty)?;
                    notes.notes.push(note);
                }
                _ => notes.extras.push(decoder.capture(&child, child_empty)?),
            }
        }

        Ok(notes)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let element = self.kind().element_name();
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;

        for note in &self.notes {
            let mut start = BytesStart::new(element);
            if let Some(note_type) = &note.note_type {
                start.push_attribute(("w:type", note_type.as_str()));
            }
            start.push_attribute(("w:id", note.id.as_str()));
            for (key, value) in &note.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            writer.write_event(Event::Start(start))?;
            for block in &note.content {
                block.write_to(&mut writer)?;
            }
            writer.write_event(Event::End(BytesEnd::new(element)))?;
        }
        for extra in &self.extras {
            extra.write_to(&mut writer)?;
        }

        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}
