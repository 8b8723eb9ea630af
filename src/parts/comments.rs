//! Comments part (w:comments)

use crate::codec::{Decoder, Registry};
use crate::document::{blocks_text, decode_blocks, BlockContent, Paragraph};
use crate::error::Result;
use crate::xml::{self, read_attributes, RawXml, RootTag};
use quick_xml::events::{BytesEnd, BytesStart, Event};

/// A review comment
#[derive(Debug, Default)]
pub struct Comment {
    pub id: String,
    pub author: Option<String>,
    pub date: Option<String>,
    pub initials: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub content: Vec<BlockContent>,
}

impl Comment {
    pub fn text(&self) -> String {
        blocks_text(&self.content)
    }
}

/// The comments part
#[derive(Debug)]
pub struct Comments {
    pub root: RootTag,
    pub comments: Vec<Comment>,
    pub extras: Vec<RawXml>,
}

impl Default for Comments {
    fn default() -> Self {
        Self {
            root: RootTag::new("w:comments", &xml::document_namespaces()),
            comments: Vec::new(),
            extras: Vec::new(),
        }
    }
}

impl Comments {
    /// Find a comment by ID
    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    /// Add a comment with the next free numeric ID and return that ID
    pub fn add(&mut self, author: impl Into<String>, text: impl Into<String>) -> u32 {
        let id = self
            .comments
            .iter()
            .filter_map(|c| c.id.parse::<u32>().ok())
            .max()
            .map_or(0, |max| max + 1);
        self.comments.push(Comment {
            id: id.to_string(),
            author: Some(author.into()),
            content: vec![BlockContent::Paragraph(Paragraph::new(text))],
            ..Default::default()
        });
        id
    }

    pub fn parse(data: &[u8], registry: &Registry) -> Result<Self> {
        let mut decoder = Decoder::new(data, registry);
        let (root, empty) = decoder.root()?;
        let mut comments = Comments {
            root: RootTag::from_start(&root)?,
            ..Default::default()
        };
        if empty {
            return Ok(comments);
        }

        while let Some((child, child_empty)) = decoder.next_child(&root)? {
            if child.name().local_name().as_ref() != b"comment" {
                comments.extras.push(decoder.capture(&child, child_empty)?);
                continue;
            }

            let mut comment = Comment::default();
            for (key, value) in read_attributes(&child)? {
                match key.as_str() {
                    "w:id" => comment.id = value,
                    "w:author" => comment.author = Some(value),
                    "w:date" => comment.date = Some(value),
                    "w:initials" => comment.initials = Some(value),
                    _ => comment.attributes.push((key, value)),
                }
            }
            comment.content = decode_blocks(&mut decoder, &child, child_empty)?;
            comments.comments.push(comment);
        }

        Ok(comments)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = xml::new_writer()?;
        self.root.write_start(&mut writer)?;

        for comment in &self.comments {
            let mut start = BytesStart::new("w:comment");
            start.push_attribute(("w:id", comment.id.as_str()));
            if let Some(author) = &comment.author {
                start.push_attribute(("w:author", author.as_str()));
            }
            if let Some(date) = &comment.date {
                start.push_attribute(("w:date", date.as_str()));
            }
            if let Some(initials) = &comment.initials {
                start.push_attribute(("w:initials", initials.as_str()));
            }
            for (key, value) in &comment.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            writer.write_event(Event::Start(start))?;
            for block in &comment.content {
                block.write_to(&mut writer)?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:comment")))?;
        }
        for extra in &self.extras {
            extra.write_to(&mut writer)?;
        }

        self.root.write_end(&mut writer)?;
        Ok(writer.into_inner())
    }
}
