//! Relationship ID, bookmark ID and media allocation
//!
//! All three allocators share one lock owned by the [`Document`], so they can
//! be called through `&Document` from several threads at once.

use std::collections::BTreeMap;

use super::Document;

/// First ID handed out for bookmarks, comments ranges and other
/// `w:id` attributes in the bookmark family.
///
/// Loaded documents number their own bookmarks from zero; starting far above
/// that keeps new IDs from colliding with existing ones without scanning the
/// body.
pub const BOOKMARK_ID_SEED: u32 = 100_000;

/// A media file stored with the document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Media {
    pub data: Vec<u8>,
    /// Relationship IDs of the main document part that point at this file
    pub rel_ids: Vec<String>,
    /// Package path the file was loaded from
    pub(crate) origin: Option<String>,
}

/// State behind the document's allocation lock
#[derive(Debug)]
pub(crate) struct Resources {
    pub next_rel_id: u64,
    pub next_bookmark_id: u32,
    pub media: BTreeMap<String, Media>,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            next_rel_id: 1,
            next_bookmark_id: BOOKMARK_ID_SEED,
            media: BTreeMap::new(),
        }
    }
}

impl Resources {
    pub fn take_rel_id(&mut self) -> String {
        let id = format!("rId{}", self.next_rel_id);
        self.next_rel_id = self.next_rel_id.saturating_add(1);
        id
    }
}

impl Document {
    /// Allocate a relationship ID for the main document part.
    ///
    /// IDs are never handed out twice and never collide with the IDs the
    /// document was loaded with.
    pub fn next_rel_id(&self) -> String {
        self.resources.lock().take_rel_id()
    }

    /// Allocate an ID for a bookmark-family element (strictly increasing)
    pub fn next_bookmark_id(&self) -> u32 {
        let mut resources = self.resources.lock();
        let id = resources.next_bookmark_id;
        resources.next_bookmark_id = id.saturating_add(1);
        id
    }

    /// Store a media file and return the relationship ID that refers to it.
    ///
    /// When `name` is taken the file is stored under the first free name with
    /// a numeric suffix before the extension (`logo.png`, `logo1.png`, ...).
    pub fn add_media(&self, name: &str, data: impl Into<Vec<u8>>) -> String {
        let mut resources = self.resources.lock();
        let name = unique_name(name, |candidate| resources.media.contains_key(candidate));
        let id = resources.take_rel_id();
        log::debug!("added media {} as {}", name, id);
        resources.media.insert(
            name,
            Media {
                data: data.into(),
                rel_ids: vec![id.clone()],
                origin: None,
            },
        );
        id
    }

    /// Bytes of a media file
    pub fn media(&self, name: &str) -> Option<Vec<u8>> {
        self.resources.lock().media.get(name).map(|m| m.data.clone())
    }

    /// Names of all media files, sorted
    pub fn media_names(&self) -> Vec<String> {
        self.resources.lock().media.keys().cloned().collect()
    }

    /// Name of the media file a document relationship points at
    pub fn media_for_rel(&self, rel_id: &str) -> Option<String> {
        self.resources
            .lock()
            .media
            .iter()
            .find(|(_, m)| m.rel_ids.iter().any(|id| id == rel_id))
            .map(|(name, _)| name.clone())
    }

    /// Remove a media file. References to it in the body are not touched.
    pub fn remove_media(&mut self, name: &str) -> Option<Media> {
        self.resources.get_mut().media.remove(name)
    }
}

/// `name` when it is free, otherwise the first free `stem{n}.ext` for
/// n = 1, 2, ...
pub(crate) fn unique_name(name: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };
    (1u32..)
        .map(|n| format!("{}{}{}", stem, n, ext))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}
