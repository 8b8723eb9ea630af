//! Typed secondary parts of a WordprocessingML package
//!
//! Every typed part parses from the bytes of its package part and
//! serializes back to a complete XML part. Parts whose content nobody edits
//! through this crate (theme, web settings, extended properties) are carried
//! as bytes by [`Document`](crate::Document) instead.

mod comments;
mod fonts;
mod header_footer;
mod notes;
mod numbering;
mod properties;
mod settings;
mod styles;

pub use comments::{Comment, Comments};
pub use fonts::{Font, FontTable};
pub use header_footer::{HeaderFooter, HeaderFooterKind};
pub use notes::{Note, NoteKind, Notes};
pub use numbering::{AbstractNum, AbstractNumChild, Level, Num, NumberFormat, Numbering};
pub use properties::CoreProperties;
pub use settings::{Rsids, Settings, Zoom};
pub use styles::{Style, StyleType, Styles};

use crate::opc::{content_types, rel_types};

/// Singleton parts reached from the main document by relationship type.
///
/// The declaration order is the order parts are loaded and written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartSlot {
    Styles,
    Settings,
    FontTable,
    Numbering,
    Footnotes,
    Endnotes,
    Comments,
    WebSettings,
    Theme,
}

impl PartSlot {
    pub const ALL: [PartSlot; 9] = [
        PartSlot::Styles,
        PartSlot::Settings,
        PartSlot::FontTable,
        PartSlot::Numbering,
        PartSlot::Footnotes,
        PartSlot::Endnotes,
        PartSlot::Comments,
        PartSlot::WebSettings,
        PartSlot::Theme,
    ];

    /// Relationship type from the main document
    pub fn rel_type(self) -> &'static str {
        match self {
            PartSlot::Styles => rel_types::STYLES,
            PartSlot::Settings => rel_types::SETTINGS,
            PartSlot::FontTable => rel_types::FONT_TABLE,
            PartSlot::Numbering => rel_types::NUMBERING,
            PartSlot::Footnotes => rel_types::FOOTNOTES,
            PartSlot::Endnotes => rel_types::ENDNOTES,
            PartSlot::Comments => rel_types::COMMENTS,
            PartSlot::WebSettings => rel_types::WEB_SETTINGS,
            PartSlot::Theme => rel_types::THEME,
        }
    }

    /// Content type written for the part
    pub fn content_type(self) -> &'static str {
        match self {
            PartSlot::Styles => content_types::STYLES,
            PartSlot::Settings => content_types::SETTINGS,
            PartSlot::FontTable => content_types::FONT_TABLE,
            PartSlot::Numbering => content_types::NUMBERING,
            PartSlot::Footnotes => content_types::FOOTNOTES,
            PartSlot::Endnotes => content_types::ENDNOTES,
            PartSlot::Comments => content_types::COMMENTS,
            PartSlot::WebSettings => content_types::WEB_SETTINGS,
            PartSlot::Theme => content_types::THEME,
        }
    }

    /// Path of the part relative to the main document's directory
    pub fn file_name(self) -> &'static str {
        match self {
            PartSlot::Styles => "styles.xml",
            PartSlot::Settings => "settings.xml",
            PartSlot::FontTable => "fontTable.xml",
            PartSlot::Numbering => "numbering.xml",
            PartSlot::Footnotes => "footnotes.xml",
            PartSlot::Endnotes => "endnotes.xml",
            PartSlot::Comments => "comments.xml",
            PartSlot::WebSettings => "webSettings.xml",
            PartSlot::Theme => "theme/theme1.xml",
        }
    }
}
