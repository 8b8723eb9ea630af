//! Extensible content codec
//!
//! WordprocessingML content nests in three roles: block-level content (body,
//! table cells, headers, notes), paragraph-level content (inside `w:p`) and
//! run-level content (inside `w:r`). Elements opt into a role by implementing
//! its marker trait on top of [`Element`]. A [`Registry`] maps qualified
//! element names to fresh elements per role; when no factory claims a name
//! the element is captured as [`RawXml`](crate::xml::RawXml) and written back
//! verbatim.

mod decoder;
mod order;
mod registry;

pub use decoder::Decoder;
pub use order::{ChildOrder, SchemaField, Slot};
pub use registry::{BlockFactory, ParagraphFactory, Registry, RunFactory};

use crate::error::Result;
use crate::xml::XmlWriter;
use quick_xml::events::BytesStart;
use std::any::Any;
use std::fmt;

/// A strongly typed element that can be decoded in place and written back
pub trait Element: Any + fmt::Debug + Send + Sync {
    /// Fill `self` from the element that starts with `start`.
    ///
    /// When `empty` is false the decoder sits right after the start tag and
    /// the implementation must consume everything up to and including the
    /// matching end tag.
    fn decode(
        &mut self,
        decoder: &mut Decoder<'_>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<()>;

    /// Write the element
    fn encode(&self, writer: &mut XmlWriter) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Marker: element may appear as block-level content
pub trait BlockLevel: Element {}

/// Marker: element may appear inside a paragraph
pub trait ParagraphLevel: Element {}

/// Marker: element may appear inside a run
pub trait RunLevel: Element {}

/// Implements the `Any` accessors of [`Element`]
#[macro_export]
macro_rules! element_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

macro_rules! role_downcast {
    ($role:ident) => {
        impl dyn $role {
            /// Borrow as a concrete element type
            pub fn downcast_ref<T: $role>(&self) -> Option<&T> {
                self.as_any().downcast_ref()
            }

            /// Mutably borrow as a concrete element type
            pub fn downcast_mut<T: $role>(&mut self) -> Option<&mut T> {
                self.as_any_mut().downcast_mut()
            }

            /// Check the concrete element type
            pub fn is<T: $role>(&self) -> bool {
                self.as_any().is::<T>()
            }
        }
    };
}

role_downcast!(BlockLevel);
role_downcast!(ParagraphLevel);
role_downcast!(RunLevel);

/// Qualified name of a start tag as a string
pub fn qualified_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}
