//! Glyph and section provider.
//!
//! Sections are runs of pixels produced upstream; glyphs are sets of sections
//! identified by their sorted section ids. The [`GlyphIndex`] of a system
//! owns both and deduplicates glyph registration.

pub mod compound;
pub mod index;
pub mod section;
pub mod types;

pub use compound::build_compounds;
pub use index::GlyphIndex;
pub use section::{Moments, Orientation, Run, Section, SectionId};
pub use types::{Glyph, GlyphId};
