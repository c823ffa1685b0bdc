//! One system of a sheet: its sections, glyphs, stem seeds and the
//! interpretation graph the stem linker works on.

use crate::geometry::{Line, Rect};
use crate::glyph::{GlyphId, GlyphIndex, Orientation, Section, SectionId};
use crate::sig::{HeadShape, Inter, InterId, Sig};

#[derive(Clone, Debug, Default)]
pub struct SystemInfo {
    pub id: usize,
    pub bounds: Rect,
    pub glyphs: GlyphIndex,
    pub vertical_sections: Vec<SectionId>,
    pub horizontal_sections: Vec<SectionId>,
    /// Stem seeds, sorted by abscissa.
    pub seeds: Vec<GlyphId>,
    pub sig: Sig,
}

impl SystemInfo {
    pub fn new(id: usize, bounds: Rect, sections: Vec<Section>) -> Self {
        let mut vertical_sections = Vec::new();
        let mut horizontal_sections = Vec::new();
        for section in &sections {
            match section.orientation {
                Orientation::Vertical => vertical_sections.push(section.id),
                Orientation::Horizontal => horizontal_sections.push(section.id),
            }
        }
        Self {
            id,
            bounds,
            glyphs: GlyphIndex::new(sections),
            vertical_sections,
            horizontal_sections,
            seeds: Vec::new(),
            sig: Sig::new(),
        }
    }

    /// Registers the glyph made of `sections` as a stem seed.
    pub fn add_seed(&mut self, sections: &[SectionId]) -> Option<GlyphId> {
        let glyph = self.glyphs.build_glyph(sections)?;
        let id = self.glyphs.register(glyph);
        if !self.seeds.contains(&id) {
            self.seeds.push(id);
            let glyphs = &self.glyphs;
            self.seeds
                .sort_by_key(|&s| glyphs.glyph(s).map_or(i32::MAX, |g| g.bounds.x));
        }
        Some(id)
    }

    pub fn add_head(&mut self, shape: HeadShape, bounds: Rect, grade: f64) -> InterId {
        self.sig.add_vertex(Inter::head(shape, bounds, grade))
    }

    pub fn add_beam(&mut self, median: Line, height: f64, hook: bool, grade: f64) -> InterId {
        self.sig.add_vertex(Inter::beam(median, height, hook, grade))
    }
}
