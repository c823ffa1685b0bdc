use std::collections::HashMap;

use super::section::{Orientation, Section, SectionId};
use super::types::{Glyph, GlyphId};
use crate::geometry::Rect;

/// Sections and registered glyphs of one system.
#[derive(Clone, Debug, Default)]
pub struct GlyphIndex {
    sections: Vec<Section>,
    by_section: HashMap<SectionId, usize>,
    glyphs: Vec<Glyph>,
    by_signature: HashMap<Vec<SectionId>, GlyphId>,
}

impl GlyphIndex {
    pub fn new(sections: Vec<Section>) -> Self {
        let by_section = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();
        Self {
            sections,
            by_section,
            glyphs: Vec::new(),
            by_signature: HashMap::new(),
        }
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.by_section.get(&id).map(|&i| &self.sections[i])
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Sections of `orientation` whose bounds intersect `area`.
    pub fn sections_in(&self, orientation: Orientation, area: &Rect) -> Vec<&Section> {
        self.sections
            .iter()
            .filter(|s| s.orientation == orientation && s.bounds().intersects(area))
            .collect()
    }

    /// Glyph made of the given sections; unknown ids are skipped.
    pub fn build_glyph(&self, ids: &[SectionId]) -> Option<Glyph> {
        let sections: Vec<&Section> = ids.iter().filter_map(|&id| self.section(id)).collect();
        Glyph::build(&sections)
    }

    /// Registers `glyph`, returning the id of an identical glyph if any.
    pub fn register(&mut self, glyph: Glyph) -> GlyphId {
        if let Some(&id) = self.by_signature.get(&glyph.sections) {
            return id;
        }
        let id = GlyphId(self.glyphs.len() as u32);
        self.by_signature.insert(glyph.sections.clone(), id);
        self.glyphs.push(glyph);
        id
    }

    pub fn find(&self, sections: &[SectionId]) -> Option<GlyphId> {
        self.by_signature.get(sections).copied()
    }

    pub fn glyph(&self, id: GlyphId) -> Option<&Glyph> {
        self.glyphs.get(id.0 as usize)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::section::Run;

    #[test]
    fn registration_is_deduplicated_by_sections() {
        let sections = vec![
            Section::new(SectionId(5), Orientation::Vertical, 3, vec![Run::new(0, 10)]),
            Section::new(SectionId(6), Orientation::Vertical, 4, vec![Run::new(0, 10)]),
        ];
        let mut index = GlyphIndex::new(sections);
        let one = index.build_glyph(&[SectionId(5), SectionId(6)]).unwrap();
        let two = index.build_glyph(&[SectionId(6), SectionId(5)]).unwrap();
        let a = index.register(one);
        let b = index.register(two);
        assert_eq!(a, b);
        assert_eq!(index.glyph_count(), 1);
        assert_eq!(index.find(&[SectionId(5), SectionId(6)]), Some(a));
        assert_eq!(
            index
                .sections_in(Orientation::Vertical, &Rect::new(4, 0, 5, 5))
                .len(),
            1
        );
    }
}
