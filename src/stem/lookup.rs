//! Corner lookup: where to search for the stem of a head.
//!
//! For one head and one [`Corner`], the lookup area is a quadrilateral that
//! starts on a short horizontal segment around the head reference point and
//! runs to the system top or bottom along the sheet vertical, opened by a
//! slope margin on both sides. Candidate beams, seeds and existing stems are
//! pre-filtered on a vicinity box before being tested against the area.

use serde::Serialize;

use super::checker::StemChecker;
use super::corner::Corner;
use super::options::{ConnectionOptions, StemParams};
use crate::error::LinkError;
use crate::geometry::{Line, Polygon, Rect, Skew};
use crate::glyph::{GlyphId, GlyphIndex, SectionId};
use crate::scale::Scale;
use crate::sig::{BeamInter, HeadShape, InterId};

/// Head being linked.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadRef {
    pub id: InterId,
    pub shape: HeadShape,
    pub bounds: Rect,
}

/// Beam or hook candidate, copied out of the graph before linking starts.
#[derive(Clone, Debug, PartialEq)]
pub struct BeamRef {
    pub id: InterId,
    pub bounds: Rect,
    pub beam: BeamInter,
    pub good: bool,
}

/// Stem already present in the graph, for reuse by other heads.
#[derive(Clone, Debug, PartialEq)]
pub struct StemRef {
    pub id: InterId,
    pub bounds: Rect,
    pub glyph: GlyphId,
}

/// Read-only view of one system while its heads are linked.
pub struct SystemContext<'a> {
    pub bounds: Rect,
    pub glyphs: &'a GlyphIndex,
    pub vertical_sections: &'a [SectionId],
    pub horizontal_sections: &'a [SectionId],
    /// Stem seeds, sorted by abscissa.
    pub seeds: &'a [GlyphId],
    /// Beams and hooks, sorted by abscissa.
    pub beams: &'a [BeamRef],
    pub scale: &'a Scale,
    pub skew: Skew,
    pub params: &'a StemParams,
    pub connections: &'a ConnectionOptions,
    pub checker: &'a dyn StemChecker,
}

impl SystemContext<'_> {
    /// Box of system height around `head`, widened by the vicinity margin.
    pub fn vicinity(&self, head: &Rect) -> Rect {
        Rect::new(head.x, self.bounds.y, head.w, self.bounds.h)
            .grown(self.params.vicinity_margin, 0)
    }

    /// Beams and seeds near `head`.
    pub fn neighborhood(&self, head: &Rect) -> Neighborhood {
        let fat = self.vicinity(head);
        let beams = self
            .beams
            .iter()
            .enumerate()
            .filter(|(_, b)| b.bounds.intersects(&fat))
            .map(|(i, _)| i)
            .collect();
        let seeds = self
            .seeds
            .iter()
            .copied()
            .filter(|&id| {
                self.glyphs
                    .glyph(id)
                    .is_some_and(|g| g.bounds.intersects(&fat))
            })
            .collect();
        Neighborhood { beams, seeds }
    }
}

/// Neighbours of one head: indices into [`SystemContext::beams`] and seed
/// glyphs.
#[derive(Clone, Debug, Default)]
pub struct Neighborhood {
    pub beams: Vec<usize>,
    pub seeds: Vec<GlyphId>,
}

/// Lookup geometry of one head corner.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerLookup {
    corner: Corner,
    skew: Skew,
    reference_point: [f64; 2],
    in_point: [f64; 2],
    out_point: [f64; 2],
    target_point: [f64; 2],
    area: Polygon,
}

impl CornerLookup {
    pub fn new(head: &HeadRef, corner: Corner, ctx: &SystemContext<'_>) -> Result<Self, LinkError> {
        let descriptor = head.shape.descriptor().ok_or(LinkError::UnmappedShape {
            inter: head.id.index(),
            shape: head.shape,
        })?;
        let reference_point = descriptor.anchor(&head.bounds, corner);
        let x_dir = corner.x_dir() as f64;
        let y_dir = corner.y_dir();
        let params = ctx.params;

        let out_point = [
            reference_point[0] + x_dir * params.max_head_out_dx as f64,
            reference_point[1],
        ];
        let in_point = [
            reference_point[0] - x_dir * params.max_head_in_dx as f64,
            reference_point[1],
        ];

        let y_limit = if y_dir > 0 {
            ctx.bounds.bottom() as f64
        } else {
            ctx.bounds.y as f64
        };
        let dy = y_limit - reference_point[1];
        let vertical = ctx.skew.vertical_dx(1.0);
        let d_slope = -x_dir * y_dir as f64 * params.slope_margin;
        let area = Polygon::new(vec![
            out_point,
            in_point,
            [in_point[0] + (vertical + d_slope) * dy, y_limit],
            [out_point[0] + (vertical - d_slope) * dy, y_limit],
        ]);

        let mut lookup = Self {
            corner,
            skew: ctx.skew,
            reference_point,
            in_point,
            out_point,
            target_point: [reference_point[0] + ctx.skew.vertical_dx(dy), y_limit],
            area,
        };
        let edge = Line::new([0.0, y_limit], [100.0, y_limit]);
        if let Some(target) = lookup.target_on(&edge) {
            lookup.target_point = target;
        }
        Ok(lookup)
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn area(&self) -> &Polygon {
        &self.area
    }

    /// Stem anchor on the head.
    pub fn reference_point(&self) -> [f64; 2] {
        self.reference_point
    }

    /// Far end of the theoretical stem, on the system border.
    pub fn target_point(&self) -> [f64; 2] {
        self.target_point
    }

    /// Reference point pushed into the head.
    pub fn in_point(&self) -> [f64; 2] {
        self.in_point
    }

    /// Reference point pushed out of the head.
    pub fn out_point(&self) -> [f64; 2] {
        self.out_point
    }

    /// Horizontal segment around the reference point, left to right.
    pub fn head_segment(&self) -> Line {
        if self.in_point[0] <= self.out_point[0] {
            Line::new(self.in_point, self.out_point)
        } else {
            Line::new(self.out_point, self.in_point)
        }
    }

    /// Theoretical stem line, from the reference point to the target point.
    pub fn theoretical_line(&self) -> Line {
        Line::new(self.reference_point, self.target_point)
    }

    /// Point where the sheet vertical through the reference point crosses
    /// `limit`.
    pub fn target_on(&self, limit: &Line) -> Option<[f64; 2]> {
        let [x, y] = self.reference_point;
        let vertical = Line::new([x, y], [x + self.skew.vertical_dx(100.0), y + 100.0]);
        vertical.intersection(limit)
    }

    /// Beam border facing the head.
    pub fn beam_limit(&self, beam: &BeamInter) -> Line {
        beam.border(self.corner.v_side().opposite())
    }

    /// Signed distance from the reference point to the beam border facing the
    /// head, positive when the beam lies in the corner direction.
    pub fn beam_distance(&self, beam: &BeamInter) -> Option<f64> {
        let pt = self.target_on(&self.beam_limit(beam))?;
        Some(self.corner.y_dir() as f64 * (pt[1] - self.reference_point[1]))
    }

    /// Neighbouring beams that intersect the area, by abscissa.
    pub fn beam_candidates<'b>(
        &self,
        ctx: &SystemContext<'b>,
        near: &Neighborhood,
    ) -> Vec<&'b BeamRef> {
        near.beams
            .iter()
            .map(|&i| &ctx.beams[i])
            .filter(|b| self.area.intersects_rect(&b.bounds))
            .collect()
    }

    /// Neighbouring seeds that intersect the area.
    pub fn seed_candidates(&self, ctx: &SystemContext<'_>, near: &Neighborhood) -> Vec<GlyphId> {
        near.seeds
            .iter()
            .copied()
            .filter(|&id| {
                ctx.glyphs
                    .glyph(id)
                    .is_some_and(|g| self.area.intersects_rect(&g.bounds))
            })
            .collect()
    }

    /// Existing stems that intersect the area.
    pub fn stem_candidates<'s>(&self, stems: &'s [StemRef]) -> Vec<&'s StemRef> {
        stems
            .iter()
            .filter(|s| self.area.intersects_rect(&s.bounds))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Orientation, Run, Section};
    use crate::stem::checker::VerticalsChecker;
    use crate::stem::options::{CheckerOptions, StemOptions};
    use petgraph::stable_graph::NodeIndex;

    struct Fixture {
        scale: Scale,
        params: StemParams,
        connections: ConnectionOptions,
        checker: VerticalsChecker,
        glyphs: GlyphIndex,
        seeds: Vec<GlyphId>,
    }

    fn fixture() -> Fixture {
        let scale = Scale::new(20.0).unwrap();
        let connections = ConnectionOptions::default();
        let params = StemParams::resolve(&StemOptions::default(), &connections, &scale);
        let checker = VerticalsChecker::new(&scale, &Skew::default(), CheckerOptions::default());
        let sections = vec![
            Section::new(SectionId(1), Orientation::Vertical, 120, vec![Run::new(60, 45)]),
            Section::new(SectionId(2), Orientation::Vertical, 300, vec![Run::new(60, 45)]),
        ];
        let mut glyphs = GlyphIndex::new(sections);
        let near = glyphs.build_glyph(&[SectionId(1)]).unwrap();
        let far = glyphs.build_glyph(&[SectionId(2)]).unwrap();
        let seeds = vec![glyphs.register(near), glyphs.register(far)];
        Fixture {
            scale,
            params,
            connections,
            checker,
            glyphs,
            seeds,
        }
    }

    fn head() -> HeadRef {
        HeadRef {
            id: NodeIndex::new(0),
            shape: HeadShape::NoteheadBlack,
            bounds: Rect::new(100, 100, 21, 16),
        }
    }

    #[test]
    fn area_spans_from_head_to_system_edge() {
        let f = fixture();
        let ctx = SystemContext {
            bounds: Rect::new(0, 0, 1000, 400),
            glyphs: &f.glyphs,
            vertical_sections: &[],
            horizontal_sections: &[],
            seeds: &f.seeds,
            beams: &[],
            scale: &f.scale,
            skew: Skew::default(),
            params: &f.params,
            connections: &f.connections,
            checker: &f.checker,
        };
        let lookup = CornerLookup::new(&head(), Corner::TopRight, &ctx).unwrap();
        assert_eq!(lookup.reference_point(), [120.0, 106.0]);
        assert_eq!(lookup.target_point(), [120.0, 0.0]);
        assert_eq!(lookup.out_point(), [126.0, 106.0]);
        assert_eq!(lookup.in_point(), [114.0, 106.0]);
        assert!(lookup.area().contains_point([120.0, 50.0]));
        assert!(!lookup.area().contains_point([120.0, 150.0]));

        let near = ctx.neighborhood(&head().bounds);
        assert_eq!(near.seeds, vec![f.seeds[0]]);
        assert_eq!(lookup.seed_candidates(&ctx, &near), vec![f.seeds[0]]);

        let below = CornerLookup::new(&head(), Corner::BottomRight, &ctx).unwrap();
        assert!(below.seed_candidates(&ctx, &near).is_empty());
    }

    #[test]
    fn whole_heads_have_no_corner() {
        let f = fixture();
        let ctx = SystemContext {
            bounds: Rect::new(0, 0, 1000, 400),
            glyphs: &f.glyphs,
            vertical_sections: &[],
            horizontal_sections: &[],
            seeds: &[],
            beams: &[],
            scale: &f.scale,
            skew: Skew::default(),
            params: &f.params,
            connections: &f.connections,
            checker: &f.checker,
        };
        let whole = HeadRef {
            shape: HeadShape::WholeNote,
            ..head()
        };
        assert!(matches!(
            CornerLookup::new(&whole, Corner::TopLeft, &ctx),
            Err(LinkError::UnmappedShape { inter: 0, .. })
        ));
    }
}
