//! Interpretations: the vertices of the interpretation graph.

use serde::{Deserialize, Serialize};

use super::grade::{GradeImpacts, GOOD_GRADE};
use crate::geometry::{HorizontalSide, Line, Rect, VerticalSide};
use crate::glyph::GlyphId;
use crate::stem::corner::Corner;

/// Note head shapes known to the stem linker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeadShape {
    NoteheadBlack,
    NoteheadVoid,
    NoteheadBlackSmall,
    NoteheadVoidSmall,
    WholeNote,
    BreveNote,
}

/// Relative stem anchors of a head shape, as fractions of its box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadDescriptor {
    /// Anchor ordinate for top corners (stem going up).
    pub top_dy: f64,
    /// Anchor ordinate for bottom corners (stem going down).
    pub bottom_dy: f64,
    /// Anchor abscissa for left corners.
    pub left_dx: f64,
    /// Anchor abscissa for right corners.
    pub right_dx: f64,
}

const STEM_HEAD: HeadDescriptor = HeadDescriptor {
    top_dy: 0.4,
    bottom_dy: 0.6,
    left_dx: 0.0,
    right_dx: 1.0,
};

impl HeadShape {
    /// Shapes that cannot stand without a stem.
    pub fn needs_stem(self) -> bool {
        matches!(
            self,
            HeadShape::NoteheadBlack
                | HeadShape::NoteheadVoid
                | HeadShape::NoteheadBlackSmall
                | HeadShape::NoteheadVoidSmall
        )
    }

    /// Shapes that take part in stem linking.
    pub fn is_stem_template(self) -> bool {
        self.needs_stem()
    }

    pub fn descriptor(self) -> Option<HeadDescriptor> {
        self.needs_stem().then_some(STEM_HEAD)
    }
}

impl HeadDescriptor {
    /// Stem anchor of a head of box `bounds` for `corner`.
    pub fn anchor(&self, bounds: &Rect, corner: Corner) -> [f64; 2] {
        let dx = match corner.h_side() {
            HorizontalSide::Left => self.left_dx,
            HorizontalSide::Right => self.right_dx,
        };
        let dy = match corner.v_side() {
            VerticalSide::Top => self.top_dy,
            VerticalSide::Bottom => self.bottom_dy,
        };
        [
            bounds.x as f64 + dx * (bounds.w - 1).max(0) as f64,
            bounds.y as f64 + dy * (bounds.h - 1).max(0) as f64,
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeadInter {
    pub shape: HeadShape,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamInter {
    /// Median line from left end to right end.
    pub median: Line,
    /// Vertical thickness.
    pub height: f64,
    pub hook: bool,
}

impl BeamInter {
    /// Border line on `side`.
    pub fn border(&self, side: VerticalSide) -> Line {
        let half = 0.5 * self.height;
        match side {
            VerticalSide::Top => self.median.shifted_y(-half),
            VerticalSide::Bottom => self.median.shifted_y(half),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StemInter {
    pub top: [f64; 2],
    pub bottom: [f64; 2],
    pub impacts: GradeImpacts,
}

impl StemInter {
    pub fn line(&self) -> Line {
        Line::new(self.top, self.bottom)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InterKind {
    Head(HeadInter),
    Beam(BeamInter),
    Stem(StemInter),
}

/// Coarse classes used to query the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterClass {
    Head,
    /// Beams and beam hooks.
    Beam,
    Stem,
}

/// Candidate interpretation with its intrinsic grade.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Inter {
    pub kind: InterKind,
    pub bounds: Rect,
    grade: f64,
    pub glyph: Option<GlyphId>,
}

impl Inter {
    pub fn new(kind: InterKind, bounds: Rect, grade: f64) -> Self {
        Self {
            kind,
            bounds,
            grade: grade.clamp(0.0, 1.0),
            glyph: None,
        }
    }

    pub fn head(shape: HeadShape, bounds: Rect, grade: f64) -> Self {
        Self::new(InterKind::Head(HeadInter { shape }), bounds, grade)
    }

    pub fn beam(median: Line, height: f64, hook: bool, grade: f64) -> Self {
        let (x0, x1) = (
            median.p1[0].min(median.p2[0]),
            median.p1[0].max(median.p2[0]),
        );
        let half = 0.5 * height;
        let y0 = median.p1[1].min(median.p2[1]) - half;
        let y1 = median.p1[1].max(median.p2[1]) + half;
        let bounds = Rect::new(
            x0.floor() as i32,
            y0.floor() as i32,
            (x1.ceil() - x0.floor()) as i32 + 1,
            (y1.ceil() - y0.floor()) as i32,
        );
        Self::new(
            InterKind::Beam(BeamInter {
                median,
                height,
                hook,
            }),
            bounds,
            grade,
        )
    }

    pub fn stem(
        glyph: GlyphId,
        bounds: Rect,
        top: [f64; 2],
        bottom: [f64; 2],
        impacts: GradeImpacts,
    ) -> Self {
        let grade = impacts.grade();
        let mut inter = Self::new(
            InterKind::Stem(StemInter {
                top,
                bottom,
                impacts,
            }),
            bounds,
            grade,
        );
        inter.glyph = Some(glyph);
        inter
    }

    pub fn grade(&self) -> f64 {
        self.grade
    }

    pub fn set_grade(&mut self, grade: f64) {
        self.grade = grade.clamp(0.0, 1.0);
    }

    /// Raises the grade by `ratio` of the remaining distance to 1.
    pub fn increase(&mut self, ratio: f64) {
        self.grade += ratio * (1.0 - self.grade);
        self.grade = self.grade.clamp(0.0, 1.0);
    }

    pub fn is_good(&self) -> bool {
        self.grade >= GOOD_GRADE
    }

    pub fn class(&self) -> InterClass {
        match self.kind {
            InterKind::Head(_) => InterClass::Head,
            InterKind::Beam(_) => InterClass::Beam,
            InterKind::Stem(_) => InterClass::Stem,
        }
    }

    pub fn as_head(&self) -> Option<&HeadInter> {
        match &self.kind {
            InterKind::Head(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_beam(&self) -> Option<&BeamInter> {
        match &self.kind {
            InterKind::Beam(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_stem(&self) -> Option<&StemInter> {
        match &self.kind {
            InterKind::Stem(s) => Some(s),
            _ => None,
        }
    }

    pub fn center(&self) -> [f64; 2] {
        self.bounds.center()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_moves_towards_one() {
        let mut inter = Inter::head(HeadShape::NoteheadBlack, Rect::new(0, 0, 10, 8), 0.4);
        assert!(!inter.is_good());
        inter.increase(0.5);
        assert!((inter.grade() - 0.7).abs() < 1e-12);
        assert!(inter.is_good());
    }

    #[test]
    fn whole_notes_have_no_anchor() {
        assert!(HeadShape::WholeNote.descriptor().is_none());
        assert!(!HeadShape::BreveNote.needs_stem());
        let d = HeadShape::NoteheadVoid.descriptor().unwrap();
        let p = d.anchor(&Rect::new(100, 50, 21, 11), Corner::TopRight);
        assert_eq!(p, [120.0, 54.0]);
    }

    #[test]
    fn beam_borders_surround_median() {
        let beam = Inter::beam(Line::new([0.0, 100.0], [60.0, 100.0]), 8.0, false, 0.8);
        let b = beam.as_beam().unwrap();
        assert_eq!(b.border(VerticalSide::Top).p1[1], 96.0);
        assert_eq!(b.border(VerticalSide::Bottom).p2[1], 104.0);
        assert_eq!(beam.bounds, Rect::new(0, 96, 61, 8));
    }
}
