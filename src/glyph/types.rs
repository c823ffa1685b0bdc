use serde::{Deserialize, Serialize};

use super::section::{Moments, Section, SectionId};
use crate::geometry::{Line, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlyphId(pub u32);

/// Immutable set of sections seen as one shape.
///
/// Identity is the sorted list of section ids: two glyphs built from the same
/// sections are the same glyph once registered in a
/// [`GlyphIndex`](super::GlyphIndex).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Glyph {
    pub sections: Vec<SectionId>,
    pub bounds: Rect,
    pub weight: i32,
    pub centroid: [f64; 2],
    /// Vertical fit `x = slope * y + intercept`.
    pub slope: f64,
    pub intercept: f64,
    /// Largest vertical gap not covered by any section.
    pub largest_gap: i32,
}

impl Glyph {
    /// Builds the glyph made of `sections`; `None` when empty.
    pub fn build(sections: &[&Section]) -> Option<Glyph> {
        if sections.is_empty() {
            return None;
        }
        let mut ids: Vec<SectionId> = sections.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();

        let mut m = Moments::default();
        let mut bounds = Rect::default();
        let mut spans: Vec<(i32, i32)> = Vec::with_capacity(sections.len());
        let mut seen: Vec<SectionId> = Vec::with_capacity(sections.len());
        for s in sections {
            if seen.contains(&s.id) {
                continue;
            }
            seen.push(s.id);
            s.accumulate(&mut m);
            let b = s.bounds();
            bounds = bounds.union(&b);
            spans.push((b.y, b.bottom()));
        }
        if m.n == 0.0 {
            return None;
        }
        let centroid = [m.sx / m.n, m.sy / m.n];
        let den = m.n * m.syy - m.sy * m.sy;
        let (slope, intercept) = if den.abs() < 1e-9 {
            (0.0, centroid[0])
        } else {
            let a = (m.n * m.sxy - m.sx * m.sy) / den;
            (a, (m.sx - a * m.sy) / m.n)
        };

        spans.sort_unstable();
        let mut largest_gap = 0;
        let mut covered = spans[0].1;
        for &(top, bottom) in &spans[1..] {
            largest_gap = largest_gap.max(top - covered);
            covered = covered.max(bottom);
        }

        Some(Glyph {
            sections: ids,
            bounds,
            weight: m.n as i32,
            centroid,
            slope,
            intercept,
            largest_gap,
        })
    }

    /// Abscissa of the fitted vertical line at ordinate `y`.
    pub fn x_at(&self, y: f64) -> f64 {
        self.slope * y + self.intercept
    }

    /// Top end of the fitted line.
    pub fn start_point(&self) -> [f64; 2] {
        let y = self.bounds.y as f64;
        [self.x_at(y), y]
    }

    /// Bottom end of the fitted line.
    pub fn stop_point(&self) -> [f64; 2] {
        let y = (self.bounds.bottom() - 1) as f64;
        [self.x_at(y), y]
    }

    pub fn line(&self) -> Line {
        Line::new(self.start_point(), self.stop_point())
    }

    /// Mean horizontal thickness.
    pub fn mean_width(&self) -> f64 {
        if self.bounds.h == 0 {
            0.0
        } else {
            self.weight as f64 / self.bounds.h as f64
        }
    }
}
