use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u32);

/// Direction of the runs of a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Sequence of foreground pixels along the section orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// First pixel coordinate along the run.
    pub start: i32,
    pub length: i32,
}

impl Run {
    pub fn new(start: i32, length: i32) -> Self {
        Self { start, length }
    }

    #[inline]
    pub fn stop(&self) -> i32 {
        self.start + self.length - 1
    }
}

/// Contiguous runs on consecutive positions.
///
/// A vertical section has vertical runs on consecutive columns starting at
/// `first_pos`; a horizontal one has horizontal runs on consecutive rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    pub orientation: Orientation,
    pub first_pos: i32,
    pub runs: Vec<Run>,
}

/// Raw pixel moments, enough for weight, centroid and a line fit.
#[derive(Clone, Copy, Debug, Default)]
pub struct Moments {
    pub n: f64,
    pub sx: f64,
    pub sy: f64,
    pub sxy: f64,
    pub syy: f64,
}

impl Section {
    pub fn new(id: SectionId, orientation: Orientation, first_pos: i32, runs: Vec<Run>) -> Self {
        Self {
            id,
            orientation,
            first_pos,
            runs,
        }
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }

    pub fn last_pos(&self) -> i32 {
        self.first_pos + self.runs.len() as i32 - 1
    }

    pub fn weight(&self) -> i32 {
        self.runs.iter().map(|r| r.length).sum()
    }

    pub fn bounds(&self) -> Rect {
        if self.runs.is_empty() {
            return Rect::default();
        }
        let lo = self.runs.iter().map(|r| r.start).min().unwrap_or(0);
        let hi = self.runs.iter().map(|r| r.start + r.length).max().unwrap_or(0);
        let span = self.runs.len() as i32;
        match self.orientation {
            Orientation::Vertical => Rect::new(self.first_pos, lo, span, hi - lo),
            Orientation::Horizontal => Rect::new(lo, self.first_pos, hi - lo, span),
        }
    }

    /// Pixel box of the run at `pos`.
    pub fn run_box(&self, pos: i32) -> Option<Rect> {
        let run = self.runs.get((pos - self.first_pos) as usize)?;
        Some(match self.orientation {
            Orientation::Vertical => Rect::new(pos, run.start, 1, run.length),
            Orientation::Horizontal => Rect::new(run.start, pos, run.length, 1),
        })
    }

    pub fn first_run_box(&self) -> Option<Rect> {
        self.run_box(self.first_pos)
    }

    pub fn last_run_box(&self) -> Option<Rect> {
        self.run_box(self.last_pos())
    }

    pub fn accumulate(&self, m: &mut Moments) {
        for (i, run) in self.runs.iter().enumerate() {
            let pos = (self.first_pos + i as i32) as f64;
            let len = run.length as f64;
            let s = run.start as f64;
            // Sums over the run coordinate s, s+1, .., s+len-1.
            let sum = len * s + len * (len - 1.0) / 2.0;
            let sum_sq =
                len * s * s + s * len * (len - 1.0) + (len - 1.0) * len * (2.0 * len - 1.0) / 6.0;
            m.n += len;
            match self.orientation {
                Orientation::Vertical => {
                    m.sx += pos * len;
                    m.sy += sum;
                    m.sxy += pos * sum;
                    m.syy += sum_sq;
                }
                Orientation::Horizontal => {
                    m.sx += sum;
                    m.sy += pos * len;
                    m.sxy += pos * sum;
                    m.syy += pos * pos * len;
                }
            }
        }
    }

    pub fn centroid(&self) -> [f64; 2] {
        let mut m = Moments::default();
        self.accumulate(&mut m);
        if m.n == 0.0 {
            return self.bounds().center();
        }
        [m.sx / m.n, m.sy / m.n]
    }

    /// Thickness across the section orientation.
    pub fn mean_thickness(&self) -> f64 {
        let b = self.bounds();
        let along = match self.orientation {
            Orientation::Vertical => b.h,
            Orientation::Horizontal => b.w,
        };
        if along == 0 {
            0.0
        } else {
            self.weight() as f64 / along as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_section_geometry() {
        let s = Section::new(
            SectionId(1),
            Orientation::Vertical,
            10,
            vec![Run::new(5, 20), Run::new(4, 22), Run::new(6, 18)],
        );
        assert_eq!(s.bounds(), Rect::new(10, 4, 3, 22));
        assert_eq!(s.weight(), 60);
        assert_eq!(s.last_run_box(), Some(Rect::new(12, 6, 1, 18)));
        let c = s.centroid();
        assert!((c[0] - (10.0 * 20.0 + 11.0 * 22.0 + 12.0 * 18.0) / 60.0).abs() < 1e-9);
        assert!((c[1] - 14.5).abs() < 1e-9);
    }

    #[test]
    fn horizontal_moments_match_brute_force() {
        let s = Section::new(SectionId(2), Orientation::Horizontal, 3, vec![Run::new(7, 4)]);
        let mut m = Moments::default();
        s.accumulate(&mut m);
        let xs = [7.0, 8.0, 9.0, 10.0];
        assert_eq!(m.n, 4.0);
        assert_eq!(m.sx, xs.iter().sum::<f64>());
        assert_eq!(m.sy, 12.0);
        assert_eq!(m.sxy, 3.0 * 34.0);
    }
}
