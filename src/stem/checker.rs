//! Intrinsic quality of a stem candidate.

use super::options::CheckerOptions;
use crate::geometry::Skew;
use crate::glyph::Glyph;
use crate::scale::Scale;
use crate::sig::{gap_impact, GradeImpacts};

/// Grades a candidate stem glyph.
pub trait StemChecker: Send + Sync {
    fn check_stem(&self, glyph: &Glyph) -> GradeImpacts;
}

/// Default checker: black core density, largest hole, slope against the sheet
/// vertical and mean width.
#[derive(Clone, Debug)]
pub struct VerticalsChecker {
    options: CheckerOptions,
    interline: f64,
    stem_thickness: f64,
    max_stem: f64,
    vertical_slope: f64,
}

impl VerticalsChecker {
    pub fn new(scale: &Scale, skew: &Skew, options: CheckerOptions) -> Self {
        Self {
            options,
            interline: scale.interline,
            stem_thickness: scale.stem_thickness.max(1.0),
            max_stem: scale.max_stem,
            vertical_slope: skew.vertical_dx(1.0),
        }
    }
}

impl StemChecker for VerticalsChecker {
    fn check_stem(&self, glyph: &Glyph) -> GradeImpacts {
        let o = &self.options;
        let height = glyph.bounds.h.max(1) as f64;

        let core_ratio = glyph.weight as f64 / (height * self.stem_thickness);
        let core = if core_ratio < o.min_core_ratio {
            0.0
        } else {
            core_ratio.min(1.0)
        };

        let gap = gap_impact(glyph.largest_gap as f64 / self.interline, o.max_gap);
        let slope = gap_impact((glyph.slope - self.vertical_slope).abs(), o.max_slope_gap);
        let excess = (glyph.mean_width() - self.stem_thickness).max(0.0);
        let width = gap_impact(excess, self.max_stem - self.stem_thickness + 1.0);

        GradeImpacts::new()
            .with("core", core, o.core_weight)
            .with("gap", gap, o.gap_weight)
            .with("slope", slope, o.slope_weight)
            .with("width", width, o.width_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::{Orientation, Run, Section, SectionId};

    fn stem_sections(x: i32, y: i32, len: i32, width: i32) -> Vec<Section> {
        (0..width)
            .map(|i| {
                Section::new(
                    SectionId(i as u32),
                    Orientation::Vertical,
                    x + i,
                    vec![Run::new(y, len)],
                )
            })
            .collect()
    }

    #[test]
    fn clean_stem_grades_high() {
        let scale = Scale::new(20.0).unwrap();
        let checker = VerticalsChecker::new(&scale, &Skew::default(), CheckerOptions::default());
        let sections = stem_sections(100, 50, 60, 3);
        let refs: Vec<&Section> = sections.iter().collect();
        let glyph = Glyph::build(&refs).unwrap();
        let impacts = checker.check_stem(&glyph);
        assert_eq!(impacts.get("core"), Some(1.0));
        assert!(impacts.grade() > 0.9);
    }

    #[test]
    fn thin_broken_glyph_is_rejected() {
        let scale = Scale::new(20.0).unwrap();
        let checker = VerticalsChecker::new(&scale, &Skew::default(), CheckerOptions::default());
        let sections = vec![
            Section::new(SectionId(0), Orientation::Vertical, 100, vec![Run::new(50, 10)]),
            Section::new(SectionId(1), Orientation::Vertical, 100, vec![Run::new(80, 10)]),
        ];
        let refs: Vec<&Section> = sections.iter().collect();
        let glyph = Glyph::build(&refs).unwrap();
        assert_eq!(checker.check_stem(&glyph).grade(), 0.0);
    }
}
