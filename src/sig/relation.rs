//! Typed edges of the interpretation graph.
//!
//! A single [`Relation`] enum carries every edge kind so that the graph engine
//! stays kind-agnostic. Gaps are stored as interline fractions.

use serde::{Deserialize, Serialize};

use super::grade::{gap_impact, GradeImpacts};
use super::inter::StemInter;
use crate::geometry::{HorizontalSide, Rect};

/// Gap tolerances and weights of one connection kind, as interline fractions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GapLimits {
    /// Maximum abscissa gap when the stem lies inside the partner.
    pub x_in_gap_max: f64,
    /// Maximum abscissa gap when the stem lies outside the partner.
    pub x_out_gap_max: f64,
    pub y_gap_max: f64,
    pub x_weight: f64,
    pub y_weight: f64,
    /// Minimum grade for the connection to be recorded.
    pub min_grade: f64,
}

impl Default for GapLimits {
    fn default() -> Self {
        Self {
            x_in_gap_max: 0.3,
            x_out_gap_max: 0.3,
            y_gap_max: 0.8,
            x_weight: 3.0,
            y_weight: 1.0,
            min_grade: 0.1,
        }
    }
}

impl GapLimits {
    /// Grade of a connection with signed `x_gap` (negative inside) and
    /// `y_gap`, both interline fractions.
    pub fn grade(&self, x_gap: f64, y_gap: f64) -> f64 {
        let x_impact = if x_gap >= 0.0 {
            gap_impact(x_gap, self.x_out_gap_max)
        } else {
            gap_impact(-x_gap, self.x_in_gap_max)
        };
        GradeImpacts::new()
            .with("xGap", x_impact, self.x_weight)
            .with("yGap", gap_impact(y_gap, self.y_gap_max), self.y_weight)
            .grade()
    }
}

/// Part of a beam a stem is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamPortion {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionCause {
    Overlap,
    Incompatible,
}

/// Link between a head and one of its stems.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadStemRelation {
    /// Side of the head where the stem stands.
    pub head_side: HorizontalSide,
    /// Signed horizontal gap, negative when the stem enters the head.
    pub x_gap: f64,
    pub y_gap: f64,
    pub grade: f64,
    /// Stem point facing the head anchor.
    pub extension_point: [f64; 2],
    /// True when the stem goes deep inside the head.
    pub invading: bool,
}

impl HeadStemRelation {
    pub fn dy(&self) -> f64 {
        self.y_gap
    }

    pub fn is_invading(&self) -> bool {
        self.invading
    }
}

/// Link between a beam and a stem.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamStemRelation {
    pub portion: BeamPortion,
    pub x_gap: f64,
    pub y_gap: f64,
    pub grade: f64,
    /// Stem point on the far border of the beam.
    pub extension_point: [f64; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Relation {
    HeadStem(HeadStemRelation),
    BeamStem(BeamStemRelation),
    Exclusion { cause: ExclusionCause },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    HeadStem,
    BeamStem,
    Exclusion,
}

impl Relation {
    pub fn kind(&self) -> RelationKind {
        match self {
            Relation::HeadStem(_) => RelationKind::HeadStem,
            Relation::BeamStem(_) => RelationKind::BeamStem,
            Relation::Exclusion { .. } => RelationKind::Exclusion,
        }
    }

    pub fn as_head_stem(&self) -> Option<&HeadStemRelation> {
        match self {
            Relation::HeadStem(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_beam_stem(&self) -> Option<&BeamStemRelation> {
        match self {
            Relation::BeamStem(r) => Some(r),
            _ => None,
        }
    }

    /// Grade of a support relation, none for exclusions.
    pub fn grade(&self) -> Option<f64> {
        match self {
            Relation::HeadStem(r) => Some(r.grade),
            Relation::BeamStem(r) => Some(r.grade),
            Relation::Exclusion { .. } => None,
        }
    }
}

/// Canonical shared head: the left stem hangs below the head while the right
/// stem rises above it.
pub fn is_canonical_share(left_stem: &StemInter, head: &Rect, right_stem: &StemInter) -> bool {
    let head_mid = head.center()[1];
    let left_mid = 0.5 * (left_stem.top[1] + left_stem.bottom[1]);
    let right_mid = 0.5 * (right_stem.top[1] + right_stem.bottom[1]);
    left_mid > head_mid && right_mid < head_mid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_gap_uses_out_limit() {
        let limits = GapLimits {
            x_in_gap_max: 0.1,
            x_out_gap_max: 0.4,
            ..GapLimits::default()
        };
        assert!(limits.grade(0.2, 0.0) > 0.5);
        assert_eq!(limits.grade(-0.2, 0.0), 0.0);
        assert_eq!(limits.grade(0.0, 0.9), 0.0);
        assert_eq!(limits.grade(0.0, 0.0), 1.0);
    }

    #[test]
    fn canonical_share_needs_opposite_stems() {
        let head = Rect::new(100, 100, 20, 10);
        let down = StemInter {
            top: [100.0, 105.0],
            bottom: [100.0, 170.0],
            impacts: GradeImpacts::new(),
        };
        let up = StemInter {
            top: [119.0, 40.0],
            bottom: [119.0, 104.0],
            impacts: GradeImpacts::new(),
        };
        assert!(is_canonical_share(&down, &head, &up));
        assert!(!is_canonical_share(&up, &head, &down));
    }
}
