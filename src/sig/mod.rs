//! Interpretation graph: candidate symbols and their typed relations.
//!
//! - [`Inter`] vertices carry a kind payload (head, beam, stem) and a grade.
//! - [`Relation`] edges are head-stem and beam-stem supports or exclusions.
//! - [`Sig`] owns one system's graph and exposes the queries the stem stage
//!   needs (relations by kind, exclusions, compatible partitions).

pub mod grade;
pub mod graph;
pub mod inter;
pub mod relation;

pub use grade::{gap_impact, GradeImpacts, Impact, GOOD_GRADE};
pub use graph::{InterId, RelationId, Sig, SigSnapshot};
pub use inter::{
    BeamInter, HeadDescriptor, HeadInter, HeadShape, Inter, InterClass, InterKind, StemInter,
};
pub use relation::{
    is_canonical_share, BeamPortion, BeamStemRelation, ExclusionCause, GapLimits, HeadStemRelation,
    Relation, RelationKind,
};
