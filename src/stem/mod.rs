//! Stem linking.
//!
//! For every head, up to four corners are searched for stem material
//! (seeds and section chunks) and beams:
//! - [`lookup`]: corner lookup area and candidate filtering.
//! - [`assembler`]: stem hypotheses and connection scoring, without side
//!   effects.
//! - [`builder`]: [`StemsBuilder`], which applies the hypotheses to the
//!   interpretation graph in two phases.
//! - [`conflicts`]: exclusions, beam checks and head sharing rules.

pub mod assembler;
pub mod builder;
pub mod checker;
pub mod conflicts;
pub mod corner;
pub mod lookup;
pub mod options;

pub use assembler::{link_corner, CornerPlan, StemHypothesis};
pub use builder::{StemsBuilder, StemsReport};
pub use checker::{StemChecker, VerticalsChecker};
pub use conflicts::ShareChecker;
pub use corner::Corner;
pub use lookup::{BeamRef, CornerLookup, HeadRef, StemRef, SystemContext};
pub use options::{CheckerOptions, ConnectionOptions, LinkOptions, StemOptions, StemParams};
