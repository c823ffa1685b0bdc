#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod input;
pub mod sheet;
pub mod system;

// Stage modules, public for tools and tests.
pub mod geometry;
pub mod glyph;
pub mod grid;
pub mod scale;
pub mod sig;
pub mod stem;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::LinkError;
pub use crate::sheet::Sheet;
pub use crate::system::SystemInfo;

pub use crate::diagnostics::PageReport;
pub use crate::grid::{ClusterOptions, ClusterReport, ClustersRetriever};
pub use crate::stem::{LinkOptions, StemsBuilder, StemsReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use omr_linker::prelude::*;
///
/// # fn main() -> Result<(), LinkError> {
/// let scale = Scale::new(20.0)?;
/// let mut system = SystemInfo::new(0, Rect::new(0, 0, 800, 300), Vec::new());
/// system.add_head(HeadShape::NoteheadBlack, Rect::new(100, 150, 21, 16), 0.8);
///
/// let builder = StemsBuilder::new(&scale, Skew::default(), &LinkOptions::default());
/// let report = builder.link_stems(&mut system);
/// println!("stems={} removed={}", report.stems_created, report.removed_heads.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::geometry::{Line, Rect, Skew};
    pub use crate::scale::{InterlineScale, Scale};
    pub use crate::sig::{HeadShape, Sig};
    pub use crate::{LinkError, LinkOptions, Sheet, StemsBuilder, SystemInfo};
}

// --- Stage-level API (for tools & advanced users) ---------------------------

pub mod stages {
    // Stage runners.
    pub use crate::grid::{detect_combs, ClustersRetriever};
    pub use crate::stem::assembler::{
        beam_stem_relation, head_stem_relation, link_corner, reuse_corner,
    };
    pub use crate::stem::conflicts::{
        boost_beam_sides, check_beam_stems, check_head_stems, check_needed_stems,
        drop_exclusive_links, perform_mutual_exclusions, ShareChecker,
    };

    // Structured diagnostics types.
    pub use crate::diagnostics::{
        ClusterReport, PageReport, SigSnapshot, StageTiming, StemsReport, TimingBreakdown,
    };
    pub use crate::stem::{CornerLookup, CornerPlan, StemHypothesis};
}
