//! Reports returned by the clustering and stem stages.
//!
//! [`PageReport`] bundles the staff clustering outcome (`ClusterReport`) and
//! one `StemsReport` per system, each carrying its own
//! [`TimingBreakdown`].

pub mod io;
pub mod timing;

use serde::Serialize;

pub use crate::grid::ClusterReport;
pub use crate::sig::SigSnapshot;
pub use crate::stem::StemsReport;
pub use io::write_json_file;
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};

/// Outcome of a full sheet run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReport {
    pub clusters: ClusterReport,
    pub systems: Vec<StemsReport>,
    /// Final interpretation graph of each system, when requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub graphs: Vec<SigSnapshot>,
    pub timing: TimingBreakdown,
}

impl PageReport {
    pub fn head_stem_links(&self) -> usize {
        self.systems.iter().map(|s| s.head_stem_links).sum()
    }

    pub fn removed_heads(&self) -> usize {
        self.systems.iter().map(|s| s.removed_heads.len()).sum()
    }
}
