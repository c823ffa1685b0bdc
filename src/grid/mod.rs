//! Staff line clustering.
//!
//! Long horizontal filaments are grouped into staves:
//! - [`filament`]: filament geometry and the merge arena.
//! - [`comb`]: vertical sampling into evenly spaced groups of lines.
//! - [`cluster`]: `LineCluster`, one staff under construction.
//! - [`retriever`]: the full clustering pipeline.

pub mod cluster;
pub mod comb;
pub mod filament;
pub mod options;
pub mod retriever;

pub use cluster::{ClusterId, LineCluster};
pub use comb::{detect_combs, Comb, CombNetwork, CombParams};
pub use filament::{thickness_at, Filament, FilamentArena, FilamentId};
pub use options::{ClusterOptions, ClusterParams, CombOptions};
pub use retriever::{best_match, ClusterReport, ClustersRetriever, StaffLines};

#[cfg(test)]
mod tests;
