//! Sheet-level driver: staff line clustering over the filaments, then stem
//! linking system by system.

use std::time::Instant;

use log::info;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::diagnostics::{elapsed_ms, PageReport, TimingBreakdown};
use crate::geometry::Skew;
use crate::grid::{ClusterOptions, ClusterReport, ClustersRetriever, FilamentArena};
use crate::scale::{InterlineScale, Scale};
use crate::sig::SigSnapshot;
use crate::stem::{LinkOptions, StemsBuilder, StemsReport};
use crate::system::SystemInfo;

pub struct Sheet {
    pub scale: Scale,
    pub interline: InterlineScale,
    pub skew: Skew,
    pub width: i32,
    pub filaments: FilamentArena,
    pub systems: Vec<SystemInfo>,
}

impl Sheet {
    /// Clusters every filament of the sheet into staves.
    pub fn retrieve_clusters(&mut self, options: &ClusterOptions) -> ClusterReport {
        let mut retriever =
            ClustersRetriever::new(&self.scale, self.interline, self.skew, self.width, options);
        let all: Vec<usize> = (0..self.filaments.len()).collect();
        retriever.build_info(&mut self.filaments, all, options.check_consistency)
    }

    /// Links stems in every system. Systems are independent and processed
    /// in parallel when the `parallel` feature is on; reports come back in
    /// system order either way.
    pub fn link_stems(&mut self, options: &LinkOptions) -> Vec<StemsReport> {
        let builder = StemsBuilder::new(&self.scale, self.skew, options);

        #[cfg(feature = "parallel")]
        let reports: Vec<StemsReport> = self
            .systems
            .par_iter_mut()
            .map(|system| builder.link_stems(system))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let reports: Vec<StemsReport> = self
            .systems
            .iter_mut()
            .map(|system| builder.link_stems(system))
            .collect();

        reports
    }

    /// Runs clustering then stem linking.
    pub fn process(&mut self, clusters: &ClusterOptions, stems: &LinkOptions) -> PageReport {
        let t_total = Instant::now();
        let mut timing = TimingBreakdown::default();
        let mut t = Instant::now();

        let cluster_report = self.retrieve_clusters(clusters);
        t = timing.lap("clusters", t);

        let stem_reports = self.link_stems(stems);
        timing.lap("stems", t);
        timing.total_ms = elapsed_ms(t_total);

        info!(
            "Sheet processed: {} staves, {} systems in {:.3} ms",
            cluster_report.clusters.len(),
            stem_reports.len(),
            timing.total_ms
        );
        PageReport {
            clusters: cluster_report,
            systems: stem_reports,
            graphs: Vec::new(),
            timing,
        }
    }

    /// Snapshot of every system graph, in system order.
    pub fn snapshots(&self) -> Vec<SigSnapshot> {
        self.systems.iter().map(|s| s.sig.snapshot()).collect()
    }
}
