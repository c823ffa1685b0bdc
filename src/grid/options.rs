use serde::{Deserialize, Serialize};

use super::comb::CombParams;
use crate::scale::{InterlineScale, Scale};

/// Comb sampling options, as interline fractions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombOptions {
    /// Abscissa step between two samplings.
    pub sampling_dx: f64,
    /// Margin below the minimum interline accepted in a comb.
    pub min_margin: f64,
    /// Margin above the maximum interline accepted in a comb.
    pub max_margin: f64,
}

impl Default for CombOptions {
    fn default() -> Self {
        Self {
            sampling_dx: 1.0,
            min_margin: 0.0,
            max_margin: 0.0,
        }
    }
}

impl CombOptions {
    pub fn resolve(&self, interline: &InterlineScale) -> CombParams {
        CombParams {
            sampling_dx: interline.to_pixels(self.sampling_dx),
            d_min: interline.min - interline.to_pixels(self.min_margin),
            d_max: interline.max + interline.to_pixels(self.max_margin),
        }
    }
}

/// Options for staff line clustering, as interline fractions.
///
/// - `max_expand_*`: reach when attaching loose filaments to a cluster.
/// - `max_merge_*`: tolerances when merging two clusters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterOptions {
    pub comb: CombOptions,
    /// Maximum abscissa extrapolation when attaching a filament.
    pub max_expand_dx: f64,
    /// Maximum ordinate distance when attaching a filament.
    pub max_expand_dy: f64,
    /// Maximum horizontal gap between two mergeable clusters.
    pub max_merge_dx: f64,
    /// Maximum mean ordinate distance between two mergeable clusters.
    pub max_merge_dy: f64,
    /// Maximum center distance when pairing clusters side by side.
    pub max_merge_center_dy: f64,
    /// Vertical margin around a cluster box.
    pub cluster_y_margin: f64,
    /// Minimum cluster length, as ratio of the median cluster length.
    pub min_cluster_length_ratio: f64,
    /// Maximum (max - min) / mean ratio of line lengths within a cluster.
    pub max_cluster_diff_length_ratio: f64,
    /// Number of lines per staff.
    pub pop_size: usize,
    pub check_consistency: bool,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            comb: CombOptions::default(),
            max_expand_dx: 2.0,
            max_expand_dy: 0.175,
            max_merge_dx: 6.0,
            max_merge_dy: 0.4,
            max_merge_center_dy: 1.0,
            cluster_y_margin: 2.0,
            min_cluster_length_ratio: 0.2,
            max_cluster_diff_length_ratio: 0.5,
            pop_size: 5,
            check_consistency: true,
        }
    }
}

/// [`ClusterOptions`] resolved to pixels for one interline.
#[derive(Clone, Debug)]
pub struct ClusterParams {
    pub comb: CombParams,
    pub max_expand_dx: f64,
    pub max_expand_dy: f64,
    pub max_merge_dx: i32,
    pub max_merge_dy: f64,
    pub max_merge_center_dy: f64,
    pub cluster_y_margin: i32,
    pub max_fore: f64,
    pub min_cluster_length_ratio: f64,
    pub max_cluster_diff_length_ratio: f64,
    pub pop_size: usize,
}

impl ClusterParams {
    pub fn resolve(options: &ClusterOptions, scale: &Scale, interline: &InterlineScale) -> Self {
        Self {
            comb: options.comb.resolve(interline),
            max_expand_dx: interline.to_pixels_f(options.max_expand_dx),
            max_expand_dy: interline.to_pixels_f(options.max_expand_dy),
            max_merge_dx: interline.to_pixels(options.max_merge_dx),
            max_merge_dy: interline.to_pixels_f(options.max_merge_dy),
            max_merge_center_dy: interline.to_pixels_f(options.max_merge_center_dy),
            cluster_y_margin: interline.to_pixels(options.cluster_y_margin),
            max_fore: scale.max_fore,
            min_cluster_length_ratio: options.min_cluster_length_ratio,
            max_cluster_diff_length_ratio: options.max_cluster_diff_length_ratio,
            pop_size: options.pop_size,
        }
    }
}
