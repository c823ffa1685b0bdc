//! Staff line clusters retrieval.
//!
//! Pipeline run by [`ClustersRetriever::build_info`]:
//! - detect combs at regular abscissae ([`detect_combs`]),
//! - union filaments seen at the same relative rank of a comb,
//! - seed one cluster per remaining filament with combs, longest first,
//! - expand clusters with loose filaments, merge compatible clusters,
//! - trim to the popular size and destroy non-standard clusters,
//! - pair clusters split by a horizontal gap, drop short isolated ones,
//! - optionally destroy clusters with inconsistent line lengths,
//! - expand again and report the filaments left over.

use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info};
use serde::Serialize;

use super::cluster::{ClusterId, LineCluster};
use super::comb::{detect_combs, CombNetwork};
use super::filament::{thickness_at, Filament, FilamentArena, FilamentId};
use super::options::{ClusterOptions, ClusterParams};
use crate::diagnostics::TimingBreakdown;
use crate::geometry::{x_gap, x_overlap, Rect, Skew};
use crate::scale::{InterlineScale, Scale};

/// Final lines of one staff.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffLines {
    pub id: ClusterId,
    pub bounds: Rect,
    pub center: [f64; 2],
    /// Merged filaments, top to bottom.
    pub lines: Vec<Filament>,
}

/// Outcome of one clustering run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub interline: i32,
    pub pop_size: usize,
    pub comb_count: usize,
    pub clusters: Vec<StaffLines>,
    /// Filaments that could not be clustered.
    pub discarded: Vec<FilamentId>,
    pub timing: TimingBreakdown,
}

/// Builds staff line clusters for one interline population.
pub struct ClustersRetriever {
    skew: Skew,
    width: i32,
    interline: InterlineScale,
    params: ClusterParams,
    filaments: Vec<usize>,
    clusters: Vec<LineCluster>,
    discarded: Vec<usize>,
    network: CombNetwork,
    next_id: u32,
}

impl ClustersRetriever {
    pub fn new(
        scale: &Scale,
        interline: InterlineScale,
        skew: Skew,
        width: i32,
        options: &ClusterOptions,
    ) -> Self {
        Self {
            skew,
            width,
            interline,
            params: ClusterParams::resolve(options, scale, &interline),
            filaments: Vec::new(),
            clusters: Vec::new(),
            discarded: Vec::new(),
            network: CombNetwork::default(),
            next_id: 0,
        }
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    pub fn clusters(&self) -> &[LineCluster] {
        &self.clusters
    }

    pub fn network(&self) -> &CombNetwork {
        &self.network
    }

    /// Organizes `filaments` (arena indices) into clusters.
    pub fn build_info(
        &mut self,
        arena: &mut FilamentArena,
        filaments: Vec<usize>,
        check_consistency: bool,
    ) -> ClusterReport {
        let t_total = Instant::now();
        let mut timing = TimingBreakdown::default();
        arena.clear_combs();
        self.filaments = filaments
            .into_iter()
            .filter(|&f| !arena.is_merged(f))
            .collect();
        self.clusters.clear();
        self.discarded.clear();

        let mut t = Instant::now();
        self.network = detect_combs(arena, &self.filaments, self.width, &self.params.comb);
        t = timing.lap("combs", t);

        self.follow_combs_network(arena);
        t = timing.lap("combsNetwork", t);

        self.retrieve_clusters(arena, check_consistency);
        timing.lap("clusters", t);

        info!(
            "Retrieved line clusters: {} of size: {} with interline: {}",
            self.clusters.len(),
            self.params.pop_size,
            self.interline.main
        );

        let clusters = self
            .clusters
            .iter()
            .map(|c| StaffLines {
                id: c.id,
                bounds: c.bounds(arena),
                center: c.center(arena),
                lines: c.lines().map(|f| arena.filament(f).clone()).collect(),
            })
            .collect();
        timing.total_ms = crate::diagnostics::timing::elapsed_ms(t_total);
        ClusterReport {
            interline: self.interline.main,
            pop_size: self.params.pop_size,
            comb_count: self.network.comb_count(),
            clusters,
            discarded: self
                .discarded
                .iter()
                .map(|&f| arena.filament(f).id)
                .collect(),
            timing,
        }
    }

    fn retrieve_clusters(&mut self, arena: &mut FilamentArena, check_consistency: bool) {
        self.create_clusters(arena);
        self.expand_clusters(arena);
        self.merge_clusters(arena);
        self.trim_clusters(arena);
        self.destroy_non_standard_clusters(arena);
        self.merge_cluster_pairs(arena);
        if check_consistency {
            self.destroy_inconsistent_clusters(arena);
        }
        self.expand_clusters(arena);
        self.discard_non_clustered_filaments(arena);
        self.remove_merged_filaments(arena);
    }

    /// Unites filaments found at the same relative rank of some comb.
    fn follow_combs_network(&mut self, arena: &mut FilamentArena) {
        debug!("Following combs network");
        for fil in self.filaments.clone() {
            let mut lines: BTreeMap<i32, usize> = BTreeMap::new();
            for (col, rank) in arena.combs(fil) {
                let Some(comb) = self.network.comb(col, rank) else {
                    continue;
                };
                let pivot = comb
                    .members
                    .iter()
                    .position(|&m| m == fil)
                    .or_else(|| comb.index_of_ancestor(arena, arena.ancestor(fil)));
                let Some(pivot) = pivot else {
                    continue;
                };
                for (pos, &member) in comb.members.iter().enumerate() {
                    let line = pos as i32 - pivot as i32;
                    if line == 0 {
                        continue;
                    }
                    match lines.get(&line) {
                        Some(&f) => {
                            arena.connect_ancestors(f, member);
                        }
                        None => {
                            lines.insert(line, member);
                        }
                    }
                }
            }
        }
        self.remove_merged_filaments(arena);
    }

    fn create_clusters(&mut self, arena: &mut FilamentArena) {
        let mut order = self.filaments.clone();
        order.sort_by_key(|&f| Reverse(arena.filament(f).length()));
        for fil in order {
            let fil = arena.ancestor(fil);
            if arena.cluster_of(fil).is_none() && !arena.combs(fil).is_empty() {
                let id = ClusterId(self.next_id);
                self.next_id += 1;
                let cluster = LineCluster::new(id, arena, &self.network, fil);
                debug!("Created C{} with {} lines", id.0, cluster.size());
                self.clusters.push(cluster);
            }
        }
        self.remove_merged_clusters();
    }

    /// Aggregates non-clustered filaments to close clusters.
    fn expand_clusters(&mut self, arena: &mut FilamentArena) {
        let mut start_fils = self.filaments.clone();
        start_fils.sort_by(|&a, &b| {
            cmp_f64(arena.filament(a).start_point()[0], arena.filament(b).start_point()[0])
        });
        let mut stop_fils = start_fils.clone();
        stop_fils.sort_by(|&a, &b| {
            cmp_f64(arena.filament(a).stop_point()[0], arena.filament(b).stop_point()[0])
        });

        self.clusters
            .sort_by_key(|c| Reverse(c.true_length(arena)));
        for ci in 0..self.clusters.len() {
            self.expand_cluster(arena, ci, &stop_fils);
            self.expand_cluster(arena, ci, &start_fils);
        }
    }

    fn expand_cluster(&mut self, arena: &mut FilamentArena, ci: usize, fils: &[usize]) {
        let params = &self.params;
        let slope = self.skew.slope;
        let cluster = &mut self.clusters[ci];
        let mut cluster_box: Option<Rect> = None;

        for &fil in fils {
            let fil = arena.ancestor(fil);
            if arena.cluster_of(fil).is_some() {
                continue;
            }
            let bx = *cluster_box.get_or_insert_with(|| {
                cluster
                    .bounds(arena)
                    .grown(params.max_merge_dx, params.cluster_y_margin)
            });
            let fb = arena.filament(fil).bounds();
            let mx = fb.x + fb.w / 2;
            let my = arena.filament(fil).position_at(mx as f64).round() as i32;
            if !bx.contains_point([mx, my]) {
                continue;
            }
            let points = cluster.points_at(arena, mx as f64, params.max_expand_dx, slope);
            for (index, point) in points.iter().enumerate() {
                let Some(point) = point else {
                    continue;
                };
                let dy = (my as f64 - point[1]).abs();
                if dy <= params.max_expand_dy
                    && cluster.include_filament_by_index(arena, fil, index, params.max_fore)
                {
                    debug!(
                        "Aggregated F{} to C{} at index {}",
                        arena.filament(fil).id.0,
                        cluster.id.0,
                        index
                    );
                    cluster_box = None;
                    break;
                }
            }
        }
    }

    /// Merges earlier clusters (by ordinate) into each cluster in turn,
    /// until none applies.
    fn merge_clusters(&mut self, arena: &mut FilamentArena) {
        self.sort_by_ordinate(arena);
        for ci in 0..self.clusters.len() {
            loop {
                let candidate_box = self.clusters[ci]
                    .bounds(arena)
                    .grown(self.params.max_merge_dx, self.params.cluster_y_margin);
                let mut merged = false;
                for hi in 0..ci {
                    let head = &self.clusters[hi];
                    if head.parent().is_some() || !head.bounds(arena).intersects(&candidate_box) {
                        continue;
                    }
                    if let Some(delta) = self.can_merge(arena, head, &self.clusters[ci]) {
                        let (head, candidate) = pair_mut(&mut self.clusters, hi, ci);
                        debug!("Merging C{} into C{} delta:{}", head.id.0, candidate.id.0, delta);
                        candidate.merge_with(arena, head, delta);
                        merged = true;
                        break;
                    }
                }
                if !merged {
                    break;
                }
            }
        }
        self.remove_merged_clusters();
        self.remove_merged_filaments(arena);
    }

    /// Line rank delta between two clusters that can merge.
    pub fn can_merge(
        &self,
        arena: &FilamentArena,
        one: &LineCluster,
        two: &LineCluster,
    ) -> Option<i32> {
        let (one_box, two_box) = (one.bounds(arena), two.bounds(arena));
        let (one_left, one_right) = (one_box.x, one_box.right() - 1);
        let (two_left, two_right) = (two_box.x, two_box.right() - 1);
        let min_right = one_right.min(two_right);
        let max_left = one_left.max(two_left);
        let gap = max_left - min_right;
        if gap > self.params.max_merge_dx {
            debug!("Gap {} too wide between C{} & C{}", gap, one.id.0, two.id.0);
            return None;
        }

        if gap <= 0 {
            let x_mid = ((max_left + min_right) / 2) as f64;
            let slope = self.skew.slope;
            let (dist, delta) = best_match(
                &self.ordinates_of(&one.points_at(arena, x_mid, self.params.max_expand_dx, slope)),
                &self.ordinates_of(&two.points_at(arena, x_mid, self.params.max_expand_dx, slope)),
            )?;
            return (dist <= self.params.max_merge_dy
                && self.check_collision(arena, one, two, delta))
            .then_some(delta);
        }

        let (dist, delta) = if one_left < two_left {
            best_match(
                &self.ordinates_of(&one.stops(arena)),
                &self.ordinates_of(&two.starts(arena)),
            )?
        } else {
            best_match(
                &self.ordinates_of(&one.starts(arena)),
                &self.ordinates_of(&two.stops(arena)),
            )?
        };
        debug!("canMerge dist: {:.2} C{} C{}", dist, one.id.0, two.id.0);
        (dist <= self.params.max_merge_dy).then_some(delta)
    }

    /// True when no common line of the two clusters would be thicker than a
    /// single staff line once merged.
    fn check_collision(
        &self,
        arena: &FilamentArena,
        one: &LineCluster,
        two: &LineCluster,
        delta: i32,
    ) -> bool {
        let one_lines: Vec<usize> = one.lines().collect();
        let two_lines: Vec<usize> = two.lines().collect();
        for (i1, &f1) in one_lines.iter().enumerate() {
            let i2 = i1 as i32 + delta;
            if i2 < 0 || i2 as usize >= two_lines.len() {
                continue;
            }
            let f2 = two_lines[i2 as usize];
            let (r1, r2) = (arena.filament(f1).bounds(), arena.filament(f2).bounds());
            let overlap = x_overlap(&r1, &r2);
            if overlap >= 0 {
                let mid = (r1.x.max(r2.x) + overlap / 2) as f64;
                let thickness = thickness_at(mid, arena.filament(f1), arena.filament(f2));
                if thickness > self.params.max_fore {
                    debug!(
                        "Cluster collision {:.1} between C{} & C{}",
                        thickness, one.id.0, two.id.0
                    );
                    return false;
                }
            }
        }
        true
    }

    fn trim_clusters(&mut self, arena: &mut FilamentArena) {
        self.sort_by_ordinate(arena);
        for cluster in &mut self.clusters {
            cluster.trim(arena, self.params.pop_size);
        }
    }

    fn destroy_non_standard_clusters(&mut self, arena: &mut FilamentArena) {
        let pop_size = self.params.pop_size;
        self.clusters.retain_mut(|cluster| {
            if cluster.size() == pop_size {
                return true;
            }
            debug!("Destroying non standard C{} ({} lines)", cluster.id.0, cluster.size());
            cluster.destroy(arena);
            false
        });
    }

    /// Merges clusters side by side or destroys short isolated ones.
    fn merge_cluster_pairs(&mut self, arena: &mut FilamentArena) {
        if self.clusters.is_empty() {
            return;
        }
        self.sort_by_ordinate(arena);
        let min_length = self.acceptable_length(arena);

        let mut idx = 0;
        'whole: while idx < self.clusters.len() {
            let cluster_box = self.clusters[idx].bounds(arena);
            let y_max = self.ordinate_of_cluster(arena, &self.clusters[idx])
                + self.params.max_merge_center_dy;

            for j in idx + 1..self.clusters.len() {
                if self.ordinate_of_cluster(arena, &self.clusters[j]) > y_max {
                    break;
                }
                if x_gap(&cluster_box, &self.clusters[j].bounds(arena)) > self.params.max_merge_dx {
                    continue;
                }
                let mut other = self.clusters.remove(j);
                info!("Pairing clusters C{} & C{}", self.clusters[idx].id.0, other.id.0);
                self.clusters[idx].merge_with(arena, &mut other, 0);
                continue 'whole;
            }

            if (self.clusters[idx].true_length(arena) as f64) < min_length {
                let mut spurious = self.clusters.remove(idx);
                info!("Destroying spurious C{}", spurious.id.0);
                spurious.destroy(arena);
            } else {
                idx += 1;
            }
        }
        self.remove_merged_filaments(arena);
    }

    fn acceptable_length(&self, arena: &FilamentArena) -> f64 {
        let mut lengths: Vec<i32> = self.clusters.iter().map(|c| c.true_length(arena)).collect();
        lengths.sort_unstable();
        let median = lengths[lengths.len() / 2];
        let min_length = median as f64 * self.params.min_cluster_length_ratio;
        debug!("medianLength: {} minLength: {:.1}", median, min_length);
        min_length
    }

    fn destroy_inconsistent_clusters(&mut self, arena: &mut FilamentArena) {
        let max_ratio = self.params.max_cluster_diff_length_ratio;
        self.clusters.retain_mut(|cluster| {
            let lengths: Vec<i32> = cluster.lines().map(|f| arena.filament(f).length()).collect();
            let (Some(&min), Some(&max)) = (lengths.iter().min(), lengths.iter().max()) else {
                return true;
            };
            let mean = (min + max) as f64 / 2.0;
            let ratio = (max - min) as f64 / mean;
            if ratio > max_ratio {
                info!("Destroying non-consistent C{} (ratio {:.2})", cluster.id.0, ratio);
                cluster.destroy(arena);
                return false;
            }
            true
        });
    }

    fn discard_non_clustered_filaments(&mut self, arena: &FilamentArena) {
        let discarded = &mut self.discarded;
        self.filaments.retain(|&f| {
            if !arena.is_merged(f) && arena.cluster_of(f).is_none() {
                discarded.push(f);
                return false;
            }
            true
        });
    }

    fn remove_merged_clusters(&mut self) {
        self.clusters.retain(|c| c.parent().is_none());
    }

    fn remove_merged_filaments(&mut self, arena: &FilamentArena) {
        self.filaments.retain(|&f| !arena.is_merged(f));
    }

    fn sort_by_ordinate(&mut self, arena: &FilamentArena) {
        let skew = self.skew;
        self.clusters.sort_by(|a, b| {
            cmp_f64(
                skew.deskewed(a.center(arena))[1],
                skew.deskewed(b.center(arena))[1],
            )
        });
    }

    fn ordinate_of_cluster(&self, arena: &FilamentArena, cluster: &LineCluster) -> f64 {
        self.skew.deskewed(cluster.center(arena))[1]
    }

    fn ordinates_of(&self, points: &[Option<[f64; 2]>]) -> Vec<Option<f64>> {
        points
            .iter()
            .map(|p| p.map(|p| self.skew.deskewed(p)[1]))
            .collect()
    }
}

/// Best alignment between two ordinate sequences, whose missing values are
/// ignored.
///
/// Returns the smallest mean absolute distance and the shift `delta` mapping
/// `one[i]` to `two[i + delta]`. Ties keep the lowest delta.
pub fn best_match(one: &[Option<f64>], two: &[Option<f64>]) -> Option<(f64, i32)> {
    if one.is_empty() {
        return None;
    }
    let delta_max = one.len() as i32 - 1;
    let mut best: Option<(f64, i32)> = None;
    for delta in -delta_max..=delta_max {
        let mut sum = 0.0;
        let mut count = 0;
        for (i, a) in one.iter().enumerate() {
            let j = i as i32 + delta;
            if j < 0 || j as usize >= two.len() {
                continue;
            }
            if let (Some(a), Some(b)) = (a, two[j as usize]) {
                sum += (b - a).abs();
                count += 1;
            }
        }
        if count > 0 {
            let dist = sum / count as f64;
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, delta));
            }
        }
    }
    best
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Two distinct mutable elements of a slice.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
