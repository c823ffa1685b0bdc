//! Line clusters: the lines of one staff, indexed by relative position.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::comb::CombNetwork;
use super::filament::{thickness_at, FilamentArena};
use crate::geometry::{x_overlap, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub u32);

/// Ordered group of filaments, one per staff line.
///
/// Positions are relative integers; only their order matters, gaps are
/// allowed while the cluster is being built.
#[derive(Clone, Debug)]
pub struct LineCluster {
    pub id: ClusterId,
    lines: BTreeMap<i32, usize>,
    parent: Option<ClusterId>,
}

impl LineCluster {
    /// Grows a cluster from `seed` by following its combs transitively.
    pub fn new(
        id: ClusterId,
        arena: &mut FilamentArena,
        network: &CombNetwork,
        seed: usize,
    ) -> Self {
        let mut lines: BTreeMap<i32, usize> = BTreeMap::new();
        let mut stack = vec![(seed, 0_i32)];
        while let Some((pivot, pos)) = stack.pop() {
            if arena.cluster_of(pivot).is_some() || lines.contains_key(&pos) {
                continue;
            }
            lines.insert(pos, pivot);
            arena.set_cluster(pivot, Some(id));

            for (col, rank) in arena.combs(pivot) {
                let Some(comb) = network.comb(col, rank) else {
                    continue;
                };
                let Some(pivot_index) = comb.index_of_ancestor(arena, pivot) else {
                    continue;
                };
                for (index, &member) in comb.members.iter().enumerate() {
                    let fil = arena.ancestor(member);
                    if fil == pivot || arena.cluster_of(fil).is_some() {
                        continue;
                    }
                    let p = pos + index as i32 - pivot_index as i32;
                    stack.push((fil, p));
                }
            }
        }
        Self {
            id,
            lines,
            parent: None,
        }
    }

    pub fn size(&self) -> usize {
        self.lines.len()
    }

    pub fn parent(&self) -> Option<ClusterId> {
        self.parent
    }

    /// Member filaments, top to bottom.
    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.values().copied()
    }

    fn first_pos(&self) -> i32 {
        self.lines.keys().next().copied().unwrap_or(0)
    }

    pub fn bounds(&self, arena: &FilamentArena) -> Rect {
        self.lines()
            .map(|f| arena.filament(f).bounds())
            .fold(Rect::default(), |acc, r| acc.union(&r))
    }

    pub fn center(&self, arena: &FilamentArena) -> [f64; 2] {
        self.bounds(arena).center()
    }

    /// Mean length of member lines.
    pub fn true_length(&self, arena: &FilamentArena) -> i32 {
        if self.lines.is_empty() {
            return 0;
        }
        let sum: i64 = self.lines().map(|f| arena.filament(f).length() as i64).sum();
        (sum / self.lines.len() as i64) as i32
    }

    /// Point of each line at abscissa `x`. Beyond a line end the position is
    /// extrapolated with `slope` up to `max_dx`, otherwise it is unknown.
    pub fn points_at(
        &self,
        arena: &FilamentArena,
        x: f64,
        max_dx: f64,
        slope: f64,
    ) -> Vec<Option<[f64; 2]>> {
        self.lines()
            .map(|f| {
                let fil = arena.filament(f);
                let (start, stop) = (fil.start_point(), fil.stop_point());
                if x < start[0] {
                    (start[0] - x <= max_dx).then(|| [x, start[1] + (x - start[0]) * slope])
                } else if x > stop[0] {
                    (x - stop[0] <= max_dx).then(|| [x, stop[1] + (x - stop[0]) * slope])
                } else {
                    Some([x, fil.position_at(x)])
                }
            })
            .collect()
    }

    pub fn starts(&self, arena: &FilamentArena) -> Vec<Option<[f64; 2]>> {
        self.lines()
            .map(|f| Some(arena.filament(f).start_point()))
            .collect()
    }

    pub fn stops(&self, arena: &FilamentArena) -> Vec<Option<[f64; 2]>> {
        self.lines()
            .map(|f| Some(arena.filament(f).stop_point()))
            .collect()
    }

    /// Merges filament `fil` into the line at `index`, unless the combined
    /// stroke would be thicker than `max_fore`.
    pub fn include_filament_by_index(
        &mut self,
        arena: &mut FilamentArena,
        fil: usize,
        index: usize,
        max_fore: f64,
    ) -> bool {
        let Some(line) = self.lines.values().nth(index).copied() else {
            return false;
        };
        let (lb, fb) = (arena.filament(line).bounds(), arena.filament(fil).bounds());
        let overlap = x_overlap(&lb, &fb);
        if overlap >= 0 {
            let mid = (lb.x.max(fb.x) + overlap / 2) as f64;
            if thickness_at(mid, arena.filament(line), arena.filament(fil)) > max_fore {
                return false;
            }
        }
        arena.include(line, fil);
        true
    }

    /// Absorbs `other`, whose line `i` lands at rank `i + delta` of this
    /// cluster.
    pub fn merge_with(&mut self, arena: &mut FilamentArena, other: &mut LineCluster, delta: i32) {
        let first = self.first_pos();
        let others: Vec<usize> = other.lines().collect();
        for (i, fil) in others.into_iter().enumerate() {
            let pos = first + i as i32 + delta;
            match self.lines.get(&pos).copied() {
                Some(line) if line != fil => {
                    let (line, fil) = (arena.ancestor(line), arena.ancestor(fil));
                    if line != fil {
                        arena.include(line, fil);
                    }
                }
                Some(_) => {}
                None => {
                    self.lines.insert(pos, fil);
                    arena.set_cluster(fil, Some(self.id));
                }
            }
        }
        other.lines.clear();
        other.parent = Some(self.id);
    }

    /// Removes the shorter extreme line until at most `pop_size` remain.
    pub fn trim(&mut self, arena: &mut FilamentArena, pop_size: usize) {
        while self.lines.len() > pop_size {
            let (Some((&first_pos, &first)), Some((&last_pos, &last))) =
                (self.lines.first_key_value(), self.lines.last_key_value())
            else {
                break;
            };
            let (pos, fil) = if arena.filament(first).length() < arena.filament(last).length() {
                (first_pos, first)
            } else {
                (last_pos, last)
            };
            self.lines.remove(&pos);
            arena.set_cluster(fil, None);
        }
    }

    /// Releases every member filament.
    pub fn destroy(&mut self, arena: &mut FilamentArena) {
        for fil in self.lines() {
            arena.set_cluster(fil, None);
        }
        self.lines.clear();
    }
}
