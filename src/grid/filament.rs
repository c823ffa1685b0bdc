//! Horizontal filaments and the arena that tracks their merges.
//!
//! A filament is a skeleton polyline (points sorted by abscissa) with a mean
//! thickness. Filaments never disappear: when one is absorbed by another its
//! record keeps an `ancestor` link, and [`FilamentArena::ancestor`] resolves
//! the surviving representative.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LinkError;
use crate::geometry::Rect;
use crate::grid::cluster::ClusterId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilamentId(pub u32);

/// Long horizontal run of foreground pixels, candidate staff line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filament {
    pub id: FilamentId,
    /// Skeleton points sorted by increasing abscissa.
    pub points: Vec<[f64; 2]>,
    /// Mean vertical thickness in pixels.
    pub thickness: f64,
}

impl Filament {
    pub fn new(
        id: FilamentId,
        mut points: Vec<[f64; 2]>,
        thickness: f64,
    ) -> Result<Self, LinkError> {
        if points.len() < 2 {
            return Err(LinkError::DegenerateFilament { id: id.0 });
        }
        points.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(Ordering::Equal));
        Ok(Self {
            id,
            points,
            thickness,
        })
    }

    pub fn start_point(&self) -> [f64; 2] {
        self.points[0]
    }

    pub fn stop_point(&self) -> [f64; 2] {
        self.points[self.points.len() - 1]
    }

    /// Number of pixel columns covered.
    pub fn length(&self) -> i32 {
        self.stop_point()[0].ceil() as i32 - self.start_point()[0].floor() as i32 + 1
    }

    pub fn bounds(&self) -> Rect {
        let x = self.start_point()[0].floor() as i32;
        let half = self.thickness * 0.5;
        let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            y0 = y0.min(p[1] - half);
            y1 = y1.max(p[1] + half);
        }
        let y = y0.floor() as i32;
        Rect::new(x, y, self.length(), (y1.ceil() as i32 - y).max(1))
    }

    /// Ordinate at abscissa `x`, interpolated between skeleton points and
    /// extrapolated from the end segments beyond them.
    pub fn position_at(&self, x: f64) -> f64 {
        let n = self.points.len();
        let (a, b) = if x <= self.points[0][0] {
            (self.points[0], self.points[1])
        } else if x >= self.points[n - 1][0] {
            (self.points[n - 2], self.points[n - 1])
        } else {
            let i = self.points.partition_point(|p| p[0] <= x);
            (self.points[i - 1], self.points[i])
        };
        let dx = b[0] - a[0];
        if dx.abs() < 1e-9 {
            return 0.5 * (a[1] + b[1]);
        }
        a[1] + (x - a[0]) * (b[1] - a[1]) / dx
    }

    /// Mean slope between the end points.
    pub fn slope(&self) -> f64 {
        let (a, b) = (self.start_point(), self.stop_point());
        let dx = b[0] - a[0];
        if dx.abs() < 1e-9 {
            0.0
        } else {
            (b[1] - a[1]) / dx
        }
    }

    pub fn centroid(&self) -> [f64; 2] {
        let mid = 0.5 * (self.start_point()[0] + self.stop_point()[0]);
        [mid, self.position_at(mid)]
    }

    /// Absorbs the skeleton of `other`; points closer than half a pixel in
    /// abscissa are averaged.
    fn absorb(&mut self, other: &Filament) {
        let (l1, l2) = (self.length() as f64, other.length() as f64);
        self.thickness = (self.thickness * l1 + other.thickness * l2) / (l1 + l2);
        let mut all: Vec<[f64; 2]> = self.points.iter().chain(&other.points).copied().collect();
        all.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(Ordering::Equal));
        let mut merged: Vec<[f64; 2]> = Vec::with_capacity(all.len());
        let mut group: Vec<[f64; 2]> = Vec::new();
        for p in all {
            if let Some(first) = group.first() {
                if p[0] - first[0] >= 0.5 {
                    merged.push(mean_point(&group));
                    group.clear();
                }
            }
            group.push(p);
        }
        if !group.is_empty() {
            merged.push(mean_point(&group));
        }
        if merged.len() >= 2 {
            self.points = merged;
        }
    }
}

fn mean_point(points: &[[f64; 2]]) -> [f64; 2] {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    [sx / n, sy / n]
}

/// Combined thickness of two filaments seen as one line at abscissa `x`.
pub fn thickness_at(x: f64, one: &Filament, two: &Filament) -> f64 {
    let dy = (one.position_at(x) - two.position_at(x)).abs();
    dy + 0.5 * (one.thickness + two.thickness)
}

#[derive(Clone, Debug)]
struct FilamentRecord {
    filament: Filament,
    ancestor: Option<usize>,
    /// Comb memberships, keyed by sampling column, valued by the comb rank
    /// within that column.
    combs: BTreeMap<usize, usize>,
    cluster: Option<ClusterId>,
}

/// Owner of every filament of a sheet, addressed by position.
#[derive(Clone, Debug, Default)]
pub struct FilamentArena {
    records: Vec<FilamentRecord>,
}

impl FilamentArena {
    pub fn new(filaments: Vec<Filament>) -> Self {
        let records = filaments
            .into_iter()
            .map(|filament| FilamentRecord {
                filament,
                ancestor: None,
                combs: BTreeMap::new(),
                cluster: None,
            })
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filament(&self, idx: usize) -> &Filament {
        &self.records[idx].filament
    }

    /// Surviving representative of `idx`.
    pub fn ancestor(&self, idx: usize) -> usize {
        let mut cur = idx;
        while let Some(next) = self.records[cur].ancestor {
            cur = next;
        }
        cur
    }

    pub fn is_merged(&self, idx: usize) -> bool {
        self.records[idx].ancestor.is_some()
    }

    pub fn cluster_of(&self, idx: usize) -> Option<ClusterId> {
        self.records[idx].cluster
    }

    pub(crate) fn set_cluster(&mut self, idx: usize, cluster: Option<ClusterId>) {
        self.records[idx].cluster = cluster;
    }

    pub(crate) fn add_comb(&mut self, idx: usize, col: usize, rank: usize) {
        self.records[idx].combs.entry(col).or_insert(rank);
    }

    /// Comb memberships `(column, rank)` in column order.
    pub fn combs(&self, idx: usize) -> Vec<(usize, usize)> {
        self.records[idx]
            .combs
            .iter()
            .map(|(&col, &rank)| (col, rank))
            .collect()
    }

    pub(crate) fn clear_combs(&mut self) {
        for rec in &mut self.records {
            rec.combs.clear();
        }
    }

    /// Merges filament `from` into `into`. Both must be representatives.
    pub(crate) fn include(&mut self, into: usize, from: usize) {
        debug_assert!(!self.is_merged(into) && !self.is_merged(from));
        if into == from {
            return;
        }
        let absorbed = self.records[from].filament.clone();
        let moved: Vec<(usize, usize)> = self.combs(from);
        let target = &mut self.records[into];
        target.filament.absorb(&absorbed);
        for (col, rank) in moved {
            target.combs.entry(col).or_insert(rank);
        }
        self.records[from].ancestor = Some(into);
        self.records[from].cluster = None;
    }

    /// Unites the representatives of `a` and `b`, the longer one surviving.
    pub(crate) fn connect_ancestors(&mut self, a: usize, b: usize) -> usize {
        let (ra, rb) = (self.ancestor(a), self.ancestor(b));
        if ra == rb {
            return ra;
        }
        if self.filament(ra).length() >= self.filament(rb).length() {
            self.include(ra, rb);
            ra
        } else {
            self.include(rb, ra);
            rb
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: u32, x0: f64, x1: f64, y: f64) -> Filament {
        Filament::new(FilamentId(id), vec![[x0, y], [x1, y]], 3.0).unwrap()
    }

    #[test]
    fn rejects_single_point() {
        let err = Filament::new(FilamentId(7), vec![[0.0, 0.0]], 2.0).unwrap_err();
        assert_eq!(err, LinkError::DegenerateFilament { id: 7 });
    }

    #[test]
    fn position_extrapolates_beyond_ends() {
        let f = Filament::new(FilamentId(0), vec![[10.0, 10.0], [20.0, 11.0]], 2.0).unwrap();
        assert!((f.position_at(15.0) - 10.5).abs() < 1e-9);
        assert!((f.position_at(30.0) - 12.0).abs() < 1e-9);
        assert!((f.position_at(0.0) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn longer_filament_survives_connection() {
        let mut arena =
            FilamentArena::new(vec![line(0, 0.0, 50.0, 10.0), line(1, 40.0, 200.0, 10.0)]);
        let root = arena.connect_ancestors(0, 1);
        assert_eq!(root, 1);
        assert_eq!(arena.ancestor(0), 1);
        assert!(arena.is_merged(0));
        assert_eq!(arena.filament(1).start_point()[0], 0.0);
        // Connecting again is a no-op.
        assert_eq!(arena.connect_ancestors(1, 0), 1);
    }

    #[test]
    fn combined_thickness_adds_offset() {
        let a = line(0, 0.0, 100.0, 10.0);
        let b = line(1, 0.0, 100.0, 12.0);
        assert!((thickness_at(50.0, &a, &b) - 5.0).abs() < 1e-9);
    }
}
