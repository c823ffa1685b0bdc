//! Vertical sampling of filaments into combs.
//!
//! The picture width is sampled at regular abscissae. At each column the
//! filaments crossing it are sorted by ordinate and every run of consecutive
//! filaments separated by an interline-like gap becomes a [`Comb`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use super::filament::FilamentArena;

/// Filaments captured at one sampling column, separated by interline gaps.
#[derive(Clone, Debug, Serialize)]
pub struct Comb {
    /// Sampling column index (1-based).
    pub col: usize,
    /// Abscissa of the column.
    pub x: i32,
    /// Arena indices of the members, top to bottom.
    pub members: Vec<usize>,
    /// Member ordinates at `x`.
    pub ys: Vec<f64>,
}

impl Comb {
    fn new(col: usize, x: i32) -> Self {
        Self {
            col,
            x,
            members: Vec::new(),
            ys: Vec::new(),
        }
    }

    fn append(&mut self, filament: usize, y: f64) {
        self.members.push(filament);
        self.ys.push(y);
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Rank of the member currently represented by `ancestor`.
    pub fn index_of_ancestor(&self, arena: &FilamentArena, ancestor: usize) -> Option<usize> {
        self.members
            .iter()
            .position(|&m| arena.ancestor(m) == ancestor)
    }
}

/// Pixel bounds for comb detection.
#[derive(Clone, Copy, Debug)]
pub struct CombParams {
    /// Typical abscissa step between two samplings.
    pub sampling_dx: i32,
    /// Minimum accepted gap between consecutive lines.
    pub d_min: i32,
    /// Maximum accepted gap between consecutive lines.
    pub d_max: i32,
}

/// All combs of a sheet, per sampling column.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CombNetwork {
    pub col_combs: BTreeMap<usize, Vec<Comb>>,
    /// Exact abscissa per column, index 0 unused.
    pub col_x: Vec<i32>,
}

impl CombNetwork {
    pub fn comb(&self, col: usize, rank: usize) -> Option<&Comb> {
        self.col_combs.get(&col).and_then(|list| list.get(rank))
    }

    pub fn comb_count(&self) -> usize {
        self.col_combs.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comb> {
        self.col_combs.values().flatten()
    }
}

/// Samples `filaments` across `width` and registers comb memberships in the
/// arena.
pub fn detect_combs(
    arena: &mut FilamentArena,
    filaments: &[usize],
    width: i32,
    params: &CombParams,
) -> CombNetwork {
    let mut network = CombNetwork::default();
    if params.sampling_dx <= 0 || width <= 0 {
        return network;
    }
    let sample_count =
        ((width as f64 / params.sampling_dx as f64).round() as i64 - 1).max(0) as usize;
    network.col_x = vec![0; sample_count + 1];
    let step = width as f64 / (sample_count + 1) as f64;

    for col in 1..=sample_count {
        let x = (step * col as f64).round() as i32;
        network.col_x[col] = x;

        let filys = filaments_at_x(arena, filaments, x as f64);
        let mut combs: Vec<Comb> = Vec::new();
        let mut active = false;
        for pair in filys.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            let dy = (cur.1 - prev.1).round() as i32;
            if dy >= params.d_min && dy <= params.d_max {
                if !active {
                    let mut comb = Comb::new(col, x);
                    comb.append(prev.0, prev.1);
                    combs.push(comb);
                    active = true;
                }
                if let Some(comb) = combs.last_mut() {
                    comb.append(cur.0, cur.1);
                }
            } else {
                active = false;
            }
        }

        for (rank, comb) in combs.iter().enumerate() {
            for &member in &comb.members {
                arena.add_comb(member, col, rank);
            }
        }
        network.col_combs.insert(col, combs);
    }

    debug!(
        "Combs: {} over {} columns (dy in [{}, {}])",
        network.comb_count(),
        sample_count,
        params.d_min,
        params.d_max
    );
    network
}

/// Filaments crossing abscissa `x`, with their ordinate there, sorted by y.
fn filaments_at_x(arena: &FilamentArena, filaments: &[usize], x: f64) -> Vec<(usize, f64)> {
    let mut list: Vec<(usize, f64)> = filaments
        .iter()
        .filter_map(|&idx| {
            let fil = arena.filament(idx);
            (x >= fil.start_point()[0] && x <= fil.stop_point()[0])
                .then(|| (idx, fil.position_at(x)))
        })
        .collect();
    list.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::filament::{Filament, FilamentId};

    fn staff(y0: f64, gap: f64, x0: f64, x1: f64, first_id: u32) -> Vec<Filament> {
        (0..5)
            .map(|i| {
                let y = y0 + gap * i as f64;
                Filament::new(FilamentId(first_id + i), vec![[x0, y], [x1, y]], 2.0).unwrap()
            })
            .collect()
    }

    #[test]
    fn comb_gaps_stay_within_bounds() {
        let mut fils = staff(100.0, 20.0, 0.0, 399.0, 0);
        // Stray line too far below the staff.
        fils.push(Filament::new(FilamentId(9), vec![[0.0, 230.0], [399.0, 230.0]], 2.0).unwrap());
        // Narrower staff with a wider interline further down.
        fils.extend(staff(300.0, 21.0, 50.0, 350.0, 10));
        let mut arena = FilamentArena::new(fils);
        let all: Vec<usize> = (0..arena.len()).collect();
        let params = CombParams {
            sampling_dx: 20,
            d_min: 18,
            d_max: 22,
        };
        let network = detect_combs(&mut arena, &all, 400, &params);
        assert_eq!(network.col_x.len(), 20);
        assert!(network.comb_count() > 0);
        for comb in network.iter() {
            assert!(comb.count() >= 2);
            for pair in comb.ys.windows(2) {
                let dy = (pair[1] - pair[0]).round() as i32;
                assert!(dy >= params.d_min && dy <= params.d_max, "dy={dy}");
            }
            assert!(!comb.members.contains(&5));
        }
        // The first staff is seen whole at every column.
        let first = network.comb(1, 0).unwrap();
        assert_eq!(first.members, vec![0, 1, 2, 3, 4]);
        assert!(!arena.combs(0).is_empty());
        assert!(arena.combs(5).is_empty());
    }

    #[test]
    fn zero_step_yields_no_columns() {
        let mut arena = FilamentArena::new(staff(0.0, 10.0, 0.0, 100.0, 0));
        let params = CombParams {
            sampling_dx: 0,
            d_min: 9,
            d_max: 11,
        };
        let network = detect_combs(&mut arena, &[0, 1, 2, 3, 4], 100, &params);
        assert_eq!(network.comb_count(), 0);
    }
}
