use super::*;
use crate::geometry::Skew;
use crate::scale::{InterlineScale, Scale};

fn line(id: u32, x0: f64, x1: f64, y: f64) -> Filament {
    Filament::new(FilamentId(id), vec![[x0, y], [x1, y]], 2.0).unwrap()
}

fn retriever(width: i32) -> ClustersRetriever {
    let scale = Scale::new(20.0).unwrap();
    ClustersRetriever::new(
        &scale,
        InterlineScale::uniform(20),
        Skew::default(),
        width,
        &ClusterOptions::default(),
    )
}

#[test]
fn best_match_prefers_lowest_delta_on_ties() {
    let one = [Some(0.0), Some(0.0)];
    let two = [Some(0.0), Some(0.0)];
    assert_eq!(best_match(&one, &two), Some((0.0, -1)));
}

#[test]
fn best_match_finds_line_shift() {
    let one: Vec<Option<f64>> = [10.0, 20.0, 30.0, 40.0, 50.0].map(Some).to_vec();
    let two: Vec<Option<f64>> = [30.0, 40.0, 50.0, 60.0, 70.0].map(Some).to_vec();
    let (dist, delta) = best_match(&one, &two).unwrap();
    assert_eq!(delta, -2);
    assert!(dist < 1e-9);
}

#[test]
fn best_match_ignores_missing_values() {
    assert_eq!(best_match(&[None, None], &[Some(1.0)]), None);
    assert_eq!(best_match(&[], &[Some(1.0)]), None);
    let one = [None, Some(12.0)];
    let two = [Some(3.0), Some(11.0)];
    assert_eq!(best_match(&one, &two), Some((1.0, 0)));
}

#[test]
fn staff_split_by_gap_is_merged_back() {
    let mut fils = Vec::new();
    for i in 0..5 {
        let y = 100.0 + 20.0 * i as f64;
        fils.push(line(i, 0.0, 190.0, y));
        fils.push(line(10 + i, 210.0, 399.0, y));
    }
    fils.push(line(99, 100.0, 150.0, 400.0));
    let mut arena = FilamentArena::new(fils);
    let all: Vec<usize> = (0..arena.len()).collect();

    let mut retriever = retriever(400);
    let report = retriever.build_info(&mut arena, all, true);

    assert_eq!(report.clusters.len(), 1);
    let staff = &report.clusters[0];
    assert_eq!(staff.lines.len(), 5);
    for l in &staff.lines {
        assert_eq!(l.start_point()[0], 0.0);
        assert_eq!(l.stop_point()[0], 399.0);
    }
    assert_eq!(report.discarded, vec![FilamentId(99)]);
    assert!(report.comb_count > 0);
}

#[test]
fn extra_line_is_trimmed_to_popular_size() {
    // Six evenly spaced lines, the top one shorter.
    let mut fils = vec![line(0, 40.0, 380.0, 80.0)];
    for i in 1..6 {
        fils.push(line(i, 0.0, 399.0, 80.0 + 20.0 * i as f64));
    }
    let mut arena = FilamentArena::new(fils);
    let all: Vec<usize> = (0..arena.len()).collect();

    let mut retriever = retriever(400);
    let report = retriever.build_info(&mut arena, all, false);

    assert_eq!(report.clusters.len(), 1);
    let ids: Vec<FilamentId> = report.clusters[0].lines.iter().map(|l| l.id).collect();
    assert_eq!(ids, (1..6).map(FilamentId).collect::<Vec<_>>());
    assert_eq!(report.discarded, vec![FilamentId(0)]);
}

#[test]
fn staff_with_inconsistent_lengths_is_destroyed() {
    let mut fils = Vec::new();
    for i in 0..5 {
        let x1 = if i == 2 { 120.0 } else { 399.0 };
        fils.push(line(i, 0.0, x1, 100.0 + 20.0 * i as f64));
    }
    let mut arena = FilamentArena::new(fils);
    let all: Vec<usize> = (0..arena.len()).collect();

    let report = retriever(400).build_info(&mut arena, all, true);
    assert!(report.clusters.is_empty());
    assert_eq!(report.discarded.len(), 5);
}
