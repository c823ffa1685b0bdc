mod common;

use common::synthetic_page::{builder, init_logging, SystemSketch};
use omr_linker::geometry::{HorizontalSide, Rect};
use omr_linker::sig::{HeadShape, InterClass, InterId, RelationKind, Sig};

fn stems_of(sig: &Sig, head: InterId) -> Vec<InterId> {
    sig.relations(head, RelationKind::HeadStem)
        .into_iter()
        .filter_map(|e| sig.opposite(e, head))
        .collect()
}

#[test]
fn clean_seed_above_head_gives_one_stem() {
    init_logging();
    // Reference point of the top right corner is (120, 206); the seed is
    // three times the minimum extension.
    let (mut system, ids) = SystemSketch::new(0).seed(118, 158, 48).head(100, 200).build();
    let report = builder().link_stems(&mut system);

    assert_eq!(report.stems_created, 1);
    assert_eq!(report.head_stem_links, 1);
    assert_eq!(system.sig.inters(InterClass::Stem).len(), 1);

    let head = ids.heads[0];
    let rels = system.sig.relations(head, RelationKind::HeadStem);
    assert_eq!(rels.len(), 1);
    let rel = system.sig.edge(rels[0]).and_then(|r| r.as_head_stem()).unwrap();
    assert!(rel.y_gap < 0.1, "y_gap={}", rel.y_gap);
    assert_eq!(rel.head_side, HorizontalSide::Right);
}

#[test]
fn distal_seed_beyond_large_gap_is_ignored() {
    init_logging();
    // 20 px of white between both seeds, twice the maximum gap.
    let (mut system, _) = SystemSketch::new(0)
        .seed(118, 170, 36)
        .seed(118, 100, 50)
        .head(100, 200)
        .build();
    let report = builder().link_stems(&mut system);

    assert_eq!(report.stems_created, 1);
    let stems = system.sig.inters(InterClass::Stem);
    let stem = system.sig.inter(stems[0]).unwrap();
    assert_eq!(stem.bounds, Rect::new(118, 170, 3, 36));
}

#[test]
fn chord_heads_share_one_stem() {
    init_logging();
    let (mut system, ids) = SystemSketch::new(0)
        .seed(118, 120, 86)
        .head(100, 200)
        .head(100, 180)
        .build();
    let report = builder().link_stems(&mut system);

    assert_eq!(report.stems_created, 1);
    assert_eq!(report.head_stem_links, 2);
    assert!(report.ambiguous_heads.is_empty());
    assert!(report.removed_heads.is_empty());
    let low = stems_of(&system.sig, ids.heads[0]);
    let high = stems_of(&system.sig, ids.heads[1]);
    assert_eq!(low.len(), 1);
    assert_eq!(low, high);
}

#[test]
fn canonical_share_keeps_both_stems() {
    init_logging();
    // Left stem going down, right stem going up.
    let (mut system, ids) = SystemSketch::new(0)
        .seed(118, 120, 86)
        .seed(99, 209, 72)
        .head(100, 200)
        .build();
    let report = builder().link_stems(&mut system);

    let head = ids.heads[0];
    assert_eq!(stems_of(&system.sig, head).len(), 2);
    assert!(report.ambiguous_heads.is_empty());

    let sig = &system.sig;
    let side_stem = |side: HorizontalSide| {
        sig.relations(head, RelationKind::HeadStem)
            .into_iter()
            .find(|&e| {
                sig.edge(e)
                    .and_then(|r| r.as_head_stem())
                    .is_some_and(|r| r.head_side == side)
            })
            .and_then(|e| sig.opposite(e, head))
            .and_then(|s| sig.inter(s))
            .and_then(|s| s.as_stem())
            .cloned()
            .unwrap()
    };
    let head_box = sig.inter(head).unwrap().bounds;
    assert!(omr_linker::sig::is_canonical_share(
        &side_stem(HorizontalSide::Left),
        &head_box,
        &side_stem(HorizontalSide::Right)
    ));
}

#[test]
fn two_stems_going_up_are_flagged() {
    init_logging();
    let (mut system, ids) = SystemSketch::new(0)
        .seed(118, 130, 76)
        .seed(99, 130, 76)
        .head(100, 200)
        .build();
    let report = builder().link_stems(&mut system);

    assert_eq!(report.ambiguous_heads, vec![ids.heads[0].index()]);
    assert_eq!(stems_of(&system.sig, ids.heads[0]).len(), 2);
}

#[test]
fn head_without_candidates_is_removed() {
    init_logging();
    let (mut system, ids) = SystemSketch::new(0)
        .head(100, 200)
        .shaped_head(HeadShape::WholeNote, Rect::new(300, 200, 24, 16))
        .build();
    let report = builder().link_stems(&mut system);

    assert_eq!(report.removed_heads, vec![ids.heads[0].index()]);
    assert!(!system.sig.contains(ids.heads[0]));
    // Whole notes need no stem.
    assert!(system.sig.contains(ids.heads[1]));
}

#[test]
fn beamed_stem_reaches_the_beam() {
    init_logging();
    let (mut system, ids) = SystemSketch::new(0)
        .seed(118, 104, 102)
        .head(100, 200)
        .beam(60.0, 200.0, 104.0)
        .build();
    let report = builder().link_stems(&mut system);

    assert_eq!(report.beam_stem_links, 1);
    let stem = stems_of(&system.sig, ids.heads[0])[0];
    let e = system.sig.relation(ids.beams[0], stem, RelationKind::BeamStem).unwrap();
    let rel = system.sig.edge(e).and_then(|r| r.as_beam_stem()).unwrap();
    assert_eq!(rel.y_gap, 0.0);
}

#[test]
fn chunks_without_seed_build_a_stem() {
    init_logging();
    let (mut system, ids) = SystemSketch::new(0).chunk(118, 150, 56).head(100, 200).build();
    let report = builder().link_stems(&mut system);

    assert_eq!(report.stems_created, 1);
    assert_eq!(stems_of(&system.sig, ids.heads[0]).len(), 1);
}
