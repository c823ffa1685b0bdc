//! Clean-up once all stems of a system are linked.
//!
//! - Overlapping stems exclude each other.
//! - Stems too close on a same beam exclude each other.
//! - Stems on a good beam side get a grade boost.
//! - A head never keeps two exclusive stems.
//! - A head keeps at most two stems, and two only in the canonical shared
//!   configuration (see [`ShareChecker`]).
//! - Heads that need a stem but found none are removed.

use log::{debug, warn};

use crate::geometry::HorizontalSide;
use crate::sig::{
    is_canonical_share, BeamPortion, ExclusionCause, HeadStemRelation, InterClass, InterId,
    RelationId, RelationKind, Sig,
};

/// Inserts an overlap exclusion between every pair of stems whose boxes
/// intersect. Returns the number of pairs found.
pub fn perform_mutual_exclusions(sig: &mut Sig) -> usize {
    let mut stems: Vec<(InterId, crate::geometry::Rect)> = sig
        .inters(InterClass::Stem)
        .into_iter()
        .filter_map(|id| sig.inter(id).map(|inter| (id, inter.bounds)))
        .collect();
    let size = stems.len();
    if size < 2 {
        return 0;
    }
    stems.sort_by_key(|(id, b)| (b.x, *id));

    let mut count = 0;
    for i in 0..size - 1 {
        let (one, one_box) = stems[i];
        let x_break = one_box.right();
        for &(two, two_box) in &stems[i + 1..] {
            if one_box.intersects(&two_box) {
                sig.insert_exclusion(one, two, ExclusionCause::Overlap);
                count += 1;
            } else if two_box.x >= x_break {
                break;
            }
        }
    }
    debug!("stems: {} exclusions: {}", size, count);
    count
}

/// Beam-stem relations of `beam`, as (stem, extension abscissa, portion),
/// sorted by abscissa.
fn beam_stems(sig: &Sig, beam: InterId) -> Vec<(InterId, f64, BeamPortion)> {
    let mut rels: Vec<(InterId, f64, BeamPortion)> = sig
        .relations(beam, RelationKind::BeamStem)
        .into_iter()
        .filter_map(|e| {
            let rel = sig.edge(e)?.as_beam_stem()?;
            let stem = sig.opposite(e, beam)?;
            Some((stem, rel.extension_point[0], rel.portion))
        })
        .collect();
    rels.sort_by(|a, b| a.1.total_cmp(&b.1));
    rels
}

/// Stems attached to `beam` closer than `min_gap` pixels are mutually
/// exclusive. Returns the number of exclusions inserted.
pub fn check_beam_stems(sig: &mut Sig, beam: InterId, min_gap: i32) -> usize {
    let rels = beam_stems(sig, beam);
    let mut count = 0;
    for (i, &(stem, x, _)) in rels.iter().enumerate() {
        for &(other, other_x, _) in &rels[i + 1..] {
            if other_x - x >= min_gap as f64 {
                break;
            }
            if sig.insert_exclusion(stem, other, ExclusionCause::Incompatible).is_some() {
                count += 1;
            }
        }
    }
    count
}

/// Raises the grade of stems linked to a side of a good `beam`.
pub fn boost_beam_sides(sig: &mut Sig, beam: InterId, boost: f64) {
    if !sig.inter(beam).is_some_and(|b| b.is_good()) {
        return;
    }
    for (stem, _, portion) in beam_stems(sig, beam) {
        if portion == BeamPortion::Center {
            continue;
        }
        if let Some(inter) = sig.inter_mut(stem) {
            inter.increase(boost);
        }
    }
}

/// Reduces the stems of one head, ensemble by ensemble.
///
/// While more than two stems remain, the link with the largest significant
/// ordinate gap is cut, else the link to the weakest stem. Two remaining
/// stems must form the canonical share (tight links, left stem going down,
/// right stem going up); otherwise one more large-gap cut is tried, and if
/// none applies the configuration is left as is and reported ambiguous.
pub struct ShareChecker {
    head: InterId,
    y_gap_tiny: f64,
    rels: Vec<(RelationId, InterId, HeadStemRelation)>,
}

impl ShareChecker {
    pub fn new(head: InterId, y_gap_tiny: f64) -> Self {
        Self {
            head,
            y_gap_tiny,
            rels: Vec::new(),
        }
    }

    /// Checks one ensemble of compatible stems; returns `true` when an
    /// ambiguous pair is left in place.
    pub fn check(&mut self, sig: &mut Sig, stems: &[InterId]) -> bool {
        self.rels = stems
            .iter()
            .filter_map(|&stem| {
                let e = sig.relation(self.head, stem, RelationKind::HeadStem)?;
                let rel = sig.edge(e)?.as_head_stem()?.clone();
                Some((e, stem, rel))
            })
            .collect();

        while self.rels.len() > 2 {
            if !self.discard_large_gap(sig) {
                self.discard_weaker_stem(sig);
            }
        }

        if self.rels.len() == 2 && !self.is_canonical_share(sig) && !self.discard_large_gap(sig) {
            warn!(
                "head#{} could not decide between stems {:?}",
                self.head.index(),
                self.rels.iter().map(|(_, s, _)| s.index()).collect::<Vec<_>>()
            );
            return true;
        }
        false
    }

    /// Cuts the link with the largest gap above the tiny gap, if any.
    fn discard_large_gap(&mut self, sig: &mut Sig) -> bool {
        let mut worst: Option<(usize, f64)> = None;
        for (i, (_, _, rel)) in self.rels.iter().enumerate() {
            if rel.dy() > worst.map_or(0.0, |(_, gap)| gap) {
                worst = Some((i, rel.dy()));
            }
        }
        match worst {
            Some((i, gap)) if gap > self.y_gap_tiny => {
                let (e, stem, _) = self.rels.remove(i);
                debug!(
                    "head#{} discarding gap {:.3} to stem#{}",
                    self.head.index(),
                    gap,
                    stem.index()
                );
                sig.remove_edge(e);
                true
            }
            _ => false,
        }
    }

    /// Cuts the link to the stem of lowest intrinsic grade.
    fn discard_weaker_stem(&mut self, sig: &mut Sig) {
        let mut worst: Option<(usize, f64)> = None;
        for (i, (_, stem, _)) in self.rels.iter().enumerate() {
            let grade = sig.inter(*stem).map_or(0.0, |s| s.grade());
            if worst.map_or(true, |(_, g)| grade < g) {
                worst = Some((i, grade));
            }
        }
        let Some((i, _)) = worst else {
            return;
        };
        let (e, stem, rel) = self.rels.remove(i);
        debug!("head#{} discarding weaker stem#{}", self.head.index(), stem.index());
        sig.remove_edge(e);
        if rel.is_invading() {
            sig.insert_exclusion(self.head, stem, ExclusionCause::Overlap);
        }
    }

    fn is_canonical_share(&self, sig: &Sig) -> bool {
        let mut left = None;
        let mut right = None;
        for (_, stem, rel) in &self.rels {
            if rel.dy() > self.y_gap_tiny {
                return false;
            }
            match rel.head_side {
                HorizontalSide::Left => left = Some(*stem),
                HorizontalSide::Right => right = Some(*stem),
            }
        }
        let (Some(left), Some(right)) = (left, right) else {
            return false;
        };
        match (
            sig.inter(left).and_then(|i| i.as_stem()),
            sig.inter(self.head),
            sig.inter(right).and_then(|i| i.as_stem()),
        ) {
            (Some(l), Some(head), Some(r)) => is_canonical_share(l, &head.bounds, r),
            _ => false,
        }
    }
}

/// Cuts the links of `head` to stems that exclude a better linked stem.
///
/// Stems are visited by decreasing grade, then decreasing link grade, then
/// index; a stem exclusive with one already kept loses its link. Returns the
/// number of links cut.
pub fn drop_exclusive_links(sig: &mut Sig, head: InterId) -> usize {
    let mut links: Vec<(RelationId, InterId, f64, f64)> = sig
        .relations(head, RelationKind::HeadStem)
        .into_iter()
        .filter_map(|e| {
            let stem = sig.opposite(e, head)?;
            let grade = sig.inter(stem)?.grade();
            let link_grade = sig.edge(e)?.as_head_stem()?.grade;
            Some((e, stem, grade, link_grade))
        })
        .collect();
    links.sort_by(|a, b| {
        b.2.total_cmp(&a.2)
            .then(b.3.total_cmp(&a.3))
            .then(a.1.cmp(&b.1))
    });

    let mut kept: Vec<InterId> = Vec::new();
    let mut cut = 0;
    for (e, stem, _, _) in links {
        if let Some(&other) = kept.iter().find(|&&k| sig.are_exclusive(k, stem)) {
            debug!(
                "head#{} dropping stem#{} exclusive with stem#{}",
                head.index(),
                stem.index(),
                other.index()
            );
            sig.remove_edge(e);
            cut += 1;
        } else {
            kept.push(stem);
        }
    }
    cut
}

/// Runs the [`ShareChecker`] on every compatible ensemble of stems linked to
/// `head`, once exclusive links are dropped. Returns `true` when an
/// ambiguity was left.
pub fn check_head_stems(sig: &mut Sig, head: InterId, y_gap_tiny: f64) -> bool {
    drop_exclusive_links(sig, head);
    let stems: Vec<InterId> = sig
        .relations(head, RelationKind::HeadStem)
        .into_iter()
        .filter_map(|e| sig.opposite(e, head))
        .collect();
    let mut checker = ShareChecker::new(head, y_gap_tiny);
    let mut ambiguous = false;
    for ensemble in sig.partitions(&stems) {
        if ensemble.len() > 1 {
            ambiguous |= checker.check(sig, &ensemble);
        }
    }
    ambiguous
}

/// Removes the heads that need a stem and have none. Returns the removed
/// heads.
pub fn check_needed_stems(sig: &mut Sig, heads: &[InterId]) -> Vec<InterId> {
    let mut removed = Vec::new();
    for &head in heads {
        let needs = sig
            .inter(head)
            .and_then(|i| i.as_head())
            .is_some_and(|h| h.shape.needs_stem());
        if needs && !sig.has_relation(head, RelationKind::HeadStem) {
            debug!("head#{} has no stem, removed", head.index());
            sig.remove_vertex(head);
            removed.push(head);
        }
    }
    removed
}
