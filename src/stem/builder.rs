//! Stem linking driver for one system.
//!
//! Phase 1 searches the four corners of every head for stem hypotheses,
//! creates the stem interpretations and links them to the head and to the
//! beams found on the way. Phase 2 lets every head reuse the stems created
//! by its neighbours. Conflicts are then resolved globally (see
//! [`conflicts`](super::conflicts)).

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info, warn};
use serde::Serialize;

use super::assembler::{
    beam_stem_relation, crossing, link_corner, lookup_beam_groups, reuse_corner, CornerPlan,
};
use super::checker::{StemChecker, VerticalsChecker};
use super::conflicts::{
    boost_beam_sides, check_beam_stems, check_head_stems, check_needed_stems,
    perform_mutual_exclusions,
};
use super::corner::Corner;
use super::lookup::{BeamRef, CornerLookup, HeadRef, StemRef, SystemContext};
use super::options::{ConnectionOptions, LinkOptions, StemParams};
use crate::diagnostics::{elapsed_ms, TimingBreakdown};
use crate::error::LinkError;
use crate::geometry::Skew;
use crate::glyph::GlyphId;
use crate::scale::Scale;
use crate::sig::{BeamStemRelation, Inter, InterClass, InterId, Relation, RelationKind, Sig};
use crate::system::SystemInfo;

/// Outcome of stem linking on one system.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StemsReport {
    pub system_id: usize,
    /// Heads processed.
    pub heads: usize,
    pub stems_created: usize,
    /// Head-stem relations left in the graph.
    pub head_stem_links: usize,
    /// Beam-stem relations left in the graph.
    pub beam_stem_links: usize,
    /// Exclusions inserted between stems.
    pub exclusions: usize,
    /// Heads left with two stems not in the canonical shared configuration.
    pub ambiguous_heads: Vec<usize>,
    /// Heads removed for lack of a stem.
    pub removed_heads: Vec<usize>,
    /// Heads skipped on error.
    pub skipped_heads: usize,
    pub timing: TimingBreakdown,
}

/// Builds stems for the heads of a system.
pub struct StemsBuilder {
    scale: Scale,
    skew: Skew,
    params: StemParams,
    connections: ConnectionOptions,
    checker: Box<dyn StemChecker>,
}

impl StemsBuilder {
    pub fn new(scale: &Scale, skew: Skew, options: &LinkOptions) -> Self {
        Self {
            scale: scale.clone(),
            skew,
            params: StemParams::resolve(&options.stem, &options.connections, scale),
            connections: options.connections.clone(),
            checker: Box::new(VerticalsChecker::new(scale, &skew, options.checker.clone())),
        }
    }

    /// Replaces the default [`VerticalsChecker`].
    pub fn with_checker(mut self, checker: Box<dyn StemChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn params(&self) -> &StemParams {
        &self.params
    }

    /// Links stems to the heads and beams of `system`.
    pub fn link_stems(&self, system: &mut SystemInfo) -> StemsReport {
        let t_total = Instant::now();
        let mut timing = TimingBreakdown::default();
        let mut t = Instant::now();

        let heads = collect_heads(&system.sig);
        let beams = collect_beams(&system.sig);
        let mut stems_by_glyph: HashMap<GlyphId, InterId> = system
            .sig
            .inters(InterClass::Stem)
            .into_iter()
            .filter_map(|id| system.sig.inter(id)?.glyph.map(|g| (g, id)))
            .collect();
        t = timing.lap("collections", t);

        // Phase 1: look for stems around each head.
        let mut created: Vec<InterId> = Vec::new();
        let mut skipped: Vec<InterId> = Vec::new();
        for head in &heads {
            let plans: Result<Vec<CornerPlan>, LinkError> = {
                let ctx = self.context(system, &beams);
                Corner::ALL
                    .iter()
                    .map(|&corner| link_corner(head, corner, &ctx))
                    .collect()
            };
            match plans {
                Ok(plans) => {
                    for plan in plans {
                        self.apply_plan(system, head, plan, &mut stems_by_glyph, &mut created);
                    }
                }
                Err(err) => {
                    warn!("System#{} skipping head#{}: {err}", system.id, head.id.index());
                    skipped.push(head.id);
                }
            }
        }
        t = timing.lap("phase1", t);

        // Phase 2: reuse the stems created by other heads.
        let mut stems: Vec<StemRef> = created
            .iter()
            .filter_map(|&id| {
                let inter = system.sig.inter(id)?;
                Some(StemRef {
                    id,
                    bounds: inter.bounds,
                    glyph: inter.glyph?,
                })
            })
            .collect();
        stems.sort_by_key(|s| (s.bounds.x, s.id));
        for head in heads.iter().filter(|h| !skipped.contains(&h.id)) {
            let found: Result<Vec<_>, LinkError> = {
                let ctx = self.context(system, &beams);
                Corner::ALL
                    .iter()
                    .map(|&corner| reuse_corner(head, corner, &ctx, &stems))
                    .collect()
            };
            let Ok(found) = found else {
                continue;
            };
            for (stem, rel) in found.into_iter().flatten() {
                if system.sig.relation(head.id, stem, RelationKind::HeadStem).is_none() {
                    debug!("head#{} reusing stem#{}", head.id.index(), stem.index());
                    system.sig.add_edge(head.id, stem, Relation::HeadStem(rel));
                }
            }
        }
        t = timing.lap("phase2", t);

        let sig = &mut system.sig;
        let mut exclusions = perform_mutual_exclusions(sig);
        t = timing.lap("stemExclusions", t);

        for beam in sig.inters(InterClass::Beam) {
            exclusions += check_beam_stems(sig, beam, self.params.min_beam_stems_gap);
            boost_beam_sides(sig, beam, self.params.side_stem_boost);
        }
        t = timing.lap("beamStems", t);

        let mut ambiguous_heads = Vec::new();
        for head in &heads {
            if sig.contains(head.id) && check_head_stems(sig, head.id, self.params.y_gap_tiny) {
                ambiguous_heads.push(head.id.index());
            }
        }
        t = timing.lap("headStems", t);

        let head_ids: Vec<InterId> = heads.iter().map(|h| h.id).collect();
        let removed_heads: Vec<usize> = check_needed_stems(sig, &head_ids)
            .into_iter()
            .map(|id| id.index())
            .collect();
        timing.lap("neededStems", t);
        timing.total_ms = elapsed_ms(t_total);

        let report = StemsReport {
            system_id: system.id,
            heads: heads.len(),
            stems_created: created.iter().filter(|&&id| sig.contains(id)).count(),
            head_stem_links: count_relations(sig, InterClass::Head, RelationKind::HeadStem),
            beam_stem_links: count_relations(sig, InterClass::Beam, RelationKind::BeamStem),
            exclusions,
            ambiguous_heads,
            removed_heads,
            skipped_heads: skipped.len(),
            timing,
        };
        info!(
            "System#{} heads: {} stems: {} head links: {} beam links: {} removed heads: {}",
            report.system_id,
            report.heads,
            report.stems_created,
            report.head_stem_links,
            report.beam_stem_links,
            report.removed_heads.len()
        );
        report
    }

    /// Links a known cue `stem` of `head` to the nearest group of `beams`
    /// found in `corner`. Returns the number of relations added.
    pub fn link_cue_beams(
        &self,
        system: &mut SystemInfo,
        head: InterId,
        corner: Corner,
        stem: InterId,
        beams: &[InterId],
    ) -> Result<usize, LinkError> {
        let head_ref = head_ref(&system.sig, head).ok_or(LinkError::MissingInter {
            inter: head.index(),
        })?;
        if !system.sig.inter(stem).is_some_and(|i| i.as_stem().is_some()) {
            return Err(LinkError::MissingInter { inter: stem.index() });
        }
        let beams: Vec<BeamRef> = beams
            .iter()
            .map(|&id| {
                beam_ref(&system.sig, id).ok_or(LinkError::MissingInter { inter: id.index() })
            })
            .collect::<Result<_, _>>()?;

        let mut groups = {
            let ctx = self.context(system, &beams);
            let lookup = CornerLookup::new(&head_ref, corner, &ctx)?;
            let candidates: Vec<&BeamRef> = beams
                .iter()
                .filter(|b| lookup.area().intersects_rect(&b.bounds))
                .collect();
            lookup_beam_groups(&lookup, candidates, &self.params)
        };
        groups.truncate(1);
        Ok(self.link_beams(&mut system.sig, &groups, corner, stem))
    }

    fn context<'a>(&'a self, system: &'a SystemInfo, beams: &'a [BeamRef]) -> SystemContext<'a> {
        SystemContext {
            bounds: system.bounds,
            glyphs: &system.glyphs,
            vertical_sections: &system.vertical_sections,
            horizontal_sections: &system.horizontal_sections,
            seeds: &system.seeds,
            beams,
            scale: &self.scale,
            skew: self.skew,
            params: &self.params,
            connections: &self.connections,
            checker: self.checker.as_ref(),
        }
    }

    /// Turns the hypotheses of one corner into stems and relations.
    fn apply_plan(
        &self,
        system: &mut SystemInfo,
        head: &HeadRef,
        plan: CornerPlan,
        stems_by_glyph: &mut HashMap<GlyphId, InterId>,
        created: &mut Vec<InterId>,
    ) {
        let mut linked = Vec::new();
        for hyp in plan.hypotheses {
            let grade = hyp.grade();
            let (top, bottom) = (hyp.top(), hyp.bottom());
            let bounds = hyp.glyph.bounds;
            let glyph = system.glyphs.register(hyp.glyph);

            let stem = match stems_by_glyph.get(&glyph) {
                Some(&id) if system.sig.contains(id) => id,
                _ => {
                    if grade < self.params.min_stem_grade {
                        debug!("head#{} {} weak stem {:.3}", head.id.index(), plan.corner, grade);
                        continue;
                    }
                    let inter = Inter::stem(glyph, bounds, top, bottom, hyp.impacts);
                    let id = system.sig.add_vertex(inter);
                    stems_by_glyph.insert(glyph, id);
                    created.push(id);
                    id
                }
            };

            if system.sig.relation(head.id, stem, RelationKind::HeadStem).is_some() {
                linked.push(stem);
            } else if let Some(rel) = hyp.head_link {
                system.sig.add_edge(head.id, stem, Relation::HeadStem(rel));
                linked.push(stem);
            }
        }

        for stem in linked {
            self.link_beams(&mut system.sig, &plan.beam_groups, plan.corner, stem);
        }
    }

    /// Connects `stem` to the first beam of each group. Behind a good first
    /// beam, the other beams of its group get the same connection.
    fn link_beams(
        &self,
        sig: &mut Sig,
        groups: &[Vec<BeamRef>],
        corner: Corner,
        stem: InterId,
    ) -> usize {
        let Some(stem_inter) = sig.inter(stem).and_then(|i| i.as_stem()).cloned() else {
            return 0;
        };
        let mut count = 0;
        for group in groups {
            let Some(first) = group.first() else {
                continue;
            };
            if !sig.contains(first.id) {
                continue;
            }
            let existing = sig
                .relation(first.id, stem, RelationKind::BeamStem)
                .and_then(|e| sig.edge(e))
                .and_then(|r| r.as_beam_stem())
                .cloned();
            let rel = match existing {
                Some(rel) => rel,
                None => {
                    let Some(rel) = beam_stem_relation(
                        first,
                        &stem_inter,
                        corner,
                        &self.scale,
                        self.params.max_beam_in_dx,
                        &self.connections.beam_stem,
                    ) else {
                        continue;
                    };
                    sig.add_edge(first.id, stem, Relation::BeamStem(rel.clone()));
                    count += 1;
                    rel
                }
            };

            if !first.good {
                continue;
            }
            for other in &group[1..] {
                if !sig.contains(other.id)
                    || sig.relation(other.id, stem, RelationKind::BeamStem).is_some()
                {
                    continue;
                }
                let Some((_, extension_point)) = crossing(other, &stem_inter, corner) else {
                    continue;
                };
                sig.add_edge(
                    other.id,
                    stem,
                    Relation::BeamStem(BeamStemRelation {
                        extension_point,
                        ..rel.clone()
                    }),
                );
                count += 1;
            }
        }
        count
    }
}

fn head_ref(sig: &Sig, id: InterId) -> Option<HeadRef> {
    let inter = sig.inter(id)?;
    Some(HeadRef {
        id,
        shape: inter.as_head()?.shape,
        bounds: inter.bounds,
    })
}

fn beam_ref(sig: &Sig, id: InterId) -> Option<BeamRef> {
    let inter = sig.inter(id)?;
    Some(BeamRef {
        id,
        bounds: inter.bounds,
        beam: inter.as_beam()?.clone(),
        good: inter.is_good(),
    })
}

/// Heads that take stems, by abscissa.
fn collect_heads(sig: &Sig) -> Vec<HeadRef> {
    let mut heads: Vec<HeadRef> = sig
        .inters(InterClass::Head)
        .into_iter()
        .filter_map(|id| head_ref(sig, id))
        .filter(|h| h.shape.is_stem_template())
        .collect();
    heads.sort_by_key(|h| (h.bounds.x, h.id));
    heads
}

/// Beams and hooks, by abscissa.
fn collect_beams(sig: &Sig) -> Vec<BeamRef> {
    let mut beams: Vec<BeamRef> = sig
        .inters(InterClass::Beam)
        .into_iter()
        .filter_map(|id| beam_ref(sig, id))
        .collect();
    beams.sort_by_key(|b| (b.bounds.x, b.id));
    beams
}

fn count_relations(sig: &Sig, class: InterClass, kind: RelationKind) -> usize {
    sig.inters(class)
        .into_iter()
        .map(|id| sig.relations(id, kind).len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Line, Rect};
    use crate::glyph::{Orientation, Run, Section, SectionId};
    use crate::sig::HeadShape;

    /// Columns `x..x+3` covering `y..y+len`.
    fn columns(first_id: u32, x: i32, y: i32, len: i32) -> Vec<Section> {
        (0..3)
            .map(|i| {
                Section::new(
                    SectionId(first_id + i as u32),
                    Orientation::Vertical,
                    x + i,
                    vec![Run::new(y, len)],
                )
            })
            .collect()
    }

    fn builder() -> StemsBuilder {
        let scale = Scale::new(20.0).unwrap();
        StemsBuilder::new(&scale, Skew::default(), &LinkOptions::default())
    }

    #[test]
    fn seed_above_head_becomes_its_stem() {
        let mut system = SystemInfo::new(0, Rect::new(0, 0, 1000, 400), columns(0, 118, 150, 56));
        system.add_seed(&[SectionId(0), SectionId(1), SectionId(2)]).unwrap();
        let head = system.add_head(HeadShape::NoteheadBlack, Rect::new(100, 200, 21, 16), 0.8);

        let report = builder().link_stems(&mut system);
        assert_eq!(report.heads, 1);
        assert_eq!(report.stems_created, 1);
        assert_eq!(report.head_stem_links, 1);
        assert!(report.removed_heads.is_empty());
        assert!(report.timing.stage("phase1").is_some());

        let rel = system.sig.relations(head, RelationKind::HeadStem);
        let edge = system.sig.edge(rel[0]).and_then(|r| r.as_head_stem()).unwrap();
        assert!(edge.y_gap < 0.1);
    }

    #[test]
    fn beam_is_linked_through_the_stem() {
        let mut system = SystemInfo::new(0, Rect::new(0, 0, 1000, 400), columns(0, 118, 104, 102));
        system.add_seed(&[SectionId(0), SectionId(1), SectionId(2)]).unwrap();
        let head = system.add_head(HeadShape::NoteheadBlack, Rect::new(100, 200, 21, 16), 0.8);
        let beam = system.add_beam(Line::new([60.0, 104.0], [200.0, 104.0]), 8.0, false, 0.8);

        let report = builder().link_stems(&mut system);
        assert_eq!(report.head_stem_links, 1);
        assert_eq!(report.beam_stem_links, 1);
        let stem = system
            .sig
            .relations(head, RelationKind::HeadStem)
            .first()
            .and_then(|&e| system.sig.opposite(e, head))
            .unwrap();
        assert!(system.sig.relation(beam, stem, RelationKind::BeamStem).is_some());
    }

    #[test]
    fn cue_stem_requires_live_inters() {
        let mut system = SystemInfo::new(0, Rect::new(0, 0, 1000, 400), Vec::new());
        let head = system.add_head(HeadShape::NoteheadBlackSmall, Rect::new(100, 200, 14, 11), 0.8);
        let ghost = system.add_head(HeadShape::NoteheadBlack, Rect::new(300, 200, 21, 16), 0.8);
        system.sig.remove_vertex(ghost);
        let result = builder().link_cue_beams(&mut system, head, Corner::TopRight, ghost, &[]);
        assert_eq!(result, Err(LinkError::MissingInter { inter: ghost.index() }));
    }

    #[test]
    fn cue_stem_is_linked_to_nearest_group() {
        let mut system = SystemInfo::new(0, Rect::new(0, 0, 1000, 400), Vec::new());
        let head = system.add_head(HeadShape::NoteheadBlackSmall, Rect::new(100, 200, 14, 11), 0.8);
        let stem = system.sig.add_vertex(Inter::stem(
            GlyphId(0),
            Rect::new(112, 150, 2, 55),
            [113.0, 150.0],
            [113.0, 204.0],
            Default::default(),
        ));
        let near = system.add_beam(Line::new([80.0, 154.0], [200.0, 154.0]), 6.0, false, 0.8);
        let next = system.add_beam(Line::new([80.0, 164.0], [200.0, 164.0]), 6.0, false, 0.8);
        let far = system.add_beam(Line::new([80.0, 60.0], [200.0, 60.0]), 6.0, false, 0.8);

        let builder = builder();
        let added = builder
            .link_cue_beams(&mut system, head, Corner::TopRight, stem, &[near, next, far])
            .unwrap();
        assert_eq!(added, 2);
        assert!(system.sig.relation(near, stem, RelationKind::BeamStem).is_some());
        assert!(system.sig.relation(next, stem, RelationKind::BeamStem).is_some());
        assert!(system.sig.relation(far, stem, RelationKind::BeamStem).is_none());
    }
}
