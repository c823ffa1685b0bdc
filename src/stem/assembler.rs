//! Stem assembly for one head corner.
//!
//! [`link_corner`] is pure: it reads the system through a [`SystemContext`]
//! and returns a [`CornerPlan`] that the builder applies to the graph.
//!
//! - The theoretical line from the reference point to the target point is
//!   refined by the seeds found in the corner.
//! - Sections not covered by seeds are grouped into chunks; a too thick
//!   vertical section straddling the reference ordinate is seen as part of
//!   the head and only shifts the reference ordinate.
//! - Seeds and chunks are walked from the head outwards; each prefix that
//!   goes far enough from the head yields one stem hypothesis.

use std::cmp::Reverse;

use log::debug;

use super::corner::Corner;
use super::lookup::{BeamRef, CornerLookup, HeadRef, StemRef, SystemContext};
use super::options::StemParams;
use crate::error::LinkError;
use crate::geometry::{y_overlap, Line, Rect};
use crate::glyph::{build_compounds, Glyph, GlyphId, Section, SectionId};
use crate::scale::Scale;
use crate::sig::{
    BeamPortion, BeamStemRelation, GapLimits, GradeImpacts, HeadStemRelation, InterId, StemInter,
};

/// Candidate stem made of the first items of a corner.
#[derive(Clone, Debug, PartialEq)]
pub struct StemHypothesis {
    pub glyph: Glyph,
    pub impacts: GradeImpacts,
    /// Connection to the head, when good enough.
    pub head_link: Option<HeadStemRelation>,
}

impl StemHypothesis {
    pub fn grade(&self) -> f64 {
        self.impacts.grade()
    }

    pub fn top(&self) -> [f64; 2] {
        self.glyph.start_point()
    }

    pub fn bottom(&self) -> [f64; 2] {
        self.glyph.stop_point()
    }
}

/// Everything found in one head corner.
#[derive(Clone, Debug)]
pub struct CornerPlan {
    pub corner: Corner,
    pub lookup: CornerLookup,
    /// Ordinate range between the reference point and the limit.
    pub y_range: Rect,
    pub target_line: Line,
    /// Touching run of a fat head section, if any.
    pub fat_head_run: Option<Rect>,
    /// Beam groups ordered by distance from the head.
    pub beam_groups: Vec<Vec<BeamRef>>,
    /// Hypotheses ordered by increasing length.
    pub hypotheses: Vec<StemHypothesis>,
}

/// Searches the `corner` of `head` for stems and beams.
pub fn link_corner(
    head: &HeadRef,
    corner: Corner,
    ctx: &SystemContext<'_>,
) -> Result<CornerPlan, LinkError> {
    let lookup = CornerLookup::new(head, corner, ctx)?;
    let near = ctx.neighborhood(&head.bounds);
    let beam_groups = lookup_beam_groups(&lookup, lookup.beam_candidates(ctx, &near), ctx.params);

    // The first good beam ends the white space to fill.
    let y_limit = beam_groups
        .first()
        .and_then(|group| group.first())
        .filter(|beam| beam.good)
        .and_then(|beam| lookup.target_on(&beam.beam.border(corner.v_side())))
        .map(|pt| pt[1])
        .unwrap_or(lookup.target_point()[1]);

    let work = CornerWork {
        ctx,
        lookup: &lookup,
        y_dir: corner.y_dir(),
        y_range: y_range(lookup.reference_point()[1], y_limit, corner.y_dir()),
    };

    let (target_line, seeds) = work.target_line(&lookup.seed_candidates(ctx, &near));
    let (chunks, fat_head_run) = work.lookup_chunks(head, &target_line, &seeds);

    let mut items: Vec<Glyph> = seeds
        .iter()
        .filter_map(|&id| ctx.glyphs.glyph(id).cloned())
        .collect();
    if !chunks.is_empty() {
        items.extend(chunks);
        work.sort_by_distance(&mut items);
    }

    let mut ref_y = lookup.reference_point()[1];
    if let Some(run) = fat_head_run {
        let contrib = work.contrib(&run);
        if contrib > 0 {
            ref_y += (corner.y_dir() * contrib) as f64;
        }
    }

    let hypotheses = work.include_items(head, &items, ref_y, fat_head_run);
    debug!(
        "head#{} {}: seeds {} items {} hypotheses {} beam groups {}",
        head.id.index(),
        corner,
        seeds.len(),
        items.len(),
        hypotheses.len(),
        beam_groups.len()
    );

    Ok(CornerPlan {
        corner,
        y_range: work.y_range,
        lookup,
        target_line,
        fat_head_run,
        beam_groups,
        hypotheses,
    })
}

/// Head-stem links to already existing `stems` found in the head corner.
pub fn reuse_corner(
    head: &HeadRef,
    corner: Corner,
    ctx: &SystemContext<'_>,
    stems: &[StemRef],
) -> Result<Vec<(InterId, HeadStemRelation)>, LinkError> {
    let lookup = CornerLookup::new(head, corner, ctx)?;
    let fat = ctx.vicinity(&head.bounds);
    let near: Vec<StemRef> = stems
        .iter()
        .filter(|s| s.bounds.intersects(&fat))
        .cloned()
        .collect();
    Ok(lookup
        .stem_candidates(&near)
        .into_iter()
        .filter_map(|stem| {
            let glyph = ctx.glyphs.glyph(stem.glyph)?;
            let rel = head_stem_relation(
                head,
                &lookup,
                None,
                glyph,
                ctx.scale,
                &ctx.connections.head_stem,
            )?;
            Some((stem.id, rel))
        })
        .collect())
}

/// Groups the beam candidates of a corner, nearest first.
///
/// Beams behind the head are ignored, as is a first beam too close to the
/// head. A group only grows after a good beam, with beams close enough in
/// ordinate to the previous one.
pub fn lookup_beam_groups(
    lookup: &CornerLookup,
    candidates: Vec<&BeamRef>,
    params: &StemParams,
) -> Vec<Vec<BeamRef>> {
    let mut located: Vec<(f64, &BeamRef)> = candidates
        .into_iter()
        .filter_map(|b| {
            let dist = lookup.beam_distance(&b.beam)?;
            (dist > 0.0).then_some((dist, b))
        })
        .collect();
    located.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<Vec<BeamRef>> = Vec::new();
    let mut group_is_good = false;
    let mut prev: Option<&BeamRef> = None;
    for (dist, beam) in located {
        if groups.is_empty() && dist < params.min_head_beam_distance as f64 {
            continue;
        }
        let grows = group_is_good
            && prev.is_some_and(|p| {
                are_group_compatible(lookup, p, beam, params.max_beam_distance)
            });
        match groups.last_mut() {
            Some(group) if grows => group.push(beam.clone()),
            _ => {
                groups.push(vec![beam.clone()]);
                group_is_good = beam.good;
            }
        }
        prev = Some(beam);
    }
    groups
}

fn are_group_compatible(
    lookup: &CornerLookup,
    one: &BeamRef,
    two: &BeamRef,
    max_distance: i32,
) -> bool {
    match (lookup.target_on(&one.beam.median), lookup.target_on(&two.beam.median)) {
        (Some(a), Some(b)) => {
            let far = (a[1] - b[1]).abs() > max_distance as f64;
            if far {
                debug!("beam#{} & beam#{} are too distant", one.id.index(), two.id.index());
            }
            !far
        }
        _ => false,
    }
}

/// Grades the link between the head of `lookup` and a stem glyph.
///
/// With a fat head section, the abscissa gap is taken on its touching run
/// and the ordinate gap between that run and the stem box. Otherwise both
/// come from the stem line at the reference ordinate.
pub fn head_stem_relation(
    head: &HeadRef,
    lookup: &CornerLookup,
    head_run: Option<Rect>,
    stem: &Glyph,
    scale: &Scale,
    limits: &GapLimits,
) -> Option<HeadStemRelation> {
    let corner = lookup.corner();
    let x_dir = corner.x_dir() as f64;
    let ref_pt = lookup.reference_point();

    let (x_gap, y_gap, x_anchor) = match head_run {
        Some(run) => {
            let overlap = y_overlap(&run, &stem.bounds);
            (
                x_dir * (run.x as f64 - ref_pt[0]),
                (-overlap).max(0) as f64,
                run.x as f64,
            )
        }
        None => {
            let start = stem.start_point();
            let stop = stem.stop_point();
            let x_anchor = Line::new(start, stop).x_at_y(ref_pt[1]);
            let y_gap = if ref_pt[1] < start[1] {
                start[1] - ref_pt[1]
            } else if ref_pt[1] > stop[1] {
                ref_pt[1] - stop[1]
            } else {
                0.0
            };
            (x_dir * (x_anchor - ref_pt[0]), y_gap, x_anchor)
        }
    };

    let x_frac = scale.pixels_to_frac(x_gap);
    let y_frac = scale.pixels_to_frac(y_gap);
    let grade = limits.grade(x_frac, y_frac);
    if grade < limits.min_grade {
        return None;
    }
    let ext_y = if corner.y_dir() > 0 {
        head.bounds.y
    } else {
        head.bounds.bottom() - 1
    };
    Some(HeadStemRelation {
        head_side: corner.h_side(),
        x_gap: x_frac,
        y_gap: y_frac,
        grade,
        extension_point: [x_anchor, ext_y as f64],
        invading: x_frac < -0.5 * limits.x_in_gap_max,
    })
}

/// Grades the link between a beam and a stem going away from a head in
/// `corner`.
pub fn beam_stem_relation(
    beam: &BeamRef,
    stem: &StemInter,
    corner: Corner,
    scale: &Scale,
    max_beam_in_dx: i32,
    limits: &GapLimits,
) -> Option<BeamStemRelation> {
    let (cross, extension_point) = crossing(beam, stem, corner)?;
    let limit = beam.beam.border(corner.v_side().opposite());
    let left = limit.p1[0].min(limit.p2[0]);
    let right = limit.p1[0].max(limit.p2[0]);

    // Positive within the beam span.
    let to_left = cross[0] - left;
    let to_right = right - cross[0];
    let (portion, x_gap) = if !beam.beam.hook && to_left.min(to_right) > max_beam_in_dx as f64 {
        (BeamPortion::Center, 0.0)
    } else if to_left < to_right {
        (BeamPortion::Left, (-to_left).max(0.0))
    } else {
        (BeamPortion::Right, (-to_right).max(0.0))
    };

    let y_gap = if corner.y_dir() > 0 {
        (cross[1] - stem.bottom[1]).max(0.0)
    } else {
        (stem.top[1] - cross[1]).max(0.0)
    };

    let x_frac = scale.pixels_to_frac(x_gap);
    let y_frac = scale.pixels_to_frac(y_gap);
    let grade = limits.grade(x_frac, y_frac);
    if grade < limits.min_grade {
        return None;
    }
    Some(BeamStemRelation {
        portion,
        x_gap: x_frac,
        y_gap: y_frac,
        grade,
        extension_point,
    })
}

/// Crossing of the stem line with the beam border facing the head, and the
/// matching point on the far border.
pub fn crossing(beam: &BeamRef, stem: &StemInter, corner: Corner) -> Option<([f64; 2], [f64; 2])> {
    let limit = beam.beam.border(corner.v_side().opposite());
    let cross = stem.line().intersection(&limit)?;
    let far = [
        cross[0],
        cross[1] + corner.y_dir() as f64 * (beam.beam.height - 1.0),
    ];
    Some((cross, far))
}

fn y_range(ref_y: f64, y_limit: f64, y_dir: i32) -> Rect {
    let top = if y_dir > 0 { ref_y } else { y_limit };
    Rect::new(0, top.round() as i32, 0, (y_limit - ref_y).abs().round() as i32)
}

struct CornerWork<'w, 'a> {
    ctx: &'w SystemContext<'a>,
    lookup: &'w CornerLookup,
    y_dir: i32,
    y_range: Rect,
}

impl<'a> CornerWork<'_, 'a> {
    /// Height of `rect` within the white space to fill.
    fn contrib(&self, rect: &Rect) -> i32 {
        y_overlap(&self.y_range, rect).max(0)
    }

    /// Run of `section` on the side facing the stem.
    fn run_box(&self, section: &Section) -> Option<Rect> {
        if self.lookup.corner().x_dir() < 0 {
            section.first_run_box()
        } else {
            section.last_run_box()
        }
    }

    fn distance_key(&self, rect: &Rect) -> i32 {
        if self.y_dir > 0 {
            rect.y
        } else {
            -rect.bottom()
        }
    }

    fn sort_by_distance(&self, glyphs: &mut [Glyph]) {
        glyphs.sort_by_key(|g| self.distance_key(&g.bounds));
    }

    /// Refines the theoretical line with the seeds of the corner and returns
    /// the seeds kept, nearest first.
    fn target_line(&self, candidates: &[GlyphId]) -> (Line, Vec<GlyphId>) {
        let theory = self.lookup.theoretical_line();
        let params = self.ctx.params;

        let mut seeds: Vec<(GlyphId, &'a Glyph)> = candidates
            .iter()
            .filter_map(|&id| self.ctx.glyphs.glyph(id).map(|g| (id, g)))
            .filter(|(_, g)| self.contrib(&g.bounds) > 0)
            .filter(|(_, g)| theory.pt_line_dist(g.centroid) <= params.max_seed_jitter)
            .collect();

        // On overlap, the most contributive seed wins.
        seeds.sort_by_key(|(_, g)| Reverse(self.contrib(&g.bounds)));
        let mut kept: Vec<(GlyphId, &'a Glyph)> = Vec::new();
        for (id, glyph) in seeds {
            if kept
                .iter()
                .all(|(_, k)| y_overlap(&glyph.bounds, &k.bounds) <= 0)
            {
                kept.push((id, glyph));
            }
        }
        kept.sort_by_key(|(_, g)| self.distance_key(&g.bounds));

        match (kept.first(), kept.last()) {
            (Some((_, first)), Some((_, last))) => {
                let line = Line::new(first.start_point(), last.stop_point());
                (line, kept.iter().map(|(id, _)| *id).collect())
            }
            _ => (theory, Vec::new()),
        }
    }

    /// Sections that may complement the seeds, plus the touching run of a
    /// fat head section.
    fn lookup_sections(
        &self,
        head: &HeadRef,
        target_line: &Line,
        seeds: &[GlyphId],
    ) -> (Vec<&'a Section>, Option<Rect>) {
        let ctx = self.ctx;
        let params = ctx.params;
        let area = self.lookup.area();
        let segment = self.lookup.head_segment();
        let ref_y = self.lookup.reference_point()[1].round() as i32;
        let wide_head = head.bounds.grown(params.max_stem_thickness, 0);
        let seed_boxes: Vec<Rect> = seeds
            .iter()
            .filter_map(|&id| ctx.glyphs.glyph(id).map(|g| g.bounds))
            .collect();
        let hits_seed = |rect: &Rect| seed_boxes.iter().any(|s| y_overlap(rect, s) > 0);

        let mut sections: Vec<&'a Section> = Vec::new();
        let mut head_sections: Vec<SectionId> = Vec::new();
        let mut fat: Option<Rect> = None;

        for &id in ctx.vertical_sections.iter().chain(ctx.horizontal_sections) {
            let Some(section) = ctx.glyphs.section(id) else {
                continue;
            };
            let bounds = section.bounds();
            if !area.intersects_rect(&bounds) {
                continue;
            }

            // Outside the area, only a section of the head itself may help.
            if !area.contains_rect(&bounds) {
                if !bounds.intersects(&wide_head) || !bounds.y_embraces(ref_y) {
                    continue;
                }
                if section.is_vertical() && bounds.w > params.max_stem_thickness {
                    let Some(run) = self.run_box(section) else {
                        continue;
                    };
                    if hits_seed(&run) || !segment.x_embraces(run.x as f64) {
                        continue;
                    }
                    match fat {
                        Some(other) if self.contrib(&run) <= self.contrib(&other) => {}
                        _ => fat = Some(run),
                    }
                    continue;
                }
                if self.contrib(&bounds) < params.min_head_section_contribution {
                    debug!("Discarding tiny head section {:?}", section.id);
                    continue;
                }
                head_sections.push(section.id);
            }

            if bounds.w > params.max_stem_thickness || hits_seed(&bounds) {
                continue;
            }
            if target_line.pt_line_dist(section.centroid()) <= params.max_section_jitter {
                sections.push(section);
            }
        }

        // A standard section overlapping the fat run: keep the best one.
        if let Some(run) = fat {
            let run_contrib = self.contrib(&run);
            let mut i = 0;
            while i < sections.len() {
                let bounds = sections[i].bounds();
                if y_overlap(&run, &bounds) > 0 {
                    if self.contrib(&bounds) <= run_contrib {
                        sections.remove(i);
                        continue;
                    }
                    debug!("Cancelling fat head section at x:{}", run.x);
                    fat = None;
                    break;
                }
                i += 1;
            }
        }

        head_sections.retain(|id| sections.iter().any(|s| s.id == *id));
        if head_sections.len() > 1 {
            let mut best: Option<(&'a Section, i32)> = None;
            for s in sections.iter().filter(|s| head_sections.contains(&s.id)) {
                let contrib = self.contrib(&s.bounds());
                if best.map_or(true, |(_, c)| contrib > c) {
                    best = Some((*s, contrib));
                }
            }
            sections.retain(|s| !head_sections.contains(&s.id));
            if let Some((s, _)) = best {
                sections.push(s);
            }
        }

        (sections, fat)
    }

    /// Chunks built from the sections found in the corner.
    fn lookup_chunks(
        &self,
        head: &HeadRef,
        target_line: &Line,
        seeds: &[GlyphId],
    ) -> (Vec<Glyph>, Option<Rect>) {
        let ctx = self.ctx;
        let params = ctx.params;
        let (sections, fat) = self.lookup_sections(head, target_line, seeds);

        let mut chunks = Vec::new();
        let mut wides: Vec<Vec<SectionId>> = Vec::new();
        for ids in build_compounds(&sections) {
            let Some(glyph) = ctx.glyphs.build_glyph(&ids) else {
                continue;
            };
            if self.contrib(&glyph.bounds) == 0 || glyph.weight < params.min_chunk_weight {
                continue;
            }
            if glyph.mean_width().round() as i32 > params.max_stem_thickness {
                wides.push(ids);
            } else {
                chunks.push(glyph);
            }
        }

        // A too wide chunk is reduced to its heaviest section.
        for ids in wides {
            let mut members: Vec<&Section> =
                ids.iter().filter_map(|&id| ctx.glyphs.section(id)).collect();
            members.sort_by_key(|s| Reverse(s.weight()));
            if let Some(glyph) = members.first().and_then(|s| ctx.glyphs.build_glyph(&[s.id])) {
                chunks.push(glyph);
            }
        }
        (chunks, fat)
    }

    /// Walks `items` away from the head and builds one hypothesis per prefix
    /// long enough.
    fn include_items(
        &self,
        head: &HeadRef,
        items: &[Glyph],
        ref_y: f64,
        head_run: Option<Rect>,
    ) -> Vec<StemHypothesis> {
        let ctx = self.ctx;
        let params = ctx.params;
        let y_dir = self.y_dir as f64;
        let mut last_y = ref_y;
        let mut hypotheses = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let bounds = item.bounds;
            if self.contrib(&bounds) == 0 {
                break;
            }

            let item_y = f64::from(if self.y_dir > 0 {
                bounds.y
            } else {
                bounds.bottom() - 1
            });
            let item_start = if self.y_dir > 0 {
                item_y.max(ref_y)
            } else {
                item_y.min(ref_y)
            };
            let y_gap = y_dir * (item_start - last_y);
            if y_gap > params.max_y_gap as f64 {
                debug!("head#{} gap {} too large before item {}", head.id.index(), y_gap, i);
                break;
            }
            if i == 0 && y_gap > params.max_stem_head_gap_y as f64 {
                break;
            }

            let item_stop = item_y + y_dir * (bounds.h - 1) as f64;
            last_y = if self.y_dir > 0 {
                last_y.max(item_stop)
            } else {
                last_y.min(item_stop)
            };
            if (last_y - ref_y).abs() < params.min_stem_extension as f64 {
                continue;
            }

            let ids: Vec<SectionId> = items[..=i]
                .iter()
                .flat_map(|g| g.sections.iter().copied())
                .collect();
            let Some(glyph) = ctx.glyphs.build_glyph(&ids) else {
                continue;
            };
            let impacts = ctx.checker.check_stem(&glyph);
            let head_link = head_stem_relation(
                head,
                self.lookup,
                head_run,
                &glyph,
                ctx.scale,
                &ctx.connections.head_stem,
            );
            hypotheses.push(StemHypothesis {
                glyph,
                impacts,
                head_link,
            });
        }
        hypotheses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Line, Skew};
    use crate::glyph::{GlyphIndex, Orientation, Run};
    use crate::sig::{HeadShape, Inter};
    use crate::stem::checker::VerticalsChecker;
    use crate::stem::options::{CheckerOptions, ConnectionOptions, StemOptions};
    use petgraph::stable_graph::NodeIndex;

    struct Setup {
        scale: Scale,
        params: StemParams,
        connections: ConnectionOptions,
        checker: VerticalsChecker,
        glyphs: GlyphIndex,
        vertical: Vec<SectionId>,
    }

    /// Columns `x..x+3` covering `y..y+len`.
    fn stem_columns(first_id: u32, x: i32, y: i32, len: i32) -> Vec<Section> {
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

    fn setup(sections: Vec<Section>) -> Setup {
        let scale = Scale::new(20.0).unwrap();
        let connections = ConnectionOptions::default();
        let params = StemParams::resolve(&StemOptions::default(), &connections, &scale);
        let checker = VerticalsChecker::new(&scale, &Skew::default(), CheckerOptions::default());
        let vertical = sections.iter().map(|s| s.id).collect();
        Setup {
            scale,
            params,
            connections,
            checker,
            glyphs: GlyphIndex::new(sections),
            vertical,
        }
    }

    fn context<'a>(s: &'a Setup, beams: &'a [BeamRef]) -> SystemContext<'a> {
        SystemContext {
            bounds: Rect::new(0, 0, 1000, 400),
            glyphs: &s.glyphs,
            vertical_sections: &s.vertical,
            horizontal_sections: &[],
            seeds: &[],
            beams,
            scale: &s.scale,
            skew: Skew::default(),
            params: &s.params,
            connections: &s.connections,
            checker: &s.checker,
        }
    }

    fn head() -> HeadRef {
        HeadRef {
            id: NodeIndex::new(0),
            shape: HeadShape::NoteheadBlack,
            bounds: Rect::new(100, 200, 21, 16),
        }
    }

    fn beam(id: usize, x0: f64, x1: f64, y: f64, good: bool) -> BeamRef {
        let grade = if good { 0.8 } else { 0.3 };
        let inter = Inter::beam(Line::new([x0, y], [x1, y]), 8.0, false, grade);
        BeamRef {
            id: NodeIndex::new(id),
            bounds: inter.bounds,
            beam: inter.as_beam().cloned().unwrap(),
            good,
        }
    }

    #[test]
    fn chunks_from_sections_yield_growing_hypotheses() {
        // Reference point of the top right corner is (120, 206).
        let mut sections = stem_columns(0, 118, 170, 36);
        sections.extend(stem_columns(10, 118, 120, 45));
        let s = setup(sections);
        let ctx = context(&s, &[]);
        let plan = link_corner(&head(), Corner::TopRight, &ctx).unwrap();
        assert_eq!(plan.lookup.reference_point(), [120.0, 206.0]);
        assert_eq!(plan.hypotheses.len(), 2);
        assert_eq!(plan.hypotheses[0].glyph.bounds, Rect::new(118, 170, 3, 36));
        assert_eq!(plan.hypotheses[1].glyph.bounds, Rect::new(118, 120, 3, 86));
        let link = plan.hypotheses[0].head_link.as_ref().unwrap();
        assert!(link.y_gap < 0.1);
        assert_eq!(link.head_side, crate::geometry::HorizontalSide::Right);
        // The hole between both chunks costs some grade.
        assert!(plan.hypotheses[0].grade() > 0.9);
        assert!(plan.hypotheses[1].grade() < plan.hypotheses[0].grade());
    }

    #[test]
    fn large_gap_stops_the_walk() {
        let mut sections = stem_columns(0, 118, 170, 36);
        sections.extend(stem_columns(10, 118, 100, 50));
        let s = setup(sections);
        let ctx = context(&s, &[]);
        let plan = link_corner(&head(), Corner::TopRight, &ctx).unwrap();
        assert_eq!(plan.hypotheses.len(), 1);
        assert_eq!(plan.hypotheses[0].glyph.bounds.y, 170);
    }

    #[test]
    fn nothing_found_in_an_empty_corner() {
        let s = setup(Vec::new());
        let ctx = context(&s, &[]);
        for corner in Corner::ALL {
            let plan = link_corner(&head(), corner, &ctx).unwrap();
            assert!(plan.hypotheses.is_empty());
            assert!(plan.beam_groups.is_empty());
        }
    }

    #[test]
    fn beam_groups_start_after_a_good_beam() {
        let s = setup(Vec::new());
        let beams = vec![
            beam(1, 80.0, 200.0, 120.0, true),
            beam(2, 80.0, 200.0, 105.0, false),
            beam(3, 80.0, 200.0, 60.0, true),
            // Behind the head.
            beam(4, 80.0, 200.0, 300.0, true),
        ];
        let ctx = context(&s, &beams);
        let lookup = CornerLookup::new(&head(), Corner::TopRight, &ctx).unwrap();
        let near = ctx.neighborhood(&head().bounds);
        let groups = lookup_beam_groups(&lookup, lookup.beam_candidates(&ctx, &near), &s.params);
        let ids: Vec<Vec<usize>> = groups
            .iter()
            .map(|g| g.iter().map(|b| b.id.index()).collect())
            .collect();
        assert_eq!(ids, vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn beam_portion_follows_crossing_abscissa() {
        let s = setup(Vec::new());
        let stem = StemInter {
            top: [120.0, 100.0],
            bottom: [120.0, 206.0],
            impacts: GradeImpacts::new(),
        };
        let limits = &s.connections.beam_stem;
        let max_dx = s.params.max_beam_in_dx;

        let center = beam(1, 60.0, 200.0, 104.0, true);
        let rel = beam_stem_relation(&center, &stem, Corner::TopRight, &s.scale, max_dx, limits)
            .unwrap();
        assert_eq!(rel.portion, BeamPortion::Center);
        assert_eq!(rel.extension_point, [120.0, 101.0]);
        assert_eq!(rel.y_gap, 0.0);

        let left = beam(2, 119.0, 200.0, 104.0, true);
        let rel = beam_stem_relation(&left, &stem, Corner::TopRight, &s.scale, max_dx, limits)
            .unwrap();
        assert_eq!(rel.portion, BeamPortion::Left);
        assert_eq!(rel.x_gap, 0.0);

        let far = beam(3, 130.0, 200.0, 104.0, true);
        assert!(
            beam_stem_relation(&far, &stem, Corner::TopRight, &s.scale, max_dx, limits).is_none()
        );
    }
}
