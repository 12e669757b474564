//! The outer placement loop (spec §4.7): for each part instance in
//! descending area, for each candidate rotation, for each eligible sheet,
//! build the IFP, evaluate candidate anchors, and keep the best-scoring
//! legal placement.

use std::collections::HashMap;
use std::time::Instant;

use nest_core::error::NestError;
use nest_core::geometry::{Polygon2D, Ring, TOLERANCE};
use nest_core::job::{NestJob, PreparedPart};
use nest_core::log::Logger;
use nest_core::result::{BBoxOut, PlacementRecord, UnplacedSummary};
use nest_core::svg::polygon_to_svg;

use crate::anchor::{dedup_and_sort_points, evaluate_candidates, filter_cache_points, AnchorEvaluation};
use crate::geomops::{free_space, inward_offset};
use crate::score::ScoreKey;
use crate::sheet::{PlacedItem, SheetState};

/// Floor on the IFP inward-offset distance, matching the original script's
/// `max(part_spacing / 2 + TOLERANCE, 0.01)`.
const MIN_IFP_MARGIN: f64 = 0.01;

pub struct NestOutcome {
    pub placements: Vec<PlacementRecord>,
    pub unplaced: Vec<UnplacedSummary>,
    pub nesting_time_seconds: f64,
}

struct WinningCandidate {
    angle: f64,
    anchor: AnchorEvaluation,
}

struct PartInstance<'a> {
    instance_id: String,
    part: &'a PreparedPart,
}

/// Run the placement loop. Fatal only on a thickness with zero eligible
/// sheet capacity (spec §4.7); every other failure mode degrades to a
/// warning plus an unplaced tally entry.
pub fn nest(job: &NestJob, logger: &dyn Logger) -> Result<NestOutcome, NestError> {
    let start = Instant::now();
    let params = &job.parameters;

    for part in &job.parts {
        if part.quantity <= 0 {
            continue;
        }
        let eligible: i64 = job
            .sheets
            .iter()
            .filter(|s| (s.thickness - part.thickness).abs() < TOLERANCE)
            .map(|s| s.quantity.max(0))
            .sum();
        if eligible <= 0 {
            return Err(NestError::ThicknessMismatch { thickness: part.thickness });
        }
    }

    let mut sheets = build_sheet_instances(job, logger);
    let mut instances = build_part_instances(job);
    instances.sort_by(|a, b| b.part.area.partial_cmp(&a.part.area).unwrap_or(std::cmp::Ordering::Equal));

    let mut placements = Vec::new();
    let mut unplaced_counts: HashMap<String, (String, i64)> = HashMap::new();

    for inst in &instances {
        let placed = place_one(inst, &mut sheets, params, logger);
        match placed {
            Some((sheet_idx, candidate)) => {
                let sheet = &mut sheets[sheet_idx];
                let bbox = candidate.anchor.translated.bbox();
                let item = PlacedItem {
                    part_instance_id: inst.instance_id.clone(),
                    part_id: inst.part.id.clone(),
                    original_name: inst.part.original_name.clone(),
                    rotation: candidate.angle,
                    polygon: candidate.anchor.translated.clone(),
                    bbox,
                };
                let svg = params.emit_svg.then(|| polygon_to_svg(&candidate.anchor.translated));

                sheet.commit_placement(item, candidate.anchor.buffered, params.part_to_part_distance);

                placements.push(PlacementRecord {
                    part_instance_id: inst.instance_id.clone(),
                    part_id: inst.part.id.clone(),
                    original_name: inst.part.original_name.clone(),
                    sheet_id: sheet.sheet_id.clone(),
                    x_bl_bbox: bbox.min_x,
                    y_bl_bbox: bbox.min_y,
                    width_bbox: bbox.width(),
                    height_bbox: bbox.height(),
                    rotation: candidate.angle,
                    profile2d: inst.part.raw_profile.clone(),
                    bbox: BBoxOut::from(bbox),
                    svg,
                });
            }
            None => {
                let entry = unplaced_counts
                    .entry(inst.part.id.clone())
                    .or_insert_with(|| (inst.part.original_name.clone(), 0));
                entry.1 += 1;
            }
        }
    }

    let unplaced = unplaced_counts
        .into_iter()
        .map(|(id, (original_name, quantity))| UnplacedSummary { id, original_name, quantity })
        .collect();

    Ok(NestOutcome { placements, unplaced, nesting_time_seconds: start.elapsed().as_secs_f64() })
}

fn place_one(
    inst: &PartInstance,
    sheets: &mut [SheetState],
    params: &nest_core::job::NestParameters,
    logger: &dyn Logger,
) -> Option<(usize, WinningCandidate)> {
    let mut best: Option<(ScoreKey, usize, WinningCandidate)> = None;

    for &angle in &inst.part.candidate_angles {
        let rotated = inst.part.polygon.rotated(angle);
        let reference = rotated.bbox();
        let reference_point = [reference.min_x, reference.min_y];

        for (sheet_idx, sheet) in sheets.iter_mut().enumerate() {
            if (sheet.thickness - inst.part.thickness).abs() > TOLERANCE {
                continue;
            }
            sheet.ensure_index_fresh();

            let free = match free_space(&sheet.interior, &sheet.placed_buffered) {
                Ok(f) => f,
                Err(e) => {
                    logger.warn(&format!("free-space computation failed on sheet {}: {e}", sheet.sheet_id));
                    continue;
                }
            };
            if free.is_empty() {
                continue;
            }

            let margin = (params.part_to_part_distance / 2.0 + TOLERANCE).max(MIN_IFP_MARGIN);
            let ifp = match inward_offset(&free, margin) {
                Ok(i) => i,
                Err(e) => {
                    logger.warn(&format!("IFP offset failed on sheet {}: {e}", sheet.sheet_id));
                    continue;
                }
            };
            if ifp.is_empty() {
                continue;
            }

            let cache_candidates = filter_cache_points(&sheet.candidate_points, &sheet.interior, &sheet.placed_buffered);
            let mut legal = evaluate_candidates(
                &cache_candidates,
                &rotated,
                reference_point,
                &sheet.interior,
                &sheet.placed_buffered,
                &sheet.spatial_index,
                params.part_to_part_distance,
            );

            if legal.is_empty() {
                let ifp_vertices = ifp_vertex_candidates(&ifp);
                legal = evaluate_candidates(
                    &ifp_vertices,
                    &rotated,
                    reference_point,
                    &sheet.interior,
                    &sheet.placed_buffered,
                    &sheet.spatial_index,
                    params.part_to_part_distance,
                );
            }

            let Some(winner) = best_by_bottom_left(legal) else { continue };
            let height = winner.translated.bbox().height();
            let key = ScoreKey::new(params.score_strategy, sheet.index_in_job, winner.point[0], winner.point[1], height);

            if best.as_ref().is_none_or(|(existing, _, _)| key < *existing) {
                best = Some((key, sheet_idx, WinningCandidate { angle, anchor: winner }));
            }
        }
    }

    best.map(|(_, idx, candidate)| (idx, candidate))
}

fn ifp_vertex_candidates(ifp: &[Polygon2D]) -> Vec<[f64; 2]> {
    let vertices: Vec<[f64; 2]> = ifp.iter().flat_map(|p| p.outer.0.clone()).collect();
    dedup_and_sort_points(vertices)
}

fn best_by_bottom_left(mut legal: Vec<AnchorEvaluation>) -> Option<AnchorEvaluation> {
    legal.sort_by(|a, b| a.point[1].partial_cmp(&b.point[1]).unwrap().then_with(|| a.point[0].partial_cmp(&b.point[0]).unwrap()));
    legal.into_iter().next()
}

fn build_part_instances(job: &NestJob) -> Vec<PartInstance<'_>> {
    let mut out = Vec::new();
    for part in &job.parts {
        for n in 1..=part.quantity.max(0) {
            out.push(PartInstance { instance_id: format!("{}_inst_{}", part.id, n), part });
        }
    }
    out
}

fn build_sheet_instances(job: &NestJob, logger: &dyn Logger) -> Vec<SheetState> {
    let mut out = Vec::new();
    let margin = job.parameters.part_to_sheet_distance;

    for def in &job.sheets {
        for n in 1..=def.quantity.max(0) {
            let width = def.width - 2.0 * margin;
            let height = def.height - 2.0 * margin;
            if width <= 0.0 || height <= 0.0 {
                logger.warn(&format!("sheet {} margin-eroded region is empty; skipping instance {n}", def.id));
                continue;
            }
            let rect = Ring::new(vec![
                [margin, margin],
                [margin + width, margin],
                [margin + width, margin + height],
                [margin, margin + height],
                [margin, margin],
            ]);
            let index_in_job = out.len();
            out.push(SheetState::new(
                format!("{}_inst_{}", def.id, n),
                index_in_job,
                def.thickness,
                Polygon2D::new(rect, vec![]),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_core::job::{NestParameters, ParametersRaw, Profile2dRaw, ScoreStrategy, SheetDef};
    use nest_core::log::NullLogger;

    fn square_part(id: &str, side: f64, thickness: f64, quantity: i64) -> PreparedPart {
        let outer = vec![[0.0, 0.0], [side, 0.0], [side, side], [0.0, side], [0.0, 0.0]];
        let polygon = Polygon2D::new(Ring::new(outer.clone()), vec![]);
        PreparedPart {
            id: id.to_string(),
            original_name: id.to_string(),
            thickness,
            quantity,
            area: polygon.area(),
            candidate_angles: vec![0.0, 90.0],
            polygon,
            raw_profile: Profile2dRaw { outer, holes: vec![] },
        }
    }

    fn sheet_def(id: &str, thickness: f64, width: f64, height: f64, quantity: i64) -> SheetDef {
        SheetDef { id: id.to_string(), quantity, thickness, width, height }
    }

    fn params(strategy: ScoreStrategy) -> NestParameters {
        let mut p = NestParameters::from_raw(&ParametersRaw::default());
        p.score_strategy = strategy;
        p
    }

    #[test]
    fn test_single_square_fits_once() {
        let job = NestJob {
            parts: vec![square_part("p1", 10.0, 1.0, 1)],
            sheets: vec![sheet_def("s1", 1.0, 100.0, 100.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        assert_eq!(outcome.placements.len(), 1);
        assert!(outcome.unplaced.is_empty());
        let placement = &outcome.placements[0];
        assert!((placement.x_bl_bbox).abs() < 1e-6);
        assert!((placement.y_bl_bbox).abs() < 1e-6);
    }

    #[test]
    fn test_thickness_mismatch_is_fatal() {
        let job = NestJob {
            parts: vec![square_part("p1", 10.0, 2.0, 1)],
            sheets: vec![sheet_def("s1", 1.0, 100.0, 100.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let err = nest(&job, &NullLogger).unwrap_err();
        assert!(matches!(err, NestError::ThicknessMismatch { thickness } if thickness == 2.0));
    }

    #[test]
    fn test_oversize_part_is_unplaced_not_error() {
        let job = NestJob {
            parts: vec![square_part("p1", 60.0, 1.0, 1)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        assert!(outcome.placements.is_empty());
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.unplaced[0].quantity, 1);
    }

    #[test]
    fn test_second_of_two_squares_goes_unplaced() {
        let job = NestJob {
            parts: vec![square_part("p1", 30.0, 1.0, 2)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: {
                let mut p = params(ScoreStrategy::Yx);
                p.part_to_part_distance = 1.0;
                p
            },
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        assert_eq!(outcome.placements.len(), 1);
        assert_eq!(outcome.unplaced.len(), 1);
        assert_eq!(outcome.unplaced[0].quantity, 1);
    }

    #[test]
    fn test_total_placed_plus_unplaced_equals_requested() {
        let job = NestJob {
            parts: vec![square_part("p1", 30.0, 1.0, 2)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        let placed: i64 = outcome.placements.len() as i64;
        let unplaced: i64 = outcome.unplaced.iter().map(|u| u.quantity).sum();
        assert_eq!(placed + unplaced, 2);
    }

    /// Invariant 1: every placement's bbox lies within the margin-eroded sheet.
    #[test]
    fn test_placements_stay_within_margin_eroded_sheet() {
        let job = NestJob {
            parts: vec![square_part("p1", 10.0, 1.0, 3)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: {
                let mut p = params(ScoreStrategy::Yx);
                p.part_to_sheet_distance = 2.0;
                p
            },
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        assert!(!outcome.placements.is_empty());
        for placement in &outcome.placements {
            assert!(placement.x_bl_bbox >= 2.0 - 1e-6);
            assert!(placement.y_bl_bbox >= 2.0 - 1e-6);
            assert!(placement.x_bl_bbox + placement.width_bbox <= 48.0 + 1e-6);
            assert!(placement.y_bl_bbox + placement.height_bbox <= 48.0 + 1e-6);
        }
    }

    /// Invariant 2: no two placements on the same sheet may overlap beyond
    /// the buffered-intersection tolerance.
    #[test]
    fn test_placements_on_same_sheet_do_not_overlap() {
        let job = NestJob {
            parts: vec![square_part("p1", 10.0, 1.0, 6)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        assert!(outcome.placements.len() >= 2);
        for i in 0..outcome.placements.len() {
            for j in (i + 1)..outcome.placements.len() {
                let a = &outcome.placements[i];
                let b = &outcome.placements[j];
                if a.sheet_id != b.sheet_id {
                    continue;
                }
                let area = crate::geomops::intersection_area(
                    &square_part("p1", 10.0, 1.0, 1).polygon.rotated(a.rotation).translated(a.x_bl_bbox, a.y_bl_bbox),
                    &square_part("p1", 10.0, 1.0, 1).polygon.rotated(b.rotation).translated(b.x_bl_bbox, b.y_bl_bbox),
                );
                assert!(area <= 1e-2, "placements {i} and {j} overlap by {area}");
            }
        }
    }

    /// Invariant 3: a placement's rotation is always one of the part's
    /// enumerated candidate angles.
    #[test]
    fn test_placement_rotation_is_a_candidate_angle() {
        let job = NestJob {
            parts: vec![square_part("p1", 10.0, 1.0, 1)],
            sheets: vec![sheet_def("s1", 1.0, 100.0, 100.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        let placement = &outcome.placements[0];
        let candidates = [0.0, 90.0];
        assert!(candidates.iter().any(|c| (c - placement.rotation).abs() < 1e-9));
    }

    /// Boundary: a part exactly matching the margin-eroded sheet interior
    /// places at the corner with rotation 0.
    #[test]
    fn test_exact_fit_places_at_corner_with_zero_rotation() {
        let job = NestJob {
            parts: vec![square_part("p1", 50.0, 1.0, 1)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let outcome = nest(&job, &NullLogger).unwrap();
        assert_eq!(outcome.placements.len(), 1);
        let placement = &outcome.placements[0];
        assert!(placement.x_bl_bbox.abs() < 1e-6);
        assert!(placement.y_bl_bbox.abs() < 1e-6);
        assert!(placement.rotation.abs() < 1e-9);
    }

    /// Determinism: identical inputs produce identical placement coordinates
    /// and rotations across two independent runs.
    #[test]
    fn test_identical_inputs_produce_identical_placements() {
        let build_job = || NestJob {
            parts: vec![square_part("p1", 10.0, 1.0, 4)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: params(ScoreStrategy::Yx),
        };
        let a = nest(&build_job(), &NullLogger).unwrap();
        let b = nest(&build_job(), &NullLogger).unwrap();
        assert_eq!(a.placements.len(), b.placements.len());
        for (pa, pb) in a.placements.iter().zip(b.placements.iter()) {
            assert_eq!(pa.part_instance_id, pb.part_instance_id);
            assert_eq!(pa.sheet_id, pb.sheet_id);
            assert!((pa.x_bl_bbox - pb.x_bl_bbox).abs() < 1e-12);
            assert!((pa.y_bl_bbox - pb.y_bl_bbox).abs() < 1e-12);
            assert!((pa.rotation - pb.rotation).abs() < 1e-12);
        }
    }

    /// Round-trip: scaling all geometry and distances uniformly by k leaves
    /// rotations unchanged and scales positions by k.
    #[test]
    fn test_uniform_scaling_produces_congruent_placement() {
        const K: f64 = 3.0;
        let base = NestJob {
            parts: vec![square_part("p1", 10.0, 1.0, 1)],
            sheets: vec![sheet_def("s1", 1.0, 50.0, 50.0, 1)],
            parameters: {
                let mut p = params(ScoreStrategy::Yx);
                p.part_to_part_distance = 1.0;
                p
            },
        };
        let scaled = NestJob {
            parts: vec![square_part("p1", 10.0 * K, 1.0, 1)],
            sheets: vec![sheet_def("s1", 1.0, 50.0 * K, 50.0 * K, 1)],
            parameters: {
                let mut p = params(ScoreStrategy::Yx);
                p.part_to_part_distance = 1.0 * K;
                p
            },
        };

        let base_outcome = nest(&base, &NullLogger).unwrap();
        let scaled_outcome = nest(&scaled, &NullLogger).unwrap();
        assert_eq!(base_outcome.placements.len(), 1);
        assert_eq!(scaled_outcome.placements.len(), 1);

        let a = &base_outcome.placements[0];
        let b = &scaled_outcome.placements[0];
        assert!((a.rotation - b.rotation).abs() < 1e-9);
        assert!((a.x_bl_bbox * K - b.x_bl_bbox).abs() < 1e-6);
        assert!((a.y_bl_bbox * K - b.y_bl_bbox).abs() < 1e-6);
    }
}
