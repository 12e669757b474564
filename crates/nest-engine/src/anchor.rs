//! Candidate anchor generation, filtering, and overlap-pruned evaluation
//! (spec §4.5), grounded on `evaluate_candidate_points` in the original
//! nesting script. The spatial index mirrors its `STRtree` usage via
//! `rstar::RTree` over buffered-polygon envelopes.

use geo::{Contains, EuclideanDistance, Point};
use rstar::{RTree, RTreeObject, AABB};

use nest_core::geometry::{BBox, Polygon2D, TOLERANCE};

use crate::geomops::{intersection_area, outward_buffer};

/// Below this many placed-buffered polygons, test overlap directly; at or
/// above it, prune via the spatial index first.
pub const INDEX_THRESHOLD: usize = 10;
const DEDUP_TOLERANCE: f64 = 1e-4;
const OVERLAP_AREA_TOLERANCE: f64 = 1e-2;

#[derive(Clone, Copy)]
struct EnvelopeEntry {
    index: usize,
    bbox: BBox,
}

impl RTreeObject for EnvelopeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.bbox.min_x, self.bbox.min_y], [self.bbox.max_x, self.bbox.max_y])
    }
}

/// Envelope-keyed index over a sheet's buffered placed polygons. Rebuilt
/// lazily: a query compares its own version against the buffered list's
/// current length and rebuilds on mismatch, rather than rebuilding on every
/// `INDEX_THRESHOLD`-th addition.
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<EnvelopeEntry>,
    version: usize,
}

impl SpatialIndex {
    pub fn empty() -> Self {
        SpatialIndex { tree: RTree::new(), version: 0 }
    }

    pub fn is_stale(&self, current_len: usize) -> bool {
        self.version != current_len
    }

    pub fn rebuild(&mut self, polys: &[Polygon2D]) {
        let entries: Vec<EnvelopeEntry> =
            polys.iter().enumerate().map(|(index, p)| EnvelopeEntry { index, bbox: p.bbox() }).collect();
        self.tree = RTree::bulk_load(entries);
        self.version = polys.len();
    }

    pub fn candidates_overlapping(&self, bbox: BBox) -> Vec<usize> {
        let envelope = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        self.tree.locate_in_envelope_intersecting(&envelope).map(|e| e.index).collect()
    }
}

/// Deduplicate at `1e-4` and sort lexicographically by `(x, y)`.
pub fn dedup_and_sort_points(mut pts: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    pts.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap().then_with(|| a[1].partial_cmp(&b[1]).unwrap()));
    pts.dedup_by(|a, b| (a[0] - b[0]).hypot(a[1] - b[1]) < DEDUP_TOLERANCE);
    pts
}

/// Keep only points that lie inside (or on the boundary of) the
/// margin-eroded sheet and outside every already-buffered placed polygon.
///
/// The sheet test is boundary-tolerant rather than a strict `Contains`: the
/// seed anchor is the sheet's own margin corner, which sits exactly on the
/// sheet boundary, and a strict containment test would drop it on every
/// sheet. Reject only points strictly outside the sheet (by more than
/// `TOLERANCE`), matching the original script's `within` check on that
/// corner rather than a point-in-interior test.
pub fn filter_cache_points(points: &[[f64; 2]], sheet_interior: &Polygon2D, placed_buffered: &[Polygon2D]) -> Vec<[f64; 2]> {
    let sheet_geo = sheet_interior.to_geo();
    points
        .iter()
        .copied()
        .filter(|&[x, y]| {
            let pt = Point::new(x, y);
            if !(sheet_geo.contains(&pt) || pt.euclidean_distance(&sheet_geo) <= TOLERANCE) {
                return false;
            }
            !placed_buffered.iter().any(|b| b.to_geo().contains(&pt))
        })
        .collect()
}

/// A candidate anchor point that produced a legal placement: within the
/// sheet, outward-buffered successfully, and clear of every other placed
/// (buffered) polygon on the sheet.
pub struct AnchorEvaluation {
    pub point: [f64; 2],
    pub translated: Polygon2D,
    pub buffered: Polygon2D,
}

/// Evaluate each candidate anchor for a rotated part polygon against a
/// sheet's free-space and placed state, returning every legal result.
#[allow(clippy::too_many_arguments)]
pub fn evaluate_candidates(
    candidates: &[[f64; 2]],
    rotated_poly: &Polygon2D,
    reference_point: [f64; 2],
    sheet_interior: &Polygon2D,
    placed_buffered: &[Polygon2D],
    index: &SpatialIndex,
    spacing: f64,
) -> Vec<AnchorEvaluation> {
    let sheet_geo = sheet_interior.to_geo();
    let mut legal = Vec::new();

    for &point in candidates {
        let dx = point[0] - reference_point[0];
        let dy = point[1] - reference_point[1];
        let translated = rotated_poly.translated(dx, dy);

        if !sheet_geo.contains(&translated.to_geo()) {
            continue;
        }

        let buffered = match outward_buffer(&translated, spacing / 2.0 + nest_core::geometry::TOLERANCE) {
            Ok(b) => b,
            Err(_) => continue,
        };

        if overlaps_any(&buffered, placed_buffered, index) {
            continue;
        }

        legal.push(AnchorEvaluation { point, translated, buffered });
    }

    legal
}

fn overlaps_any(candidate: &Polygon2D, placed_buffered: &[Polygon2D], index: &SpatialIndex) -> bool {
    if placed_buffered.len() < INDEX_THRESHOLD {
        placed_buffered.iter().any(|p| intersection_area(candidate, p) > OVERLAP_AREA_TOLERANCE)
    } else {
        let bbox = candidate.bbox();
        index
            .candidates_overlapping(bbox)
            .into_iter()
            .any(|i| intersection_area(candidate, &placed_buffered[i]) > OVERLAP_AREA_TOLERANCE)
    }
}
