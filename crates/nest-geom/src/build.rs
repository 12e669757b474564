//! Polygon construction and validity repair (spec §4.1).

use geo::{Contains, EuclideanDistance, Point};
use nest_core::geometry::{Polygon2D, Ring, TOLERANCE, ZERO_TOLERANCE};
use thiserror::Error;

/// Non-fatal: a single part's profile could not be turned into a usable
/// polygon. The loader downgrades this to a warning and tallies the part's
/// quantity into `initiallySkipped`.
#[derive(Debug, Error, PartialEq)]
pub enum PolygonError {
    #[error("outer ring has fewer than 3 unique points")]
    TooFewPoints,
    #[error("polygon is self-intersecting and could not be repaired")]
    SelfIntersecting,
    #[error("polygon area is below the zero-area tolerance")]
    DegenerateArea,
}

/// Build a polygon from a raw outer ring and hole rings, applying the
/// repair rules from spec §4.1:
///
/// - dedup consecutive points, close the ring if needed
/// - reject rings with < 3 unique points
/// - drop holes whose sample point doesn't lie strictly inside the outer
///   ring (shrunk by `TOLERANCE`)
/// - if the result self-intersects, attempt a zero-width-buffer repair;
///   reject if still invalid or the area is below `ZERO_TOLERANCE`
pub fn build_polygon(
    outer: &[[f64; 2]],
    holes: &[Vec<[f64; 2]>],
) -> Result<Polygon2D, PolygonError> {
    let outer_ring = Ring::new(outer.to_vec()).normalised();
    if outer_ring.unique_len() < 3 {
        return Err(PolygonError::TooFewPoints);
    }

    let outer_geo = outer_ring.to_line_string();
    let mut kept_holes = Vec::new();
    for hole in holes {
        let hole_ring = Ring::new(hole.clone()).normalised();
        if hole_ring.unique_len() < 3 {
            continue;
        }
        let sample = hole_ring.0[0];
        let sample_pt = Point::new(sample[0], sample[1]);
        let outer_poly = geo::Polygon::new(outer_geo.clone(), vec![]);
        let dist_to_boundary = sample_pt.euclidean_distance(&outer_geo);
        if outer_poly.contains(&sample_pt) && dist_to_boundary > TOLERANCE {
            kept_holes.push(hole_ring);
        }
    }

    let mut polygon = Polygon2D::new(outer_ring, kept_holes);

    if is_self_intersecting(&polygon.outer) {
        polygon = repair_via_self_union(&polygon).ok_or(PolygonError::SelfIntersecting)?;
        if is_self_intersecting(&polygon.outer) {
            return Err(PolygonError::SelfIntersecting);
        }
    }

    if polygon.area() < ZERO_TOLERANCE {
        return Err(PolygonError::DegenerateArea);
    }

    Ok(polygon)
}

/// O(n^2) segment-intersection scan over non-adjacent edges. Fine for the
/// part sizes this system deals with (tens to low hundreds of vertices
/// after simplification).
fn is_self_intersecting(ring: &Ring) -> bool {
    let pts = &ring.0;
    let n = pts.len();
    if n < 4 {
        return false;
    }
    let edges = n - 1;
    for i in 0..edges {
        for j in (i + 1)..edges {
            if j == i || (j + 1) % edges == i || (i + 1) % edges == j {
                continue;
            }
            if segments_intersect(pts[i], pts[i + 1], pts[j], pts[j + 1]) {
                return true;
            }
        }
    }
    false
}

fn segments_intersect(p1: [f64; 2], p2: [f64; 2], p3: [f64; 2], p4: [f64; 2]) -> bool {
    fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
        (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
    }
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);
    ((d1 > 0.0) != (d2 > 0.0)) && ((d3 > 0.0) != (d4 > 0.0))
}

/// The "buffer(0)" trick: self-union the ring through the boolean overlay
/// engine so the non-zero fill rule resolves the self-intersection into a
/// simple polygon. Returns `None` if the union collapses to nothing.
fn repair_via_self_union(poly: &Polygon2D) -> Option<Polygon2D> {
    use i_overlay::core::fill_rule::FillRule;
    use i_overlay::core::overlay_rule::OverlayRule;
    use i_overlay::float::single::SingleFloatOverlay;

    let subject: Vec<Vec<[f64; 2]>> = vec![poly.outer.0.clone()];
    let clip: Vec<Vec<[f64; 2]>> = vec![poly.outer.0.clone()];
    let shapes = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);

    let mut best: Option<(f64, Vec<Vec<[f64; 2]>>)> = None;
    for shape in shapes {
        if shape.is_empty() {
            continue;
        }
        let area = Ring::new(shape[0].clone()).signed_area().abs();
        if best.as_ref().is_none_or(|(a, _)| area > *a) {
            best = Some((area, shape));
        }
    }
    let (_, shape) = best?;
    let outer = Ring::new(shape[0].clone());
    let repaired_holes: Vec<Ring> = shape[1..].iter().map(|c| Ring::new(c.clone())).collect();
    let mut holes = poly.holes.clone();
    holes.extend(repaired_holes);
    Some(Polygon2D::new(outer, holes))
}
