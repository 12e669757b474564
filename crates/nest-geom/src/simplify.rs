//! Automatic simplification (spec §4.2): Douglas-Peucker plus a collinear
//! vertex reduction pass, grounded on `auto_simplify`/`reduce_polygon_vertices`
//! in the original nesting script.

use geo::Simplify;
use nest_core::geometry::{Polygon2D, Ring};

const MIN_TOLERANCE: f64 = 0.5;
const MAX_TOLERANCE: f64 = 5.0;
const PERIMETER_FACTOR: f64 = 0.02;
const COLLINEAR_THRESHOLD: f64 = 0.1;

/// Simplify a polygon's rings, returning the simplified polygon plus the
/// tolerance used and the outer ring's perimeter (the quantity the tolerance
/// itself is derived from, useful for logging/stats).
pub fn auto_simplify(poly: &Polygon2D) -> (Polygon2D, f64, f64) {
    let perimeter = ring_perimeter(&poly.outer);
    let tolerance = (perimeter * PERIMETER_FACTOR).clamp(MIN_TOLERANCE, MAX_TOLERANCE);

    let simplified_outer = simplify_ring(&poly.outer, tolerance);
    let simplified_holes: Vec<Ring> = poly.holes.iter().map(|h| simplify_ring(h, tolerance)).collect();

    let out = Polygon2D::new(simplified_outer, simplified_holes);

    (out, tolerance, perimeter)
}

fn simplify_ring(ring: &Ring, tolerance: f64) -> Ring {
    let geo_ls = ring.to_line_string();
    let simplified = geo_ls.simplify(tolerance);
    let reduced = Ring::from_line_string(&simplified).normalised();
    reduce_collinear(&reduced)
}

/// For small rings (4 or 5 unique vertices), drop any vertex that lies
/// almost exactly on the line between its neighbours. Douglas-Peucker alone
/// tends to leave these behind on near-rectangular profiles.
fn reduce_collinear(ring: &Ring) -> Ring {
    let n = ring.unique_len();
    if !(4..=5).contains(&n) {
        return ring.clone();
    }

    let pts = &ring.0[..ring.0.len() - 1];
    let len = pts.len();
    let mut kept: Vec<[f64; 2]> = Vec::with_capacity(len);
    for i in 0..len {
        let prev = pts[(i + len - 1) % len];
        let cur = pts[i];
        let next = pts[(i + 1) % len];
        if point_to_segment_distance(cur, prev, next) > COLLINEAR_THRESHOLD {
            kept.push(cur);
        }
    }

    if kept.len() < 3 {
        return ring.clone();
    }
    kept.push(kept[0]);
    Ring::new(kept)
}

fn point_to_segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let (ax, ay) = (a[0], a[1]);
    let (bx, by) = (b[0], b[1]);
    let (px, py) = (p[0], p[1]);
    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-12 {
        return (px - ax).hypot(py - ay);
    }
    let t = (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0);
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (px - cx).hypot(py - cy)
}

fn ring_perimeter(ring: &Ring) -> f64 {
    let pts = &ring.0;
    if pts.len() < 2 {
        return 0.0;
    }
    pts.windows(2).map(|w| (w[1][0] - w[0][0]).hypot(w[1][1] - w[0][1])).sum()
}
