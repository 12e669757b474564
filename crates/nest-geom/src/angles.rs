//! Candidate rotation angle enumeration (spec §4.3), grounded on
//! `get_potential_rotation_angles`/`determine_candidate_angles` in the
//! original nesting script.

use geo::MinimumRotatedRect;
use nest_core::geometry::Polygon2D;

/// Profiles with this many or fewer edges fall back to a discrete
/// equi-angular sweep instead of shape-derived candidates — small polygons
/// (rectangles, triangles) don't have enough edge diversity to produce a
/// useful OBB/edge-direction set.
const LOW_SEGMENT_THRESHOLD: usize = 10;

/// Return the set of rotation angles (degrees, normalised to `(-180, 180]`)
/// worth trying for this part's outer profile.
pub fn candidate_angles(poly: &Polygon2D) -> Vec<f64> {
    let n = poly.outer.unique_len();
    if n == 0 {
        return vec![0.0];
    }
    if n <= LOW_SEGMENT_THRESHOLD {
        return discrete_sweep(n);
    }

    let mut angles = Vec::new();
    angles.push(0.0);
    angles.extend(obb_axis_angles(poly));
    angles.extend(edge_direction_angles(poly));

    dedup_angles(angles)
}

/// n even: n/2 angles spread over 180 degrees. n odd: n angles spread over
/// 360 degrees. Matches the original script's behaviour for low vertex
/// counts, where edge directions alone don't discriminate well between
/// orientations.
fn discrete_sweep(n: usize) -> Vec<f64> {
    if n < 3 {
        return vec![0.0];
    }
    let (count, span) = if n % 2 == 0 { (n / 2, 180.0) } else { (n, 360.0) };
    let count = count.max(1);
    (0..count)
        .map(|i| normalise_angle(i as f64 * span / count as f64))
        .collect()
}

fn obb_axis_angles(poly: &Polygon2D) -> Vec<f64> {
    let geo_poly = poly.to_geo();
    let Some(rect) = geo_poly.minimum_rotated_rect() else {
        return Vec::new();
    };
    let coords: Vec<_> = rect.exterior().coords().collect();
    if coords.len() < 3 {
        return Vec::new();
    }
    let dx = coords[1].x - coords[0].x;
    let dy = coords[1].y - coords[0].y;
    let base = dy.atan2(dx).to_degrees();
    vec![normalise_angle(base), normalise_angle(base + 90.0)]
}

fn edge_direction_angles(poly: &Polygon2D) -> Vec<f64> {
    let pts = &poly.outer.0;
    if pts.len() < 2 {
        return Vec::new();
    }
    pts.windows(2)
        .map(|w| {
            let dx = w[1][0] - w[0][0];
            let dy = w[1][1] - w[0][1];
            normalise_angle(-dy.atan2(dx).to_degrees())
        })
        .collect()
}

fn normalise_angle(mut deg: f64) -> f64 {
    deg %= 360.0;
    if deg <= -180.0 {
        deg += 360.0;
    } else if deg > 180.0 {
        deg -= 360.0;
    }
    // Round to 2 decimals for stable dedup.
    (deg * 100.0).round() / 100.0
}

fn dedup_angles(mut angles: Vec<f64>) -> Vec<f64> {
    angles.sort_by(|a, b| a.partial_cmp(b).unwrap());
    angles.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
    angles
}
