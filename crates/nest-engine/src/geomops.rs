//! Boolean difference/intersection and offsetting (spec §4.4), grounded on
//! `shapely_to_clipper`/`clipper_to_shapely`/`PyclipperOffset` in the
//! original nesting script. Booleans run through `i_overlay` on coordinates
//! scaled by `CLIPPER_SCALE`; offsetting runs through `geo-buffer` directly
//! on floating point, matching how that crate's own callers use it.

use geo::Area;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nest_core::geometry::{Polygon2D, Ring, ZERO_TOLERANCE};

use crate::error::GeomError;

/// Scale factor applied to coordinates before every boolean op and undone
/// on the way out, matching the original script's integer-scaled robustness
/// strategy even though `i_overlay` itself is float-native.
pub const CLIPPER_SCALE: f64 = 1e4;

fn to_paths(poly: &Polygon2D) -> Vec<Vec<[f64; 2]>> {
    let mut paths = vec![poly.outer.0.clone()];
    paths.extend(poly.holes.iter().map(|h| h.0.clone()));
    paths
}

fn scale_paths(paths: &[Vec<[f64; 2]>], factor: f64) -> Vec<Vec<[f64; 2]>> {
    paths
        .iter()
        .map(|p| p.iter().map(|[x, y]| [x * factor, y * factor]).collect())
        .collect()
}

fn shapes_to_polygons(shapes: Vec<Vec<Vec<[f64; 2]>>>, inv_factor: f64) -> Vec<Polygon2D> {
    shapes
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|contours| {
            let descale = |c: &Vec<[f64; 2]>| -> Ring {
                Ring::new(c.iter().map(|[x, y]| [x * inv_factor, y * inv_factor]).collect())
            };
            let outer = descale(&contours[0]);
            let holes = contours[1..].iter().map(descale).collect();
            Polygon2D::new(outer, holes)
        })
        .filter(|p: &Polygon2D| p.area() > ZERO_TOLERANCE)
        .collect()
}

/// `sheet_with_margin \ union(forbidden)`, computed as a single non-zero
/// fill-rule difference against all forbidden shapes at once (the overlay
/// engine unions the clip set implicitly).
pub fn free_space(sheet_interior: &Polygon2D, forbidden: &[Polygon2D]) -> Result<Vec<Polygon2D>, GeomError> {
    if forbidden.is_empty() {
        return Ok(vec![sheet_interior.clone()]);
    }
    let subject = scale_paths(&to_paths(sheet_interior), CLIPPER_SCALE);
    let mut clip = Vec::new();
    for f in forbidden {
        clip.extend(scale_paths(&to_paths(f), CLIPPER_SCALE));
    }
    let shapes = subject.overlay(&clip, OverlayRule::Difference, FillRule::NonZero);
    Ok(shapes_to_polygons(shapes, 1.0 / CLIPPER_SCALE))
}

/// Inward-offset (negative distance) the free-space polygons by the
/// half-spacing margin. Each input polygon may split into several output
/// polygons; degenerate (near-zero area) slivers are dropped.
pub fn inward_offset(polys: &[Polygon2D], distance: f64) -> Result<Vec<Polygon2D>, GeomError> {
    let mut out = Vec::new();
    for p in polys {
        let geo_poly = p.to_geo();
        let buffered = geo_buffer::buffer_polygon(&geo_poly, -distance);
        for bp in buffered {
            let converted = Polygon2D::from_geo(&bp);
            if converted.area() > ZERO_TOLERANCE {
                out.push(converted);
            }
        }
    }
    Ok(out)
}

/// Outward-buffer (positive distance) a single candidate placement by half
/// the part-to-part spacing, returning the largest resulting polygon.
pub fn outward_buffer(poly: &Polygon2D, distance: f64) -> Result<Polygon2D, GeomError> {
    let geo_poly = poly.to_geo();
    let buffered = geo_buffer::buffer_polygon(&geo_poly, distance);
    buffered
        .into_iter()
        .max_by(|a, b| a.unsigned_area().partial_cmp(&b.unsigned_area()).unwrap())
        .map(|p| Polygon2D::from_geo(&p))
        .ok_or_else(|| GeomError::new("outward buffer produced no geometry"))
}

/// Area of `a ∩ b`, used by the overlap-prune rule in §4.5.
pub fn intersection_area(a: &Polygon2D, b: &Polygon2D) -> f64 {
    let subject = vec![a.outer.0.clone()];
    let clip = vec![b.outer.0.clone()];
    let shapes = subject.overlay(&clip, OverlayRule::Intersect, FillRule::NonZero);
    shapes
        .into_iter()
        .map(|contours| contours.first().map(|c| Ring::new(c.clone()).signed_area().abs()).unwrap_or(0.0))
        .sum()
}
