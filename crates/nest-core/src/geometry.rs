use geo::{Coord, LineString, Polygon as GeoPolygon};
use serde::{Deserialize, Serialize};

/// Tolerance used to decide whether a ring is already closed, and the
/// general-purpose epsilon for near-zero comparisons throughout the crate.
pub const TOLERANCE: f64 = 1e-5;
pub const ZERO_TOLERANCE: f64 = 1e-9;

/// A closed polygon ring: an ordered list of vertices with the first point
/// repeated as the last. Origin is whatever coordinate system the caller
/// uses; the engine itself is coordinate-system agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring(pub Vec<[f64; 2]>);

impl Ring {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self(points)
    }

    /// Unique vertex count (ignoring the closing repeat of the first point).
    pub fn unique_len(&self) -> usize {
        if self.0.len() >= 2 && points_close(self.0[0], *self.0.last().unwrap()) {
            self.0.len() - 1
        } else {
            self.0.len()
        }
    }

    /// Deduplicate consecutive points and close the ring if it isn't already.
    pub fn normalised(&self) -> Ring {
        let mut out: Vec<[f64; 2]> = Vec::with_capacity(self.0.len());
        for &p in &self.0 {
            if out.last().is_none_or(|&last| !points_close(last, p)) {
                out.push(p);
            }
        }
        if out.len() >= 2 && !points_close(out[0], *out.last().unwrap()) {
            out.push(out[0]);
        }
        Ring(out)
    }

    pub fn signed_area(&self) -> f64 {
        let pts = &self.0;
        if pts.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..pts.len() - 1 {
            let [x1, y1] = pts[i];
            let [x2, y2] = pts[i + 1];
            sum += x1 * y2 - x2 * y1;
        }
        sum * 0.5
    }

    pub fn bbox(&self) -> BBox {
        BBox::from_points(&self.0)
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        LineString::from(self.0.iter().map(|&[x, y]| Coord { x, y }).collect::<Vec<_>>())
    }

    pub fn from_line_string(ls: &LineString<f64>) -> Self {
        Ring(ls.coords().map(|c| [c.x, c.y]).collect())
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Ring {
        Ring(self.0.iter().map(|&[x, y]| [x + dx, y + dy]).collect())
    }

    /// Rotate about the origin by `degrees`, counter-clockwise.
    pub fn rotated(&self, degrees: f64) -> Ring {
        let rad = degrees.to_radians();
        let (s, c) = rad.sin_cos();
        Ring(
            self.0
                .iter()
                .map(|&[x, y]| [x * c - y * s, x * s + y * c])
                .collect(),
        )
    }
}

fn points_close(a: [f64; 2], b: [f64; 2]) -> bool {
    (a[0] - b[0]).hypot(a[1] - b[1]) <= TOLERANCE
}

/// A polygon: an outer ring plus zero or more hole rings, strictly inside
/// the outer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon2D {
    pub outer: Ring,
    #[serde(default)]
    pub holes: Vec<Ring>,
}

impl Polygon2D {
    pub fn new(outer: Ring, holes: Vec<Ring>) -> Self {
        Self { outer, holes }
    }

    pub fn area(&self) -> f64 {
        let outer = self.outer.signed_area().abs();
        let holes: f64 = self.holes.iter().map(|h| h.signed_area().abs()).sum();
        (outer - holes).max(0.0)
    }

    pub fn bbox(&self) -> BBox {
        self.outer.bbox()
    }

    pub fn to_geo(&self) -> GeoPolygon<f64> {
        GeoPolygon::new(
            self.outer.to_line_string(),
            self.holes.iter().map(|h| h.to_line_string()).collect(),
        )
    }

    pub fn from_geo(p: &GeoPolygon<f64>) -> Self {
        Polygon2D {
            outer: Ring::from_line_string(p.exterior()),
            holes: p.interiors().iter().map(Ring::from_line_string).collect(),
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Polygon2D {
        Polygon2D {
            outer: self.outer.translated(dx, dy),
            holes: self.holes.iter().map(|h| h.translated(dx, dy)).collect(),
        }
    }

    pub fn rotated(&self, degrees: f64) -> Polygon2D {
        Polygon2D {
            outer: self.outer.rotated(degrees),
            holes: self.holes.iter().map(|h| h.rotated(degrees)).collect(),
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn from_points(points: &[[f64; 2]]) -> Self {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for &[x, y] in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if !min_x.is_finite() {
            return BBox { min_x: 0.0, min_y: 0.0, max_x: 0.0, max_y: 0.0 };
        }
        BBox { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> Ring {
        Ring::new(vec![[0.0, 0.0], [side, 0.0], [side, side], [0.0, side], [0.0, 0.0]])
    }

    #[test]
    fn test_ring_closes_open_ring() {
        let open = Ring::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let closed = open.normalised();
        assert_eq!(closed.0.first(), closed.0.last());
        assert_eq!(closed.unique_len(), 4);
    }

    #[test]
    fn test_ring_dedups_consecutive_points() {
        let r = Ring::new(vec![
            [0.0, 0.0],
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ]);
        assert_eq!(r.normalised().unique_len(), 4);
    }

    #[test]
    fn test_polygon_area_with_hole() {
        let outer = square(10.0);
        let hole = Ring::new(vec![[2.0, 2.0], [4.0, 2.0], [4.0, 4.0], [2.0, 4.0], [2.0, 2.0]]);
        let poly = Polygon2D::new(outer, vec![hole]);
        assert!((poly.area() - (100.0 - 4.0)).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_from_square() {
        let poly = Polygon2D::new(square(10.0), vec![]);
        let bbox = poly.bbox();
        assert!((bbox.width() - 10.0).abs() < 1e-9);
        assert!((bbox.height() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_90_swaps_bbox_axes() {
        let poly = Polygon2D::new(
            Ring::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 20.0], [0.0, 20.0], [0.0, 0.0]]),
            vec![],
        );
        let rotated = poly.rotated(90.0);
        let bbox = rotated.bbox();
        assert!((bbox.width() - 20.0).abs() < 1e-6);
        assert!((bbox.height() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_translate_moves_bbox() {
        let poly = Polygon2D::new(square(10.0), vec![]);
        let moved = poly.translated(5.0, -3.0);
        let bbox = moved.bbox();
        assert!((bbox.min_x - 5.0).abs() < 1e-9);
        assert!((bbox.min_y - (-3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_geo_roundtrip() {
        let poly = Polygon2D::new(square(10.0), vec![]);
        let geo_poly = poly.to_geo();
        let back = Polygon2D::from_geo(&geo_poly);
        assert!((back.area() - poly.area()).abs() < 1e-9);
    }
}
