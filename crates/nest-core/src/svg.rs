use crate::geometry::Polygon2D;

/// Emit the exterior ring of a polygon as an SVG path: `M x,y L x,y … Z`,
/// coordinates to two decimals. Holes are not emitted (matches
/// `polygon_to_svg` in the original engine — the result document only ever
/// needs the outline for preview rendering).
pub fn polygon_to_svg(poly: &Polygon2D) -> String {
    let pts = &poly.outer.0;
    if pts.is_empty() {
        return String::new();
    }
    let segments: Vec<String> = pts.iter().map(|[x, y]| format!("{x:.2},{y:.2}")).collect();
    format!("M {} Z", segments.join(" L "))
}
