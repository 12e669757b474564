//! Per-sheet mutable state (spec §4.6). A sheet is modeled as a value; every
//! mutation passes through `commit_placement`, which updates the placed
//! list, buffered list, candidate cache, and spatial-index staleness
//! together rather than through separate call sites.

use nest_core::geometry::{BBox, Polygon2D};

use crate::anchor::{SpatialIndex, INDEX_THRESHOLD};

/// A placement already committed to a sheet. Unbuffered — kept only for
/// SVG emission and the result document's `profile2d` field; overlap
/// checks consult `placed_buffered`, never this list.
#[derive(Debug, Clone)]
pub struct PlacedItem {
    pub part_instance_id: String,
    pub part_id: String,
    pub original_name: String,
    pub rotation: f64,
    pub polygon: Polygon2D,
    pub bbox: BBox,
}

pub struct SheetState {
    pub sheet_id: String,
    pub index_in_job: usize,
    pub thickness: f64,
    /// Sheet interior after inward erosion by `partToSheetDistance`.
    pub interior: Polygon2D,
    pub placed: Vec<PlacedItem>,
    pub placed_buffered: Vec<Polygon2D>,
    pub candidate_points: Vec<[f64; 2]>,
    pub spatial_index: SpatialIndex,
}

impl SheetState {
    pub fn new(sheet_id: String, index_in_job: usize, thickness: f64, interior: Polygon2D) -> Self {
        let seed = interior.bbox();
        SheetState {
            sheet_id,
            index_in_job,
            thickness,
            candidate_points: vec![[seed.min_x, seed.min_y]],
            interior,
            placed: Vec::new(),
            placed_buffered: Vec::new(),
            spatial_index: SpatialIndex::empty(),
        }
    }

    pub fn ensure_index_fresh(&mut self) {
        if self.placed_buffered.len() >= INDEX_THRESHOLD && self.spatial_index.is_stale(self.placed_buffered.len()) {
            self.spatial_index.rebuild(&self.placed_buffered);
        }
    }

    /// Absorb a successful placement: the placed list, the buffered list,
    /// and two derived anchor candidates (the corners diagonally opposite
    /// the placement's bottom-left, per spec §4.6) all update in one call.
    pub fn commit_placement(&mut self, item: PlacedItem, buffered: Polygon2D, spacing: f64) {
        let bbox = item.bbox;
        let derived = [
            [bbox.min_x + bbox.width() + spacing, bbox.min_y],
            [bbox.min_x, bbox.min_y + bbox.height() + spacing],
        ];

        self.placed.push(item);
        self.placed_buffered.push(buffered);
        self.candidate_points.extend(derived);

        self.ensure_index_fresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nest_core::geometry::Ring;

    fn interior(side: f64) -> Polygon2D {
        Polygon2D::new(
            Ring::new(vec![[0.0, 0.0], [side, 0.0], [side, side], [0.0, side], [0.0, 0.0]]),
            vec![],
        )
    }

    fn item(bbox: BBox) -> PlacedItem {
        PlacedItem {
            part_instance_id: "p1_inst_1".into(),
            part_id: "p1".into(),
            original_name: "panel".into(),
            rotation: 0.0,
            polygon: interior(bbox.width()),
            bbox,
        }
    }

    #[test]
    fn test_commit_placement_extends_candidate_cache() {
        let mut sheet = SheetState::new("s1_inst_1".into(), 0, 1.0, interior(100.0));
        let bbox = BBox { min_x: 0.0, min_y: 0.0, max_x: 10.0, max_y: 10.0 };
        sheet.commit_placement(item(bbox), interior(10.0), 1.0);
        assert_eq!(sheet.placed.len(), 1);
        assert_eq!(sheet.placed_buffered.len(), 1);
        assert!(sheet.candidate_points.contains(&[21.0, 0.0]));
        assert!(sheet.candidate_points.contains(&[0.0, 21.0]));
    }

    #[test]
    fn test_index_rebuilds_once_threshold_reached() {
        let mut sheet = SheetState::new("s1_inst_1".into(), 0, 1.0, interior(1000.0));
        for i in 0..INDEX_THRESHOLD {
            let bbox = BBox { min_x: i as f64 * 20.0, min_y: 0.0, max_x: i as f64 * 20.0 + 10.0, max_y: 10.0 };
            sheet.commit_placement(item(bbox), interior(10.0).translated(i as f64 * 20.0, 0.0), 0.0);
        }
        assert!(!sheet.spatial_index.is_stale(sheet.placed_buffered.len()));
    }
}
