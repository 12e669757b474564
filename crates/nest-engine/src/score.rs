//! Tie-break scoring (spec §6, design note in §9: a tagged enum with a
//! comparable key, not string dispatch).

use std::cmp::Ordering;

use nest_core::job::ScoreStrategy;

/// A comparable placement score. Smaller is better (`<` means "preferred").
///
/// `height` is a final, position-independent tie-break: when two candidates
/// anchor at the exact same corner (same `x`, `y`), the one with the lower
/// placed bounding-box height wins. Anchoring alone cannot distinguish a
/// part from the same part rotated 90 degrees when both occupy the same
/// corner, since the anchor point is identical either way; preferring the
/// flatter orientation casts a smaller shadow over the rest of the sheet.
#[derive(Debug, Clone, Copy)]
pub struct ScoreKey {
    pub sheet_index: usize,
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub strategy: ScoreStrategy,
}

impl ScoreKey {
    pub fn new(strategy: ScoreStrategy, sheet_index: usize, x: f64, y: f64, height: f64) -> Self {
        ScoreKey { sheet_index, x, y, height, strategy }
    }

    fn primary(&self) -> f64 {
        match self.strategy {
            ScoreStrategy::Yx | ScoreStrategy::SheetYx => self.y,
            ScoreStrategy::OriginDist => self.x * self.x + self.y * self.y,
        }
    }
}

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.strategy == ScoreStrategy::SheetYx {
            match self.sheet_index.cmp(&other.sheet_index) {
                Ordering::Equal => {}
                non_eq => return non_eq,
            }
        }
        self.primary()
            .partial_cmp(&other.primary())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.x.partial_cmp(&other.x).unwrap_or(Ordering::Equal))
            .then_with(|| self.height.partial_cmp(&other.height).unwrap_or(Ordering::Equal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yx_prefers_lower_y() {
        let a = ScoreKey::new(ScoreStrategy::Yx, 0, 5.0, 1.0, 0.0);
        let b = ScoreKey::new(ScoreStrategy::Yx, 0, 0.0, 2.0, 0.0);
        assert!(a < b);
    }

    #[test]
    fn test_yx_ties_on_y_break_on_x() {
        let a = ScoreKey::new(ScoreStrategy::Yx, 0, 1.0, 3.0, 0.0);
        let b = ScoreKey::new(ScoreStrategy::Yx, 0, 2.0, 3.0, 0.0);
        assert!(a < b);
    }

    #[test]
    fn test_origindist_prefers_smaller_radius() {
        let a = ScoreKey::new(ScoreStrategy::OriginDist, 0, 3.0, 4.0, 0.0);
        let b = ScoreKey::new(ScoreStrategy::OriginDist, 0, 1.0, 1.0, 0.0);
        assert!(b < a);
    }

    #[test]
    fn test_sheetyx_prefers_lower_sheet_index_first() {
        let a = ScoreKey::new(ScoreStrategy::SheetYx, 1, 0.0, 0.0, 0.0);
        let b = ScoreKey::new(ScoreStrategy::SheetYx, 0, 50.0, 50.0, 0.0);
        assert!(b < a);
    }

    #[test]
    fn test_height_breaks_ties_on_identical_anchor() {
        let flatter = ScoreKey::new(ScoreStrategy::Yx, 0, 0.0, 0.0, 10.0);
        let taller = ScoreKey::new(ScoreStrategy::Yx, 0, 0.0, 0.0, 20.0);
        assert!(flatter < taller);
    }
}
