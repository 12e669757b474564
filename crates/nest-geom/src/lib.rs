pub mod angles;
pub mod build;
pub mod simplify;

pub use angles::candidate_angles;
pub use build::{build_polygon, PolygonError};
pub use simplify::auto_simplify;
