pub mod anchor;
pub mod engine;
pub mod error;
pub mod geomops;
pub mod score;
pub mod sheet;

pub use engine::{nest, NestOutcome};
pub use error::GeomError;
