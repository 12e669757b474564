pub mod error;
pub mod geometry;
pub mod job;
pub mod log;
pub mod result;
pub mod svg;

pub use error::NestError;
pub use geometry::{BBox, Polygon2D, Ring};
pub use job::{NestJob, NestParameters, PartDef, ScoreStrategy, SheetDef};
pub use log::{Logger, NullLogger, StderrLogger};
pub use result::{JobStats, NestDocument, PlacementRecord, UnplacedSummary};
