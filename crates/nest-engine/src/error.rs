use thiserror::Error;

/// A geometric operation (boolean difference, offset, intersection) could
/// not be completed for a single (rotation, sheet) pair. The placement loop
/// treats this as "skip and continue", never a panic.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{0}")]
pub struct GeomError(pub String);

impl GeomError {
    pub fn new(msg: impl Into<String>) -> Self {
        GeomError(msg.into())
    }
}
