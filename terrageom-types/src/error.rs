//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// A pairwise operation received a geometry collection whose members are of different kinds.
    #[error("pairwise operations do not support heterogeneous geometry collections")]
    UnsupportedGeometryCollection,
    /// No coordinate transformation is available between the two reference systems.
    #[error("cannot transform geometry from SRID {from} to SRID {to}")]
    Transform {
        /// Source SRID.
        from: i32,
        /// Target SRID.
        to: i32,
    },
    /// Unknown spatial relation tag or name.
    #[error("invalid spatial relation: {0}")]
    InvalidRelation(String),
    /// WKB or WKT could not be read or written.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The value is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Operands of a pairwise operation have different SRIDs.
    #[error("geometries have different SRIDs: {left} and {right}")]
    SridMismatch {
        /// SRID of the receiver.
        left: i32,
        /// SRID of the argument.
        right: i32,
    },
    /// Collection member index out of bounds.
    #[error("index {index} is out of range for a collection of {len} members")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of slots in the collection.
        len: usize,
    },
    /// A member of the wrong kind was put into a homogeneous collection.
    #[error("{found} cannot be a member of {expected}")]
    TypeMismatch {
        /// Collection type name.
        expected: &'static str,
        /// Rejected member type name.
        found: &'static str,
    },
    /// Topological operations were requested, but no engine is installed.
    #[error("no geometry predicate engine is installed")]
    EngineUnavailable,
    /// The installed engine cannot perform the operation for the given input.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// Engine reported a failure.
    #[error("geometry engine error: {0}")]
    Engine(String),
}

impl From<hex::FromHexError> for GeometryError {
    fn from(value: hex::FromHexError) -> Self {
        Self::Serialization(format!("invalid hex WKB: {value}"))
    }
}
