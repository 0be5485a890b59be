//! The error taxonomy shared by every public operation.

use thiserror::Error;

/// Failure kinds surfaced to callers.
///
/// All checks run before any mutation, so a returned error guarantees the
/// receiver is unchanged. Emptiness discovered during a well-formed
/// operation is not an error: the receiver transitions to the empty
/// element and the operation returns normally.
#[derive(Debug, Error)]
pub enum Error {
    /// An operand mentions a space dimension beyond the receiver's.
    #[error("{op}: operand of space dimension {operand_dim} exceeds receiver dimension {receiver_dim}")]
    DimensionIncompatible {
        op: &'static str,
        receiver_dim: usize,
        operand_dim: usize,
    },
    /// Closed and not-necessarily-closed objects were mixed where the
    /// combination is meaningless.
    #[error("{op}: topology mismatch")]
    TopologyMismatch { op: &'static str },
    /// A structurally legal argument that the operation rejects, such as a
    /// strict relation in the closed domain or a non-point generator for an
    /// empty polyhedron.
    #[error("{op}: {reason}")]
    InvalidArgument { op: &'static str, reason: &'static str },
    /// The denominator of an affine transformation is zero.
    #[error("{op}: zero denominator")]
    DivisionByZero { op: &'static str },
    /// `map_space_dimensions` received a map that is not a partial
    /// injection bounded by the space dimension.
    #[error("{op}: {reason}")]
    InvalidMap { op: &'static str, reason: &'static str },
    /// `ascii_load` rejected its input.
    #[error("malformed input: {0}")]
    MalformedInput(#[from] anyhow::Error),
    /// The cooperative deadline installed through [`crate::Engine`] fired.
    #[error("{op}: deadline exceeded")]
    Timeout { op: &'static str },
    /// An internal consistency check failed; reserved for defensive code.
    #[error("internal invariant broken: {0}")]
    InvariantBroken(&'static str),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
