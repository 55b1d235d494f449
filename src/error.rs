//! Error types for proximity queries.

use thiserror::Error;

/// Errors surfaced while loading shapes or running a query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProximityError {
    /// A shape was given with no triangles.
    #[error("shape contains no triangles")]
    EmptySet,

    /// A query ran before both shapes were loaded.
    #[error("both shapes must be loaded before querying")]
    NotLoaded,

    /// The cancellation flag was raised mid-query.
    #[error("query cancelled")]
    Cancelled,

    /// Topology that does not describe a valid triangle set.
    #[error("malformed triangle set: {0}")]
    MalformedSet(String),
}

pub type ProximityResult<V> = Result<V, ProximityError>;
