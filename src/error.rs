use thiserror::Error;

/// Result alias for `billet`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction, community detection and assignment.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Total free space is smaller than the number of people to place.
    #[error("total free capacity {capacity} cannot hold {required} people")]
    InfeasibleCapacity {
        /// Free places across all groups.
        capacity: usize,
        /// People waiting to be placed.
        required: usize,
    },

    /// Too many consecutive passes placed nobody.
    #[error("no community could be placed after {stalled_passes} stalled passes ({remaining} people unplaced)")]
    NoProgress {
        /// Consecutive passes without a placement.
        stalled_passes: usize,
        /// People still in the working graph.
        remaining: usize,
    },

    /// A batch of members does not fit into a group.
    #[error("group '{label}' has {remaining} free places, cannot add {requested}")]
    CapacityExceeded {
        /// Group label.
        label: String,
        /// Free places in the group.
        remaining: usize,
        /// Size of the rejected batch.
        requested: usize,
    },

    /// A group was declared with zero capacity.
    #[error("group '{label}' must have a positive capacity")]
    InvalidCapacity {
        /// Group label.
        label: String,
    },

    /// The same person id was supplied twice.
    #[error("person {0} appears more than once")]
    DuplicatePerson(String),

    /// A connection or lookup referenced a person not in the graph.
    #[error("unknown person {0}")]
    UnknownPerson(String),

    /// A person could not be mapped to a restricted category.
    #[error("person {0} has no restricted category")]
    UncategorizedPerson(String),

    /// A community oracle returned labels that do not cover the graph.
    #[error("partition has {found} labels for {expected} nodes")]
    MalformedPartition {
        /// Nodes in the snapshot.
        expected: usize,
        /// Labels returned.
        found: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Malformed JSON input.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
