//! Crate-wide error type.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::ElementId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the graph, the traversal engine and the recommenders.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A referenced vertex id is not present in the graph.
    #[error("vertex {0} not found")]
    NotFound(ElementId),
    /// `add_vertex` was called with an id that is already taken.
    #[error("duplicate vertex id {0}")]
    DuplicateId(ElementId),
    /// A pipeline or query was driven in a way its construction does not allow.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A caller-supplied argument (log filter, step list, ...) is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// No recommender is registered under the requested name.
    #[error("unknown recommender strategy '{0}'")]
    UnknownStrategy(String),
    /// Configuration could not be read or parsed.
    #[error("config error in {}: {message}", path.display())]
    Config {
        /// File the configuration was read from.
        path: PathBuf,
        /// Parser or reader message.
        message: String,
    },
    /// The recommendation store rejected a write.
    #[error("recommendation store error: {0}")]
    Store(String),
    /// I/O failure while reading a snapshot or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Snapshot or output (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GraphError {
    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        GraphError::InvalidState(msg.into())
    }
}
