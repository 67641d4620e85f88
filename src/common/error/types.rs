//! Error type shared by the tree, the codec and the repair stages.
use crate::tree::{NodeId, NodeType};
use thiserror::Error;

/// Main error type for tablemend operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The tree violates a structural invariant the repair relies on
    /// (cell index out of range, row outside a table, ...).
    ///
    /// Stages abort only the table or row being processed when they see this.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Handle does not resolve to a live node
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Handle resolved to a node of the wrong kind
    #[error("Unexpected node kind: expected {expected:?}, got {found:?}")]
    UnexpectedKind { expected: NodeType, found: NodeType },

    /// XML reading or writing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Options could not be loaded or dumped
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error only invalidates the structure currently being repaired.
    ///
    /// The top-level pass keeps going after such errors.
    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::MalformedInput(_) | Error::NodeNotFound(_) | Error::UnexpectedKind { .. }
        )
    }
}

/// Result type for tablemend operations.
pub type Result<T> = std::result::Result<T, Error>;
