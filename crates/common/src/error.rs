//! Errors for loading blockflow program graphs.

use thiserror::Error;

/// Errors that occur while reading a program graph document.
///
/// Graph *content* problems (dangling `next`/`body` ids, unknown block
/// types) are not errors: the compiler degrades around them. Only
/// documents that cannot be turned into a [`BlockGraph`](crate::BlockGraph)
/// at all end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The document is not valid JSON or does not have the graph shape.
    #[error("malformed graph document: {0}")]
    Malformed(String),

    /// Two nodes share the same id.
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    /// A node keyed by one id declares a different `id` field.
    #[error("node keyed '{key}' declares id '{id}'")]
    IdMismatch { key: String, id: String },
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Malformed(err.to_string())
    }
}
