use std::path::PathBuf;

/// Errors returned by the link and shell stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Bad link name, unusable path, or a path whose shape contradicts the request.
    #[error("{0}")]
    Validation(String),

    /// The name or path is already taken.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The `after` edges among active shell entries form a cycle.
    #[error("shell.d: cycle in --after dependency involving: {}", nodes.join(", "))]
    Cycle { nodes: Vec<String> },

    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }
}
