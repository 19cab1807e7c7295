// ============================================================================
// cirkit - Errors
// ============================================================================

use thiserror::Error;

use crate::render::{NodeRef, RenderError};

pub type Result<T> = std::result::Result<T, CircuitError>;

/// Everything that can go wrong inside the bus, collections, binders and router.
#[derive(Debug, Error)]
pub enum CircuitError {
    /// Out-of-range access on a collection or node index.
    #[error("index {index} out of range for length {len}")]
    Index { index: usize, len: usize },

    /// A dotted path does not name a mounted component or template node.
    #[error("no mounted component at path `{path}`")]
    UnresolvedPath { path: String },

    /// The path is mounted but never declared the signal.
    #[error("component `{path}` does not declare signal `{signal}`")]
    UndeclaredSignal { path: String, signal: String },

    /// Item-event delegation walked to the root without meeting a bound collection.
    #[error("node {node} is not inside a bound collection")]
    MissingCollectionMarker { node: NodeRef },

    #[error("signal cascade exceeded {limit} dispatched entries")]
    CascadeOverflow { limit: usize },

    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("render target error: {0}")]
    Render(#[from] RenderError),

    /// Raised by application slots.
    #[error("slot for `{signal}` failed: {message}")]
    Slot { signal: String, message: String },
}

impl CircuitError {
    #[must_use]
    pub fn index(index: usize, len: usize) -> Self {
        Self::Index { index, len }
    }

    #[must_use]
    pub fn unresolved(path: impl Into<String>) -> Self {
        Self::UnresolvedPath { path: path.into() }
    }

    #[must_use]
    pub fn slot(signal: impl AsRef<str>, message: impl Into<String>) -> Self {
        Self::Slot {
            signal: signal.as_ref().to_string(),
            message: message.into(),
        }
    }
}
