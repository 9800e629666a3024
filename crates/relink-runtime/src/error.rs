#![forbid(unsafe_code)]

//! Connection failure modes.
//!
//! Mapping, accessor, equality, and sink failures are programming errors and
//! are not represented here: they panic through the update that hit them.

use relink_store::StoreError;

/// Error type for connection lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// The store refused the operation.
    Store(StoreError),
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store rejected connection: {err}"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for ConnectionError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
