//! crates/storyhub_core/src/error.rs
//!
//! Errors surfaced by the core services to the presentation layer.

use crate::ports::PortError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// No token is stored and the operation needs the network.
    #[error("You need to log in first")]
    AuthRequired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Neither the network nor the local store could supply the data.
    #[error("{}", offline_miss_message(.cause))]
    NoOfflineData { cause: Option<PortError> },

    /// A storage or remote failure on a path that does not fall back.
    #[error(transparent)]
    Port(#[from] PortError),
}

impl SyncError {
    /// The remote failure that preceded an exhausted fallback, if any.
    pub fn remote_cause(&self) -> Option<&PortError> {
        match self {
            SyncError::NoOfflineData { cause } => cause.as_ref(),
            SyncError::Port(e) => Some(e),
            _ => None,
        }
    }
}

fn offline_miss_message(cause: &Option<PortError>) -> String {
    match cause {
        Some(PortError::Api { message, .. }) => {
            format!("{message} (no offline data available)")
        }
        Some(other) => format!("{other} (no offline data available)"),
        None => "You are offline and no saved data is available".to_string(),
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
