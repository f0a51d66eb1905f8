use shared::domain::ResourceKind;
use thiserror::Error;

use crate::mutation::MutationAction;

/// Failure of a read or write request against the REST backend.
///
/// Kept `Clone` so a track can hold on to its last error while the previous
/// good data stays visible.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("no credential available for the request")]
    MissingCredential,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl NetworkError {
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, NetworkError::MissingCredential)
            || matches!(self.status(), Some(401 | 403))
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            NetworkError::Decode(value.to_string())
        } else {
            NetworkError::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(value: serde_json::Error) -> Self {
        NetworkError::Decode(value.to_string())
    }
}

/// Business-rule violation caught before anything is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("cannot assign both {first} and {second} roles")]
    ConflictingRoles {
        first: &'static str,
        second: &'static str,
    },
    #[error("{field} must not be blank")]
    BlankField { field: String },
    #[error("{action} on {resource} requires a payload")]
    MissingPayload {
        resource: ResourceKind,
        action: MutationAction,
    },
    #[error("{action} is not supported for {resource}")]
    UnsupportedAction {
        resource: ResourceKind,
        action: MutationAction,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("mutation rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Network(NetworkError),
}

impl From<NetworkError> for MutationError {
    fn from(value: NetworkError) -> Self {
        match value {
            NetworkError::Status { status, message } => MutationError::Rejected { status, message },
            other => MutationError::Network(other),
        }
    }
}

/// A response that lost the sequence race. Not an error: it is reported to
/// bookkeeping and tests, never to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleResponseDiscarded {
    pub track: TrackKind,
    pub sequence: u64,
    pub latest: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    List,
    GlobalStats,
    FilteredStats,
}

impl TrackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackKind::List => "list",
            TrackKind::GlobalStats => "global_stats",
            TrackKind::FilteredStats => "filtered_stats",
        }
    }
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no stat card named {0}")]
pub struct UnknownStatCard(pub String);
