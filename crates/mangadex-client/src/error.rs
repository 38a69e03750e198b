//! Error type shared by every client operation.

use thiserror::Error;

use crate::relationship::EntityType;

/// Errors from the MangaDex client.
#[derive(Debug, Error)]
pub enum Error {
    /// A required parameter was missing or malformed. Raised before any request is sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("auth error: {0}")]
    Auth(String),

    /// The request went through but the API reported a failure, or the payload
    /// did not have the expected shape.
    #[error("{0}")]
    Semantic(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityType, id: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// True for failures reported by the API itself rather than the transport.
    pub fn is_semantic(&self) -> bool {
        matches!(self, Self::Semantic(_) | Self::NotFound { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Rewrites a transport-level 404 as a `NotFound` for the given entity.
    pub(crate) fn into_not_found(self, kind: EntityType, id: &str) -> Self {
        match self {
            Self::Status { status: 404, .. } => Self::NotFound {
                kind,
                id: id.to_string(),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
