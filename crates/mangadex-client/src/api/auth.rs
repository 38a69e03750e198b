use std::future::Future;

use crate::error::{Error, Result};

/// Checks credentials before an authenticated call.
///
/// Implementations may refresh tokens; any failure aborts the operation that
/// asked for validation.
pub trait CredentialGuard: Send + Sync {
    fn validate(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Anonymous access. Every authenticated operation is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialGuard for NoCredentials {
    async fn validate(&self) -> Result<()> {
        Err(Error::Auth("not logged in".into()))
    }
}

/// A session token obtained elsewhere. Valid while non-empty.
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl CredentialGuard for StaticToken {
    async fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::Auth("session token is empty".into()));
        }
        Ok(())
    }
}
