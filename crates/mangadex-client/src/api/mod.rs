//! Request plumbing between entities and the transport.
//!
//! [`Client`] bundles a [`Transport`], a [`CredentialGuard`] and the locale used
//! to resolve localized strings. It is passed explicitly into every operation.

pub mod auth;
pub mod envelope;
#[cfg(test)]
pub(crate) mod mock;
pub mod paginate;
pub mod query;
pub mod rate_limiter;
pub mod transport;

pub use auth::{CredentialGuard, NoCredentials, StaticToken};
pub use paginate::{fetch_page, DEFAULT_LIMIT, DEFAULT_SERVER_CAP};
pub use query::{Limit, QueryParams, QueryValue};
pub use rate_limiter::RateLimiter;
pub use reqwest::Method;
pub use transport::{HttpTransport, Transport, TransportConfig};

use serde_json::Value;
use tracing::debug;

use crate::entity::Entity;
use crate::error::Result;
use crate::localized::DEFAULT_LOCALE;

/// Credential context plus transport, threaded through every operation.
pub struct Client<T, G = NoCredentials> {
    transport: T,
    guard: G,
    locale: String,
}

impl<T: Transport> Client<T, NoCredentials> {
    /// An anonymous client. Authenticated operations fail with `Error::Auth`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            guard: NoCredentials,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl<T: Transport, G: CredentialGuard> Client<T, G> {
    /// Swap the credential guard, keeping transport and locale.
    ///
    /// The guard only decides whether authenticated calls may proceed; the
    /// transport supplies the credentials on the wire. For [`HttpTransport`],
    /// pass the guard from [`HttpTransport::credentials`].
    pub fn with_guard<G2: CredentialGuard>(self, guard: G2) -> Client<T, G2> {
        Client {
            transport: self.transport,
            guard,
            locale: self.locale,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn guard(&self) -> &G {
        &self.guard
    }

    /// Validate (and if needed refresh) credentials. Must precede every authenticated call.
    pub async fn authorize(&self) -> Result<()> {
        self.guard.validate().await
    }

    pub async fn request(&self, path: &str, method: Method, body: Option<&Value>) -> Result<Value> {
        debug!(%method, path, "API request");
        self.transport.request(path, method, body).await
    }

    pub async fn parameterized_request(&self, path: &str, params: &QueryParams) -> Result<Value> {
        debug!(path, "API parameterized request");
        self.transport.parameterized_request(path, params).await
    }

    /// Fetch a logical `limit`/`offset` window of `E` in pages of at most `server_cap`.
    pub async fn casted_request<E: Entity>(
        &self,
        path: &str,
        params: &QueryParams,
        server_cap: u64,
        default_limit: u64,
    ) -> Result<Vec<E>> {
        fetch_page(self, path, params, server_cap, default_limit).await
    }
}
