//! Typed entities built from response envelopes.
//!
//! Parsing never fails: every entity reads its envelope through defensive
//! lookups and leaves unreadable fields as `None`. Callers that need to tell
//! a malformed payload from an absent field use [`Entity::from_envelope_strict`].

mod author;
mod chapter;
mod cover;
mod group;
mod list;
mod manga;
mod tag;
mod user;

pub use author::Author;
pub use chapter::{Chapter, FeedParams};
pub use cover::Cover;
pub use group::Group;
pub use list::{List, Visibility};
pub use manga::{ContentRating, Demographic, Manga, MangaSearch, PublicationStatus, TagMode};
pub use tag::Tag;
pub use user::User;

use serde_json::Value;
use tracing::debug;

use crate::api::envelope::{ensure_data, ensure_found, validate_envelope};
use crate::api::{Client, CredentialGuard, Method, Transport};
use crate::error::{Error, Result};
use crate::relationship::EntityType;

/// A server-side record with a stable id and a fetch-by-id endpoint.
pub trait Entity: Sized {
    /// Type tag this entity is fetched as.
    const KIND: EntityType;
    /// Relationship types that point at this entity.
    const ACCEPTS: &'static [EntityType];
    /// Collection path, e.g. `/manga`.
    const PATH: &'static str;
    /// Whether fetching requires validated credentials.
    const AUTHENTICATED: bool = false;

    /// Best-effort parse of a full envelope.
    fn from_envelope(raw: &Value) -> Self;

    fn id(&self) -> &str;

    /// Parse only if the envelope has the expected shape.
    fn from_envelope_strict(raw: &Value) -> Result<Self> {
        validate_envelope(raw)?;
        Ok(Self::from_envelope(raw))
    }
}

/// Either a bare id waiting to be fetched, or a fully parsed entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<E> {
    Stub(String),
    Hydrated(E),
}

impl<E: Entity> Resource<E> {
    pub fn stub(id: impl Into<String>) -> Self {
        Self::Stub(id.into())
    }

    pub fn from_envelope(raw: &Value) -> Self {
        Self::Hydrated(E::from_envelope(raw))
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Stub(id) => id,
            Self::Hydrated(entity) => entity.id(),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Stub(_))
    }

    pub fn hydrated(&self) -> Option<&E> {
        match self {
            Self::Stub(_) => None,
            Self::Hydrated(entity) => Some(entity),
        }
    }

    /// Fetch the current server state. Works on stubs and on hydrated values
    /// being refreshed; the receiver is left untouched.
    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<E>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, self.id()).await
    }
}

impl<E> From<&str> for Resource<E> {
    fn from(id: &str) -> Self {
        Self::Stub(id.to_string())
    }
}

impl<E> From<String> for Resource<E> {
    fn from(id: String) -> Self {
        Self::Stub(id)
    }
}

/// GET `{E::PATH}/{id}` and parse the envelope.
pub(crate) async fn fetch_by_id<E, T, G>(client: &Client<T, G>, id: &str) -> Result<E>
where
    E: Entity,
    T: Transport,
    G: CredentialGuard,
{
    if id.is_empty() {
        return Err(Error::invalid(format!("attempted to fetch {} with no id", E::KIND)));
    }
    if E::AUTHENTICATED {
        client.authorize().await?;
    }

    let kind = E::KIND;
    debug!(%kind, id, "Fetching entity");
    let raw = client
        .request(&format!("{}/{id}", E::PATH), Method::GET, None)
        .await
        .map_err(|e| e.into_not_found(kind, id))?;
    ensure_found(&raw, kind, id)?;
    ensure_data(&raw)?;
    Ok(E::from_envelope(&raw))
}
