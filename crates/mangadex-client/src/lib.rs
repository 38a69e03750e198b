//! Typed client for the MangaDex REST API.
//!
//! Raw JSON envelopes are turned into entities ([`Manga`], [`List`],
//! [`Chapter`], ...) whose references to other entities stay unresolved
//! [`Relationship`]s until a caller asks for them. Collection endpoints go
//! through one paginating caster that splits a logical `limit`/`offset`
//! window into capped requests.
//!
//! Every operation takes a [`Client`], which carries the transport, the
//! credential guard and the locale. Nothing is global.

pub mod api;
pub mod entity;
pub mod error;
pub mod localized;
pub mod relationship;

pub use api::{
    Client, CredentialGuard, HttpTransport, Limit, NoCredentials, QueryParams, StaticToken,
    Transport, TransportConfig,
};
pub use entity::{
    Author, Chapter, ContentRating, Cover, Demographic, Entity, FeedParams, Group, List, Manga,
    MangaSearch, PublicationStatus, Resource, Tag, TagMode, User, Visibility,
};
pub use error::{Error, Result};
pub use localized::LocalizedString;
pub use relationship::{EntityType, Relationship, Resolved};
