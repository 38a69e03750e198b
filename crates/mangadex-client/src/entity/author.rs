use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{fetch_by_id, Entity};
use crate::api::envelope::{date, relationships, string};
use crate::api::{Client, CredentialGuard, Limit, QueryParams, Transport, DEFAULT_LIMIT, DEFAULT_SERVER_CAP};
use crate::error::Result;
use crate::localized::LocalizedString;
use crate::relationship::{EntityType, Relationship};

/// A writer or artist. Both relationship roles point at this entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub biography: LocalizedString,
    pub manga: Vec<Relationship>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Author {
    const KIND: EntityType = EntityType::Author;
    const ACCEPTS: &'static [EntityType] = &[EntityType::Author, EntityType::Artist];
    const PATH: &'static str = "/author";

    fn from_envelope(raw: &Value) -> Self {
        let attributes = &raw["data"]["attributes"];
        Self {
            id: string(&raw["data"]["id"]).unwrap_or_default(),
            name: string(&attributes["name"]),
            image_url: string(&attributes["imageUrl"]),
            biography: LocalizedString::from_value(&attributes["biography"]),
            manga: Relationship::convert_type(EntityType::Manga, relationships(raw)),
            created_at: date(&attributes["createdAt"]),
            updated_at: date(&attributes["updatedAt"]),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Author {
    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<Author>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, id).await
    }

    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<Author>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, &self.id).await
    }

    pub async fn search<T, G>(client: &Client<T, G>, name: &str, limit: Limit, offset: u64) -> Result<Vec<Author>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        let params = QueryParams::new().with("name", name).limit(limit).offset(offset);
        client
            .casted_request("/author", &params, DEFAULT_SERVER_CAP, DEFAULT_LIMIT)
            .await
    }

    pub fn biography(&self, locale: &str) -> Option<&str> {
        self.biography.local_string(locale)
    }
}
