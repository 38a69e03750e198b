use serde_json::Value;

use super::{fetch_by_id, Entity};
use crate::api::envelope::{relationships, string};
use crate::api::{Client, CredentialGuard, Limit, QueryParams, Transport, DEFAULT_LIMIT, DEFAULT_SERVER_CAP};
use crate::error::Result;
use crate::relationship::{EntityType, Relationship};

/// Host serving cover image files.
pub const UPLOADS_URL: &str = "https://uploads.mangadex.org";

#[derive(Debug, Clone, PartialEq)]
pub struct Cover {
    pub id: String,
    pub volume: Option<String>,
    pub file_name: Option<String>,
    pub description: Option<String>,
    pub locale: Option<String>,
    pub manga: Option<Relationship>,
    pub uploader: Option<Relationship>,
}

impl Entity for Cover {
    const KIND: EntityType = EntityType::CoverArt;
    const ACCEPTS: &'static [EntityType] = &[EntityType::CoverArt];
    const PATH: &'static str = "/cover";

    fn from_envelope(raw: &Value) -> Self {
        let attributes = &raw["data"]["attributes"];
        let rels = relationships(raw);
        Self {
            id: string(&raw["data"]["id"]).unwrap_or_default(),
            volume: string(&attributes["volume"]),
            file_name: string(&attributes["fileName"]),
            description: string(&attributes["description"]),
            locale: string(&attributes["locale"]),
            manga: Relationship::first_of(EntityType::Manga, rels),
            uploader: Relationship::first_of(EntityType::User, rels),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Cover {
    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<Cover>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, id).await
    }

    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<Cover>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, &self.id).await
    }

    /// Covers uploaded for one manga.
    pub async fn for_manga<T, G>(client: &Client<T, G>, manga_id: &str, limit: Limit) -> Result<Vec<Cover>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        let params = QueryParams::new().with_list("manga", [manga_id]).limit(limit);
        client
            .casted_request("/cover", &params, DEFAULT_SERVER_CAP, DEFAULT_LIMIT)
            .await
    }

    /// Full-size image URL. Needs both the manga relationship and the file name.
    pub fn image_url(&self) -> Option<String> {
        let manga = self.manga.as_ref()?;
        let file = self.file_name.as_deref()?;
        Some(format!("{UPLOADS_URL}/covers/{}/{file}", manga.id))
    }
}
