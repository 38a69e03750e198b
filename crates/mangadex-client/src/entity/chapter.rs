use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{fetch_by_id, Entity};
use crate::api::envelope::{date, integer, relationships, string};
use crate::api::{Client, CredentialGuard, Limit, QueryParams, Transport, DEFAULT_LIMIT, DEFAULT_SERVER_CAP};
use crate::error::Result;
use crate::relationship::{EntityType, Relationship};

/// Per-request maximum of the feed endpoints.
pub(crate) const FEED_SERVER_CAP: u64 = 500;
pub(crate) const FEED_DEFAULT_LIMIT: u64 = 100;

/// A single scanlated chapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub title: Option<String>,
    pub volume: Option<String>,
    /// Chapter number as published, e.g. `"10.5"`
    pub chapter: Option<String>,
    pub translated_language: Option<String>,
    pub pages: Option<u32>,
    pub publish_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub manga: Option<Relationship>,
    pub groups: Vec<Relationship>,
    pub uploader: Option<Relationship>,
}

impl Entity for Chapter {
    const KIND: EntityType = EntityType::Chapter;
    const ACCEPTS: &'static [EntityType] = &[EntityType::Chapter];
    const PATH: &'static str = "/chapter";

    fn from_envelope(raw: &Value) -> Self {
        let attributes = &raw["data"]["attributes"];
        let rels = relationships(raw);

        Self {
            id: string(&raw["data"]["id"]).unwrap_or_default(),
            title: string(&attributes["title"]),
            volume: string(&attributes["volume"]),
            chapter: string(&attributes["chapter"]),
            translated_language: string(&attributes["translatedLanguage"]),
            pages: integer(&attributes["pages"]).and_then(|n| u32::try_from(n).ok()),
            publish_at: date(&attributes["publishAt"]),
            created_at: date(&attributes["createdAt"]),
            updated_at: date(&attributes["updatedAt"]),
            manga: Relationship::first_of(EntityType::Manga, rels),
            groups: Relationship::convert_type(EntityType::ScanlationGroup, rels),
            uploader: Relationship::first_of(EntityType::User, rels),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Chapter {
    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<Chapter>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, id).await
    }

    /// Re-fetch this chapter; the receiver is left as it was.
    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<Chapter>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, &self.id).await
    }

    /// Chapter search with raw query parameters (`manga`, `groups[]`, `translatedLanguage[]`, ...).
    pub async fn search<T, G>(client: &Client<T, G>, params: &QueryParams) -> Result<Vec<Chapter>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        client
            .casted_request("/chapter", params, DEFAULT_SERVER_CAP, DEFAULT_LIMIT)
            .await
    }

    /// Display label such as `Vol. 3 Ch. 21`.
    pub fn label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(volume) = &self.volume {
            parts.push(format!("Vol. {volume}"));
        }
        match &self.chapter {
            Some(chapter) => parts.push(format!("Ch. {chapter}")),
            None => parts.push("Oneshot".to_string()),
        }
        parts.join(" ")
    }
}

/// Filters for manga and list chapter feeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedParams {
    pub translated_language: Vec<String>,
    /// `YYYY-MM-DDTHH:MM:SS`
    pub created_at_since: Option<String>,
    pub updated_at_since: Option<String>,
    pub publish_at_since: Option<String>,
    /// e.g. `[("chapter", "asc")]`
    pub order: Vec<(String, String)>,
    /// Not bounded by the server cap.
    pub limit: Option<Limit>,
    pub offset: u64,
}

impl FeedParams {
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if !self.translated_language.is_empty() {
            params = params.with_list("translatedLanguage", self.translated_language.iter().cloned());
        }
        for (key, value) in [
            ("createdAtSince", &self.created_at_since),
            ("updatedAtSince", &self.updated_at_since),
            ("publishAtSince", &self.publish_at_since),
        ] {
            if let Some(value) = value {
                params = params.with(key, value);
            }
        }
        if !self.order.is_empty() {
            params = params.with_map("order", self.order.iter().cloned());
        }
        params.limit = self.limit;
        params.offset = self.offset;
        params
    }
}

/// Shared body of the manga and list feed operations.
pub(crate) async fn fetch_feed<T, G>(
    client: &Client<T, G>,
    path: &str,
    feed: &FeedParams,
) -> Result<Vec<Chapter>>
where
    T: Transport,
    G: CredentialGuard,
{
    client
        .casted_request(path, &feed.to_query(), FEED_SERVER_CAP, FEED_DEFAULT_LIMIT)
        .await
}
