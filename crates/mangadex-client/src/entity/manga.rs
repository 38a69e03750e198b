use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::chapter::fetch_feed;
use super::{fetch_by_id, Chapter, Cover, Entity, FeedParams, Tag};
use crate::api::envelope::{date, ensure_data, ensure_ok, integer, number, relationships, string};
use crate::api::{Client, CredentialGuard, Limit, Method, QueryParams, Transport};
use crate::error::Result;
use crate::localized::LocalizedString;
use crate::relationship::{EntityType, Relationship};

const SEARCH_SERVER_CAP: u64 = 100;
const SEARCH_DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationStatus {
    Ongoing,
    Completed,
    Hiatus,
    Abandoned,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Demographic {
    Shounen,
    Shoujo,
    Josei,
    Seinen,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRating {
    Safe,
    Suggestive,
    Erotica,
    Pornographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagMode {
    And,
    Or,
}

/// Wire name of a unit-variant enum, via its serde representation.
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default()
}

/// Parse a string enum, dropping values this client does not know.
fn known<T: for<'de> Deserialize<'de>>(value: &Value) -> Option<T> {
    serde_json::from_value(value.clone()).ok()
}

/// A manga title with its metadata and unresolved relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct Manga {
    pub id: String,
    pub localized_title: LocalizedString,
    pub localized_alt_titles: Vec<LocalizedString>,
    pub localized_description: LocalizedString,
    pub is_locked: Option<bool>,
    /// Site code to URL or id, e.g. `("mal", "13")`
    pub links: Vec<(String, String)>,
    pub original_language: Option<String>,
    pub last_volume: Option<f64>,
    pub last_chapter: Option<String>,
    pub publication_demographic: Option<Demographic>,
    pub status: Option<PublicationStatus>,
    pub year: Option<i32>,
    pub content_rating: Option<ContentRating>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub authors: Vec<Relationship>,
    pub artists: Vec<Relationship>,
    pub chapters: Vec<Relationship>,
    /// Latest `cover_art` relationship, if any.
    pub main_cover: Option<Relationship>,
    pub tags: Vec<Tag>,
}

impl Entity for Manga {
    const KIND: EntityType = EntityType::Manga;
    const ACCEPTS: &'static [EntityType] = &[EntityType::Manga];
    const PATH: &'static str = "/manga";

    fn from_envelope(raw: &Value) -> Self {
        let attributes = &raw["data"]["attributes"];
        let rels = relationships(raw);

        Self {
            id: string(&raw["data"]["id"]).unwrap_or_default(),
            localized_title: LocalizedString::from_value(&attributes["title"]),
            localized_alt_titles: attributes["altTitles"]
                .as_array()
                .map(|titles| titles.iter().map(LocalizedString::from_value).collect())
                .unwrap_or_default(),
            localized_description: LocalizedString::from_value(&attributes["description"]),
            is_locked: attributes["isLocked"].as_bool(),
            links: attributes["links"]
                .as_object()
                .map(|links| {
                    links
                        .iter()
                        .filter_map(|(site, v)| Some((site.clone(), v.as_str()?.to_string())))
                        .collect()
                })
                .unwrap_or_default(),
            original_language: string(&attributes["originalLanguage"]),
            last_volume: number(&attributes["lastVolume"]),
            last_chapter: string(&attributes["lastChapter"]),
            publication_demographic: known(&attributes["publicationDemographic"]),
            status: known(&attributes["status"]),
            year: integer(&attributes["year"]).and_then(|y| i32::try_from(y).ok()),
            content_rating: known(&attributes["contentRating"]),
            created_at: date(&attributes["createdAt"]),
            updated_at: date(&attributes["updatedAt"]),
            authors: Relationship::convert_type(EntityType::Author, rels),
            artists: Relationship::convert_type(EntityType::Artist, rels),
            chapters: Relationship::convert_type(EntityType::Chapter, rels),
            main_cover: Relationship::last_of(EntityType::CoverArt, rels),
            tags: attributes["tags"]
                .as_array()
                .map(|tags| tags.iter().map(Tag::from_resource).collect())
                .unwrap_or_default(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Manga {
    /// Title in `locale`, falling back to English and then any locale.
    pub fn title(&self, locale: &str) -> Option<&str> {
        self.localized_title.local_string(locale)
    }

    pub fn alt_titles(&self, locale: &str) -> Vec<&str> {
        self.localized_alt_titles
            .iter()
            .filter_map(|t| t.local_string(locale))
            .collect()
    }

    pub fn description(&self, locale: &str) -> Option<&str> {
        self.localized_description.local_string(locale)
    }

    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<Manga>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, id).await
    }

    /// Re-fetch this manga; the receiver is left as it was.
    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<Manga>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, &self.id).await
    }

    /// Search the catalog. `limit` may exceed the per-request cap.
    pub async fn search<T, G>(
        client: &Client<T, G>,
        search: impl Into<MangaSearch>,
        limit: Limit,
        offset: u64,
    ) -> Result<Vec<Manga>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        let params = search.into().to_query().limit(limit).offset(offset);
        let results = client
            .casted_request("/manga", &params, SEARCH_SERVER_CAP, SEARCH_DEFAULT_LIMIT)
            .await?;
        info!(results = results.len(), "Manga search complete");
        Ok(results)
    }

    pub async fn random<T, G>(client: &Client<T, G>) -> Result<Manga>
    where
        T: Transport,
        G: CredentialGuard,
    {
        let raw = client.request("/manga/random", Method::GET, None).await?;
        ensure_ok(&raw, "Failed to get random manga")?;
        ensure_data(&raw)?;
        Ok(Manga::from_envelope(&raw))
    }

    /// Manga followed by the logged-in user.
    pub async fn followed<T, G>(client: &Client<T, G>, limit: Limit, offset: u64) -> Result<Vec<Manga>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        client.authorize().await?;
        let params = QueryParams::new().limit(limit).offset(offset);
        client
            .casted_request("/user/follows/manga", &params, SEARCH_SERVER_CAP, 100)
            .await
    }

    /// Most recent chapters of the manga with this id.
    pub async fn feed_of<T, G>(client: &Client<T, G>, id: &str, feed: &FeedParams) -> Result<Vec<Chapter>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_feed(client, &format!("/manga/{id}/feed"), feed).await
    }

    pub async fn feed<T, G>(&self, client: &Client<T, G>, feed: &FeedParams) -> Result<Vec<Chapter>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        Self::feed_of(client, &self.id, feed).await
    }

    /// Every cover uploaded for this manga, not just the main one.
    pub async fn covers<T, G>(&self, client: &Client<T, G>) -> Result<Vec<Cover>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        Cover::for_manga(client, &self.id, Limit::Unbounded).await
    }
}

/// Structured manga search. Converts from a plain title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MangaSearch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub authors: Vec<String>,
    pub artists: Vec<String>,
    pub included_tags: Vec<String>,
    pub included_tags_mode: Option<TagMode>,
    pub excluded_tags: Vec<String>,
    pub excluded_tags_mode: Option<TagMode>,
    pub status: Vec<PublicationStatus>,
    pub original_language: Vec<String>,
    pub publication_demographic: Vec<Demographic>,
    /// At most 100 ids per request.
    pub ids: Vec<String>,
    pub content_rating: Vec<ContentRating>,
    pub created_at_since: Option<String>,
    pub updated_at_since: Option<String>,
    pub order: Vec<(String, String)>,
}

impl MangaSearch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(title) = &self.title {
            params = params.with("title", title);
        }
        if let Some(year) = self.year {
            params = params.with("year", year);
        }

        let lists: [(&str, Vec<String>); 9] = [
            ("authors", self.authors.clone()),
            ("artists", self.artists.clone()),
            ("includedTags", self.included_tags.clone()),
            ("excludedTags", self.excluded_tags.clone()),
            ("status", self.status.iter().map(wire_name).collect()),
            ("originalLanguage", self.original_language.clone()),
            (
                "publicationDemographic",
                self.publication_demographic.iter().map(wire_name).collect(),
            ),
            ("ids", self.ids.clone()),
            ("contentRating", self.content_rating.iter().map(wire_name).collect()),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                params = params.with_list(key, values);
            }
        }

        if let Some(mode) = &self.included_tags_mode {
            params = params.with("includedTagsMode", wire_name(mode));
        }
        if let Some(mode) = &self.excluded_tags_mode {
            params = params.with("excludedTagsMode", wire_name(mode));
        }
        if let Some(since) = &self.created_at_since {
            params = params.with("createdAtSince", since);
        }
        if let Some(since) = &self.updated_at_since {
            params = params.with("updatedAtSince", since);
        }
        if !self.order.is_empty() {
            params = params.with_map("order", self.order.iter().cloned());
        }
        params
    }
}

impl From<&str> for MangaSearch {
    fn from(title: &str) -> Self {
        Self::title(title)
    }
}

impl From<String> for MangaSearch {
    fn from(title: String) -> Self {
        Self::title(title)
    }
}
