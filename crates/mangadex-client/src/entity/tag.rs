use serde_json::Value;

use crate::api::envelope::{ensure_ok, page_items, string};
use crate::api::{Client, CredentialGuard, Method, Transport};
use crate::error::{Error, Result};
use crate::localized::LocalizedString;
use crate::relationship::EntityType;

/// A catalog tag (genre, theme, format, content warning).
///
/// Tags arrive embedded in manga attributes; there is no per-tag endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub id: String,
    pub name: LocalizedString,
    pub description: LocalizedString,
    /// `genre`, `theme`, `format` or `content`
    pub group: Option<String>,
}

impl Tag {
    /// Parse a `{id, type, attributes}` resource.
    pub fn from_resource(raw: &Value) -> Self {
        let attributes = &raw["attributes"];
        Self {
            id: string(&raw["id"]).unwrap_or_default(),
            name: LocalizedString::from_value(&attributes["name"]),
            description: LocalizedString::from_value(&attributes["description"]),
            group: string(&attributes["group"]),
        }
    }

    pub fn from_envelope(raw: &Value) -> Self {
        Self::from_resource(&raw["data"])
    }

    pub fn name(&self, locale: &str) -> Option<&str> {
        self.name.local_string(locale)
    }

    /// The full tag catalog.
    pub async fn all<T, G>(client: &Client<T, G>) -> Result<Vec<Tag>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        let raw = client.request("/manga/tag", Method::GET, None).await?;
        ensure_ok(&raw, "Failed to get tag list")?;
        Ok(page_items(&raw)?.iter().map(Tag::from_envelope).collect())
    }

    /// Look up one tag in the catalog.
    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<Tag>
    where
        T: Transport,
        G: CredentialGuard,
    {
        Self::all(client)
            .await?
            .into_iter()
            .find(|tag| tag.id == id)
            .ok_or_else(|| Error::NotFound {
                kind: EntityType::Tag,
                id: id.to_string(),
            })
    }

    /// Tags whose name in any locale matches `name`, ignoring case.
    pub async fn find_by_name<T, G>(client: &Client<T, G>, name: &str) -> Result<Vec<Tag>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        let needle = name.to_lowercase();
        Ok(Self::all(client)
            .await?
            .into_iter()
            .filter(|tag| {
                tag.name
                    .locales()
                    .filter_map(|l| tag.name.get(l))
                    .any(|n| n.to_lowercase() == needle)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;

    fn catalog() -> MockTransport {
        MockTransport::new(|call| {
            assert_eq!(call.path, "/manga/tag");
            Ok(json!({
                "results": [
                    { "result": "ok", "data": { "id": "t1", "type": "tag", "attributes": { "name": { "en": "Action" }, "group": "genre" } } },
                    { "result": "ok", "data": { "id": "t2", "type": "tag", "attributes": { "name": { "en": "Isekai" }, "group": "theme" } } }
                ]
            }))
        })
    }

    #[tokio::test]
    async fn test_get_finds_in_catalog() {
        let client = Client::new(catalog());
        let tag = Tag::get(&client, "t2").await.unwrap();
        assert_eq!(tag.name("en"), Some("Isekai"));
        assert_eq!(tag.group.as_deref(), Some("theme"));

        let err = Tag::get(&client, "t9").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let client = Client::new(catalog());
        let tags = Tag::find_by_name(&client, "action").await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, "t1");
    }

    #[test]
    fn test_from_resource_is_lenient() {
        let tag = Tag::from_resource(&json!({ "id": "t1" }));
        assert_eq!(tag.id, "t1");
        assert!(tag.name.is_empty());
        assert!(tag.group.is_none());
    }
}
