use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::chapter::fetch_feed;
use super::{fetch_by_id, Chapter, Entity, FeedParams};
use crate::api::envelope::{ensure_data, ensure_found, ensure_ok, integer, relationships, string};
use crate::api::{Client, CredentialGuard, Limit, Method, QueryParams, Transport};
use crate::error::{Error, Result};
use crate::relationship::{EntityType, Relationship};

const LISTS_SERVER_CAP: u64 = 100;
const LISTS_DEFAULT_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(Error::invalid(format!(
                "visibility must be `public` or `private`, got `{other}`"
            ))),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-curated, ordered collection of manga.
///
/// Operations that change the list on the server take `&mut self` and update
/// the local copy once the server accepts the change. The `version` token is
/// echoed on every update but is not re-read afterwards, so a second update
/// through the same value may be rejected as stale.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub id: String,
    pub name: Option<String>,
    /// Concurrency token; required by every update.
    pub version: Option<u64>,
    /// `None` when the server sent something other than `public`/`private`.
    pub visibility: Option<Visibility>,
    pub owner_name: Option<String>,
    /// Member manga in server order.
    pub manga: Vec<Relationship>,
    pub owner: Option<Relationship>,
}

impl Entity for List {
    const KIND: EntityType = EntityType::CustomList;
    const ACCEPTS: &'static [EntityType] = &[EntityType::CustomList];
    const PATH: &'static str = "/list";
    const AUTHENTICATED: bool = true;

    fn from_envelope(raw: &Value) -> Self {
        let attributes = &raw["data"]["attributes"];
        let rels = relationships(raw);
        let owner = string(&attributes["owner"]["id"])
            .filter(|id| !id.is_empty())
            .map(|id| Relationship::new(EntityType::User, id))
            .or_else(|| Relationship::first_of(EntityType::User, rels));

        Self {
            id: string(&raw["data"]["id"]).unwrap_or_default(),
            name: string(&attributes["name"]),
            version: integer(&attributes["version"]).and_then(|v| u64::try_from(v).ok()),
            visibility: attributes["visibility"].as_str().and_then(|v| v.parse().ok()),
            owner_name: string(&attributes["owner"]["attributes"]["username"]),
            manga: Relationship::convert_type(EntityType::Manga, rels),
            owner,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl List {
    /// `Some(true)` if public, `Some(false)` if private, `None` if unknown.
    pub fn is_public(&self) -> Option<bool> {
        self.visibility.map(|v| v == Visibility::Public)
    }

    pub fn manga_ids(&self) -> Vec<&str> {
        self.manga.iter().map(|r| r.id.as_str()).collect()
    }

    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<List>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, id).await
    }

    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<List>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, &self.id).await
    }

    /// Create a list owned by the logged-in user. Visibility defaults to private.
    pub async fn create<T, G, S>(
        client: &Client<T, G>,
        name: &str,
        manga: &[S],
        visibility: Option<Visibility>,
    ) -> Result<List>
    where
        T: Transport,
        G: CredentialGuard,
        S: AsRef<str>,
    {
        if name.is_empty() {
            return Err(Error::invalid("list name must not be empty"));
        }
        let ids = non_empty_ids(manga)?;
        client.authorize().await?;

        let body = json!({
            "name": name,
            "manga": ids,
            "visibility": visibility.unwrap_or(Visibility::Private),
        });
        let raw = client.request("/list", Method::POST, Some(&body)).await?;
        ensure_ok(&raw, "Failed to create list")?;
        ensure_data(&raw)?;
        let list = List::from_envelope(&raw);
        info!(id = %list.id, name, "Created list");
        Ok(list)
    }

    pub async fn delete_by_id<T, G>(client: &Client<T, G>, id: &str) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        require_id(id, "list")?;
        client.authorize().await?;
        let raw = client
            .request(&format!("/list/{id}"), Method::DELETE, None)
            .await
            .map_err(|e| e.into_not_found(EntityType::CustomList, id))?;
        ensure_found(&raw, EntityType::CustomList, id)?;
        info!(id, "Deleted list");
        Ok(())
    }

    /// Add one manga to a list by ids, without fetching the list.
    pub async fn add_manga_to<T, G>(client: &Client<T, G>, list_id: &str, manga_id: &str) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        membership_request(client, Method::POST, list_id, manga_id).await
    }

    pub async fn remove_manga_from<T, G>(client: &Client<T, G>, list_id: &str, manga_id: &str) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        membership_request(client, Method::DELETE, list_id, manga_id).await
    }

    /// Lists owned by the logged-in user.
    pub async fn logged_in_user_lists<T, G>(client: &Client<T, G>, limit: Limit, offset: u64) -> Result<Vec<List>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        client.authorize().await?;
        let params = QueryParams::new().limit(limit).offset(offset);
        client
            .casted_request("/user/list", &params, LISTS_SERVER_CAP, LISTS_DEFAULT_LIMIT)
            .await
    }

    /// Public lists of another user.
    pub async fn user_lists<T, G>(client: &Client<T, G>, user_id: &str, limit: Limit, offset: u64) -> Result<Vec<List>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        require_id(user_id, "user")?;
        let params = QueryParams::new().limit(limit).offset(offset);
        client
            .casted_request(
                &format!("/user/{user_id}/list"),
                &params,
                LISTS_SERVER_CAP,
                LISTS_DEFAULT_LIMIT,
            )
            .await
    }

    /// Recent chapters across every manga in the list with this id.
    pub async fn feed_of<T, G>(client: &Client<T, G>, id: &str, feed: &FeedParams) -> Result<Vec<Chapter>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        require_id(id, "list")?;
        client.authorize().await?;
        fetch_feed(client, &format!("/list/{id}/feed"), feed).await
    }

    pub async fn feed<T, G>(&self, client: &Client<T, G>, feed: &FeedParams) -> Result<Vec<Chapter>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        Self::feed_of(client, &self.id, feed).await
    }

    pub async fn rename<T, G>(&mut self, client: &Client<T, G>, name: &str) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        if name.is_empty() {
            return Err(Error::invalid("list name must not be empty"));
        }
        self.update(client, json!({ "name": name })).await?;
        self.name = Some(name.to_string());
        Ok(())
    }

    /// Set the visibility, or toggle it when `None` is given.
    ///
    /// Toggling a list whose visibility is unknown makes it public.
    pub async fn change_visibility<T, G>(&mut self, client: &Client<T, G>, visibility: Option<Visibility>) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        let target = match (visibility, self.is_public()) {
            (Some(v), _) => v,
            (None, Some(true)) => Visibility::Private,
            (None, _) => Visibility::Public,
        };
        self.update(client, json!({ "visibility": target })).await?;
        self.visibility = Some(target);
        Ok(())
    }

    /// Replace the whole membership. The local order is taken from the server's reply.
    pub async fn update_manga_list<T, G, S>(&mut self, client: &Client<T, G>, manga: &[S]) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
        S: AsRef<str>,
    {
        let ids = non_empty_ids(manga)?;
        let raw = self.update(client, json!({ "manga": ids })).await?;
        let rels = relationships(&raw).ok_or_else(|| {
            Error::Semantic(format!("list {} update reply carries no membership", self.id))
        })?;
        self.manga = Relationship::convert_type(EntityType::Manga, Some(rels));
        Ok(())
    }

    /// Append a manga. Does nothing if it is already a member.
    pub async fn add_manga<T, G>(&mut self, client: &Client<T, G>, manga_id: &str) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        require_id(manga_id, "manga")?;
        if self.manga.iter().any(|r| r.id == manga_id) {
            return Ok(());
        }
        let mut ids: Vec<String> = self.manga.iter().map(|r| r.id.clone()).collect();
        ids.push(manga_id.to_string());
        self.update_manga_list(client, &ids).await
    }

    pub async fn remove_manga<T, G>(&mut self, client: &Client<T, G>, manga_id: &str) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        Self::remove_manga_from(client, &self.id, manga_id).await?;
        self.manga.retain(|r| r.id != manga_id);
        Ok(())
    }

    /// Delete the list on the server. The value is consumed.
    pub async fn delete<T, G>(self, client: &Client<T, G>) -> Result<()>
    where
        T: Transport,
        G: CredentialGuard,
    {
        Self::delete_by_id(client, &self.id).await
    }

    /// PUT `/list/{id}` with `changes` plus the current version.
    async fn update<T, G>(&self, client: &Client<T, G>, mut changes: Value) -> Result<Value>
    where
        T: Transport,
        G: CredentialGuard,
    {
        require_id(&self.id, "list")?;
        let version = self
            .version
            .ok_or_else(|| Error::invalid(format!("list {} has no version; fetch it before updating", self.id)))?;
        changes["version"] = json!(version);

        client.authorize().await?;
        let raw = client
            .request(&format!("/list/{}", self.id), Method::PUT, Some(&changes))
            .await
            .map_err(|e| e.into_not_found(EntityType::CustomList, &self.id))?;
        ensure_found(&raw, EntityType::CustomList, &self.id)?;
        Ok(raw)
    }
}

async fn membership_request<T, G>(client: &Client<T, G>, method: Method, list_id: &str, manga_id: &str) -> Result<()>
where
    T: Transport,
    G: CredentialGuard,
{
    require_id(list_id, "list")?;
    require_id(manga_id, "manga")?;
    client.authorize().await?;
    let raw = client
        .request(&format!("/manga/{manga_id}/list/{list_id}"), method, None)
        .await
        .map_err(|e| e.into_not_found(EntityType::CustomList, list_id))?;
    ensure_found(&raw, EntityType::CustomList, list_id)
}

fn require_id(id: &str, what: &str) -> Result<()> {
    if id.is_empty() {
        Err(Error::invalid(format!("{what} id must not be empty")))
    } else {
        Ok(())
    }
}

fn non_empty_ids<S: AsRef<str>>(manga: &[S]) -> Result<Vec<&str>> {
    manga
        .iter()
        .map(|id| {
            let id = id.as_ref();
            require_id(id, "manga").map(|()| id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::StaticToken;

    fn envelope(visibility: &str, manga: &[&str]) -> Value {
        let rels: Vec<Value> = manga
            .iter()
            .map(|id| json!({ "type": "manga", "id": id }))
            .chain([json!({ "type": "user", "id": "u1" })])
            .collect();
        json!({
            "result": "ok",
            "data": {
                "id": "l1",
                "type": "custom_list",
                "attributes": { "name": "Reading", "visibility": visibility, "version": 3 }
            },
            "relationships": rels
        })
    }

    fn logged_in(handler: impl Fn(&crate::api::mock::Call) -> Result<Value> + Send + Sync + 'static) -> Client<MockTransport, StaticToken> {
        Client::new(MockTransport::new(handler)).with_guard(StaticToken::new("session"))
    }

    /// Echo PUT bodies back as the new list state.
    fn echo_server() -> Client<MockTransport, StaticToken> {
        logged_in(|call| {
            assert_eq!(call.method, Method::PUT);
            assert_eq!(call.path, "/list/l1");
            let body = call.body.clone().unwrap_or_default();
            assert_eq!(body["version"], 3);
            let ids: Vec<&str> = body["manga"]
                .as_array()
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            Ok(envelope("private", &ids))
        })
    }

    #[test]
    fn test_from_envelope() {
        let mut raw = envelope("public", &["m1", "m2"]);
        raw["data"]["attributes"]["owner"] = json!({ "id": "owner", "attributes": { "username": "reader" } });
        let list = List::from_envelope(&raw);
        assert_eq!(list.name.as_deref(), Some("Reading"));
        assert_eq!(list.version, Some(3));
        assert_eq!(list.is_public(), Some(true));
        assert_eq!(list.manga_ids(), ["m1", "m2"]);
        assert_eq!(list.owner.unwrap().id, "owner");
        assert_eq!(list.owner_name.as_deref(), Some("reader"));
    }

    #[test]
    fn test_owner_falls_back_to_relationship() {
        let list = List::from_envelope(&envelope("private", &[]));
        assert_eq!(list.is_public(), Some(false));
        assert_eq!(list.owner.unwrap().id, "u1");
    }

    #[test]
    fn test_unknown_visibility_is_none() {
        let list = List::from_envelope(&envelope("friends", &[]));
        assert_eq!(list.visibility, None);
        assert_eq!(list.is_public(), None);
        assert!("friends".parse::<Visibility>().is_err());
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
    }

    #[tokio::test]
    async fn test_get_requires_login() {
        let client = Client::new(MockTransport::unreachable());
        assert!(matches!(List::get(&client, "l1").await, Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_create_defaults_to_private() {
        let client = logged_in(|call| {
            assert_eq!(call.method, Method::POST);
            assert_eq!(call.path, "/list");
            let body = call.body.clone().unwrap_or_default();
            assert_eq!(body["visibility"], "private");
            assert_eq!(body["manga"], json!(["m1"]));
            Ok(envelope("private", &["m1"]))
        });
        let list = List::create(&client, "Reading", &["m1"], None).await.unwrap();
        assert_eq!(list.id, "l1");
        assert_eq!(list.manga_ids(), ["m1"]);
    }

    #[tokio::test]
    async fn test_create_validates_before_request() {
        let client = Client::new(MockTransport::unreachable()).with_guard(StaticToken::new("session"));
        let err = List::create(&client, "", &["m1"], None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = List::create(&client, "Reading", &["m1", ""], None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_rename_updates_in_place() {
        let client = logged_in(|call| {
            let body = call.body.clone().unwrap_or_default();
            assert_eq!(body["name"], "Finished");
            assert_eq!(body["version"], 3);
            Ok(json!({ "result": "ok" }))
        });
        let mut list = List::from_envelope(&envelope("private", &[]));
        list.rename(&client, "Finished").await.unwrap();
        assert_eq!(list.name.as_deref(), Some("Finished"));
        assert_eq!(list.version, Some(3));

        let err = list.rename(&client, "").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(client.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_update_without_version_fails_before_request() {
        let client = Client::new(MockTransport::unreachable()).with_guard(StaticToken::new("session"));
        let mut raw = envelope("private", &[]);
        raw["data"]["attributes"]["version"] = Value::Null;
        let mut list = List::from_envelope(&raw);
        let err = list.rename(&client, "New").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_toggle_visibility() {
        let client = logged_in(|call| {
            let target = call.body.as_ref().map(|b| b["visibility"].clone());
            Ok(json!({ "result": "ok", "echo": target }))
        });

        let mut list = List::from_envelope(&envelope("public", &[]));
        list.change_visibility(&client, None).await.unwrap();
        assert_eq!(list.visibility, Some(Visibility::Private));
        list.change_visibility(&client, None).await.unwrap();
        assert_eq!(list.visibility, Some(Visibility::Public));

        let mut unknown = List::from_envelope(&envelope("friends", &[]));
        unknown.change_visibility(&client, None).await.unwrap();
        assert_eq!(unknown.visibility, Some(Visibility::Public));

        list.change_visibility(&client, Some(Visibility::Public)).await.unwrap();
        assert_eq!(list.visibility, Some(Visibility::Public));

        let sent: Vec<Value> = client
            .transport()
            .calls()
            .iter()
            .map(|c| c.body.clone().unwrap_or_default()["visibility"].clone())
            .collect();
        assert_eq!(sent, [json!("private"), json!("public"), json!("public"), json!("public")]);
    }

    #[tokio::test]
    async fn test_update_manga_list_takes_server_order() {
        let client = logged_in(|_| Ok(envelope("private", &["m3", "m1"])));
        let mut list = List::from_envelope(&envelope("private", &["m1"]));
        list.update_manga_list(&client, &["m1", "m3"]).await.unwrap();
        assert_eq!(list.manga_ids(), ["m3", "m1"]);
    }

    #[tokio::test]
    async fn test_add_manga_is_idempotent() {
        let client = echo_server();
        let mut list = List::from_envelope(&envelope("private", &["m1"]));

        list.add_manga(&client, "m2").await.unwrap();
        assert_eq!(list.manga_ids(), ["m1", "m2"]);
        list.add_manga(&client, "m2").await.unwrap();
        assert_eq!(list.manga_ids(), ["m1", "m2"]);
        assert_eq!(client.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_update_reply_without_membership_keeps_local_list() {
        let client = logged_in(|_| Ok(json!({ "result": "ok" })));
        let mut list = List::from_envelope(&envelope("private", &["m1"]));
        let err = list.add_manga(&client, "m2").await.unwrap_err();
        assert!(err.is_semantic());
        assert_eq!(list.manga_ids(), ["m1"]);
    }

    #[tokio::test]
    async fn test_create_rejects_reply_without_list() {
        let client = logged_in(|_| Ok(json!({ "result": "ok" })));
        let err = List::create(&client, "Reading", &["m1"], None).await.unwrap_err();
        assert!(matches!(err, Error::Semantic(_)));
    }

    #[tokio::test]
    async fn test_remove_manga() {
        let client = logged_in(|call| {
            assert_eq!(call.method, Method::DELETE);
            assert_eq!(call.path, "/manga/m1/list/l1");
            Ok(json!({ "result": "ok" }))
        });
        let mut list = List::from_envelope(&envelope("private", &["m1", "m2"]));
        list.remove_manga(&client, "m1").await.unwrap();
        assert_eq!(list.manga_ids(), ["m2"]);
    }

    #[tokio::test]
    async fn test_deleted_list_is_not_found() {
        let client = logged_in(|call| {
            assert_eq!(call.method, Method::DELETE);
            Err(Error::Status {
                status: 404,
                message: "CustomList not found".into(),
            })
        });
        let list = List::from_envelope(&envelope("private", &[]));
        let err = list.delete(&client).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: EntityType::CustomList, .. }));
    }

    #[tokio::test]
    async fn test_user_lists_paging() {
        let client = Client::new(MockTransport::new(|call| {
            assert_eq!(call.path, "/user/u1/list");
            assert_eq!(call.query_value("limit"), Some("100"));
            assert_eq!(call.query_value("offset"), Some("0"));
            Ok(json!({ "results": [envelope("public", &[])] }))
        }));
        let lists = List::user_lists(&client, "u1", Limit::Count(100), 0).await.unwrap();
        assert_eq!(lists.len(), 1);
    }

    #[tokio::test]
    async fn test_feed_requires_login() {
        let anonymous = Client::new(MockTransport::unreachable());
        let err = List::feed_of(&anonymous, "l1", &FeedParams::default()).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));

        let client = logged_in(|call| {
            assert_eq!(call.path, "/list/l1/feed");
            Ok(json!({ "results": [] }))
        });
        assert!(List::feed_of(&client, "l1", &FeedParams::default()).await.unwrap().is_empty());
    }
}
