//! Unresolved references between entities.
//!
//! Every envelope carries a flat `relationships` array of `{type, id}` records.
//! They are kept as [`Relationship`] values and only fetched when a caller asks
//! for it, so loading a manga never drags in its authors, covers or chapters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::{Client, CredentialGuard, Transport};
use crate::entity::{Author, Chapter, Cover, Entity, Group, List, Manga, Resource, Tag, User};
use crate::error::{Error, Result};

/// The closed set of relationship types the API emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Manga,
    Chapter,
    CoverArt,
    Author,
    Artist,
    ScanlationGroup,
    Tag,
    User,
    CustomList,
    Leader,
    Member,
    Creator,
}

impl EntityType {
    pub const ALL: &[EntityType] = &[
        Self::Manga,
        Self::Chapter,
        Self::CoverArt,
        Self::Author,
        Self::Artist,
        Self::ScanlationGroup,
        Self::Tag,
        Self::User,
        Self::CustomList,
        Self::Leader,
        Self::Member,
        Self::Creator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manga => "manga",
            Self::Chapter => "chapter",
            Self::CoverArt => "cover_art",
            Self::Author => "author",
            Self::Artist => "artist",
            Self::ScanlationGroup => "scanlation_group",
            Self::Tag => "tag",
            Self::User => "user",
            Self::CustomList => "custom_list",
            Self::Leader => "leader",
            Self::Member => "member",
            Self::Creator => "creator",
        }
    }

    /// Parse a wire tag. Unknown tags yield `None` and are dropped by callers.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == tag)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{type, id}` pointer to another entity. Never resolves on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: String,
}

/// An entity fetched through [`Relationship::resolve`].
#[derive(Debug, Clone)]
pub enum Resolved {
    Manga(Manga),
    Chapter(Chapter),
    Cover(Cover),
    Author(Author),
    Group(Group),
    Tag(Tag),
    User(User),
    List(List),
}

impl Resolved {
    pub fn id(&self) -> &str {
        match self {
            Self::Manga(e) => e.id(),
            Self::Chapter(e) => e.id(),
            Self::Cover(e) => e.id(),
            Self::Author(e) => e.id(),
            Self::Group(e) => e.id(),
            Self::Tag(e) => &e.id,
            Self::User(e) => e.id(),
            Self::List(e) => e.id(),
        }
    }
}

impl Relationship {
    pub fn new(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity_type,
            id: id.into(),
        }
    }

    /// Read one raw `{type, id, attributes?}` record. Unknown types and records
    /// without an id are rejected.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let entity_type = raw.get("type").and_then(Value::as_str).and_then(EntityType::parse)?;
        let id = raw.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())?;
        Some(Self::new(entity_type, id))
    }

    /// Keep the relationships of `target` type from a raw array, in order.
    ///
    /// `raw` may be absent, null or not an array at all; all of those yield an
    /// empty vector.
    pub fn convert_type(target: EntityType, raw: Option<&Value>) -> Vec<Self> {
        raw.and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Self::from_raw)
                    .filter(|r| r.entity_type == target)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First relationship of `target` type, for references the API guarantees to be unique.
    pub fn first_of(target: EntityType, raw: Option<&Value>) -> Option<Self> {
        Self::convert_type(target, raw).into_iter().next()
    }

    /// Last relationship of `target` type; the latest entry wins when several are present.
    pub fn last_of(target: EntityType, raw: Option<&Value>) -> Option<Self> {
        Self::convert_type(target, raw).pop()
    }

    /// Wrap this reference as a stub of `E`, checking that the types agree.
    pub fn stub<E: Entity>(&self) -> Result<Resource<E>> {
        self.check_kind::<E>()?;
        Ok(Resource::Stub(self.id.clone()))
    }

    /// Fetch the entity this relationship points to.
    pub async fn resolve<T, G>(&self, client: &Client<T, G>) -> Result<Resolved>
    where
        T: Transport,
        G: CredentialGuard,
    {
        debug!(kind = %self.entity_type, id = %self.id, "Resolving relationship");
        let resolved = match self.entity_type {
            EntityType::Manga => Resolved::Manga(Manga::get(client, &self.id).await?),
            EntityType::Chapter => Resolved::Chapter(Chapter::get(client, &self.id).await?),
            EntityType::CoverArt => Resolved::Cover(Cover::get(client, &self.id).await?),
            EntityType::Author | EntityType::Artist => {
                Resolved::Author(Author::get(client, &self.id).await?)
            }
            EntityType::ScanlationGroup => Resolved::Group(Group::get(client, &self.id).await?),
            EntityType::Tag => Resolved::Tag(Tag::get(client, &self.id).await?),
            EntityType::User | EntityType::Leader | EntityType::Member | EntityType::Creator => {
                Resolved::User(User::get(client, &self.id).await?)
            }
            EntityType::CustomList => Resolved::List(List::get(client, &self.id).await?),
        };
        Ok(resolved)
    }

    /// Fetch the entity as a concrete type. Fails with `InvalidArgument` when
    /// this relationship cannot point to an `E`.
    pub async fn resolve_as<E, T, G>(&self, client: &Client<T, G>) -> Result<E>
    where
        E: Entity,
        T: Transport,
        G: CredentialGuard,
    {
        self.stub::<E>()?.fill(client).await
    }

    fn check_kind<E: Entity>(&self) -> Result<()> {
        if E::ACCEPTS.contains(&self.entity_type) {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "{} relationship cannot be resolved as {}",
                self.entity_type,
                E::KIND
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;

    #[test]
    fn test_convert_type_filters_and_keeps_order() {
        let raw = json!([
            { "type": "author", "id": "a1" },
            { "type": "artist", "id": "x1" },
            { "type": "author", "id": "a2", "attributes": { "name": "Someone" } },
            { "type": "cover_art", "id": "c1" },
            { "type": "author", "id": "a3" }
        ]);
        let authors = Relationship::convert_type(EntityType::Author, Some(&raw));
        let ids: Vec<&str> = authors.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a1", "a2", "a3"]);
        assert!(authors.iter().all(|r| r.entity_type == EntityType::Author));
    }

    #[test]
    fn test_convert_type_absent_input() {
        assert!(Relationship::convert_type(EntityType::Manga, None).is_empty());
        assert!(Relationship::convert_type(EntityType::Manga, Some(&Value::Null)).is_empty());
        assert!(Relationship::convert_type(EntityType::Manga, Some(&json!({}))).is_empty());
    }

    #[test]
    fn test_unknown_types_and_missing_ids_are_dropped() {
        let raw = json!([
            { "type": "mystery", "id": "z" },
            { "type": "manga" },
            { "type": "manga", "id": "" },
            { "type": "manga", "id": "m1" },
            "garbage"
        ]);
        let manga = Relationship::convert_type(EntityType::Manga, Some(&raw));
        assert_eq!(manga, vec![Relationship::new(EntityType::Manga, "m1")]);
    }

    #[test]
    fn test_first_and_last_positional_policies() {
        let raw = json!([
            { "type": "cover_art", "id": "old" },
            { "type": "user", "id": "u1" },
            { "type": "cover_art", "id": "new" }
        ]);
        assert_eq!(Relationship::last_of(EntityType::CoverArt, Some(&raw)).unwrap().id, "new");
        assert_eq!(Relationship::first_of(EntityType::CoverArt, Some(&raw)).unwrap().id, "old");
        assert!(Relationship::last_of(EntityType::Tag, Some(&raw)).is_none());
    }

    #[test]
    fn test_entity_type_wire_names() {
        assert_eq!(EntityType::parse("scanlation_group"), Some(EntityType::ScanlationGroup));
        assert_eq!(EntityType::parse("cover_art"), Some(EntityType::CoverArt));
        assert_eq!(EntityType::parse("Manga"), None);
        assert_eq!(EntityType::CustomList.to_string(), "custom_list");
    }

    #[test]
    fn test_stub_checks_kind() {
        let rel = Relationship::new(EntityType::Artist, "a1");
        assert!(rel.stub::<Author>().is_ok());
        assert!(matches!(rel.stub::<Manga>(), Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_resolve_dispatches_on_type() {
        let mock = MockTransport::new(|call| {
            assert_eq!(call.path, "/author/a1");
            Ok(json!({
                "result": "ok",
                "data": { "id": "a1", "type": "author", "attributes": { "name": "Oda" } },
                "relationships": []
            }))
        });
        let client = Client::new(mock);

        let rel = Relationship::new(EntityType::Artist, "a1");
        match rel.resolve(&client).await.unwrap() {
            Resolved::Author(author) => assert_eq!(author.name.as_deref(), Some("Oda")),
            other => panic!("unexpected resolution: {other:?}"),
        }
        assert_eq!(client.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn test_resolve_as_rejects_wrong_type_without_request() {
        let client = Client::new(MockTransport::unreachable());
        let rel = Relationship::new(EntityType::CoverArt, "c1");
        let err = rel.resolve_as::<Manga, _, _>(&client).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(client.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_missing_entity_is_not_found() {
        let mock = MockTransport::new(|_| {
            Err(Error::Status {
                status: 404,
                message: "Manga not found".into(),
            })
        });
        let client = Client::new(mock);
        let rel = Relationship::new(EntityType::Manga, "gone");
        let err = rel.resolve(&client).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { kind: EntityType::Manga, ref id } if id == "gone"));
    }
}
