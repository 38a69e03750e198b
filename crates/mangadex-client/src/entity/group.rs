use serde_json::Value;

use super::{fetch_by_id, Entity};
use crate::api::envelope::{relationships, string};
use crate::api::{Client, CredentialGuard, Transport};
use crate::error::Result;
use crate::relationship::{EntityType, Relationship};

/// A scanlation group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub name: Option<String>,
    pub website: Option<String>,
    pub leader: Option<Relationship>,
    pub members: Vec<Relationship>,
}

impl Entity for Group {
    const KIND: EntityType = EntityType::ScanlationGroup;
    const ACCEPTS: &'static [EntityType] = &[EntityType::ScanlationGroup];
    const PATH: &'static str = "/group";

    fn from_envelope(raw: &Value) -> Self {
        let attributes = &raw["data"]["attributes"];
        let rels = relationships(raw);
        Self {
            id: string(&raw["data"]["id"]).unwrap_or_default(),
            name: string(&attributes["name"]),
            website: string(&attributes["website"]),
            leader: Relationship::first_of(EntityType::Leader, rels),
            members: Relationship::convert_type(EntityType::Member, rels),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Group {
    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<Group>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, id).await
    }

    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<Group>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, &self.id).await
    }
}
