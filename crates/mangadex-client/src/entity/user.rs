use serde_json::Value;

use super::{fetch_by_id, Entity, List};
use crate::api::envelope::string;
use crate::api::{Client, CredentialGuard, Limit, Transport};
use crate::error::Result;
use crate::relationship::EntityType;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub roles: Vec<String>,
}

impl Entity for User {
    const KIND: EntityType = EntityType::User;
    const ACCEPTS: &'static [EntityType] = &[
        EntityType::User,
        EntityType::Leader,
        EntityType::Member,
        EntityType::Creator,
    ];
    const PATH: &'static str = "/user";

    fn from_envelope(raw: &Value) -> Self {
        let attributes = &raw["data"]["attributes"];
        Self {
            id: string(&raw["data"]["id"]).unwrap_or_default(),
            username: string(&attributes["username"]),
            roles: attributes["roles"]
                .as_array()
                .map(|roles| roles.iter().filter_map(string).collect())
                .unwrap_or_default(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl User {
    pub async fn get<T, G>(client: &Client<T, G>, id: &str) -> Result<User>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, id).await
    }

    pub async fn fill<T, G>(&self, client: &Client<T, G>) -> Result<User>
    where
        T: Transport,
        G: CredentialGuard,
    {
        fetch_by_id(client, &self.id).await
    }

    /// This user's public lists.
    pub async fn lists<T, G>(&self, client: &Client<T, G>, limit: Limit, offset: u64) -> Result<Vec<List>>
    where
        T: Transport,
        G: CredentialGuard,
    {
        List::user_lists(client, &self.id, limit, offset).await
    }
}
