use super::{ACTIVITY_STREAMS, SECURITY_V1};
use crate::signature::{self, LocalKey};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A federation identity, either hosted here or cached from another server
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub uri: String,
    pub username: String,
    pub inbox: String,
    pub public_key: PublicKey,
    /// Only present for actors hosted on this server
    pub private_key_pem: Option<String>,
    pub freshness: Freshness,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    pub id: String,
    pub owner: String,
    pub public_key_pem: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Local,
    CachedRemote { fetched_at: DateTime<Utc> },
}

impl Actor {
    /// An account hosted on this server, at `{base_url}/users/{username}`
    pub fn local(
        base_url: &str,
        username: &str,
        public_key_pem: String,
        private_key_pem: Option<String>,
    ) -> Self {
        let uri = format!("{}/users/{}", base_url, username);
        Self {
            inbox: format!("{}/inbox", uri),
            public_key: PublicKey {
                id: format!("{}#main-key", uri),
                owner: uri.clone(),
                public_key_pem,
            },
            username: username.to_string(),
            private_key_pem,
            freshness: Freshness::Local,
            uri,
        }
    }

    /// The server's own actor, whose key signs outbound fetches
    pub fn instance(base_url: &str, key: &LocalKey) -> Result<Self, signature::Error> {
        let uri = format!("{}/actor", base_url);
        Ok(Self {
            inbox: format!("{}/inbox", uri),
            public_key: PublicKey {
                id: key.key_id().to_string(),
                owner: uri.clone(),
                public_key_pem: key.public_key_pem()?,
            },
            username: "instance".to_string(),
            private_key_pem: None,
            freshness: Freshness::Local,
            uri,
        })
    }

    pub fn is_local(&self) -> bool {
        self.freshness == Freshness::Local
    }

    pub fn to_document(&self) -> ActorDocument {
        ActorDocument {
            context: json!([ACTIVITY_STREAMS, SECURITY_V1]),
            id: self.uri.clone(),
            kind: "Person".to_string(),
            preferred_username: self.username.clone(),
            inbox: self.inbox.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// The JSON form of an actor
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActorDocument {
    #[serde(rename = "@context", default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub preferred_username: String,
    pub inbox: String,
    pub public_key: PublicKey,
}

impl ActorDocument {
    pub fn into_remote(self, fetched_at: DateTime<Utc>) -> Actor {
        Actor {
            uri: self.id,
            username: self.preferred_username,
            inbox: self.inbox,
            public_key: self.public_key,
            private_key_pem: None,
            freshness: Freshness::CachedRemote { fetched_at },
        }
    }
}
