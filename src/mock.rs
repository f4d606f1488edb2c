//! Fixtures shared by the unit tests
use crate::ap::{Actor, ActorDocument, Status};
use crate::inbox::InboundRequest;
use crate::signature::{self, LocalKey};
use crate::store::MemoryStore;
use crate::transport::{self, Response, Transport};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use ed25519_dalek::SigningKey;
use hashbrown::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use warp::http::{HeaderMap, HeaderValue};

pub const LOCAL: &str = "https://local.example";
pub const REMOTE_ACTOR: &str = "https://remote.example/users/alice";

pub fn remote_key() -> LocalKey {
    LocalKey::new(
        format!("{}#main-key", REMOTE_ACTOR),
        SigningKey::from_bytes(&[42; 32]),
    )
}

pub fn other_key() -> LocalKey {
    LocalKey::new(
        format!("{}#main-key", REMOTE_ACTOR),
        SigningKey::from_bytes(&[43; 32]),
    )
}

/// The JSON document `remote.example` serves for alice
pub fn remote_actor_json() -> Vec<u8> {
    let pem = remote_key().public_key_pem().expect("in test");
    let alice = Actor::local("https://remote.example", "alice", pem, None);
    serde_json::to_vec(&alice.to_document()).expect("in test")
}

/// Alice as she would sit in the cache after a fetch
pub fn remote_actor() -> Actor {
    let document: ActorDocument =
        serde_json::from_slice(&remote_actor_json()).expect("in test");
    document.into_remote(Utc::now())
}

/// A store with local accounts `bob` and `carol`, and one status by bob
pub fn store() -> MemoryStore {
    let store = MemoryStore::default();
    for username in &["bob", "carol"] {
        store.add_local_account(Actor::local(LOCAL, username, String::new(), None));
    }
    store.add_status(bob_status());
    store
}

pub fn bob_status() -> Status {
    Status {
        id: "100".to_string(),
        uri: format!("{}/users/bob/statuses/100", LOCAL),
        account_uri: format!("{}/users/bob", LOCAL),
        in_reply_to_uri: None,
        content: "hello".to_string(),
        local: true,
    }
}

/// A POST to `path`, signed over the usual headers by `key`
pub fn signed_post(key: &LocalKey, path: &str, body: &[u8]) -> InboundRequest {
    signed_post_at(key, path, body, Utc::now())
}

pub fn signed_post_at(
    key: &LocalKey,
    path: &str,
    body: &[u8],
    date: DateTime<Utc>,
) -> InboundRequest {
    let mut headers = HeaderMap::new();
    headers.insert("host", HeaderValue::from_static("local.example"));
    headers.insert(
        "date",
        HeaderValue::from_str(&signature::http_date(date)).expect("in test"),
    );
    headers.insert(
        "digest",
        HeaderValue::from_str(&signature::digest(body)).expect("in test"),
    );
    let value = signature::sign(key, "POST", path, &headers, signature::POST_HEADERS)
        .expect("in test");
    headers.insert("signature", HeaderValue::from_str(&value).expect("in test"));

    InboundRequest {
        method: "POST".to_string(),
        path: path.to_string(),
        headers,
        body: Bytes::copy_from_slice(body),
    }
}

#[derive(Debug, Clone)]
pub enum Canned {
    Respond(u16, Vec<u8>),
    Timeout,
    /// The body ran past the fetch size limit
    Oversized,
}

/// A transport that answers from a table and counts its calls
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Canned>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn with(self, uri: &str, canned: Canned) -> Self {
        self.responses
            .lock()
            .expect("in test")
            .insert(uri.to_string(), canned);
        self
    }

    pub fn serving_alice() -> Self {
        Self::default().with(REMOTE_ACTOR, Canned::Respond(200, remote_actor_json()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn signed_get(&self, uri: &str) -> Result<Response, transport::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let canned = self.responses.lock().expect("in test").get(uri).cloned();
        match canned {
            Some(Canned::Respond(status, body)) => Ok(Response { status, body }),
            Some(Canned::Timeout) => Err(transport::Error::Timeout(uri.to_string())),
            Some(Canned::Oversized) => Err(transport::Error::TooLarge {
                uri: uri.to_string(),
                limit: transport::MAX_FETCH_BYTES,
            }),
            None => Ok(Response {
                status: 404,
                body: Vec::new(),
            }),
        }
    }
}
