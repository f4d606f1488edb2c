use crate::ap::{Activity, Actor};
use crate::signature::SignatureHeader;

use bytes::Bytes;
use warp::http::HeaderMap;

/// The parts of an HTTP request that signatures cover
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: String,
    /// Path plus query string, exactly as requested
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: &str, path: &str, query: Option<&str>, headers: HeaderMap, body: Bytes) -> Self {
        let path = match query {
            Some(query) if !query.is_empty() => format!("{}?{}", path, query),
            _ => path.to_string(),
        };
        Self {
            method: method.to_string(),
            path,
            headers,
            body,
        }
    }
}

/// Everything known about one inbox delivery, filled in as it moves through the pipeline
#[derive(Debug, Clone)]
pub struct InboxContext {
    pub receiving_account: Actor,
    pub activity: Activity,
    /// Set once the signature has been verified
    pub requesting_actor: Option<Actor>,
    pub signature: Option<SignatureHeader>,
}

impl InboxContext {
    pub fn new(receiving_account: Actor, activity: Activity) -> Self {
        Self {
            receiving_account,
            activity,
            requesting_actor: None,
            signature: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.requesting_actor.is_some()
    }
}
