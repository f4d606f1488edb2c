//! The slice of the ActivityStreams vocabulary that the federation endpoints read and write
mod activity;
mod actor;
mod note;

pub use activity::{Activity, ActivityKind};
pub use actor::{Actor, ActorDocument, Freshness, PublicKey};
pub use note::{Note, Status};

use chrono::Utc;
use serde_json::Value;

pub const ACTIVITY_JSON: &str = "application/activity+json";
pub const ACTIVITY_STREAMS: &str = "https://www.w3.org/ns/activitystreams";
pub const SECURITY_V1: &str = "https://w3id.org/security/v1";

/// Whatever a URI turned out to name
#[derive(Debug, Clone, PartialEq)]
pub enum ApObject {
    /// `kind` is the document's own `type`, such as `Person` or `Service`
    Actor { actor: Actor, kind: String },
    Note(Note),
    Other { id: String, kind: String },
}

impl ApObject {
    /// Sort a fetched JSON document by its `type`.
    ///
    /// Actors parsed here are marked as freshly fetched remote actors.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(match kind.as_str() {
            "Person" | "Service" | "Application" | "Group" | "Organization" => {
                let document: ActorDocument = serde_json::from_value(value)?;
                ApObject::Actor {
                    actor: document.into_remote(Utc::now()),
                    kind,
                }
            }
            "Note" | "Article" | "Question" => ApObject::Note(serde_json::from_value(value)?),
            _ => {
                let id = value
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("id"))?;
                ApObject::Other {
                    id: id.to_string(),
                    kind,
                }
            }
        })
    }

    pub fn id(&self) -> &str {
        match self {
            ApObject::Actor { actor, .. } => &actor.uri,
            ApObject::Note(note) => &note.id,
            ApObject::Other { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            ApObject::Actor { kind, .. } | ApObject::Other { kind, .. } => kind,
            ApObject::Note(note) => &note.kind,
        }
    }
}

/// The id of an embedded object or a bare link
pub(crate) fn uri_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(uri) => Some(uri),
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        _ => None,
    }
}
