use super::uri_of;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An activity delivered to an inbox
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Activity {
    #[serde(rename = "@context", default, skip_serializing_if = "Value::is_null")]
    pub context: Value,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub actor: Value,
    #[serde(default)]
    pub object: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Accept,
    Add,
    Announce,
    Block,
    Create,
    Delete,
    Flag,
    Follow,
    Like,
    Move,
    Reject,
    Remove,
    Undo,
    Update,
    #[serde(other)]
    Unknown,
}

impl Activity {
    /// The actor who claims to have performed this activity
    pub fn actor_uri(&self) -> Option<&str> {
        uri_of(&self.actor)
    }
}
