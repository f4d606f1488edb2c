use serde::{Deserialize, Serialize};

/// A post as the store keeps it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Sortable local identifier; collections page over it
    pub id: String,
    pub uri: String,
    pub account_uri: String,
    pub in_reply_to_uri: Option<String>,
    pub content: String,
    pub local: bool,
}

/// A post as it travels between servers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(rename = "type", default = "Note::kind")]
    pub kind: String,
    pub attributed_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl Note {
    fn kind() -> String {
        "Note".to_string()
    }

    /// Store a remote note under a freshly assigned local id
    pub fn into_status(self, id: String) -> Status {
        Status {
            id,
            uri: self.id,
            account_uri: self.attributed_to,
            in_reply_to_uri: self.in_reply_to,
            content: self.content,
            local: false,
        }
    }
}

impl From<&Status> for Note {
    fn from(status: &Status) -> Self {
        Self {
            id: status.uri.clone(),
            kind: Note::kind(),
            attributed_to: status.account_uri.clone(),
            in_reply_to: status.in_reply_to_uri.clone(),
            content: status.content.clone(),
        }
    }
}
