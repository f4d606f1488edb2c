use crate::ap::ACTIVITY_STREAMS;
use serde::Serialize;

/// A collection response, either the unpaged root or one page
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Envelope {
    Collection(Collection),
    Page(CollectionPage),
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub first: CollectionPage,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionPage {
    /// Only present at the top level of a response
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<&'static str>,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(rename = "partOf")]
    pub part_of: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// A lone item is written as a bare URI rather than a one-element array
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Items {
    One(String),
    Many(Vec<String>),
}

impl From<Vec<String>> for Items {
    fn from(mut uris: Vec<String>) -> Self {
        match uris.len() {
            1 => Items::One(uris.remove(0)),
            _ => Items::Many(uris),
        }
    }
}

impl Collection {
    pub fn new(id: String, first: CollectionPage) -> Self {
        Self {
            context: ACTIVITY_STREAMS,
            first,
            id,
            kind: "Collection",
        }
    }
}

impl CollectionPage {
    pub fn new(id: String, part_of: String) -> Self {
        Self {
            context: None,
            id,
            items: None,
            next: None,
            part_of,
            kind: "CollectionPage",
        }
    }
}
