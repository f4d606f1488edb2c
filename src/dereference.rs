//! Turn URIs into the objects they name
//!
//! Lookups try the store first and only go to the network on a miss.  Failures are sorted
//! into two classes: a transient failure (the remote server or our store is unavailable right
//! now) is worth retrying; a permanent one (the object is gone, or is not what it claims to
//! be) is not.  The `Dereferencer` never writes what it fetches back to the store; that is
//! the caller's decision.
mod err;
#[cfg(test)]
mod test;

pub use err::Error;

use crate::ap::{Actor, ApObject};
use crate::store::Store;
use crate::transport::Transport;

use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct Dereferencer {
    store: Arc<dyn Store>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Dereferencer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Dereferencer")
    }
}

impl Dereferencer {
    pub fn new(store: Arc<dyn Store>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// Whatever `uri` names, from the store if it is known there.  The store does not keep
    /// an actor's `type`, so stored actors come back as `Person`.
    pub async fn resolve(&self, uri: &str) -> Result<ApObject, Error> {
        if let Some(actor) = self.store.actor(uri).await? {
            return Ok(ApObject::Actor {
                actor,
                kind: "Person".to_string(),
            });
        }
        if let Some(status) = self.store.status(uri).await? {
            return Ok(ApObject::Note((&status).into()));
        }
        self.fetch(uri).await
    }

    /// The actor at `uri`; anything else found there is a permanent failure
    pub async fn resolve_actor(&self, uri: &str) -> Result<Actor, Error> {
        if let Some(actor) = self.store.actor(uri).await? {
            return Ok(actor);
        }
        self.fetch_actor(uri).await
    }

    /// Fetch the actor at `uri`, skipping the store
    pub async fn fetch_actor(&self, uri: &str) -> Result<Actor, Error> {
        match self.fetch(uri).await? {
            ApObject::Actor { actor, .. } => Ok(actor),
            other => Err(Error::WrongType {
                uri: uri.to_string(),
                kind: other.kind().to_string(),
            }),
        }
    }

    /// Fetch `uri` from its origin server, skipping the store
    pub async fn fetch(&self, uri: &str) -> Result<ApObject, Error> {
        let response = self.transport.signed_get(uri).await?;
        match response.status {
            200..=299 => (),
            404 | 410 => return Err(Error::Gone(uri.to_string())),
            429 | 500..=599 => {
                return Err(Error::Unavailable {
                    uri: uri.to_string(),
                    status: response.status,
                })
            }
            status => {
                return Err(Error::Refused {
                    uri: uri.to_string(),
                    status,
                })
            }
        }

        let malformed = |e: serde_json::Error| Error::Malformed {
            uri: uri.to_string(),
            reason: e.to_string(),
        };
        let document: Value = serde_json::from_slice(&response.body).map_err(malformed)?;
        let object = ApObject::from_json(document).map_err(malformed)?;
        if object.id() != uri {
            return Err(Error::IdMismatch {
                requested: uri.to_string(),
                found: object.id().to_string(),
            });
        }
        Ok(object)
    }
}
