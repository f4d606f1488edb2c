//! Side effects of accepted activities
use super::InboxContext;
use crate::ap::{ActivityKind, Note};
use crate::store::{self, Store};

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Applies an authenticated activity.  Runs on the worker pool, after the sender has already
/// been answered.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn apply(&self, ctx: InboxContext, cancel: CancellationToken) -> store::Result<()>;
}

/// Keeps inbound replies to our statuses, so that they show up in reply collections
pub struct StoreProcessor {
    store: Arc<dyn Store>,
}

impl StoreProcessor {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn create(&self, ctx: &InboxContext) -> store::Result<()> {
        let activity = &ctx.activity;
        let note: Note = match serde_json::from_value(activity.object.clone()) {
            Ok(note) => note,
            Err(_) => {
                log::debug!("{} does not embed a note; ignoring", activity.id);
                return Ok(());
            }
        };
        if Some(note.attributed_to.as_str()) != activity.actor_uri() {
            log::debug!("{} creates a note on someone else's behalf", activity.id);
            return Ok(());
        }
        let parent = match &note.in_reply_to {
            Some(uri) => self.store.status(uri).await?,
            None => None,
        };
        if parent.is_none() {
            log::debug!("{} is not a reply to a known status", note.id);
            return Ok(());
        }
        if self.store.status(&note.id).await?.is_some() {
            log::debug!("{} is already stored", note.id);
            return Ok(());
        }

        let status = note.into_status(Uuid::now_v7().to_string());
        log::info!("Storing reply {} as {}", status.uri, status.id);
        self.store.put_status(status).await
    }
}

#[async_trait]
impl Processor for StoreProcessor {
    async fn apply(&self, ctx: InboxContext, cancel: CancellationToken) -> store::Result<()> {
        if cancel.is_cancelled() {
            log::debug!("Applying {} during shutdown", ctx.activity.id);
        }
        match ctx.activity.kind {
            ActivityKind::Create => self.create(&ctx).await,
            kind => {
                log::debug!(
                    "No side effects for {:?} {} to {}",
                    kind,
                    ctx.activity.id,
                    ctx.receiving_account.username
                );
                Ok(())
            }
        }
    }
}
