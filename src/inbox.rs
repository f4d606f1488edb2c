//! Inbound federation: from a POSTed activity to its side effects
//!
//! # Notes on data flow
//! * **Request → Federator**: the HTTP layer parses the body into an `Activity` and calls
//!   [`Federator::handle_inbound_body`], which looks up the receiving local account.  Unknown
//!   usernames stop here.
//!
//! * **Federator → Authenticator**: [`Federator::authenticate`] verifies the HTTP signature,
//!   resolving the signer through the store or, failing that, by fetching it.  The signer must
//!   also be the activity's `actor`.
//!
//! * **Federator → WorkerPool**: an accepted activity is queued for a [`Processor`] and the
//!   request is answered straight away.  Side effects never hold up the sender.
mod authenticator;
mod context;
mod err;
mod processor;
#[cfg(test)]
mod test;

pub use authenticator::{Authenticator, Outcome, Reason};
pub use context::{InboundRequest, InboxContext};
pub use err::Error;
pub use processor::{Processor, StoreProcessor};

use crate::ap::Activity;
use crate::pool::WorkerPool;
use crate::store::Store;

use std::sync::Arc;

#[derive(Clone)]
pub struct Federator {
    store: Arc<dyn Store>,
    authenticator: Authenticator,
    pool: Arc<WorkerPool>,
    processor: Arc<dyn Processor>,
}

impl std::fmt::Debug for Federator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Federator({:?})", self.authenticator)
    }
}

impl Federator {
    pub fn new(
        store: Arc<dyn Store>,
        authenticator: Authenticator,
        pool: Arc<WorkerPool>,
        processor: Arc<dyn Processor>,
    ) -> Self {
        Self {
            store,
            authenticator,
            pool,
            processor,
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Start an `InboxContext` for a delivery to `username`'s inbox
    pub async fn handle_inbound_body(
        &self,
        request: &InboundRequest,
        username: &str,
        activity: Activity,
    ) -> Result<InboxContext, Error> {
        let account = self
            .store
            .local_account(username)
            .await?
            .ok_or_else(|| Error::UnknownAccount(username.to_string()))?;
        log::debug!(
            "{} {} delivers {} to {}",
            request.method,
            request.path,
            activity.id,
            account.uri
        );
        Ok(InboxContext::new(account, activity))
    }

    /// Verify the delivery and, if it holds up, queue its side effects.
    ///
    /// `Ok((ctx, false))` is a rejected signature, not an error.
    pub async fn authenticate(
        &self,
        ctx: InboxContext,
        request: &InboundRequest,
    ) -> Result<(InboxContext, bool), Error> {
        let (actor, signature) = match self.authenticator.authenticate(request).await? {
            Outcome::Authenticated { actor, signature } => (actor, signature),
            Outcome::Rejected(_) => return Ok((ctx, false)),
        };

        if ctx.activity.actor_uri() != Some(actor.uri.as_str()) {
            let reason = Reason::ActorMismatch {
                signer: actor.uri,
                actor: ctx.activity.actor_uri().map(String::from),
            };
            log::debug!("Rejected {}: {}", ctx.activity.id, reason);
            return Ok((ctx, false));
        }

        let ctx = InboxContext {
            requesting_actor: Some(actor),
            signature: Some(signature),
            ..ctx
        };
        self.dispatch(ctx.clone()).await?;
        Ok((ctx, true))
    }

    async fn dispatch(&self, ctx: InboxContext) -> Result<(), Error> {
        let processor = self.processor.clone();
        let id = ctx.activity.id.clone();
        let accepted = self
            .pool
            .enqueue(move |cancel| async move {
                let id = ctx.activity.id.clone();
                if let Err(e) = processor.apply(ctx, cancel).await {
                    log::error!("Could not apply {}: {}", id, e);
                }
            })
            .await;
        if accepted {
            Ok(())
        } else {
            log::warn!("Worker pool stopped; dropping {}", id);
            Err(Error::ShuttingDown)
        }
    }
}
