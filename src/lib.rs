//! Federation server core for ActivityPub
//!
//!
//! This server accepts activities that other servers deliver to its users' inboxes, verifies
//! their HTTP signatures, and applies them in the background.  It also serves the paged
//! collections (such as a status's replies) that remote servers walk to catch up on a
//! conversation.
//!
//! # Notes on data flow
//! * **Remote server → Warp**:
//! Warp filters for valid requests and parses request data into an `InboundRequest`, the parts
//! of the request an HTTP signature can cover.  A delivery's body is parsed into an `Activity`.
//!
//! * **Warp → Federator**:
//! The `Federator` binds the delivery to a local account, then has the `Authenticator` verify
//! the signature.  The signing actor comes from the `Store`, or is fetched (with a signed GET
//! of our own) through the `Dereferencer` and cached.
//!
//! * **Federator → WorkerPool**:
//! An accepted delivery is queued on the bounded `WorkerPool`, and the remote server gets its
//! `202` straight away.  A `Processor` applies the activity on one of the pool's workers.
//!
//! * **Warp → Pager**:
//! Collection reads go through the `Pager`, which turns one page of store results into an
//! ActivityStreams `Collection` or `CollectionPage` with `min_id` cursors.

pub mod ap;
pub mod collection;
pub mod config;
pub mod dereference;
pub mod err;
pub mod inbox;
pub mod pool;
pub mod request;
pub mod signature;
pub mod store;
pub mod transport;

#[cfg(test)]
mod mock;
