//! Where actors and statuses live between requests
//!
//! The federation core only talks to storage through the [`Store`] trait.  Two backends are
//! provided: [`PgPool`] for deployments and [`MemoryStore`], which also backs the tests.
//! Either way a store must give read-your-writes for actors: an actor passed to
//! [`Store::put_actor`] is returned by the next [`Store::actor`] call for its URI.
mod err;
mod memory;
mod postgres;

pub use self::postgres::PgPool;
pub use err::Error;
pub use memory::MemoryStore;

use crate::ap::{Actor, Status};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Error>;

#[async_trait]
pub trait Store: Send + Sync {
    /// An account hosted on this server
    async fn local_account(&self, username: &str) -> Result<Option<Actor>>;

    /// Any known actor, local or cached remote
    async fn actor(&self, uri: &str) -> Result<Option<Actor>>;

    /// Insert or refresh an actor
    async fn put_actor(&self, actor: Actor) -> Result<()>;

    async fn status(&self, uri: &str) -> Result<Option<Status>>;

    /// A status with local id `id`, only if `account` wrote it
    async fn local_status(&self, account: &Actor, id: &str) -> Result<Option<Status>>;

    /// Replies to `status` in ascending id order, strictly after `min_id`
    async fn status_replies(
        &self,
        status: &Status,
        min_id: Option<&str>,
        only_other_accounts: bool,
        limit: usize,
    ) -> Result<Vec<Status>>;

    async fn put_status(&self, status: Status) -> Result<()>;
}
