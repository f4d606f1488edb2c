//! An in-process store
use super::{Result, Store};
use crate::ap::{Actor, Status};

use async_trait::async_trait;
use hashbrown::HashMap;
use lru::LruCache;
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::Bound;
use std::sync::{Mutex, PoisonError, RwLock};

/// Local accounts and statuses are kept for the life of the process; remote actors are a
/// bounded cache that forgets the least recently used entry once full.
#[derive(Debug)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, Actor>>,
    remote_actors: Mutex<LruCache<String, Actor>>,
    statuses: RwLock<BTreeMap<String, Status>>,
}

impl MemoryStore {
    pub fn new(remote_actor_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(remote_actor_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            accounts: RwLock::new(HashMap::new()),
            remote_actors: Mutex::new(LruCache::new(capacity)),
            statuses: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn add_local_account(&self, account: Actor) {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.username.clone(), account);
    }

    pub fn add_status(&self, status: Status) {
        self.statuses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(status.id.clone(), status);
    }

    pub fn remote_actor_count(&self) -> usize {
        self.remote_actors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn local_account(&self, username: &str) -> Result<Option<Actor>> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        Ok(accounts.get(username).cloned())
    }

    async fn actor(&self, uri: &str) -> Result<Option<Actor>> {
        let local = {
            let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
            accounts.values().find(|account| account.uri == uri).cloned()
        };
        if local.is_some() {
            return Ok(local);
        }
        let mut remote = self
            .remote_actors
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(remote.get(uri).cloned())
    }

    async fn put_actor(&self, actor: Actor) -> Result<()> {
        if actor.is_local() {
            self.add_local_account(actor);
        } else {
            self.remote_actors
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(actor.uri.clone(), actor);
        }
        Ok(())
    }

    async fn status(&self, uri: &str) -> Result<Option<Status>> {
        let statuses = self.statuses.read().unwrap_or_else(PoisonError::into_inner);
        Ok(statuses.values().find(|status| status.uri == uri).cloned())
    }

    async fn local_status(&self, account: &Actor, id: &str) -> Result<Option<Status>> {
        let statuses = self.statuses.read().unwrap_or_else(PoisonError::into_inner);
        Ok(statuses
            .get(id)
            .filter(|status| status.local && status.account_uri == account.uri)
            .cloned())
    }

    async fn status_replies(
        &self,
        status: &Status,
        min_id: Option<&str>,
        only_other_accounts: bool,
        limit: usize,
    ) -> Result<Vec<Status>> {
        let statuses = self.statuses.read().unwrap_or_else(PoisonError::into_inner);
        let lower = match min_id {
            Some(min_id) => Bound::Excluded(min_id),
            None => Bound::Unbounded,
        };
        Ok(statuses
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(_, reply)| reply)
            .filter(|reply| reply.in_reply_to_uri.as_deref() == Some(status.uri.as_str()))
            .filter(|reply| !only_other_accounts || reply.account_uri != status.account_uri)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn put_status(&self, status: Status) -> Result<()> {
        self.add_status(status);
        Ok(())
    }
}
