//! Postgres queries
//!
//! The `postgres` client is synchronous, so every query runs on tokio's blocking pool.
use super::{Error, Result, Store};
use crate::ap::{Actor, Freshness, PublicKey, Status};
use crate::config;

use ::postgres;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2_postgres::PostgresConnectionManager;

type Connection = r2d2::PooledConnection<PostgresConnectionManager<postgres::NoTls>>;

const ACCOUNT_COLUMNS: &str = "uri, username, domain, inbox_uri, public_key_uri, public_key_pem, \
                               private_key_pem, fetched_at";
const STATUS_COLUMNS: &str = "id, uri, account_uri, in_reply_to_uri, content, local";

/// Ids compare bytewise, whatever the database's default collation, so that `min_id`
/// cursors walk the same order the in-memory store does
fn replies_query() -> String {
    format!(
        r#"SELECT {} FROM statuses
            WHERE in_reply_to_uri = $1
              AND ($2::TEXT IS NULL OR id COLLATE "C" > $2)
              AND (NOT $3 OR account_uri <> $4)
         ORDER BY id COLLATE "C" ASC
            LIMIT $5"#,
        STATUS_COLUMNS
    )
}

#[derive(Clone, Debug)]
pub struct PgPool {
    conn: r2d2::Pool<PostgresConnectionManager<postgres::NoTls>>,
}

impl PgPool {
    pub fn new(pg_cfg: &config::Postgres) -> Result<Self> {
        let mut cfg = postgres::Config::new();
        cfg.user(&pg_cfg.user)
            .host(&pg_cfg.host)
            .port(*pg_cfg.port)
            .dbname(&pg_cfg.database)
            .ssl_mode(pg_cfg.ssl_mode.to_postgres());
        if let Some(password) = &*pg_cfg.password {
            cfg.password(password);
        };

        // Fail at startup rather than on the first request if Postgres is unreachable
        cfg.connect(postgres::NoTls)?;
        let manager = PostgresConnectionManager::new(cfg, postgres::NoTls);
        let pool = r2d2::Pool::builder().max_size(10).build(manager)?;

        Ok(Self { conn: pool })
    }

    async fn with_conn<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            query(&mut conn)
        })
        .await?
    }
}

fn actor_from_row(row: &postgres::Row) -> Result<Actor> {
    let uri: String = row.try_get("uri")?;
    let domain: Option<String> = row.try_get("domain")?;
    let fetched_at: Option<DateTime<Utc>> = row.try_get("fetched_at")?;
    let freshness = match (domain, fetched_at) {
        (None, _) => Freshness::Local,
        (Some(_), Some(fetched_at)) => Freshness::CachedRemote { fetched_at },
        (Some(_), None) => Err(Error::Corrupt(format!("remote account {} has no fetch time", uri)))?,
    };
    Ok(Actor {
        username: row.try_get("username")?,
        inbox: row.try_get("inbox_uri")?,
        public_key: PublicKey {
            id: row.try_get("public_key_uri")?,
            owner: uri.clone(),
            public_key_pem: row.try_get("public_key_pem")?,
        },
        private_key_pem: row.try_get("private_key_pem")?,
        freshness,
        uri,
    })
}

fn status_from_row(row: &postgres::Row) -> Result<Status> {
    Ok(Status {
        id: row.try_get("id")?,
        uri: row.try_get("uri")?,
        account_uri: row.try_get("account_uri")?,
        in_reply_to_uri: row.try_get("in_reply_to_uri")?,
        content: row.try_get("content")?,
        local: row.try_get("local")?,
    })
}

fn domain_of(actor: &Actor) -> Option<String> {
    match actor.freshness {
        Freshness::Local => None,
        Freshness::CachedRemote { .. } => Some(
            url::Url::parse(&actor.uri)
                .ok()
                .and_then(|uri| uri.host_str().map(String::from))
                .unwrap_or_default(),
        ),
    }
}

#[async_trait]
impl Store for PgPool {
    async fn local_account(&self, username: &str) -> Result<Option<Actor>> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            conn.query_opt(
                &*format!(
                    "SELECT {} FROM accounts WHERE username = $1 AND domain IS NULL LIMIT 1",
                    ACCOUNT_COLUMNS
                ),
                &[&username],
            )?
            .as_ref()
            .map(actor_from_row)
            .transpose()
        })
        .await
    }

    async fn actor(&self, uri: &str) -> Result<Option<Actor>> {
        let uri = uri.to_string();
        self.with_conn(move |conn| {
            conn.query_opt(
                &*format!("SELECT {} FROM accounts WHERE uri = $1 LIMIT 1", ACCOUNT_COLUMNS),
                &[&uri],
            )?
            .as_ref()
            .map(actor_from_row)
            .transpose()
        })
        .await
    }

    async fn put_actor(&self, actor: Actor) -> Result<()> {
        let fetched_at = match actor.freshness {
            Freshness::Local => None,
            Freshness::CachedRemote { fetched_at } => Some(fetched_at),
        };
        let domain = domain_of(&actor);
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO accounts (uri, username, domain, inbox_uri, public_key_uri,
                                       public_key_pem, private_key_pem, fetched_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (uri) DO UPDATE SET
                   username = EXCLUDED.username,
                   inbox_uri = EXCLUDED.inbox_uri,
                   public_key_uri = EXCLUDED.public_key_uri,
                   public_key_pem = EXCLUDED.public_key_pem,
                   fetched_at = EXCLUDED.fetched_at",
                &[
                    &actor.uri,
                    &actor.username,
                    &domain,
                    &actor.inbox,
                    &actor.public_key.id,
                    &actor.public_key.public_key_pem,
                    &actor.private_key_pem,
                    &fetched_at,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn status(&self, uri: &str) -> Result<Option<Status>> {
        let uri = uri.to_string();
        self.with_conn(move |conn| {
            conn.query_opt(
                &*format!("SELECT {} FROM statuses WHERE uri = $1 LIMIT 1", STATUS_COLUMNS),
                &[&uri],
            )?
            .as_ref()
            .map(status_from_row)
            .transpose()
        })
        .await
    }

    async fn local_status(&self, account: &Actor, id: &str) -> Result<Option<Status>> {
        let (account_uri, id) = (account.uri.clone(), id.to_string());
        self.with_conn(move |conn| {
            conn.query_opt(
                &*format!(
                    "SELECT {} FROM statuses WHERE id = $1 AND account_uri = $2 AND local LIMIT 1",
                    STATUS_COLUMNS
                ),
                &[&id, &account_uri],
            )?
            .as_ref()
            .map(status_from_row)
            .transpose()
        })
        .await
    }

    async fn status_replies(
        &self,
        status: &Status,
        min_id: Option<&str>,
        only_other_accounts: bool,
        limit: usize,
    ) -> Result<Vec<Status>> {
        let (parent_uri, parent_account) = (status.uri.clone(), status.account_uri.clone());
        let min_id = min_id.map(String::from);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            conn.query(
                &*replies_query(),
                &[&parent_uri, &min_id, &only_other_accounts, &parent_account, &limit],
            )?
            .iter()
            .map(status_from_row)
            .collect()
        })
        .await
    }

    async fn put_status(&self, status: Status) -> Result<()> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO statuses (id, uri, account_uri, in_reply_to_uri, content, local)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (uri) DO NOTHING",
                &[
                    &status.id,
                    &status.uri,
                    &status.account_uri,
                    &status.in_reply_to_uri,
                    &status.content,
                    &status.local,
                ],
            )?;
            Ok(())
        })
        .await
    }
}
