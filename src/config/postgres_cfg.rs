use super::{postgres_cfg_types::*, EnvVar};
use crate::err::FatalErr;

#[derive(Debug, Default)]
pub struct Postgres {
    pub user: PgUser,
    pub host: PgHost,
    pub password: PgPass,
    pub database: PgDatabase,
    pub port: PgPort,
    pub ssl_mode: PgSslMode,
}

impl Postgres {
    /// Read the Postgres settings; values from `DATABASE_URL` win over the `DB_*` variables
    pub(crate) fn from_env(env: EnvVar) -> Result<Self, FatalErr> {
        let env = match env.get("DATABASE_URL").cloned() {
            Some(url_str) => env.update_with_postgres_url(&url_str)?,
            None => env,
        };

        let cfg = Self {
            user: PgUser::default().maybe_update(env.get("DB_USER"))?,
            host: PgHost::default().maybe_update(env.get("DB_HOST"))?,
            password: PgPass::default().maybe_update(env.get("DB_PASS"))?,
            database: PgDatabase::default().maybe_update(env.get("DB_NAME"))?,
            port: PgPort::default().maybe_update(env.get("DB_PORT"))?,
            ssl_mode: PgSslMode::default().maybe_update(env.get("DB_SSLMODE"))?,
        };

        log::info!(
            "Postgres configuration: {}@{}:{}/{} (sslmode {:?})",
            *cfg.user,
            *cfg.host,
            *cfg.port,
            *cfg.database,
            *cfg.ssl_mode
        );
        Ok(cfg)
    }
}
