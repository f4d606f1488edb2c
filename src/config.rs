//! Configuration from environment variables, optionally merged from a `.env` file
pub use {deployment_cfg::Deployment, federation_cfg::Federation, postgres_cfg::Postgres};

use self::environmental_variables::EnvVar;
use super::err::FatalErr;
use hashbrown::HashMap;
use std::env;

mod deployment_cfg;
mod deployment_cfg_types;
mod environmental_variables;
mod federation_cfg;
mod federation_cfg_types;
mod postgres_cfg;
mod postgres_cfg_types;

/// Load `.env` (or `.env.production` when `ENV=production`) if it exists
pub fn merge_dotenv() -> Result<(), FatalErr> {
    let env_file = match env::var("ENV").ok().as_deref() {
        Some("production") => ".env.production",
        Some("development") | None => ".env",
        Some(unsupported) => Err(FatalErr::config("ENV", unsupported, "`production` or `development`"))?,
    };
    match dotenv::from_filename(env_file) {
        Ok(_) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            // Plain environment variables are enough to run
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn from_env(env_vars: HashMap<String, String>) -> Result<(Postgres, Federation, Deployment), FatalErr> {
    let env_vars = EnvVar::new(env_vars);
    log::info!("Environmental variables fedgatt received: {}", &env_vars);
    Ok((
        Postgres::from_env(env_vars.clone())?,
        Federation::from_env(&env_vars)?,
        Deployment::from_env(&env_vars)?,
    ))
}
