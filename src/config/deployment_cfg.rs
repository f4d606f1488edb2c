use super::{deployment_cfg_types::*, EnvVar};
use crate::err::FatalErr;
use std::net::SocketAddr;

#[derive(Debug, Default)]
pub struct Deployment {
    pub env: Env,
    pub log_level: LogLevel,
    pub address: BindAddr,
    pub port: Port,
    pub host: Host,
    pub protocol: Protocol,
}

impl Deployment {
    pub(crate) fn from_env(env: &EnvVar) -> Result<Self, FatalErr> {
        let cfg = Self {
            env: Env::default().maybe_update(env.get("RUST_ENV"))?,
            log_level: LogLevel::default().maybe_update(env.get("RUST_LOG"))?,
            address: BindAddr::default().maybe_update(env.get("BIND"))?,
            port: Port::default().maybe_update(env.get("PORT"))?,
            host: Host::default().maybe_update(env.get("HOST"))?,
            protocol: Protocol::default().maybe_update(env.get("PROTOCOL"))?,
        };
        if *cfg.env == EnvInner::Production && *cfg.protocol == ProtocolInner::Http {
            log::warn!("Serving production traffic with http:// URIs; most servers will refuse to federate");
        }
        log::info!("Using deployment configuration:\n {:#?}", &cfg);
        Ok(cfg)
    }

    /// `protocol://host`, the prefix of every URI this server mints
    pub fn base_url(&self) -> String {
        format!("{}://{}", *self.protocol, *self.host)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(*self.address, *self.port)
    }
}
