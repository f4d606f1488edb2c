use crate::from_env_var;
use std::net::IpAddr;
use std::str::FromStr;
use strum::VariantNames;
use strum_macros::{Display, EnumString, EnumVariantNames};

from_env_var!(
    /// The current environment, which controls what file to read other ENV vars from
    let name = Env;
    let default: EnvInner = EnvInner::Development;
    let (env_var, allowed_values) = ("RUST_ENV", format!("one of: {:?}", EnvInner::VARIANTS));
    let from_str = |s| EnvInner::from_str(s).ok();
);
from_env_var!(
    /// The address to listen on
    let name = BindAddr;
    let default: IpAddr = IpAddr::V4("127.0.0.1".parse().expect("hardcoded"));
    let (env_var, allowed_values) = ("BIND", "a valid address (e.g., 127.0.0.1)");
    let from_str = |s| s.parse().ok();
);
from_env_var!(
    /// The port to listen on
    let name = Port;
    let default: u16 = 8080;
    let (env_var, allowed_values) = ("PORT", "a number between 0 and 65535");
    let from_str = |s| s.parse().ok();
);
from_env_var!(
    /// How verbosely to log messages
    let name = LogLevel;
    let default: LogLevelInner = LogLevelInner::Warn;
    let (env_var, allowed_values) = ("RUST_LOG", format!("one of: {:?}", LogLevelInner::VARIANTS));
    let from_str = |s| LogLevelInner::from_str(s).ok();
);
from_env_var!(
    /// The host name other servers reach this one under; it is part of every local URI
    let name = Host;
    let default: String = "localhost".to_string();
    let (env_var, allowed_values) = ("HOST", "a host name, optionally with a port");
    let from_str = |s| if s.contains('/') { None } else { Some(s.to_string()) };
);
from_env_var!(
    /// The scheme of every local URI
    let name = Protocol;
    let default: ProtocolInner = ProtocolInner::Https;
    let (env_var, allowed_values) = ("PROTOCOL", format!("one of: {:?}", ProtocolInner::VARIANTS));
    let from_str = |s| ProtocolInner::from_str(s).ok();
);

#[derive(EnumString, EnumVariantNames, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum EnvInner {
    Production,
    Development,
}

#[derive(EnumString, EnumVariantNames, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum LogLevelInner {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(EnumString, EnumVariantNames, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum ProtocolInner {
    Http,
    Https,
}
