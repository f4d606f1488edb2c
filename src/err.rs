use crate::{signature, store, transport};
use std::fmt;

/// Anything that stops the server from starting
pub enum FatalErr {
    Logger(log::SetLoggerError),
    Postgres(store::Error),
    StdIo(std::io::Error),
    Transport(transport::Error),
    InstanceKey(signature::Error),
    Bind(warp::Error),
    /// The worker pool refused to start
    WorkerPool,
    // config errs
    Dotenv(dotenv::Error),
    UrlParse(url::ParseError),
    UrlEncoding(std::string::FromUtf8Error),
    ConfigErr(String),
}

impl FatalErr {
    pub fn config(var: impl fmt::Display, value: impl fmt::Display, allowed_vals: impl fmt::Display) -> Self {
        Self::ConfigErr(format!(
            "{0} is set to `{1}`, which is invalid.\n{3:7}{0} must be {2}.",
            var, value, allowed_vals, ""
        ))
    }
}

impl std::error::Error for FatalErr {}
impl fmt::Debug for FatalErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl fmt::Display for FatalErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use FatalErr::*;
        write!(
            f,
            "{}",
            match self {
                Logger(e) => format!("{}", e),
                StdIo(e) => format!("{}", e),
                Postgres(e) => format!("could not connect to Postgres.\n{:7}{}", "", e),
                Transport(e) => format!("could not build the HTTP client.\n{:7}{}", "", e),
                InstanceKey(e) => format!("could not use the instance key.\n{:7}{}", "", e),
                Bind(e) => format!("could not listen for requests.\n{:7}{}", "", e),
                WorkerPool => "could not start the worker pool".to_string(),
                Dotenv(e) => format!("could not read the .env file.\n{:7}{}", "", e),
                ConfigErr(e) => e.to_string(),
                UrlParse(e) => format!("could not parse DATABASE_URL.\n{:7}{}", "", e),
                UrlEncoding(e) => format!("could not decode DATABASE_URL.\n{:7}{}", "", e),
            }
        )
    }
}

impl From<store::Error> for FatalErr {
    fn from(e: store::Error) -> Self {
        Self::Postgres(e)
    }
}
impl From<transport::Error> for FatalErr {
    fn from(e: transport::Error) -> Self {
        Self::Transport(e)
    }
}
impl From<signature::Error> for FatalErr {
    fn from(e: signature::Error) -> Self {
        Self::InstanceKey(e)
    }
}
impl From<warp::Error> for FatalErr {
    fn from(e: warp::Error) -> Self {
        Self::Bind(e)
    }
}
impl From<dotenv::Error> for FatalErr {
    fn from(e: dotenv::Error) -> Self {
        Self::Dotenv(e)
    }
}
impl From<std::string::FromUtf8Error> for FatalErr {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::UrlEncoding(e)
    }
}
impl From<url::ParseError> for FatalErr {
    fn from(e: url::ParseError) -> Self {
        Self::UrlParse(e)
    }
}
impl From<std::io::Error> for FatalErr {
    fn from(e: std::io::Error) -> Self {
        Self::StdIo(e)
    }
}
impl From<log::SetLoggerError> for FatalErr {
    fn from(e: log::SetLoggerError) -> Self {
        Self::Logger(e)
    }
}
