use crate::signature;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Timeout(String),
    Connection(String),
    InvalidUri(String),
    /// The body ran past the fetch size limit
    TooLarge { uri: String, limit: usize },
    Client(reqwest::Error),
    Signature(signature::Error),
}

impl Error {
    /// Whether trying the same fetch later could succeed
    pub fn is_transient(&self) -> bool {
        use Error::*;
        match self {
            Timeout(_) | Connection(_) => true,
            Client(e) => !e.is_builder() && !e.is_redirect(),
            InvalidUri(_) | TooLarge { .. } | Signature(_) => false,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use Error::*;
        match self {
            Timeout(uri) => write!(f, "timed out fetching {}", uri),
            Connection(uri) => write!(f, "could not connect to fetch {}", uri),
            InvalidUri(uri) => write!(f, "`{}` cannot be fetched", uri),
            TooLarge { uri, limit } => write!(f, "{} is larger than {} bytes", uri, limit),
            Client(e) => write!(f, "{}", e),
            Signature(e) => write!(f, "could not sign fetch: {}", e),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let uri = e.url().map(|url| url.to_string()).unwrap_or_default();
        if e.is_timeout() {
            Self::Timeout(uri)
        } else if e.is_connect() {
            Self::Connection(uri)
        } else {
            Self::Client(e)
        }
    }
}

impl From<signature::Error> for Error {
    fn from(e: signature::Error) -> Self {
        Self::Signature(e)
    }
}
