use crate::{store, transport};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Store(store::Error),
    Transport(transport::Error),
    /// The origin answered 429 or 5xx
    Unavailable { uri: String, status: u16 },
    /// The origin answered 404 or 410
    Gone(String),
    /// The origin answered with some other non-success status
    Refused { uri: String, status: u16 },
    Malformed { uri: String, reason: String },
    WrongType { uri: String, kind: String },
    IdMismatch { requested: String, found: String },
}

impl Error {
    /// Whether the origin could answer the same lookup later.  A store fault is ours, not
    /// the origin's, so it never counts.
    pub fn is_transient(&self) -> bool {
        use Error::*;
        match self {
            Unavailable { .. } => true,
            Transport(e) => e.is_transient(),
            Store(_)
            | Gone(_)
            | Refused { .. }
            | Malformed { .. }
            | WrongType { .. }
            | IdMismatch { .. } => false,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use Error::*;
        match self {
            Store(e) => write!(f, "store lookup failed: {}", e),
            Transport(e) => write!(f, "{}", e),
            Unavailable { uri, status } => write!(f, "{} is unavailable ({})", uri, status),
            Gone(uri) => write!(f, "{} does not exist", uri),
            Refused { uri, status } => write!(f, "fetching {} was refused ({})", uri, status),
            Malformed { uri, reason } => write!(f, "{} is not a usable object: {}", uri, reason),
            WrongType { uri, kind } => write!(f, "{} is a {}, not an actor", uri, kind),
            IdMismatch { requested, found } => {
                write!(f, "fetched {} but the document is {}", requested, found)
            }
        }
    }
}

impl From<store::Error> for Error {
    fn from(e: store::Error) -> Self {
        Self::Store(e)
    }
}

impl From<transport::Error> for Error {
    fn from(e: transport::Error) -> Self {
        match e {
            transport::Error::TooLarge { uri, limit } => Self::Malformed {
                uri,
                reason: format!("body is larger than {} bytes", limit),
            },
            e => Self::Transport(e),
        }
    }
}
