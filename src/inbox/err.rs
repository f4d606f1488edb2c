use crate::{dereference, signature, store};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    MissingHeader(&'static str),
    InvalidHeader(&'static str),
    BadDate(String),
    Signature(signature::Error),
    /// No local account has this username
    UnknownAccount(String),
    /// The signer could not be looked up right now
    Dereference(dereference::Error),
    Store(store::Error),
    /// The worker pool is no longer taking work
    ShuttingDown,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use Error::*;
        match self {
            MissingHeader(name) => write!(f, "request has no `{}` header", name),
            InvalidHeader(name) => write!(f, "`{}` header is not valid text", name),
            BadDate(date) => write!(f, "`{}` is not an HTTP date", date),
            Signature(e) => write!(f, "{}", e),
            UnknownAccount(username) => write!(f, "no local account `{}`", username),
            Dereference(e) => write!(f, "could not resolve signer: {}", e),
            Store(e) => write!(f, "{}", e),
            ShuttingDown => write!(f, "server is shutting down"),
        }
    }
}

impl From<signature::Error> for Error {
    fn from(e: signature::Error) -> Self {
        Self::Signature(e)
    }
}
impl From<store::Error> for Error {
    fn from(e: store::Error) -> Self {
        Self::Store(e)
    }
}
impl From<dereference::Error> for Error {
    fn from(e: dereference::Error) -> Self {
        match e {
            dereference::Error::Store(e) => Self::Store(e),
            e => Self::Dereference(e),
        }
    }
}
