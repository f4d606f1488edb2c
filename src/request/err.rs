use crate::{inbox, store};
use std::fmt;
use warp::http::StatusCode;

/// What a request can fail with, as far as the remote server needs to know
#[derive(Debug)]
pub enum Error {
    MalformedInput(String),
    /// The signature did not check out.  Not a fault on our side.
    Unauthenticated,
    NotFound,
    TransientNetwork(String),
    Internal(String),
}

impl warp::reject::Reject for Error {}
impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use Error::*;
        match self {
            MalformedInput(msg) => write!(f, "malformed request: {}", msg),
            Unauthenticated => write!(f, "request signature could not be verified"),
            NotFound => write!(f, "not found"),
            TransientNetwork(_) => write!(f, "temporarily unavailable, try again later"),
            Internal(_) => write!(f, "internal server error"),
        }
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        use Error::*;
        match self {
            MalformedInput(_) => StatusCode::BAD_REQUEST,
            Unauthenticated => StatusCode::UNAUTHORIZED,
            NotFound => StatusCode::NOT_FOUND,
            TransientNetwork(_) => StatusCode::SERVICE_UNAVAILABLE,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log server-side faults with their context; client mistakes only at debug
    pub fn log(&self) {
        use Error::*;
        match self {
            TransientNetwork(context) => log::warn!("{}", context),
            Internal(context) => log::error!("{}", context),
            MalformedInput(_) | Unauthenticated | NotFound => log::debug!("{}", self),
        }
    }
}

impl From<inbox::Error> for Error {
    fn from(e: inbox::Error) -> Self {
        use inbox::Error::*;
        match e {
            MissingHeader(_) | InvalidHeader(_) | BadDate(_) | Signature(_) => {
                Self::MalformedInput(e.to_string())
            }
            UnknownAccount(_) => Self::NotFound,
            Dereference(_) | ShuttingDown => Self::TransientNetwork(e.to_string()),
            Store(e) => Self::Internal(format!("store failure: {}", e)),
        }
    }
}

impl From<store::Error> for Error {
    fn from(e: store::Error) -> Self {
        Self::Internal(format!("store failure: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedInput(e.to_string())
    }
}
