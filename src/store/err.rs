use std::fmt;

#[derive(Debug)]
pub enum Error {
    PgPool(r2d2::Error),
    Pg(postgres::Error),
    Join(tokio::task::JoinError),
    Corrupt(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use Error::*;
        let msg = match self {
            PgPool(e) => format!("{}", e),
            Pg(e) => format!("{}", e),
            Join(e) => format!("storage task failed: {}", e),
            Corrupt(e) => format!("unusable stored row: {}", e),
        };
        write!(f, "{}", msg)
    }
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Self::PgPool(e)
    }
}
impl From<postgres::Error> for Error {
    fn from(e: postgres::Error) -> Self {
        Self::Pg(e)
    }
}
impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join(e)
    }
}
