use std::fmt;

#[derive(Debug)]
pub enum Error {
    MissingParam(&'static str),
    MalformedHeader(String),
    UnsupportedAlgorithm(String),
    MissingSignedHeader(String),
    InvalidHeaderValue(String),
    KeyId(url::ParseError),
    Base64(base64::DecodeError),
    BadKey(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use Error::*;
        match self {
            MissingParam(param) => write!(f, "signature header has no `{}` parameter", param),
            MalformedHeader(header) => write!(f, "could not parse signature header `{}`", header),
            UnsupportedAlgorithm(alg) => write!(f, "unsupported signature algorithm `{}`", alg),
            MissingSignedHeader(name) => {
                write!(f, "header `{}` is signed but absent from the request", name)
            }
            InvalidHeaderValue(name) => write!(f, "header `{}` is not valid text", name),
            KeyId(e) => write!(f, "signature keyId is not a URL: {}", e),
            Base64(e) => write!(f, "signature is not valid base64: {}", e),
            BadKey(e) => write!(f, "unusable key: {}", e),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::KeyId(e)
    }
}
