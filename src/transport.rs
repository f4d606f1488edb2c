//! Signed outbound fetches
//!
//! Every `GET` we send to another server is signed with the instance key, so that servers
//! running in authorized-fetch mode will answer us.
mod err;
#[cfg(test)]
mod test;

pub use err::Error;

use crate::ap::ACTIVITY_JSON;
use crate::signature::{self, LocalKey};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, DATE, HOST};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Largest response body a fetch will read; actor and note documents are a few KiB
pub const MAX_FETCH_BYTES: usize = 1024 * 1024;

/// What came back from a fetch, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET` a URI, signed with the instance key and with a bounded timeout
    async fn signed_get(&self, uri: &str) -> Result<Response, Error>;
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    key: Arc<LocalKey>,
}

impl HttpTransport {
    pub fn new(key: Arc<LocalKey>, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fedgatt/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, key })
    }

    fn headers(&self, url: &Url) -> Result<HeaderMap, Error> {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(Error::InvalidUri(url.to_string())),
        };
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(HOST, header_value(&host)?);
        headers.insert(DATE, header_value(&signature::http_date(Utc::now()))?);
        headers.insert(ACCEPT, HeaderValue::from_static(ACTIVITY_JSON));
        let signed = signature::sign(&self.key, "GET", &path, &headers, signature::GET_HEADERS)?;
        headers.insert("signature", header_value(&signed)?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value).map_err(|_| Error::InvalidUri(value.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn signed_get(&self, uri: &str) -> Result<Response, Error> {
        let url = Url::parse(uri).map_err(|_| Error::InvalidUri(uri.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUri(uri.to_string()));
        }
        let headers = self.headers(&url)?;

        log::debug!("Fetching {}", url);
        let mut response = self.client.get(url).headers(headers).send().await?;
        let status = response.status().as_u16();
        let mut body = CappedBody::new(uri, response.content_length(), MAX_FETCH_BYTES)?;
        while let Some(chunk) = response.chunk().await? {
            body.extend(&chunk)?;
        }
        Ok(Response {
            status,
            body: body.into_inner(),
        })
    }
}

/// A response body read chunk by chunk, abandoned as soon as it passes `limit` bytes
#[derive(Debug)]
struct CappedBody<'a> {
    uri: &'a str,
    limit: usize,
    body: Vec<u8>,
}

impl<'a> CappedBody<'a> {
    /// Refuses up front when the origin declares a body over the limit
    fn new(uri: &'a str, declared: Option<u64>, limit: usize) -> Result<Self, Error> {
        let capped = Self {
            uri,
            limit,
            body: Vec::new(),
        };
        match declared {
            Some(length) if length > limit as u64 => Err(capped.too_large()),
            Some(length) => Ok(Self {
                body: Vec::with_capacity(length as usize),
                ..capped
            }),
            None => Ok(capped),
        }
    }

    fn extend(&mut self, chunk: &[u8]) -> Result<(), Error> {
        if self.body.len() + chunk.len() > self.limit {
            return Err(self.too_large());
        }
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    fn into_inner(self) -> Vec<u8> {
        self.body
    }

    fn too_large(&self) -> Error {
        Error::TooLarge {
            uri: self.uri.to_string(),
            limit: self.limit,
        }
    }
}
