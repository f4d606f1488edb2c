//! HTTP Signatures, as used between federating servers
//!
//! Requests are signed the draft-cavage way: the signer picks a list of headers (plus the
//! `(request-target)` pseudo-header), joins `name: value` lines into a signing string and signs
//! it.  Our own keys are ed25519, published as SPKI PEM, and announced as `hs2019`.  Remote
//! keys may also be RSA, which most servers still sign with (`rsa-sha256`).
mod err;
mod header;
mod key;

pub use err::Error;
pub use header::SignatureHeader;
pub use key::{public_key_from_pem, LocalKey, RemoteKey};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use warp::http::HeaderMap;

pub const ALGORITHM: &str = "hs2019";

/// Headers we sign on outbound requests with no body
pub const GET_HEADERS: &[&str] = &["(request-target)", "host", "date"];
/// Headers we sign on outbound requests with a body
pub const POST_HEADERS: &[&str] = &["(request-target)", "host", "date", "digest"];

/// The value of a `Digest` header for `body`
pub fn digest(body: &[u8]) -> String {
    format!("SHA-256={}", STANDARD.encode(Sha256::digest(body)))
}

/// Whether a `Digest` header value contains a matching SHA-256 entry
pub fn digest_matches(header: &str, body: &[u8]) -> bool {
    let expected = STANDARD.encode(Sha256::digest(body));
    header.split(',').any(|entry| match entry.trim().split_once('=') {
        Some((algorithm, value)) => algorithm.eq_ignore_ascii_case("SHA-256") && value == expected,
        None => false,
    })
}

/// Format a timestamp for the `Date` header
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The text that gets signed for `signed` headers of a request
pub fn signing_string<S: AsRef<str>>(
    method: &str,
    path_and_query: &str,
    headers: &HeaderMap,
    signed: &[S],
) -> Result<String, Error> {
    let mut lines = Vec::with_capacity(signed.len());
    for name in signed {
        let name = name.as_ref();
        if name == "(request-target)" {
            lines.push(format!(
                "(request-target): {} {}",
                method.to_ascii_lowercase(),
                path_and_query
            ));
            continue;
        }
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| {
                value
                    .to_str()
                    .map(str::trim)
                    .map_err(|_| Error::InvalidHeaderValue(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Err(Error::MissingSignedHeader(name.to_string()));
        }
        lines.push(format!("{}: {}", name, values.join(", ")));
    }
    Ok(lines.join("\n"))
}

/// Sign a request and return the value for its `Signature` header
pub fn sign(
    key: &LocalKey,
    method: &str,
    path_and_query: &str,
    headers: &HeaderMap,
    signed: &[&str],
) -> Result<String, Error> {
    let text = signing_string(method, path_and_query, headers, signed)?;
    let header = SignatureHeader {
        key_id: key.key_id().to_string(),
        algorithm: Some(ALGORITHM.to_string()),
        headers: signed.iter().map(|name| name.to_string()).collect(),
        signature: key.sign(text.as_bytes()),
    };
    Ok(header.to_header_value())
}

/// Check a parsed signature against a request.
///
/// A signature that does not match is `Ok(false)`; `Err` means the request could not even be
/// put into signable form.
pub fn verify(
    signature: &SignatureHeader,
    key: &RemoteKey,
    method: &str,
    path_and_query: &str,
    headers: &HeaderMap,
) -> Result<bool, Error> {
    if !key.supports(signature.algorithm.as_deref()) {
        return Ok(false);
    }
    let text = signing_string(method, path_and_query, headers, &signature.headers)?;
    Ok(key::verify(key, text.as_bytes(), &signature.signature))
}
