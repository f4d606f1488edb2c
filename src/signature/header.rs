use super::{Error, ALGORITHM};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

/// A parsed `Signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub key_id: String,
    pub algorithm: Option<String>,
    /// Lower-cased names of the signed headers, in signing order
    pub headers: Vec<String>,
    pub signature: Vec<u8>,
}

impl SignatureHeader {
    /// The actor that owns `keyId`: the key URI with its fragment removed
    pub fn signer(&self) -> Result<String, Error> {
        let mut uri = Url::parse(&self.key_id)?;
        uri.set_fragment(None);
        Ok(uri.to_string())
    }

    pub fn covers(&self, header: &str) -> bool {
        self.headers.iter().any(|signed| signed == header)
    }

    pub fn to_header_value(&self) -> String {
        format!(
            r#"keyId="{}",algorithm="{}",headers="{}",signature="{}""#,
            self.key_id,
            self.algorithm.as_deref().unwrap_or(ALGORITHM),
            self.headers.join(" "),
            STANDARD.encode(&self.signature)
        )
    }

    /// Accept either a bare `Signature` value or `Authorization: Signature ...`
    pub fn from_authorization(value: &str) -> Option<Result<Self, Error>> {
        value
            .strip_prefix("Signature ")
            .map(|params| params.trim().parse())
    }
}

fn params() -> &'static Regex {
    static PARAMS: OnceLock<Regex> = OnceLock::new();
    PARAMS.get_or_init(|| Regex::new(r#"([A-Za-z]+)="([^"]*)""#).expect("hardcoded"))
}

impl FromStr for SignatureHeader {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Error> {
        let (mut key_id, mut algorithm, mut headers, mut signature) = (None, None, None, None);
        for param in params().captures_iter(value) {
            let content = param[2].to_string();
            match &param[1] {
                "keyId" => key_id = Some(content),
                "algorithm" => algorithm = Some(content),
                "headers" => headers = Some(content),
                "signature" => signature = Some(content),
                _ => (), // `created` and `expires` are not checked
            }
        }
        if key_id.is_none() && signature.is_none() {
            return Err(Error::MalformedHeader(value.to_string()));
        }

        if let Some(alg) = &algorithm {
            if !matches!(alg.to_ascii_lowercase().as_str(), "hs2019" | "ed25519" | "rsa-sha256") {
                return Err(Error::UnsupportedAlgorithm(alg.clone()));
            }
        }

        Ok(Self {
            key_id: key_id.ok_or(Error::MissingParam("keyId"))?,
            algorithm,
            headers: headers
                .map(|list| {
                    list.split_whitespace()
                        .map(str::to_ascii_lowercase)
                        .collect()
                })
                .unwrap_or_else(|| vec!["date".to_string()]),
            signature: STANDARD.decode(signature.ok_or(Error::MissingParam("signature"))?)?,
        })
    }
}
