use super::Error;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::RsaPublicKey;
use sha2::Sha256;

/// A key this server signs with, and the URI other servers find it under
#[derive(Clone)]
pub struct LocalKey {
    key_id: String,
    signing_key: SigningKey,
}

impl std::fmt::Debug for LocalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "LocalKey({})", self.key_id)
    }
}

impl LocalKey {
    pub fn new(key_id: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key,
        }
    }

    /// Build a key from a base64-encoded 32 byte seed
    pub fn from_seed_base64(key_id: impl Into<String>, seed: &str) -> Result<Self, Error> {
        let seed: [u8; 32] = STANDARD
            .decode(seed.trim())?
            .try_into()
            .map_err(|_| Error::BadKey("seed must be 32 bytes".to_string()))?;
        Ok(Self::new(key_id, SigningKey::from_bytes(&seed)))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key(&self) -> RemoteKey {
        RemoteKey::Ed25519(self.verifying_key())
    }

    pub fn public_key_pem(&self) -> Result<String, Error> {
        self.verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| Error::BadKey(e.to_string()))
    }

    pub(super) fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

/// A public key some actor publishes
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteKey {
    Ed25519(VerifyingKey),
    /// Verified as PKCS#1 v1.5 over SHA-256
    Rsa(RsaPublicKey),
}

impl RemoteKey {
    /// Whether a signature announced as `algorithm` can have been made with this key
    pub fn supports(&self, algorithm: Option<&str>) -> bool {
        match algorithm.map(str::to_ascii_lowercase).as_deref() {
            None | Some("hs2019") => true,
            Some("ed25519") => matches!(self, Self::Ed25519(_)),
            Some("rsa-sha256") => matches!(self, Self::Rsa(_)),
            Some(_) => false,
        }
    }
}

/// Read the PEM an actor document publishes: SPKI for either key type, or PKCS#1 for RSA
pub fn public_key_from_pem(pem: &str) -> Result<RemoteKey, Error> {
    let pem = pem.trim();
    if let Ok(key) = VerifyingKey::from_public_key_pem(pem) {
        return Ok(RemoteKey::Ed25519(key));
    }
    <RsaPublicKey as rsa::pkcs8::DecodePublicKey>::from_public_key_pem(pem)
        .map_err(|e| e.to_string())
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem).map_err(|e| e.to_string()))
        .map(RemoteKey::Rsa)
        .map_err(|e| Error::BadKey(format!("not an ed25519 or RSA public key: {}", e)))
}

/// `false` for any signature that does not check out, including ones of the wrong length
pub(super) fn verify(key: &RemoteKey, message: &[u8], signature: &[u8]) -> bool {
    match key {
        RemoteKey::Ed25519(key) => match Signature::from_slice(signature) {
            Ok(signature) => key.verify(message, &signature).is_ok(),
            Err(_) => false,
        },
        RemoteKey::Rsa(key) => match rsa::pkcs1v15::Signature::try_from(signature) {
            Ok(signature) => {
                let key = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(key.clone());
                rsa::signature::Verifier::verify(&key, message, &signature).is_ok()
            }
            Err(_) => false,
        },
    }
}
