//! Decide whether a signed request really comes from who it says
//!
//! The outcome has three shapes.  `Ok(Outcome::Authenticated)` carries the verified signer.
//! `Ok(Outcome::Rejected)` means the request was well formed but its signature does not hold
//! up; that is the sender's problem, not ours, so it is only logged at debug level.  `Err`
//! means we could not reach a verdict, either because the request is malformed or because the
//! signer could not be looked up right now.
use super::{Error, InboundRequest};
use crate::ap::Actor;
use crate::dereference::{self, Dereferencer};
use crate::signature::{self, SignatureHeader};
use crate::store::Store;

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use warp::http::header::{HeaderMap, HeaderValue};

#[derive(Debug, Clone)]
pub enum Outcome {
    Authenticated {
        actor: Actor,
        signature: SignatureHeader,
    },
    Rejected(Reason),
}

/// Why a well-formed request was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The signer is gone or is not an actor
    UnknownSigner(String),
    KeyMismatch { key_id: String, actor_key: String },
    Stale(DateTime<Utc>),
    Uncovered(&'static str),
    DigestMismatch,
    BadKey,
    BadSignature,
    /// The activity names a different actor than the one who signed it
    ActorMismatch { signer: String, actor: Option<String> },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use Reason::*;
        match self {
            UnknownSigner(uri) => write!(f, "signer {} could not be resolved", uri),
            KeyMismatch { key_id, actor_key } => {
                write!(f, "signed with {} but the actor's key is {}", key_id, actor_key)
            }
            Stale(date) => write!(f, "signature date {} is out of range", date),
            Uncovered(header) => write!(f, "`{}` is not covered by the signature", header),
            DigestMismatch => write!(f, "digest does not match the body"),
            BadKey => write!(f, "actor's public key is unusable"),
            BadSignature => write!(f, "signature does not verify"),
            ActorMismatch { signer, actor } => write!(
                f,
                "signed by {} on behalf of {}",
                signer,
                actor.as_deref().unwrap_or("nobody")
            ),
        }
    }
}

/// The headers every signed request has to carry
struct Parsed {
    signature: SignatureHeader,
    signer: String,
    date: DateTime<Utc>,
    digest: Option<String>,
}

#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn Store>,
    dereferencer: Dereferencer,
    max_age: Duration,
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Authenticator(max_age: {:?})", self.max_age)
    }
}

impl Authenticator {
    pub fn new(store: Arc<dyn Store>, dereferencer: Dereferencer, max_age: Duration) -> Self {
        Self {
            store,
            dereferencer,
            max_age,
        }
    }

    pub async fn authenticate(&self, request: &InboundRequest) -> Result<Outcome, Error> {
        let parsed = parse(request)?;

        let (actor, fetched) = match self.resolve_signer(&parsed.signer).await? {
            Some(found) => found,
            None => return Ok(self.reject(Reason::UnknownSigner(parsed.signer))),
        };

        let outcome = match self.verify(&parsed, &actor, request)? {
            // A cached actor may have rotated its key since we stored it
            Some(Reason::KeyMismatch { .. }) | Some(Reason::BadSignature)
                if !fetched && !actor.is_local() =>
            {
                match self.refresh(&actor).await? {
                    Some(actor) => self.finish(parsed, actor, request)?,
                    None => self.reject(Reason::UnknownSigner(parsed.signer)),
                }
            }
            Some(reason) => self.reject(reason),
            None => Outcome::Authenticated {
                actor,
                signature: parsed.signature,
            },
        };
        Ok(outcome)
    }

    /// The signer from the store, or freshly fetched and stored.  `None` if it cannot exist.
    async fn resolve_signer(&self, uri: &str) -> Result<Option<(Actor, bool)>, Error> {
        if let Some(actor) = self.store.actor(uri).await? {
            return Ok(Some((actor, false)));
        }
        match self.dereferencer.fetch_actor(uri).await {
            Ok(actor) => {
                self.store.put_actor(actor.clone()).await?;
                Ok(Some((actor, true)))
            }
            Err(e @ dereference::Error::Store(_)) => Err(e.into()),
            Err(e) if e.is_transient() => Err(e.into()),
            Err(e) => {
                log::debug!("Signer {} is unresolvable: {}", uri, e);
                Ok(None)
            }
        }
    }

    async fn refresh(&self, stale: &Actor) -> Result<Option<Actor>, Error> {
        log::debug!("Refetching {} to check for a new key", stale.uri);
        match self.dereferencer.fetch_actor(&stale.uri).await {
            Ok(actor) => {
                self.store.put_actor(actor.clone()).await?;
                Ok(Some(actor))
            }
            Err(e @ dereference::Error::Store(_)) => Err(e.into()),
            Err(e) if e.is_transient() => Err(e.into()),
            Err(_) => Ok(None),
        }
    }

    fn finish(&self, parsed: Parsed, actor: Actor, request: &InboundRequest) -> Result<Outcome, Error> {
        Ok(match self.verify(&parsed, &actor, request)? {
            Some(reason) => self.reject(reason),
            None => Outcome::Authenticated {
                actor,
                signature: parsed.signature,
            },
        })
    }

    /// `None` when everything checks out
    fn verify(
        &self,
        parsed: &Parsed,
        actor: &Actor,
        request: &InboundRequest,
    ) -> Result<Option<Reason>, Error> {
        let signature = &parsed.signature;
        if actor.public_key.id != signature.key_id {
            return Ok(Some(Reason::KeyMismatch {
                key_id: signature.key_id.clone(),
                actor_key: actor.public_key.id.clone(),
            }));
        }

        let age = Utc::now().signed_duration_since(parsed.date);
        if age.num_seconds().unsigned_abs() > self.max_age.as_secs() {
            return Ok(Some(Reason::Stale(parsed.date)));
        }

        if !signature.covers("date") {
            return Ok(Some(Reason::Uncovered("date")));
        }
        if let Some(digest) = &parsed.digest {
            if !signature.covers("digest") {
                return Ok(Some(Reason::Uncovered("digest")));
            }
            if !signature::digest_matches(digest, &request.body) {
                return Ok(Some(Reason::DigestMismatch));
            }
        }

        let key = match signature::public_key_from_pem(&actor.public_key.public_key_pem) {
            Ok(key) => key,
            Err(e) => {
                log::debug!("Key of {} is unusable: {}", actor.uri, e);
                return Ok(Some(Reason::BadKey));
            }
        };
        let valid = signature::verify(
            signature,
            &key,
            &request.method,
            &request.path,
            &request.headers,
        )?;
        Ok(if valid { None } else { Some(Reason::BadSignature) })
    }

    fn reject(&self, reason: Reason) -> Outcome {
        log::debug!("Rejected signed request: {}", reason);
        Outcome::Rejected(reason)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<Option<&'a str>, Error> {
    headers
        .get(name)
        .map(|value: &HeaderValue| value.to_str().map_err(|_| Error::InvalidHeader(name)))
        .transpose()
}

fn parse(request: &InboundRequest) -> Result<Parsed, Error> {
    let headers = &request.headers;
    let signature = match header(headers, "signature")? {
        Some(value) => value.parse::<SignatureHeader>()?,
        None => header(headers, "authorization")?
            .and_then(SignatureHeader::from_authorization)
            .ok_or(Error::MissingHeader("signature"))??,
    };
    let signer = signature.signer()?;

    let date = header(headers, "date")?.ok_or(Error::MissingHeader("date"))?;
    let date = DateTime::parse_from_rfc2822(date)
        .map_err(|_| Error::BadDate(date.to_string()))?
        .with_timezone(&Utc);

    let digest = header(headers, "digest")?.map(String::from);
    if digest.is_none() && !request.body.is_empty() {
        return Err(Error::MissingHeader("digest"));
    }

    Ok(Parsed {
        signature,
        signer,
        date,
        digest,
    })
}
