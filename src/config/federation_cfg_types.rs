use crate::from_env_var;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::SigningKey;
use std::time::Duration;

from_env_var!(
    /// How many inbox activities may be processed at once
    let name = WorkerCount;
    let default: usize = 4;
    let (env_var, allowed_values) = ("WORKER_COUNT", "a positive number");
    let from_str = |s| s.parse().ok().filter(|n: &usize| *n > 0);
);
from_env_var!(
    /// How many accepted activities may wait for a worker before senders are held up
    let name = QueueSize;
    let default: usize = 512;
    let (env_var, allowed_values) = ("QUEUE_SIZE", "a positive number");
    let from_str = |s| s.parse().ok().filter(|n: &usize| *n > 0);
);
from_env_var!(
    /// How long an outbound fetch may take
    let name = FetchTimeout;
    let default: Duration = Duration::from_secs(10);
    let (env_var, allowed_values) = ("FETCH_TIMEOUT", "a number of milliseconds");
    let from_str = |s| s.parse().map(Duration::from_millis).ok();
);
from_env_var!(
    /// How far a signed request's `Date` may be from our clock, either way
    let name = SignatureMaxAge;
    let default: Duration = Duration::from_secs(60 * 60);
    let (env_var, allowed_values) = ("SIGNATURE_MAX_AGE", "a number of seconds");
    let from_str = |s| s.parse().map(Duration::from_secs).ok();
);
from_env_var!(
    /// Items per collection page
    let name = PageSize;
    let default: usize = 20;
    let (env_var, allowed_values) = ("PAGE_SIZE", "a number between 1 and 80");
    let from_str = |s| s.parse().ok().filter(|n: &usize| (1..=80).contains(n));
);
from_env_var!(
    /// Whether collection reads must be signed too
    let name = AuthorizedFetch;
    let default: bool = false;
    let (env_var, allowed_values) = ("AUTHORIZED_FETCH", "true or false");
    let from_str = |s| s.parse().ok();
);
from_env_var!(
    /// Seed of the instance's signing key
    let name = InstanceKey;
    let default: Option<SigningKey> = None;
    let (env_var, allowed_values) = ("INSTANCE_KEY", "a base64-encoded 32 byte ed25519 seed");
    let from_str = |s| {
        let seed: [u8; 32] = STANDARD.decode(s.trim()).ok()?.try_into().ok()?;
        Some(Some(SigningKey::from_bytes(&seed)))
    };
);
