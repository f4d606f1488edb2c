use super::{federation_cfg_types::*, EnvVar};
use crate::err::FatalErr;
use ed25519_dalek::SigningKey;

#[derive(Debug, Default)]
pub struct Federation {
    pub workers: WorkerCount,
    pub queue_size: QueueSize,
    pub fetch_timeout: FetchTimeout,
    pub signature_max_age: SignatureMaxAge,
    pub page_size: PageSize,
    pub authorized_fetch: AuthorizedFetch,
    pub instance_key: InstanceKey,
}

impl Federation {
    pub(crate) fn from_env(env: &EnvVar) -> Result<Self, FatalErr> {
        let cfg = Self {
            workers: WorkerCount::default().maybe_update(env.get("WORKER_COUNT"))?,
            queue_size: QueueSize::default().maybe_update(env.get("QUEUE_SIZE"))?,
            fetch_timeout: FetchTimeout::default().maybe_update(env.get("FETCH_TIMEOUT"))?,
            signature_max_age: SignatureMaxAge::default()
                .maybe_update(env.get("SIGNATURE_MAX_AGE"))?,
            page_size: PageSize::default().maybe_update(env.get("PAGE_SIZE"))?,
            authorized_fetch: AuthorizedFetch::default().maybe_update(env.get("AUTHORIZED_FETCH"))?,
            instance_key: InstanceKey::default().maybe_update(env.get("INSTANCE_KEY"))?,
        };
        log::info!("Using federation configuration:\n {:#?}", &cfg);
        Ok(cfg)
    }

    /// The configured instance key, or a new one for this run only
    pub fn instance_key(&self) -> SigningKey {
        match &*self.instance_key {
            Some(key) => key.clone(),
            None => {
                log::warn!(
                    "INSTANCE_KEY is not set; generated a key that will change on every restart"
                );
                SigningKey::generate(&mut rand::rngs::OsRng)
            }
        }
    }
}
