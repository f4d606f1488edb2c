use crate::err::FatalErr;

use hashbrown::HashMap;
use std::fmt;
use url::Url;

#[derive(Debug, Clone)]
pub(crate) struct EnvVar(pub HashMap<String, String>);
impl std::ops::Deref for EnvVar {
    type Target = HashMap<String, String>;
    fn deref(&self) -> &HashMap<String, String> {
        &self.0
    }
}

impl EnvVar {
    pub(crate) fn new(vars: HashMap<String, String>) -> Self {
        Self(vars)
    }

    pub(crate) fn maybe_add_env_var(&mut self, key: &str, maybe_value: Option<impl ToString>) {
        if let Some(value) = maybe_value {
            self.0.insert(key.to_string(), value.to_string());
        }
    }

    /// Spread a `DATABASE_URL` over the individual `DB_*` variables it stands for
    pub(crate) fn update_with_postgres_url(mut self, url_str: &str) -> Result<Self, FatalErr> {
        let url = Url::parse(url_str)?;
        let none_if_empty = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };

        for (k, v) in url.query_pairs().into_owned() {
            match k.as_str() {
                "password" => self.maybe_add_env_var("DB_PASS", Some(v)),
                "user" => self.maybe_add_env_var("DB_USER", Some(v)),
                "sslmode" => self.maybe_add_env_var("DB_SSLMODE", Some(v)),
                _ => log::warn!("Ignoring unsupported DATABASE_URL parameter `{}`", k),
            }
        }

        self.maybe_add_env_var("DB_PORT", url.port());
        self.maybe_add_env_var("DB_HOST", url.host_str());
        self.maybe_add_env_var("DB_USER", none_if_empty(url.username()));
        self.maybe_add_env_var("DB_NAME", none_if_empty(url.path().trim_start_matches('/')));
        if let Some(password) = url.password() {
            let password = urlencoding::decode(password)?;
            self.maybe_add_env_var("DB_PASS", Some(password));
        }
        Ok(self)
    }
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = String::new();
        for env_var in &[
            "RUST_ENV",
            "RUST_LOG",
            "BIND",
            "PORT",
            "HOST",
            "PROTOCOL",
            "DATABASE_URL",
            "DB_USER",
            "DB_PORT",
            "DB_HOST",
            "DB_NAME",
            "DB_SSLMODE",
            "WORKER_COUNT",
            "QUEUE_SIZE",
            "FETCH_TIMEOUT",
            "SIGNATURE_MAX_AGE",
            "PAGE_SIZE",
            "AUTHORIZED_FETCH",
        ] {
            if let Some(value) = self.get(&(*env_var).to_string()) {
                result = format!("{}\n    {}: {}", result, env_var, value)
            }
        }
        // Secrets are reported as set, never printed
        for secret in &["DB_PASS", "INSTANCE_KEY"] {
            if self.contains_key(*secret) {
                result = format!("{}\n    {}: <set>", result, secret)
            }
        }
        write!(f, "{}", result)
    }
}

#[macro_export]
macro_rules! from_env_var {
    ($(#[$outer:meta])*
     let name = $name:ident;
     let default: $type:ty = $inner:expr;
     let (env_var, allowed_values) = ($env_var:tt, $allowed_values:expr);
     let from_str = |$arg:ident| $body:expr;
    ) => {
        $(#[$outer])*
        #[derive(Clone)]
        pub struct $name(pub $type);
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{:?}", self.0)
            }
        }
        impl std::ops::Deref for $name {
            type Target = $type;
            fn deref(&self) -> &$type {
                &self.0
            }
        }
        impl std::default::Default for $name {
            fn default() -> Self {
                $name($inner)
            }
        }
        impl $name {
            fn inner_from_str($arg: &str) -> Option<$type> {
                $body
            }
            pub(crate) fn maybe_update(
                self,
                var: Option<&String>,
            ) -> Result<Self, $crate::err::FatalErr> {
                Ok(match var {
                    Some(empty_string) if empty_string.is_empty() => Self::default(),
                    Some(value) => Self(Self::inner_from_str(value).ok_or_else(|| {
                        $crate::err::FatalErr::config($env_var, value, $allowed_values)
                    })?),
                    None => self,
                })
            }
        }
    };
}
