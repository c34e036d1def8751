use std::{path::Path, time::Duration};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use super::Backend;

pub const DEFAULT_ADDRESS: &str = "http://localhost:5052";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HEAD_POLL_INTERVAL_MS: u64 = 200;
const ENV_PREFIX: &str = "BEACON_CLIENT_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `http(s)://host:port` of the node; for Prysm, its gRPC endpoint.
    pub address: String,
    pub backend: Backend,
    pub request_timeout_secs: u64,
    /// Interval between head fetches on backends without a push stream.
    pub head_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            backend: Backend::Auto,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            head_poll_interval_ms: DEFAULT_HEAD_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    pub fn new(address: impl Into<String>, backend: Backend) -> Self {
        Self {
            address: address.into(),
            backend,
            ..Default::default()
        }
    }

    /// Defaults, overridden by the TOML file at `config_path` (if present), overridden by
    /// `BEACON_CLIENT_*` environment variables.
    pub fn from_file(config_path: &Path) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
    }

    /// Defaults overridden by the environment only.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn head_poll_interval(&self) -> Duration {
        Duration::from_millis(self.head_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::from_file(Path::new("missing.toml"))?;
            assert_eq!(config, Config::default());
            assert_eq!(config.request_timeout(), Duration::from_secs(30));
            assert_eq!(config.head_poll_interval(), Duration::from_millis(200));
            Ok(())
        });
    }

    #[test]
    fn file_then_env_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "client.toml",
                r#"
                address = "http://10.0.0.1:4000"
                backend = "lighthouse"
                head_poll_interval_ms = 500
                "#,
            )?;
            jail.set_env("BEACON_CLIENT_REQUEST_TIMEOUT_SECS", "5");

            let config = Config::from_file(Path::new("client.toml"))?;
            assert_eq!(config.address, "http://10.0.0.1:4000");
            assert_eq!(config.backend, Backend::Lighthouse);
            assert_eq!(config.head_poll_interval_ms, 500);
            assert_eq!(config.request_timeout_secs, 5);
            Ok(())
        });
    }

    #[test]
    fn unknown_backend_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("BEACON_CLIENT_BACKEND", "nimbus");
            assert!(Config::from_env().is_err());
            Ok(())
        });
    }
}
