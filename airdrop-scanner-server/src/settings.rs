use std::{net::SocketAddr, str::FromStr, time::Duration};

use config::{Config, File};
use serde::{de, Deserialize, Serialize};

/// Wrapper under [`serde::de::IgnoredAny`] which implements
/// [`PartialEq`] and [`Eq`] for fields to be ignored.
#[derive(Copy, Clone, Debug, Default, Deserialize)]
struct IgnoredAny(de::IgnoredAny);

impl PartialEq for IgnoredAny {
    fn eq(&self, _other: &Self) -> bool {
        // We ignore that values, so they should not impact the equality
        true
    }
}

impl Eq for IgnoredAny {}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub server: ServerSettings,
    pub scanner: ScannerSettings,
    pub bulk: BulkSettings,
    pub realtime: RealtimeSettings,

    // Is required as we deny unknown fields, but allow users provide
    // path to config through PREFIX__CONFIG env variable. If removed,
    // the setup would fail with `unknown field `config`, expected one of...`
    #[serde(skip_serializing, rename = "config")]
    config_path: IgnoredAny,
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        let config_path = std::env::var("AIRDROP_SCANNER__CONFIG");

        let mut builder = Config::builder();
        if let Ok(config_path) = config_path {
            builder = builder.add_source(File::with_name(&config_path));
        };
        // Use `__` so that it would be possible to address keys with underscores in names (e.g. `cache_ttl_secs`)
        builder = builder
            .add_source(config::Environment::with_prefix("AIRDROP_SCANNER").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from_str("0.0.0.0:8350").expect("static socket addr"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ScannerSettings {
    pub cache_ttl_secs: u64,
    pub cache_sweep_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub per_wallet_concurrency: usize,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 180,
            cache_sweep_interval_secs: 60,
            request_timeout_secs: 15,
            per_wallet_concurrency: 6,
        }
    }
}

impl ScannerSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BulkSettings {
    pub max_wallets: usize,
    pub concurrency: usize,
    pub retention_secs: u64,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            max_wallets: 10_000,
            concurrency: 10,
            retention_secs: 2 * 60 * 60,
        }
    }
}

impl BulkSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RealtimeSettings {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub default_interval_ms: u64,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            min_interval_ms: 10_000,
            max_interval_ms: 300_000,
            default_interval_ms: 30_000,
        }
    }
}

impl RealtimeSettings {
    /// A missing interval falls back to the default; anything supplied is
    /// clamped into the allowed window.
    pub fn effective_interval(&self, requested: Option<u64>) -> Duration {
        let ms = requested
            .unwrap_or(self.default_interval_ms)
            .clamp(self.min_interval_ms, self.max_interval_ms);
        Duration::from_millis(ms)
    }
}
