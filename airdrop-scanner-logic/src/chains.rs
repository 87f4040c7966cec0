use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Closed set of provider families the scanner knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
    Cosmos,
}

/// Per-chain provider configuration. API keys are not stored here: they are
/// resolved at call time, so a missing key degrades a single call rather
/// than failing startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub key: String,
    pub family: ChainFamily,
    pub name: String,
    pub api_base: Url,
    pub api_key_env: String,
    /// Explicit key override, mainly for tests; takes precedence over the
    /// environment lookup.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ChainConfig {
    /// EVM chains fall back to `ETHERSCAN_API_KEY`, matching the multi-scan
    /// deployments where one Etherscan key covers every etherscan-family
    /// explorer.
    pub fn resolve_api_key(&self) -> Option<String> {
        let explicit = self.api_key.clone().filter(|key| !key.is_empty());
        let from_env = || std::env::var(&self.api_key_env).ok().filter(|key| !key.is_empty());
        let fallback = || match self.family {
            ChainFamily::Evm => std::env::var("ETHERSCAN_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            _ => None,
        };
        explicit.or_else(from_env).or_else(fallback)
    }
}

/// Lookup table over the configured chains, keyed by chain key.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: HashMap<String, ChainConfig>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        Self {
            chains: chains
                .into_iter()
                .map(|chain| (chain.key.clone(), chain))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ChainConfig> {
        self.chains.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.values()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new(default_chains())
    }
}

fn chain(key: &str, family: ChainFamily, name: &str, api_base: &str, api_key_env: &str) -> ChainConfig {
    ChainConfig {
        key: key.to_string(),
        family,
        name: name.to_string(),
        api_base: Url::parse(api_base).expect("static chain url"),
        api_key_env: api_key_env.to_string(),
        api_key: None,
    }
}

/// The built-in chain table. Deployments may override it through settings.
pub fn default_chains() -> Vec<ChainConfig> {
    vec![
        chain(
            "ethereum",
            ChainFamily::Evm,
            "Ethereum",
            "https://api.etherscan.io/api",
            "ETHERSCAN_API_KEY",
        ),
        chain(
            "arbitrum",
            ChainFamily::Evm,
            "Arbitrum",
            "https://api.arbiscan.io/api",
            "ARBISCAN_API_KEY",
        ),
        chain(
            "optimism",
            ChainFamily::Evm,
            "Optimism",
            "https://api-optimistic.etherscan.io/api",
            "OPTIMISTIC_ETHERSCAN_API_KEY",
        ),
        chain(
            "base",
            ChainFamily::Evm,
            "Base",
            "https://api.basescan.org/api",
            "BASESCAN_API_KEY",
        ),
        chain(
            "polygon",
            ChainFamily::Evm,
            "Polygon",
            "https://api.polygonscan.com/api",
            "POLYGONSCAN_API_KEY",
        ),
        chain(
            "bsc",
            ChainFamily::Evm,
            "BNB Chain",
            "https://api.bscscan.com/api",
            "BSCSCAN_API_KEY",
        ),
        chain(
            "solana",
            ChainFamily::Solana,
            "Solana",
            "https://api.solana.fm/v0",
            "SOLANAFM_API_KEY",
        ),
        chain(
            "cosmos",
            ChainFamily::Cosmos,
            "Cosmos",
            "https://api.mintscan.io",
            "MINTSCAN_API_KEY",
        ),
    ]
}
