mod explorer;
mod solana;

pub use explorer::ExplorerClient;
pub use solana::{SolanaClient, SolanaTransfer};

use serde::{Deserialize, Serialize};

/// Errors surfaced by the chain clients. Callers above the scanner never see
/// these: the scanner downgrades them into `unsupported` scan results.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("api key for {0} is not configured")]
    MissingApiKey(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("unexpected payload: {0}")]
    Payload(String),
}

/// One ERC-20 style transfer row as reported by an etherscan-family
/// explorer. Only the fields the scanner reads are kept; values stay raw
/// decimal strings until unit conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub value: String,
}
