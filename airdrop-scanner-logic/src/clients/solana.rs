use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::ClientError;

/// SolanaFM indexer client. Unlike the EVM explorers it exposes no generic
/// balance call; the scanner works off the wallet's transfer history only.
pub struct SolanaClient {
    api_base: Url,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaTransfer {
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    amount: Value,
}

impl SolanaTransfer {
    /// Amounts arrive as numbers or numeric strings depending on the
    /// endpoint version; anything else counts as zero.
    pub fn amount(&self) -> f64 {
        match &self.amount {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(s) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TransfersEnvelope {
    #[serde(default)]
    result: TransfersResult,
}

#[derive(Debug, Default, Deserialize)]
struct TransfersResult {
    #[serde(default)]
    data: Vec<SolanaTransfer>,
}

impl SolanaClient {
    pub fn new(api_base: Url, api_key: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base,
            api_key,
            client,
        })
    }

    pub async fn wallet_transfers(&self, wallet: &str) -> Result<Vec<SolanaTransfer>, ClientError> {
        if self.api_key.is_empty() {
            return Err(ClientError::MissingApiKey("solanafm".to_string()));
        }
        let url = format!(
            "{}/accounts/{wallet}/transfers",
            self.api_base.as_str().trim_end_matches('/')
        );
        let response = self
            .client
            .get(url)
            .header("accept", "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Provider(format!(
                "solanafm replied HTTP {}",
                response.status()
            )));
        }
        let envelope: TransfersEnvelope = response.json().await?;
        Ok(envelope.result.data)
    }
}
