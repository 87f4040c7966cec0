use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{ClientError, TokenTransfer};

const RATE_LIMIT_BACKOFF: Duration = Duration::from_millis(400);

/// Client for etherscan-family block explorer APIs.
///
/// All requests go through the explorer's `status`/`message`/`result`
/// envelope. `status == "1"` is success; "No transactions found" is an empty
/// result, not an error; rate-limit replies are retried once after a short
/// fixed backoff before the error is surfaced.
pub struct ExplorerClient {
    api_base: Url,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Value,
}

fn is_rate_limited(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("rate limit")
        || lowered.contains("max rate")
        || lowered.contains("too many requests")
}

impl ExplorerClient {
    pub fn new(api_base: Url, api_key: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base,
            api_key,
            client,
        })
    }

    fn host(&self) -> String {
        self.api_base
            .host_str()
            .unwrap_or("explorer")
            .to_string()
    }

    async fn request(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        if self.api_key.is_empty() {
            return Err(ClientError::MissingApiKey(self.host()));
        }

        let mut retries_left = 1u8;
        loop {
            let response = self
                .client
                .get(self.api_base.clone())
                .query(params)
                .query(&[("apikey", self.api_key.as_str())])
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(ClientError::Provider(format!(
                    "{} replied HTTP {}",
                    self.host(),
                    response.status()
                )));
            }

            let envelope: Envelope = response.json().await?;
            if envelope.status == "1" {
                return Ok(envelope.result);
            }

            let text = match &envelope.result {
                Value::String(s) => s.clone(),
                _ => envelope.message.unwrap_or_default(),
            };
            if text.to_lowercase().contains("no transactions found") {
                return Ok(Value::Array(Vec::new()));
            }
            if retries_left > 0 && is_rate_limited(&text) {
                retries_left -= 1;
                tracing::debug!(host = %self.host(), "rate limited, retrying once");
                tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                continue;
            }

            return Err(ClientError::Provider(if text.is_empty() {
                "explorer api error".to_string()
            } else {
                text
            }));
        }
    }

    /// Raw token balance as a decimal string; absent balances come back "0".
    pub async fn token_balance(
        &self,
        address: &str,
        contract_address: &str,
    ) -> Result<String, ClientError> {
        let result = self
            .request(&[
                ("module", "account"),
                ("action", "tokenbalance"),
                ("address", address),
                ("contractaddress", contract_address),
                ("tag", "latest"),
            ])
            .await?;
        Ok(match result {
            Value::String(s) => s,
            _ => "0".to_string(),
        })
    }

    /// First page of token transfers touching `address` for one contract,
    /// oldest first.
    pub async fn token_transfers(
        &self,
        address: &str,
        contract_address: &str,
        offset: u32,
    ) -> Result<Vec<TokenTransfer>, ClientError> {
        let offset = offset.to_string();
        let result = self
            .request(&[
                ("module", "account"),
                ("action", "tokentx"),
                ("address", address),
                ("contractaddress", contract_address),
                ("page", "1"),
                ("offset", offset.as_str()),
                ("sort", "asc"),
            ])
            .await?;
        match result {
            Value::Array(_) => serde_json::from_value(result)
                .map_err(|e| ClientError::Payload(e.to_string())),
            _ => Ok(Vec::new()),
        }
    }
}
