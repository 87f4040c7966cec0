use serde::{Deserialize, Serialize};

use crate::catalog::AirdropDefinition;

/// Per-request scan options.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    pub include_transfers: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            include_transfers: true,
        }
    }
}

/// Outcome of checking one wallet against one airdrop. Never an error:
/// anything the adapters could not answer becomes an `unsupported` row with
/// a structured reason.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub key: String,
    pub name: String,
    pub chain: String,
    pub chain_id: String,
    pub token_address: Option<String>,
    pub detected: bool,
    pub balance: f64,
    pub claimed_amount: f64,
    pub claim_events: u64,
    pub estimated_usd: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unsupported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ScanResult {
    pub fn not_supported(airdrop: &AirdropDefinition, reason: impl Into<String>) -> Self {
        Self {
            key: airdrop.key.clone(),
            name: airdrop.name.clone(),
            chain: airdrop.chain.clone(),
            chain_id: airdrop.chain_id.clone(),
            token_address: airdrop.token_address.clone(),
            detected: false,
            balance: 0.0,
            claimed_amount: 0.0,
            claim_events: 0,
            estimated_usd: 0.0,
            unsupported: true,
            reason: Some(reason.into()),
        }
    }
}

/// One wallet's aggregate over the whole catalog. `results` preserves
/// catalog order and length; the counters cover detected rows only.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub wallet: String,
    pub detected_airdrops: u64,
    pub claim_events: u64,
    pub estimated_usd: f64,
    pub results: Vec<ScanResult>,
}

impl WalletSummary {
    pub fn from_results(wallet: impl Into<String>, results: Vec<ScanResult>) -> Self {
        let mut detected_airdrops = 0;
        let mut claim_events = 0;
        let mut estimated_usd = 0.0;
        for row in results.iter().filter(|row| row.detected) {
            detected_airdrops += 1;
            claim_events += row.claim_events;
            estimated_usd += row.estimated_usd;
        }
        Self {
            wallet: wallet.into(),
            detected_airdrops,
            claim_events,
            estimated_usd,
            results,
        }
    }
}

/// Grand totals over a set of wallet summaries.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanTotals {
    pub detected_airdrops: u64,
    pub claim_events: u64,
    pub estimated_usd: f64,
}

impl ScanTotals {
    pub fn aggregate<'a>(summaries: impl IntoIterator<Item = &'a WalletSummary>) -> Self {
        let mut totals = Self::default();
        for summary in summaries {
            totals.detected_airdrops += summary.detected_airdrops;
            totals.claim_events += summary.claim_events;
            totals.estimated_usd += summary.estimated_usd;
        }
        totals
    }
}
