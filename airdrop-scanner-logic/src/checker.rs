use std::sync::Arc;

use futures::{stream, StreamExt};

use crate::{
    catalog::AirdropDefinition,
    scanner::MultiChainScanner,
    types::{ScanOptions, WalletSummary},
};

/// Runs one wallet against the full airdrop catalog with bounded
/// concurrency. Results come back in catalog order regardless of which
/// provider answered first.
pub struct WalletChecker {
    scanner: Arc<MultiChainScanner>,
    catalog: Arc<Vec<AirdropDefinition>>,
    concurrency: usize,
}

impl WalletChecker {
    pub fn new(
        scanner: Arc<MultiChainScanner>,
        catalog: Arc<Vec<AirdropDefinition>>,
        concurrency: usize,
    ) -> Self {
        Self {
            scanner,
            catalog,
            concurrency: concurrency.max(1),
        }
    }

    pub fn catalog(&self) -> &[AirdropDefinition] {
        &self.catalog
    }

    pub async fn check_wallet(&self, wallet: &str, options: ScanOptions) -> WalletSummary {
        let results = stream::iter(self.catalog.iter().cloned())
            .map(|airdrop| {
                let scanner = Arc::clone(&self.scanner);
                async move {
                    scanner
                        .scan_airdrop(wallet, &airdrop, options.include_transfers)
                        .await
                }
            })
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await;
        WalletSummary::from_results(wallet, results)
    }
}
