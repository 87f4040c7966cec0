pub mod address;
pub mod cache;
pub mod catalog;
pub mod chains;
pub mod checker;
pub mod clients;
pub mod jobs;
pub mod scanner;
pub mod types;
pub mod units;

pub use address::normalize_wallets;
pub use cache::{CachedError, ScanCache, TtlCache};
pub use catalog::{default_catalog, AirdropDefinition};
pub use chains::{default_chains, ChainConfig, ChainFamily, ChainRegistry};
pub use checker::WalletChecker;
pub use jobs::{BulkScanConfig, BulkScanService, JobError, JobStatus};
pub use scanner::MultiChainScanner;
pub use types::{ScanOptions, ScanResult, ScanTotals, WalletSummary};
