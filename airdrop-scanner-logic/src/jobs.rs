use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{stream, FutureExt, StreamExt};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    address::normalize_wallets,
    checker::WalletChecker,
    types::{ScanOptions, ScanTotals, WalletSummary},
};

/// Limits and retention for bulk scans.
#[derive(Debug, Clone)]
pub struct BulkScanConfig {
    pub max_wallets: usize,
    pub concurrency: usize,
    pub retention: Duration,
}

impl Default for BulkScanConfig {
    fn default() -> Self {
        Self {
            max_wallets: 10_000,
            concurrency: 10,
            retention: Duration::from_secs(2 * 60 * 60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("no valid wallets supplied")]
    NoWallets,
    #[error("too many wallets: {count} exceeds the limit of {limit}")]
    TooMany { count: usize, limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Status view of one job; `percent` is rounded to two decimal places.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub total_wallets: usize,
    pub completed_wallets: usize,
    pub percent: f64,
    pub include_transfers: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResults {
    pub job_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub wallets: Vec<WalletSummary>,
    pub totals: ScanTotals,
}

struct BulkJob {
    status: JobStatus,
    total_wallets: usize,
    completed_wallets: usize,
    include_transfers: bool,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    // fixed at creation; finishing a job does not extend its life
    expires_at: Instant,
    expires_at_wall: DateTime<Utc>,
    // index slots keep wallet order stable while completions arrive in
    // whatever order the providers answer
    results: Vec<Option<WalletSummary>>,
    error: Option<String>,
}

impl BulkJob {
    fn new(total_wallets: usize, include_transfers: bool, retention: Duration) -> Self {
        let now = Utc::now();
        Self {
            status: JobStatus::Queued,
            total_wallets,
            completed_wallets: 0,
            include_transfers,
            created_at: now,
            started_at: None,
            completed_at: None,
            expires_at: Instant::now() + retention,
            expires_at_wall: now
                + chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::zero()),
            results: (0..total_wallets).map(|_| None).collect(),
            error: None,
        }
    }

    /// Status only moves forward; late completions from a job already
    /// marked failed cannot resurrect it.
    fn advance(&mut self, status: JobStatus) {
        if status > self.status {
            self.status = status;
            let now = Utc::now();
            match status {
                JobStatus::Running => self.started_at = Some(now),
                JobStatus::Completed | JobStatus::Failed => self.completed_at = Some(now),
                JobStatus::Queued => {}
            }
        }
    }

    fn percent(&self) -> f64 {
        if self.total_wallets == 0 {
            return 100.0;
        }
        let ratio = self.completed_wallets as f64 / self.total_wallets as f64;
        (ratio * 10_000.0).round() / 100.0
    }

    fn view(&self, job_id: Uuid) -> JobView {
        JobView {
            job_id,
            status: self.status,
            total_wallets: self.total_wallets,
            completed_wallets: self.completed_wallets,
            percent: self.percent(),
            include_transfers: self.include_transfers,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            expires_at: self.expires_at_wall,
            error: self.error.clone(),
        }
    }
}

/// Accepts large wallet batches, runs them in the background and keeps the
/// finished results around for a bounded retention window.
///
/// There is no persistence: jobs live in memory and die with the process.
pub struct BulkScanService {
    checker: Arc<WalletChecker>,
    jobs: Arc<DashMap<Uuid, BulkJob>>,
    config: BulkScanConfig,
}

impl BulkScanService {
    pub fn new(checker: Arc<WalletChecker>, config: BulkScanConfig) -> Self {
        Self {
            checker,
            jobs: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Validates the wallet list, registers a queued job and spawns the
    /// scan. Returns the job id immediately.
    pub fn create_job(
        &self,
        wallets: Vec<String>,
        options: ScanOptions,
    ) -> Result<Uuid, JobError> {
        self.sweep_expired();

        let wallets = normalize_wallets(wallets);
        if wallets.is_empty() {
            return Err(JobError::NoWallets);
        }
        if wallets.len() > self.config.max_wallets {
            return Err(JobError::TooMany {
                count: wallets.len(),
                limit: self.config.max_wallets,
            });
        }

        let id = Uuid::new_v4();
        self.jobs.insert(
            id,
            BulkJob::new(
                wallets.len(),
                options.include_transfers,
                self.config.retention,
            ),
        );
        tracing::info!(job_id = %id, wallets = wallets.len(), "bulk scan accepted");

        let checker = Arc::clone(&self.checker);
        let jobs = Arc::clone(&self.jobs);
        let concurrency = self.config.concurrency.max(1);
        tokio::spawn(async move {
            Self::execute(checker, jobs, id, wallets, options, concurrency).await;
        });
        Ok(id)
    }

    async fn execute(
        checker: Arc<WalletChecker>,
        jobs: Arc<DashMap<Uuid, BulkJob>>,
        id: Uuid,
        wallets: Vec<String>,
        options: ScanOptions,
        concurrency: usize,
    ) {
        if let Some(mut job) = jobs.get_mut(&id) {
            job.advance(JobStatus::Running);
        }

        let scan = stream::iter(wallets.into_iter().enumerate())
            .map(|(index, wallet)| {
                let checker = Arc::clone(&checker);
                async move { (index, checker.check_wallet(&wallet, options).await) }
            })
            .buffer_unordered(concurrency)
            .for_each(|(index, summary)| {
                let jobs = Arc::clone(&jobs);
                async move {
                    if let Some(mut job) = jobs.get_mut(&id) {
                        job.results[index] = Some(summary);
                        job.completed_wallets += 1;
                    }
                }
            });

        let outcome = std::panic::AssertUnwindSafe(scan).catch_unwind().await;
        if let Some(mut job) = jobs.get_mut(&id) {
            match outcome {
                Ok(()) => job.advance(JobStatus::Completed),
                Err(_) => {
                    job.error = Some("scan worker panicked".to_string());
                    job.advance(JobStatus::Failed);
                    tracing::error!(job_id = %id, "bulk scan worker panicked");
                }
            }
        }
    }

    pub fn get_job(&self, id: Uuid) -> Option<JobView> {
        self.sweep_expired();
        self.jobs.get(&id).map(|job| job.view(id))
    }

    /// Full results, available once the job completed.
    pub fn get_job_results(&self, id: Uuid) -> Option<JobResults> {
        self.sweep_expired();
        let job = self.jobs.get(&id)?;
        if job.status != JobStatus::Completed {
            return None;
        }
        let wallets: Vec<WalletSummary> = job.results.iter().flatten().cloned().collect();
        let totals = ScanTotals::aggregate(&wallets);
        Some(JobResults {
            job_id: id,
            generated_at: job.completed_at.unwrap_or(job.created_at),
            wallets,
            totals,
        })
    }

    pub fn job_count(&self) -> usize {
        self.sweep_expired();
        self.jobs.len()
    }

    /// Jobs past their retention window are dropped lazily on every access
    /// instead of by a background task.
    fn sweep_expired(&self) {
        let now = Instant::now();
        self.jobs.retain(|_, job| job.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::ScanCache,
        catalog::AirdropDefinition,
        chains::{default_chains, ChainRegistry},
        scanner::MultiChainScanner,
    };
    use pretty_assertions::assert_eq;

    const COSMOS_A: &str = "cosmos1x5wgh6vwye60wv3dtshs9dmqggwfx2ldnqvev0";
    const COSMOS_B: &str = "osmo1x5wgh6vwye60wv3dtshs9dmqggwfx2ldcllaug";

    fn offline_service(config: BulkScanConfig) -> BulkScanService {
        let catalog = vec![AirdropDefinition {
            key: "ATOM".to_string(),
            name: "Cosmos Hub".to_string(),
            chain: "cosmos".to_string(),
            chain_id: "cosmoshub-4".to_string(),
            token_address: Some("uatom".to_string()),
            decimals: 6,
            price_usd: 1.0,
            avg_airdrop_usd: 100.0,
        }];
        let scanner = Arc::new(MultiChainScanner::new(
            ChainRegistry::new(default_chains()),
            Arc::new(ScanCache::new(Duration::from_secs(60))),
            Duration::from_secs(60),
            Duration::from_secs(5),
        ));
        let checker = Arc::new(WalletChecker::new(scanner, Arc::new(catalog), 4));
        BulkScanService::new(checker, config)
    }

    async fn wait_for_completion(service: &BulkScanService, id: Uuid) -> JobView {
        for _ in 0..200 {
            if let Some(view) = service.get_job(id) {
                if view.status == JobStatus::Completed || view.status == JobStatus::Failed {
                    return view;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish in time");
    }

    #[tokio::test]
    async fn job_runs_to_completion_with_ordered_results() {
        let service = offline_service(BulkScanConfig::default());
        let id = service
            .create_job(
                vec![COSMOS_A.to_string(), COSMOS_B.to_string()],
                ScanOptions::default(),
            )
            .unwrap();

        let view = wait_for_completion(&service, id).await;
        assert_eq!(view.status, JobStatus::Completed);
        assert_eq!(view.completed_wallets, 2);
        assert_eq!(view.percent, 100.0);
        assert!(view.include_transfers);
        assert!(view.started_at.is_some());
        assert!(view.completed_at.is_some());

        let results = service.get_job_results(id).unwrap();
        let wallets: Vec<_> = results.wallets.iter().map(|w| w.wallet.as_str()).collect();
        assert_eq!(wallets, vec![COSMOS_A, COSMOS_B]);
        assert_eq!(results.totals.detected_airdrops, 0);
    }

    #[tokio::test]
    async fn rejects_empty_and_invalid_wallet_lists() {
        let service = offline_service(BulkScanConfig::default());
        assert!(matches!(
            service.create_job(vec![], ScanOptions::default()),
            Err(JobError::NoWallets)
        ));
        assert!(matches!(
            service.create_job(vec!["garbage".to_string()], ScanOptions::default()),
            Err(JobError::NoWallets)
        ));
    }

    #[tokio::test]
    async fn rejects_oversized_batches() {
        let service = offline_service(BulkScanConfig {
            max_wallets: 1,
            ..BulkScanConfig::default()
        });
        let err = service
            .create_job(
                vec![COSMOS_A.to_string(), COSMOS_B.to_string()],
                ScanOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, JobError::TooMany { count: 2, limit: 1 }));
    }

    #[tokio::test]
    async fn results_are_withheld_until_completion() {
        let service = offline_service(BulkScanConfig::default());
        assert!(service.get_job_results(Uuid::new_v4()).is_none());

        let id = service
            .create_job(vec![COSMOS_A.to_string()], ScanOptions::default())
            .unwrap();
        wait_for_completion(&service, id).await;
        assert!(service.get_job_results(id).is_some());
    }

    #[tokio::test]
    async fn finished_jobs_expire_after_retention() {
        let service = offline_service(BulkScanConfig {
            retention: Duration::from_millis(50),
            ..BulkScanConfig::default()
        });
        let id = service
            .create_job(vec![COSMOS_A.to_string()], ScanOptions::default())
            .unwrap();
        wait_for_completion(&service, id).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(service.get_job(id).is_none());
        assert_eq!(service.job_count(), 0);
    }

    #[tokio::test]
    async fn expiry_is_anchored_at_creation() {
        let service = offline_service(BulkScanConfig::default());
        let id = service
            .create_job(vec![COSMOS_A.to_string()], ScanOptions::default())
            .unwrap();
        let before = service.get_job(id).unwrap().expires_at;
        let after = wait_for_completion(&service, id).await.expires_at;
        assert_eq!(before, after);
    }

    #[test]
    fn percent_is_rounded_to_two_decimals() {
        let mut job = BulkJob::new(3, true, Duration::from_secs(60));
        job.completed_wallets = 1;
        assert_eq!(job.percent(), 33.33);
        job.completed_wallets = 2;
        assert_eq!(job.percent(), 66.67);
    }
}
