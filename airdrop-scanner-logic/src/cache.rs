use std::{fmt::Display, sync::Arc, time::Duration};

use dashmap::DashMap;
use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use tokio::{task::JoinHandle, time::Instant};

use crate::{clients::TokenTransfer, scanner::SolanaTransferSummary};

type SharedProducer<V> = Shared<BoxFuture<'static, Result<V, CachedError>>>;

/// Producer errors are stringified so that the in-flight future stays
/// `Clone`-able across all callers awaiting the same key.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{inner}")]
pub struct CachedError {
    inner: String,
}

impl CachedError {
    pub fn new<E: Display>(e: E) -> Self {
        Self {
            inner: e.to_string(),
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// Keyed cache with per-entry expiry and in-flight request deduplication.
///
/// While a producer for some key is still running, every other caller of
/// [`TtlCache::get_or_try_insert`] with the same key awaits that producer's
/// shared future instead of issuing a duplicate call. A failed producer is
/// evicted, so the next request retries from scratch.
pub struct TtlCache<V> {
    store: Arc<DashMap<String, Entry<V>>>,
    inflight: Arc<DashMap<String, SharedProducer<V>>>,
    default_ttl: Duration,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            inflight: Arc::new(DashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// An expired entry is a miss and is removed on sight.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.store.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.store.remove(key);
        }
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.store.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Returns the cached value, or runs `produce` and caches its output.
    ///
    /// At most one producer per key is ever in flight; concurrent callers
    /// share its result, success or failure alike. Store insertion and
    /// inflight cleanup happen inside the shared future itself, so they run
    /// no matter which waiter drives it to completion; a cancelled caller
    /// cannot leave a finished producer stuck in the dedup map.
    pub async fn get_or_try_insert<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        produce: F,
    ) -> Result<V, CachedError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<V, E>> + Send + 'static,
        E: Display,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        match self.inflight.entry(key.to_string()) {
            dashmap::Entry::Occupied(entry) => {
                let shared = entry.get().clone();
                drop(entry);
                shared.await
            }
            dashmap::Entry::Vacant(entry) => {
                let store = Arc::clone(&self.store);
                let inflight = Arc::clone(&self.inflight);
                let key = key.to_string();
                let shared: SharedProducer<V> = async move {
                    let result = produce().await.map_err(CachedError::new);
                    if let Ok(value) = &result {
                        store.insert(
                            key.clone(),
                            Entry {
                                value: value.clone(),
                                expires_at: Instant::now() + ttl,
                            },
                        );
                    }
                    inflight.remove(&key);
                    result
                }
                .boxed()
                .shared();
                entry.insert(shared.clone());
                shared.await
            }
        }
    }

    /// Drops every entry past its expiry.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.store.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// The process-wide cache shared by every scan path. Balance, transfer and
/// Solana lookups each keep their own typed store but share TTL semantics.
pub struct ScanCache {
    pub balances: TtlCache<String>,
    pub transfers: TtlCache<Vec<TokenTransfer>>,
    pub solana: TtlCache<SolanaTransferSummary>,
}

impl ScanCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            balances: TtlCache::new(default_ttl),
            transfers: TtlCache::new(default_ttl),
            solana: TtlCache::new(default_ttl),
        }
    }

    pub fn sweep(&self) {
        self.balances.sweep();
        self.transfers.sweep();
        self.solana.sweep();
    }

    /// Periodic sweep so that idle keys do not linger past their TTL.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.sweep();
            }
        })
    }
}
