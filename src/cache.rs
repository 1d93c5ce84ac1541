//! TTL cache for ledger reads.
//!
//! Balance and transaction-history lookups are read-mostly and feed display
//! surfaces, so they are cached per user with a short expiry. The cache is
//! strictly a read-side optimization: the ledger re-reads balances from the
//! store before every debit, and every mutation invalidates both parties'
//! entries before the mutating call returns.

use crate::entities::transaction;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::trace;

/// How long a cached balance or history entry stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Per-user cache of balances and transaction histories.
#[derive(Debug)]
pub struct LedgerCache {
    ttl: Duration,
    balances: RwLock<HashMap<i64, CacheEntry<f64>>>,
    histories: RwLock<HashMap<i64, CacheEntry<Vec<transaction::Model>>>>,
}

impl Default for LedgerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerCache {
    /// Creates a cache with the default five-minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a cache with a custom TTL. Tests use a zero TTL to exercise
    /// the expiry path deterministically.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            balances: RwLock::new(HashMap::new()),
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached balance for `user_id` if present and unexpired.
    pub async fn cached_balance(&self, user_id: i64) -> Option<f64> {
        let balances = self.balances.read().await;
        balances.get(&user_id).filter(|e| e.fresh()).map(|e| {
            trace!(user_id, "serving balance from cache");
            e.value
        })
    }

    /// Stores a balance read for `user_id`.
    pub async fn store_balance(&self, user_id: i64, balance: f64) {
        let mut balances = self.balances.write().await;
        balances.insert(
            user_id,
            CacheEntry {
                value: balance,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Returns the cached transaction history for `user_id` if unexpired.
    pub async fn cached_history(&self, user_id: i64) -> Option<Vec<transaction::Model>> {
        let histories = self.histories.read().await;
        histories.get(&user_id).filter(|e| e.fresh()).map(|e| {
            trace!(user_id, "serving transaction history from cache");
            e.value.clone()
        })
    }

    /// Stores a transaction-history read for `user_id`.
    pub async fn store_history(&self, user_id: i64, history: Vec<transaction::Model>) {
        let mut histories = self.histories.write().await;
        histories.insert(
            user_id,
            CacheEntry {
                value: history,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops both cached entries for `user_id`. Called synchronously at every
    /// mutation site before the mutating operation returns.
    pub async fn invalidate(&self, user_id: i64) {
        self.balances.write().await.remove(&user_id);
        self.histories.write().await.remove(&user_id);
        trace!(user_id, "invalidated ledger cache entries");
    }
}
