//! The live snapshot cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use ratesvc_common::{CurrencyCode, RateSnapshot};
use tracing::{debug, info};

use crate::error::RatesResult;
use crate::provider::RateProvider;

/// Exclusive owner of the most recent [`RateSnapshot`].
///
/// The snapshot is held behind a copy-on-write swap: readers clone an
/// `Arc` under a short read lock, and [`RateCache::refresh`] replaces the
/// whole value or leaves it untouched. Readers never observe a partially
/// updated snapshot. Refresh is the only mutator.
pub struct RateCache {
    provider: Arc<dyn RateProvider>,
    snapshot: RwLock<Arc<RateSnapshot>>,
}

impl RateCache {
    /// Build a cache by performing the first fetch.
    ///
    /// There is no valid cache without at least one successful fetch, so a
    /// provider failure here is returned to the caller; process startup
    /// treats it as fatal.
    pub async fn warm(provider: Arc<dyn RateProvider>) -> RatesResult<Self> {
        let snapshot = provider.fetch_latest().await?;
        info!(
            provider = provider.name(),
            currencies = snapshot.len(),
            fetched_at = %snapshot.fetched_at(),
            "Initial snapshot loaded"
        );
        Ok(Self {
            provider,
            snapshot: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Fetch a fresh snapshot and swap it in.
    ///
    /// All-or-nothing: on any provider or decode failure the previous
    /// snapshot is retained and the error is returned.
    pub async fn refresh(&self) -> RatesResult<()> {
        let snapshot = self.provider.fetch_latest().await?;
        debug!(
            currencies = snapshot.len(),
            fetched_at = %snapshot.fetched_at(),
            "Snapshot refreshed"
        );
        *self.snapshot.write() = Arc::new(snapshot);
        Ok(())
    }

    /// The current snapshot, cheap to clone for per-request reads.
    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        self.snapshot.read().clone()
    }

    /// True if `code` (after upper-casing) is in the current snapshot.
    pub fn supports(&self, code: &CurrencyCode) -> bool {
        self.snapshot().supports(code)
    }

    /// All currency codes in the current snapshot.
    pub fn known_codes(&self) -> BTreeSet<CurrencyCode> {
        self.snapshot().codes().cloned().collect()
    }

    /// Fetch time of the current snapshot.
    pub fn snapshot_date(&self) -> DateTime<Utc> {
        self.snapshot().fetched_at()
    }

    /// Current-snapshot rate lookup.
    pub fn rate_of(&self, code: &CurrencyCode) -> Option<f64> {
        self.snapshot().rate_of(code)
    }

    /// The reference currency of the current snapshot.
    pub fn reference(&self) -> CurrencyCode {
        self.snapshot().reference().clone()
    }
}
