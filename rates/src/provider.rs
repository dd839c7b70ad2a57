//! Rate provider trait and implementations.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratesvc_common::{time, CurrencyCode, RateSnapshot};
use serde::Deserialize;
use tracing::debug;

use crate::error::{RatesError, RatesResult};

/// Source of exchange rates.
///
/// Implementations quote every rate against the requested base currency,
/// upper-case the currency codes they return, and include the base itself
/// at 1.0.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current full snapshot, quoted against the provider's
    /// reference currency, stamped with the fetch time.
    async fn fetch_latest(&self) -> RatesResult<RateSnapshot>;

    /// Fetch the rate map for a past point in time, quoted against `base`.
    async fn fetch_historical(
        &self,
        base: &CurrencyCode,
        at: DateTime<Utc>,
    ) -> RatesResult<BTreeMap<CurrencyCode, f64>>;
}

/// Upstream JSON body: `{"base": .., "date": .., "rates": {code: rate}}`.
#[derive(Debug, Deserialize)]
struct ProviderPayload {
    rates: std::collections::HashMap<String, f64>,
}

/// Rate provider backed by a fixer-style REST API.
///
/// The upstream is queried as `GET {endpoint}/{YYYY-MM-DD}?base={code}`,
/// which serves both the latest snapshot (today's date) and historical
/// lookups.
pub struct FixerProvider {
    client: reqwest::Client,
    endpoint: String,
    reference: CurrencyCode,
}

impl FixerProvider {
    /// Create a provider for the given endpoint and reference currency.
    pub fn new(
        endpoint: impl Into<String>,
        reference: CurrencyCode,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            reference,
        })
    }

    async fn request(
        &self,
        base: &CurrencyCode,
        at: DateTime<Utc>,
    ) -> RatesResult<BTreeMap<CurrencyCode, f64>> {
        let url = format!(
            "{}/{}?base={}",
            self.endpoint.trim_end_matches('/'),
            at.format("%Y-%m-%d"),
            base
        );
        debug!(url = %url, "Querying upstream provider");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RatesError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RatesError::UpstreamUnavailable(format!(
                "upstream returned status {}",
                response.status()
            )));
        }

        let payload = response
            .json::<ProviderPayload>()
            .await
            .map_err(|e| RatesError::UpstreamUnavailable(e.to_string()))?;

        Ok(normalize(payload, base))
    }
}

/// Upper-case the returned codes and pin the requested base at 1.0.
fn normalize(payload: ProviderPayload, base: &CurrencyCode) -> BTreeMap<CurrencyCode, f64> {
    let mut rates: BTreeMap<CurrencyCode, f64> = payload
        .rates
        .into_iter()
        .map(|(code, rate)| (CurrencyCode::new(code), rate))
        .collect();
    rates.insert(base.clone(), 1.0);
    rates
}

#[async_trait]
impl RateProvider for FixerProvider {
    fn name(&self) -> &str {
        "fixer"
    }

    async fn fetch_latest(&self) -> RatesResult<RateSnapshot> {
        let fetched_at = time::now();
        let rates = self.request(&self.reference, fetched_at).await?;
        RateSnapshot::new(self.reference.clone(), rates, fetched_at)
            .map_err(|e| RatesError::UpstreamUnavailable(e.to_string()))
    }

    async fn fetch_historical(
        &self,
        base: &CurrencyCode,
        at: DateTime<Utc>,
    ) -> RatesResult<BTreeMap<CurrencyCode, f64>> {
        self.request(base, at).await
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    snapshot: parking_lot::RwLock<RateSnapshot>,
    historical: parking_lot::RwLock<Option<BTreeMap<CurrencyCode, f64>>>,
    fail_latest: std::sync::atomic::AtomicBool,
    fail_historical: std::sync::atomic::AtomicBool,
    latest_calls: std::sync::atomic::AtomicUsize,
    historical_calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a mock serving the given snapshot.
    pub fn new(snapshot: RateSnapshot) -> Self {
        Self {
            snapshot: parking_lot::RwLock::new(snapshot),
            historical: parking_lot::RwLock::new(None),
            fail_latest: std::sync::atomic::AtomicBool::new(false),
            fail_historical: std::sync::atomic::AtomicBool::new(false),
            latest_calls: std::sync::atomic::AtomicUsize::new(0),
            historical_calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A USD-referenced snapshot fetched 2016-04-29T14:34:46Z.
    pub fn fixture() -> Self {
        let fetched_at = time::parse_rfc3339("2016-04-29T14:34:46Z")
            .expect("fixture timestamp")
            .with_timezone(&Utc);
        let rates: BTreeMap<CurrencyCode, f64> = [
            ("CAD", 1.2528),
            ("EUR", 0.87696),
            ("GBP", 0.68425),
            ("INR", 66.384),
            ("JPY", 107.29),
        ]
        .into_iter()
        .map(|(code, rate)| (CurrencyCode::new(code), rate))
        .collect();
        let snapshot = RateSnapshot::new(CurrencyCode::new("USD"), rates, fetched_at)
            .expect("fixture snapshot");
        Self::new(snapshot)
    }

    /// Replace the snapshot served by `fetch_latest`.
    pub fn set_snapshot(&self, snapshot: RateSnapshot) {
        *self.snapshot.write() = snapshot;
    }

    /// Serve a canned map from `fetch_historical` instead of rebasing the
    /// snapshot.
    pub fn set_historical(&self, rates: BTreeMap<CurrencyCode, f64>) {
        *self.historical.write() = Some(rates);
    }

    /// Make `fetch_latest` fail.
    pub fn fail_latest(&self, fail: bool) {
        self.fail_latest
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Make `fetch_historical` fail.
    pub fn fail_historical(&self, fail: bool) {
        self.fail_historical
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of `fetch_latest` calls seen.
    pub fn latest_calls(&self) -> usize {
        self.latest_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Number of `fetch_historical` calls seen.
    pub fn historical_calls(&self) -> usize {
        self.historical_calls
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_latest(&self) -> RatesResult<RateSnapshot> {
        self.latest_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_latest.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(RatesError::UpstreamUnavailable(
                "mock latest failure".to_string(),
            ));
        }
        Ok(self.snapshot.read().clone())
    }

    async fn fetch_historical(
        &self,
        base: &CurrencyCode,
        _at: DateTime<Utc>,
    ) -> RatesResult<BTreeMap<CurrencyCode, f64>> {
        self.historical_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_historical.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(RatesError::UpstreamUnavailable(
                "mock historical failure".to_string(),
            ));
        }

        if let Some(rates) = self.historical.read().clone() {
            return Ok(rates);
        }

        // Rebase the held snapshot onto the requested base.
        let snapshot = self.snapshot.read().clone();
        let base_rate = snapshot
            .rate_of(base)
            .ok_or_else(|| RatesError::UpstreamUnavailable(format!("no rate for base {base}")))?;
        Ok(snapshot
            .codes()
            .map(|code| {
                let rate = snapshot.rate_of(code).unwrap_or_default();
                (code.clone(), rate / base_rate)
            })
            .collect())
    }
}
