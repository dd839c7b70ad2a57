//! Rate resolution: cached same-day snapshot or historical fetch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use ratesvc_common::{time, CurrencyCode};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::cache::RateCache;
use crate::error::{RatesError, RatesResult};
use crate::provider::RateProvider;
use crate::validator::RateRequest;

/// The answer to a rates request. Produced fresh per request, never cached.
#[derive(Debug, Clone, Serialize)]
pub struct RateResult {
    /// The base currency the rates are quoted against.
    pub base: CurrencyCode,
    /// The requested timestamp, RFC 3339. Always the request's timestamp,
    /// not the snapshot's fetch time.
    pub date: String,
    /// Cross-rates per target currency.
    pub rates: BTreeMap<CurrencyCode, f64>,
}

/// Decides, per request, between the cached daily snapshot and a
/// historical fetch.
///
/// A request on the same UTC calendar day as the snapshot's fetch time is
/// answered from the cache; anything else is necessarily in the past
/// (future timestamps are rejected during validation) and goes to the
/// provider on the request's critical path. The two paths produce
/// indistinguishable results apart from latency.
pub struct RateResolver {
    cache: Arc<RateCache>,
    provider: Arc<dyn RateProvider>,
}

impl RateResolver {
    /// Create a resolver over the given cache and provider.
    pub fn new(cache: Arc<RateCache>, provider: Arc<dyn RateProvider>) -> Self {
        Self { cache, provider }
    }

    /// Resolve a validated request into a [`RateResult`].
    #[instrument(skip(self, request), fields(base = %request.base))]
    pub async fn resolve(&self, request: &RateRequest) -> RatesResult<RateResult> {
        let date = time::format_rfc3339(&request.timestamp);

        let rates = if time::same_utc_day(&request.timestamp, &self.cache.snapshot_date()) {
            self.from_snapshot(request)?
        } else {
            self.from_history(request).await?
        };

        Ok(RateResult {
            base: request.base.clone(),
            date,
            rates,
        })
    }

    /// Cross-rates straight from the live snapshot.
    fn from_snapshot(&self, request: &RateRequest) -> RatesResult<BTreeMap<CurrencyCode, f64>> {
        let snapshot = self.cache.snapshot();
        let base_rate = snapshot
            .rate_of(&request.base)
            .ok_or_else(|| RatesError::CurrencyUnrecognized(request.base.to_string()))?;

        let mut rates = BTreeMap::new();
        for target in &request.targets {
            // The snapshot may have been swapped since validation; a code
            // that vanished is reported rather than silently invented.
            let target_rate = snapshot
                .rate_of(target)
                .ok_or_else(|| RatesError::CurrencyUnrecognized(target.to_string()))?;
            rates.insert(target.clone(), target_rate / base_rate);
        }
        Ok(rates)
    }

    /// Synchronous historical fetch; the returned map is already quoted
    /// against the request's base.
    async fn from_history(&self, request: &RateRequest) -> RatesResult<BTreeMap<CurrencyCode, f64>> {
        debug!(
            provider = self.provider.name(),
            timestamp = %request.timestamp,
            "Request falls outside the snapshot day, fetching historical rates"
        );
        let historical = self
            .provider
            .fetch_historical(&request.base, request.timestamp.with_timezone(&Utc))
            .await?;

        // Only the requested targets; what the provider quotes for a past
        // date is provider-defined, so absent codes are simply omitted.
        Ok(request
            .targets
            .iter()
            .filter_map(|target| historical.get(target).map(|rate| (target.clone(), *rate)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockRateProvider;
    use crate::validator::RateRequest;
    use std::collections::BTreeSet;

    const SNAPSHOT_DAY: &str = "2016-04-29T14:34:46Z";

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s)
    }

    fn request(base: &str, targets: &[&str], timestamp: &str) -> RateRequest {
        RateRequest {
            base: code(base),
            targets: targets.iter().map(|t| code(t)).collect::<BTreeSet<_>>(),
            timestamp: time::parse_rfc3339(timestamp).unwrap(),
        }
    }

    async fn resolver() -> (RateResolver, Arc<MockRateProvider>) {
        let provider = Arc::new(MockRateProvider::fixture());
        let cache = Arc::new(RateCache::warm(provider.clone()).await.unwrap());
        (RateResolver::new(cache, provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_same_day_cross_rate_from_snapshot() {
        let (resolver, provider) = resolver().await;
        let result = resolver
            .resolve(&request("USD", &["CAD"], SNAPSHOT_DAY))
            .await
            .unwrap();

        assert_eq!(result.base, code("USD"));
        assert_eq!(result.date, SNAPSHOT_DAY);
        assert_eq!(result.rates.get(&code("CAD")), Some(&1.2528));
        assert_eq!(provider.historical_calls(), 0);
    }

    #[tokio::test]
    async fn test_base_equals_target_is_one() {
        let (resolver, _) = resolver().await;
        for base in ["USD", "CAD", "EUR", "JPY"] {
            let result = resolver
                .resolve(&request(base, &[base], SNAPSHOT_DAY))
                .await
                .unwrap();
            assert_eq!(result.rates.get(&code(base)), Some(&1.0));
        }
    }

    #[tokio::test]
    async fn test_non_reference_base() {
        let (resolver, _) = resolver().await;
        let result = resolver
            .resolve(&request("EUR", &["CAD"], SNAPSHOT_DAY))
            .await
            .unwrap();

        let rate = result.rates.get(&code("CAD")).unwrap();
        assert!((rate - 1.2528 / 0.87696).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_all_targets_divided_by_base() {
        let (resolver, _) = resolver().await;
        let targets = ["CAD", "EUR", "GBP", "INR", "JPY", "USD"];
        let result = resolver
            .resolve(&request("CAD", &targets, SNAPSHOT_DAY))
            .await
            .unwrap();

        assert_eq!(result.rates.len(), targets.len());
        assert_eq!(result.rates.get(&code("CAD")), Some(&1.0));
        let usd = result.rates.get(&code("USD")).unwrap();
        assert!((usd - 1.0 / 1.2528).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_same_day_stable_across_times_of_day() {
        let (resolver, provider) = resolver().await;
        let morning = resolver
            .resolve(&request("USD", &["CAD", "EUR"], "2016-04-29T00:00:01Z"))
            .await
            .unwrap();
        let night = resolver
            .resolve(&request("USD", &["CAD", "EUR"], "2016-04-29T23:59:59Z"))
            .await
            .unwrap();

        assert_eq!(morning.rates, night.rates);
        assert_ne!(morning.date, night.date);
        assert_eq!(provider.historical_calls(), 0);
    }

    #[tokio::test]
    async fn test_offset_timestamp_still_same_utc_day() {
        let (resolver, provider) = resolver().await;
        // 16:34 at +02:00 is 14:34 UTC, the snapshot's day.
        let result = resolver
            .resolve(&request("USD", &["CAD"], "2016-04-29T16:34:46+02:00"))
            .await
            .unwrap();

        assert_eq!(result.date, "2016-04-29T16:34:46+02:00");
        assert_eq!(provider.historical_calls(), 0);
    }

    #[tokio::test]
    async fn test_past_day_goes_to_provider() {
        let (resolver, provider) = resolver().await;
        let result = resolver
            .resolve(&request("USD", &["CAD"], "2016-04-27T09:00:00Z"))
            .await
            .unwrap();

        assert_eq!(provider.historical_calls(), 1);
        assert_eq!(result.date, "2016-04-27T09:00:00Z");
        assert!(result.rates.contains_key(&code("CAD")));
    }

    #[tokio::test]
    async fn test_historical_copies_only_requested_targets() {
        let (resolver, provider) = resolver().await;
        let canned: BTreeMap<CurrencyCode, f64> = [
            (code("USD"), 1.0),
            (code("CAD"), 1.3),
            (code("EUR"), 0.9),
        ]
        .into_iter()
        .collect();
        provider.set_historical(canned);

        let result = resolver
            .resolve(&request("USD", &["CAD"], "2016-04-27T09:00:00Z"))
            .await
            .unwrap();

        assert_eq!(result.rates.len(), 1);
        assert_eq!(result.rates.get(&code("CAD")), Some(&1.3));
    }

    #[tokio::test]
    async fn test_historical_failure_is_request_local() {
        let (resolver, provider) = resolver().await;
        provider.fail_historical(true);

        let result = resolver
            .resolve(&request("USD", &["CAD"], "2016-04-27T09:00:00Z"))
            .await;
        assert!(matches!(result, Err(RatesError::UpstreamUnavailable(_))));

        // The cached snapshot keeps serving same-day requests.
        let ok = resolver
            .resolve(&request("USD", &["CAD"], SNAPSHOT_DAY))
            .await
            .unwrap();
        assert_eq!(ok.rates.get(&code("CAD")), Some(&1.2528));
    }

    #[test]
    fn test_result_serializes_wire_shape() {
        let result = RateResult {
            base: code("USD"),
            date: SNAPSHOT_DAY.to_string(),
            rates: [(code("CAD"), 1.2528)].into_iter().collect(),
        };
        let body = serde_json::to_string(&result).unwrap();
        assert_eq!(
            body,
            r#"{"base":"USD","date":"2016-04-29T14:34:46Z","rates":{"CAD":1.2528}}"#
        );
    }
}
