//! The rate snapshot value.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::currency::CurrencyCode;

/// Errors building a snapshot from upstream data.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The upstream payload carried no rates at all.
    #[error("Snapshot contains no rates")]
    Empty,
}

/// A complete set of currency rates fetched together at one point in time.
///
/// Every rate is expressed against the reference currency, which is always
/// present at exactly 1.0. The snapshot is immutable once built; a refresh
/// replaces the whole value rather than mutating it in place.
///
/// Rates are taken to be positive market quotes. That is a precondition on
/// what a provider may hand us, not something checked at runtime.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    reference: CurrencyCode,
    rates: BTreeMap<CurrencyCode, f64>,
    fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Build a snapshot from an upstream rate map.
    ///
    /// Keys are upper-cased and the reference currency is pinned at 1.0
    /// regardless of what the provider sent for it.
    pub fn new(
        reference: CurrencyCode,
        rates: BTreeMap<CurrencyCode, f64>,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self, SnapshotError> {
        if rates.is_empty() {
            return Err(SnapshotError::Empty);
        }

        let mut rates = rates;
        rates.insert(reference.clone(), 1.0);

        Ok(Self {
            reference,
            rates,
            fetched_at,
        })
    }

    /// The reference currency all rates are quoted against.
    pub fn reference(&self) -> &CurrencyCode {
        &self.reference
    }

    /// When this snapshot was fetched from upstream.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// True if the snapshot carries a rate for `code`.
    pub fn supports(&self, code: &CurrencyCode) -> bool {
        self.rates.contains_key(code)
    }

    /// Rate of `code` against the reference currency.
    pub fn rate_of(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// All currency codes in this snapshot.
    pub fn codes(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.rates.keys()
    }

    /// Number of currencies in this snapshot.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// True if the snapshot holds no rates. Unreachable for a constructed
    /// snapshot, present for completeness.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Cross-rate of `target` against `base`: `rate(target) / rate(base)`.
    pub fn cross_rate(&self, base: &CurrencyCode, target: &CurrencyCode) -> Option<f64> {
        let base_rate = self.rate_of(base)?;
        let target_rate = self.rate_of(target)?;
        Some(target_rate / base_rate)
    }
}
