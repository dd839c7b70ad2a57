//! Query validation and normalization.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use ratesvc_common::{time, CurrencyCode};

use crate::cache::RateCache;
use crate::error::{RatesError, RatesResult};

/// The recognized query parameters of `/rates`.
const RECOGNIZED_PARAMETERS: [&str; 3] = ["base", "target", "timestamp"];

/// A validated, fully populated rates request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    /// Base currency; defaults to the snapshot's reference currency.
    pub base: CurrencyCode,
    /// Requested target currencies, deduplicated; defaults to every code
    /// in the current snapshot.
    pub targets: BTreeSet<CurrencyCode>,
    /// Requested point in time, offset as supplied; defaults to now.
    pub timestamp: DateTime<FixedOffset>,
}

/// Parses and validates raw query strings against the live snapshot.
///
/// Validation order is part of the observable contract: malformed query,
/// then unrecognized parameter (encounter order), then currency
/// recognition (all `base` values before all `target` values, encounter
/// order), then base cardinality, then timestamp format, then
/// future-timestamp rejection.
pub struct RequestValidator<'a> {
    cache: &'a RateCache,
}

impl<'a> RequestValidator<'a> {
    /// Create a validator reading the given cache.
    pub fn new(cache: &'a RateCache) -> Self {
        Self { cache }
    }

    /// Validate a raw query string into a [`RateRequest`].
    pub fn validate(&self, raw_query: &str) -> RatesResult<RateRequest> {
        if !query_is_well_formed(raw_query) {
            return Err(RatesError::MalformedQuery);
        }

        let mut bases = Vec::new();
        let mut targets = Vec::new();
        let mut timestamps = Vec::new();

        for (key, value) in form_urlencoded::parse(raw_query.as_bytes()).into_owned() {
            if !RECOGNIZED_PARAMETERS.contains(&key.as_str()) {
                return Err(RatesError::UnrecognizedParameter(key));
            }
            // Upper-casing the timestamp too is harmless in RFC 3339.
            let value = value.to_uppercase();
            match key.as_str() {
                "base" => bases.push(value),
                "target" => targets.push(value),
                _ => timestamps.push(value),
            }
        }

        for code in bases.iter().chain(targets.iter()) {
            if !self.cache.supports(&CurrencyCode::new(code.clone())) {
                return Err(RatesError::CurrencyUnrecognized(code.clone()));
            }
        }

        let base = match bases.len() {
            0 => self.cache.reference(),
            1 => CurrencyCode::new(bases.remove(0)),
            _ => return Err(RatesError::MultipleBasesSpecified),
        };

        // Only the first timestamp value is consulted.
        let timestamp = match timestamps.first() {
            None => time::now().fixed_offset(),
            Some(raw) => {
                let parsed =
                    time::parse_rfc3339(raw).map_err(|_| RatesError::TimestampInvalid)?;
                if parsed > time::now() {
                    return Err(RatesError::TimestampInFuture(time::format_rfc3339(&parsed)));
                }
                parsed
            }
        };

        let targets: BTreeSet<CurrencyCode> = if targets.is_empty() {
            self.cache.known_codes()
        } else {
            targets.into_iter().map(CurrencyCode::new).collect()
        };

        Ok(RateRequest {
            base,
            targets,
            timestamp,
        })
    }
}

/// Reject the query-string shapes `form_urlencoded` is lenient about:
/// semicolon separators and broken percent escapes.
fn query_is_well_formed(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b';' => return false,
            b'%' => {
                if i + 2 >= bytes.len()
                    || !bytes[i + 1].is_ascii_hexdigit()
                    || !bytes[i + 2].is_ascii_hexdigit()
                {
                    return false;
                }
                i += 3;
            }
            _ => i += 1,
        }
    }
    true
}
