//! ratesvc Rate Engine
//!
//! The decision core of the rates service: the in-memory snapshot cache,
//! request validation, and rate resolution.
//!
//! A request flows `validate` -> `resolve`: [`RequestValidator`] turns a
//! raw query string into an immutable [`RateRequest`], and [`RateResolver`]
//! answers it either from the cached daily snapshot (same UTC calendar day)
//! or with a synchronous historical fetch from the upstream provider.

pub mod cache;
pub mod error;
pub mod provider;
pub mod resolver;
pub mod validator;

pub use cache::RateCache;
pub use error::{RatesError, RatesResult};
pub use provider::{FixerProvider, RateProvider};
pub use resolver::{RateResolver, RateResult};
pub use validator::{RateRequest, RequestValidator};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
