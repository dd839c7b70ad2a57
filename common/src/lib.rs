//! ratesvc Common Types
//!
//! Shared leaf types for the rates service: currency codes, the rate
//! snapshot value, and timestamp helpers.

pub mod currency;
pub mod snapshot;
pub mod time;

pub use currency::*;
pub use snapshot::*;
pub use time::*;
