//! Currency code type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency identifier, normalized to upper case.
///
/// Whether a code is actually supported is decided by membership in the
/// live [`RateSnapshot`](crate::RateSnapshot), not by a fixed enumeration:
/// the supported set changes with every upstream refresh.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a new currency code from any casing.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Get the upper-cased code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
