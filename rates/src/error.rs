//! Rate engine error types.

use thiserror::Error;

/// Errors that can occur while answering a rates request.
///
/// All validation variants are request-local and map to a 400 at the HTTP
/// boundary; [`RatesError::UpstreamUnavailable`] is the only variant that
/// originates outside the process.
#[derive(Debug, Error)]
pub enum RatesError {
    /// The query string itself could not be parsed.
    #[error("Invalid querystring")]
    MalformedQuery,

    /// A query parameter outside the recognized set was supplied.
    #[error("Query parameter {0} not recognized")]
    UnrecognizedParameter(String),

    /// A base or target currency is not in the current snapshot.
    #[error("Currency {0} is not recognized")]
    CurrencyUnrecognized(String),

    /// More than one base currency was supplied.
    #[error("Multiple base currencies specified")]
    MultipleBasesSpecified,

    /// The timestamp parameter is not valid RFC 3339.
    #[error("Timestamp could not be parsed, please submit requests as RFC 3339")]
    TimestampInvalid,

    /// The timestamp parameter is strictly after the current time.
    #[error("Timestamp is in the future: {0}")]
    TimestampInFuture(String),

    /// The upstream rate provider failed or returned an unusable body.
    #[error("Upstream rate provider unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Result type for rate engine operations.
pub type RatesResult<T> = Result<T, RatesError>;
