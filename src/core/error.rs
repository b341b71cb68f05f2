//! Error types for conversion and quote fetching.

use thiserror::Error;

/// The authoritative field does not hold a usable amount.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Amount is empty")]
    Empty,

    #[error("Amount is not a number: {0}")]
    NotANumber(String),

    #[error("Amount must be positive, got {0}")]
    NotPositive(f64),
}

/// An upstream price or rate could not be obtained.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error for {key}: {source}")]
    Request {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error: {status} for {key}")]
    Status {
        key: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response for {key}: {reason}")]
    Malformed { key: String, reason: String },
}

pub type FetchResult<T> = Result<T, FetchError>;
