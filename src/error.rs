//! Error types for the credit scoring core

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the credit scoring core
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Ledger (Horizon) errors
    #[error("Ledger request failed: {0}")]
    Ledger(String),

    #[error("Ledger timeout after {0}ms")]
    LedgerTimeout(u64),

    #[error("Ledger returned HTTP {status}: {body}")]
    LedgerStatus { status: u16, body: String },

    // Scoring errors
    #[error("Metric invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // Generic errors
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Ledger(_) | Error::LedgerTimeout(_) => true,
            Error::LedgerStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Deserialization(e.to_string())
        } else {
            Error::Ledger(e.to_string())
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let throttled = Error::LedgerStatus {
            status: 429,
            body: String::new(),
        };
        let unavailable = Error::LedgerStatus {
            status: 503,
            body: String::new(),
        };
        let bad_request = Error::LedgerStatus {
            status: 400,
            body: String::new(),
        };

        assert!(throttled.is_retryable());
        assert!(unavailable.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(Error::LedgerTimeout(10_000).is_retryable());
    }

    #[test]
    fn test_invariant_violation_is_not_retryable() {
        let err = Error::InvariantViolation("punctuality out of range".to_string());
        assert!(!err.is_retryable());
        assert!(Error::Ledger("connection reset".to_string()).is_retryable());
    }
}
