//! Ledger access
//!
//! - `LedgerSource`: async boundary the analyzer fetches raw operations through
//! - `HorizonClient`: Stellar Horizon implementation
//! - `OperationParser`: raw operation records -> normalized transactions

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub mod horizon;
pub mod parser;

pub use horizon::HorizonClient;
pub use parser::OperationParser;

/// Hard cap on operations fetched per analysis
pub const MAX_RECORDS: u32 = 200;

/// Stellar network to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    /// Public Horizon endpoint for this network
    pub fn horizon_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://horizon-testnet.stellar.org",
            Network::Mainnet => "https://horizon.stellar.org",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Testnet => write!(f, "testnet"),
            Network::Mainnet => write!(f, "mainnet"),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(Network::Testnet),
            "mainnet" | "public" => Ok(Network::Mainnet),
            other => Err(Error::Config(format!("Unknown network: {}", other))),
        }
    }
}

/// Time range of history considered for scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LookbackWindow {
    /// Window of `days` ending at `end`.
    ///
    /// Fails when `days` is negative or reaches past the representable range.
    pub fn ending_at(end: DateTime<Utc>, days: i64) -> Result<Self> {
        let start = ChronoDuration::try_days(days)
            .filter(|_| days >= 0)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                Error::Validation(format!("lookback of {} days is out of range", days))
            })?;

        Ok(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Source of raw operation records for an account
///
/// Records are returned undecoded so the parser can drop malformed ones
/// individually instead of failing the whole page.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &'static str;

    /// Fetch up to `max_records` operations for `address`, newest first.
    ///
    /// An account with no history, or one that does not exist, yields an
    /// empty list. Transport failures are returned as errors.
    async fn fetch_operations(
        &self,
        address: &str,
        window: &LookbackWindow,
        max_records: u32,
    ) -> Result<Vec<serde_json::Value>>;
}
