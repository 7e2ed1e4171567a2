//! Stellar Credit Library
//!
//! Scores a Stellar wallet's creditworthiness (0-1000) from its recent
//! payment history and maps the score to advisory loan terms.

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod scoring;

// Re-export commonly used types
pub use analyzer::CreditAnalyzer;
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Network;
pub use scoring::{CreditScore, RiskLevel, WalletMetrics};
