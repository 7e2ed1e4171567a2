//! Shared data structures for the scoring pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::scoring::terms::LoanTerms;

/// Direction and shape of a normalized payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    OutgoingPayment,
    IncomingPayment,
    OutgoingPathPayment,
    IncomingPathPayment,
}

impl TransactionKind {
    pub fn is_outgoing(&self) -> bool {
        matches!(self, Self::OutgoingPayment | Self::OutgoingPathPayment)
    }
}

/// A payment touching the analyzed wallet, normalized from a ledger operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger operation id
    pub id: String,
    pub kind: TransactionKind,
    /// Amount in the wallet-local asset's units (never negative)
    pub amount: f64,
    /// Asset code, native asset already relabelled
    pub asset: String,
    pub from: String,
    pub to: String,
    pub timestamp: DateTime<Utc>,
    pub successful: bool,
    pub memo: Option<String>,
}

impl Transaction {
    /// The address on the other side of this payment
    pub fn counterparty(&self) -> &str {
        if self.kind.is_outgoing() {
            &self.to
        } else {
            &self.from
        }
    }
}

/// Behavioral features computed from a wallet's transactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletMetrics {
    /// Volume in reference currency over the lookback window
    pub total_volume: f64,
    /// Successful transactions over the lookback window
    pub transaction_count: u32,
    /// Heuristic balance estimate, not an accounting balance
    pub avg_balance: f64,
    /// Successful / total (0-1)
    pub payment_punctuality: f64,
    /// Transactions per 30-day month
    pub usage_frequency: f64,
    /// Kind and asset variety (0-1)
    pub diversification_score: f64,
    /// Wallet age (0-1)
    pub age_score: f64,
    /// Interaction variety (0-1)
    pub network_activity: f64,
}

impl WalletMetrics {
    /// Verify every ratio is in [0,1] and every magnitude is finite and non-negative.
    ///
    /// A failure here means upstream code produced impossible values.
    pub fn check_invariants(&self) -> Result<()> {
        let ratios = [
            ("payment_punctuality", self.payment_punctuality),
            ("diversification_score", self.diversification_score),
            ("age_score", self.age_score),
            ("network_activity", self.network_activity),
        ];
        for (name, value) in ratios {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::InvariantViolation(format!(
                    "{} = {} is outside [0, 1]",
                    name, value
                )));
            }
        }

        let magnitudes = [
            ("total_volume", self.total_volume),
            ("avg_balance", self.avg_balance),
            ("usage_frequency", self.usage_frequency),
        ];
        for (name, value) in magnitudes {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvariantViolation(format!(
                    "{} = {} must be finite and non-negative",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Coarse risk bucket derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Final credit assessment for a wallet
#[derive(Debug, Clone, Serialize)]
pub struct CreditScore {
    pub address: String,
    /// Score, tier, ceiling and rate from one table lookup
    #[serde(flatten)]
    pub terms: LoanTerms,
    pub metrics: WalletMetrics,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    /// True when no qualifying history existed
    pub new_user: bool,
}

/// Score assigned to wallets without qualifying history
pub const NEW_USER_SCORE: u32 = 250;

const NEW_USER_RECOMMENDATIONS: [&str; 3] = [
    "Start making transactions on the Stellar network",
    "Keep your activity consistent over time",
    "Diversify the types of transactions you make",
];

impl CreditScore {
    /// Fixed onboarding result, independent of the scoring formulas
    pub fn new_user(address: &str, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            terms: LoanTerms::for_score(NEW_USER_SCORE),
            metrics: WalletMetrics::default(),
            recommendations: NEW_USER_RECOMMENDATIONS
                .iter()
                .map(|r| r.to_string())
                .collect(),
            analyzed_at,
            new_user: true,
        }
    }

    pub fn score(&self) -> u32 {
        self.terms.score()
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.terms.risk_level()
    }

    pub fn max_loan_amount(&self) -> f64 {
        self.terms.max_loan_amount()
    }

    pub fn interest_rate(&self) -> f64 {
        self.terms.interest_rate()
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Score: {} ({}) - Max loan: ${:.2} at {:.1}%/month",
            self.score(),
            self.risk_level(),
            self.max_loan_amount(),
            self.interest_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(kind: TransactionKind) -> Transaction {
        Transaction {
            id: "1".to_string(),
            kind,
            amount: 10.0,
            asset: "XLM".to_string(),
            from: "GFROM".to_string(),
            to: "GTO".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            successful: true,
            memo: None,
        }
    }

    #[test]
    fn test_counterparty_follows_direction() {
        assert_eq!(tx(TransactionKind::OutgoingPayment).counterparty(), "GTO");
        assert_eq!(tx(TransactionKind::IncomingPathPayment).counterparty(), "GFROM");
    }

    #[test]
    fn test_default_metrics_pass_invariants() {
        assert!(WalletMetrics::default().check_invariants().is_ok());
    }

    #[test]
    fn test_out_of_range_ratio_is_invariant_violation() {
        let metrics = WalletMetrics {
            payment_punctuality: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            metrics.check_invariants(),
            Err(Error::InvariantViolation(_))
        ));

        let metrics = WalletMetrics {
            avg_balance: f64::NAN,
            ..Default::default()
        };
        assert!(metrics.check_invariants().is_err());
    }

    #[test]
    fn test_new_user_result_is_fixed() {
        let now = Utc::now();
        let score = CreditScore::new_user("GABC", now);

        assert_eq!(score.score(), 250);
        assert_eq!(score.risk_level(), RiskLevel::High);
        assert_eq!(score.max_loan_amount(), 0.0);
        assert_eq!(score.interest_rate(), 0.10);
        assert_eq!(score.recommendations.len(), 3);
        assert_eq!(score.metrics, WalletMetrics::default());
        assert!(score.new_user);
    }

    #[test]
    fn test_credit_score_serializes_flat() {
        let score = CreditScore::new_user("GABC", Utc::now());
        let json = serde_json::to_value(&score).unwrap();

        assert_eq!(json["score"], 250);
        assert_eq!(json["risk_level"], "HIGH");
        assert_eq!(json["max_loan_amount"], 0.0);
    }

    #[test]
    fn test_summary() {
        let score = CreditScore::new_user("GABC", Utc::now());
        assert_eq!(
            score.summary(),
            "Score: 250 (HIGH) - Max loan: $0.00 at 10.0%/month"
        );
    }
}
