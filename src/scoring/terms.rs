//! Score to loan terms mapping
//!
//! `LOAN_BANDS` is the only place score thresholds live. Both the primary
//! terms attached to a `CreditScore` and the offer ladder shown to users
//! are read from it, so they cannot drift apart.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::scoring::types::RiskLevel;

/// Highest possible score
pub const MAX_SCORE: u32 = 1000;

/// A loan offer shown for a score band
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanOffer {
    pub amount: f64,
    /// Monthly rate
    pub interest_rate: f64,
    pub duration_months: u32,
    pub description: &'static str,
}

/// One row of the tier table. The first offer carries the band's terms.
#[derive(Debug, Clone, Copy)]
pub struct LoanBand {
    pub min_score: u32,
    pub risk_level: RiskLevel,
    pub offers: &'static [LoanOffer],
}

impl LoanBand {
    pub fn max_loan_amount(&self) -> f64 {
        self.offers.first().map(|o| o.amount).unwrap_or(0.0)
    }

    pub fn interest_rate(&self) -> f64 {
        self.offers
            .first()
            .map(|o| o.interest_rate)
            .unwrap_or(INELIGIBLE_RATE)
    }
}

/// Rate quoted to wallets below the lowest band
pub const INELIGIBLE_RATE: f64 = 0.10;

/// Bands ordered from highest threshold down, first match wins
pub const LOAN_BANDS: [LoanBand; 4] = [
    LoanBand {
        min_score: 750,
        risk_level: RiskLevel::Low,
        offers: &[
            LoanOffer {
                amount: 2000.0,
                interest_rate: 0.02,
                duration_months: 12,
                description: "Premium loan - low rate for an excellent history",
            },
            LoanOffer {
                amount: 1000.0,
                interest_rate: 0.015,
                duration_months: 6,
                description: "Quick loan - short term at a special rate",
            },
        ],
    },
    LoanBand {
        min_score: 600,
        risk_level: RiskLevel::Low,
        offers: &[
            LoanOffer {
                amount: 1000.0,
                interest_rate: 0.025,
                duration_months: 12,
                description: "Standard loan - good conditions",
            },
            LoanOffer {
                amount: 500.0,
                interest_rate: 0.02,
                duration_months: 6,
                description: "Quick loan - smaller amount, better rate",
            },
        ],
    },
    LoanBand {
        min_score: 450,
        risk_level: RiskLevel::Medium,
        offers: &[
            LoanOffer {
                amount: 500.0,
                interest_rate: 0.04,
                duration_months: 12,
                description: "Intermediate loan",
            },
            LoanOffer {
                amount: 200.0,
                interest_rate: 0.035,
                duration_months: 6,
                description: "Basic loan - build your history",
            },
        ],
    },
    LoanBand {
        min_score: 300,
        risk_level: RiskLevel::Medium,
        offers: &[
            LoanOffer {
                amount: 200.0,
                interest_rate: 0.06,
                duration_months: 6,
                description: "Starter loan - for building a history",
            },
            LoanOffer {
                amount: 100.0,
                interest_rate: 0.05,
                duration_months: 3,
                description: "Microcredit - first loan",
            },
        ],
    },
];

fn band_for(score: u32) -> Option<&'static LoanBand> {
    LOAN_BANDS.iter().find(|band| score >= band.min_score)
}

/// Score with the tier, ceiling and rate it maps to
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanTerms {
    score: u32,
    risk_level: RiskLevel,
    max_loan_amount: f64,
    interest_rate: f64,
}

impl LoanTerms {
    /// Look up the terms for a score. Scores above 1000 are capped.
    pub fn for_score(score: u32) -> Self {
        let score = score.min(MAX_SCORE);
        match band_for(score) {
            Some(band) => Self {
                score,
                risk_level: band.risk_level,
                max_loan_amount: band.max_loan_amount(),
                interest_rate: band.interest_rate(),
            },
            None => Self {
                score,
                risk_level: RiskLevel::High,
                max_loan_amount: 0.0,
                interest_rate: INELIGIBLE_RATE,
            },
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn max_loan_amount(&self) -> f64 {
        self.max_loan_amount
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }
}

/// All loan offers available at a score
pub fn offers_for_score(score: i64) -> Result<Vec<LoanOffer>> {
    if !(0..=MAX_SCORE as i64).contains(&score) {
        return Err(Error::Validation(format!(
            "score must be between 0 and {}, got {}",
            MAX_SCORE, score
        )));
    }

    Ok(band_for(score as u32)
        .map(|band| band.offers.to_vec())
        .unwrap_or_default())
}
