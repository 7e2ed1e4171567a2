//! Score composition
//!
//! Formula (weights from `ScoringWeights`):
//! - Volume (20%): total volume, normalized against $50k
//! - Punctuality (30%): success rate
//! - Frequency (15%): transactions/month, normalized against 100
//! - Diversification (20%): kind and asset variety
//! - Balance (15%): balance estimate, normalized against $10k
//!
//! Age (up to +10%) and network activity (up to +5%) are added on top, then
//! the sum is scaled to 0-1000.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scoring::terms::{LoanTerms, MAX_SCORE};
use crate::scoring::types::WalletMetrics;

/// Weights and normalization ceilings for the score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Component weights (must sum to 1.0)
    #[serde(default = "default_weight_volume")]
    pub weight_volume: f64,
    #[serde(default = "default_weight_punctuality")]
    pub weight_punctuality: f64,
    #[serde(default = "default_weight_frequency")]
    pub weight_frequency: f64,
    #[serde(default = "default_weight_diversification")]
    pub weight_diversification: f64,
    #[serde(default = "default_weight_balance")]
    pub weight_balance: f64,

    /// Additive bonuses
    #[serde(default = "default_age_bonus")]
    pub age_bonus: f64,
    #[serde(default = "default_network_bonus")]
    pub network_bonus: f64,

    /// Normalization ceilings
    #[serde(default = "default_max_volume")]
    pub max_volume: f64,
    #[serde(default = "default_max_frequency")]
    pub max_frequency: f64,
    #[serde(default = "default_max_balance")]
    pub max_balance: f64,
}

fn default_weight_volume() -> f64 {
    0.20
}

fn default_weight_punctuality() -> f64 {
    0.30
}

fn default_weight_frequency() -> f64 {
    0.15
}

fn default_weight_diversification() -> f64 {
    0.20
}

fn default_weight_balance() -> f64 {
    0.15
}

fn default_age_bonus() -> f64 {
    0.10
}

fn default_network_bonus() -> f64 {
    0.05
}

fn default_max_volume() -> f64 {
    50_000.0
}

fn default_max_frequency() -> f64 {
    100.0
}

fn default_max_balance() -> f64 {
    10_000.0
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            weight_volume: default_weight_volume(),
            weight_punctuality: default_weight_punctuality(),
            weight_frequency: default_weight_frequency(),
            weight_diversification: default_weight_diversification(),
            weight_balance: default_weight_balance(),
            age_bonus: default_age_bonus(),
            network_bonus: default_network_bonus(),
            max_volume: default_max_volume(),
            max_frequency: default_max_frequency(),
            max_balance: default_max_balance(),
        }
    }
}

impl ScoringWeights {
    /// Reject weight sets that break the score's scale
    pub fn validate(&self) -> Result<()> {
        let primary = [
            self.weight_volume,
            self.weight_punctuality,
            self.weight_frequency,
            self.weight_diversification,
            self.weight_balance,
        ];
        let bonuses = [self.age_bonus, self.network_bonus];

        if primary
            .iter()
            .chain(bonuses.iter())
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            return Err(Error::Config(
                "scoring weights must be finite and non-negative".to_string(),
            ));
        }

        let sum: f64 = primary.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(Error::Config(format!(
                "primary scoring weights must sum to 1.0, got {}",
                sum
            )));
        }

        for (name, ceiling) in [
            ("max_volume", self.max_volume),
            ("max_frequency", self.max_frequency),
            ("max_balance", self.max_balance),
        ] {
            if !ceiling.is_finite() || ceiling <= 0.0 {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
        }

        Ok(())
    }
}

/// Combines wallet metrics into a score and its loan terms
pub struct ScoreComposer {
    weights: ScoringWeights,
}

impl ScoreComposer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Compute the score and look up its terms
    pub fn compose(&self, metrics: &WalletMetrics) -> LoanTerms {
        LoanTerms::for_score(self.score(metrics))
    }

    /// Compute the integer score (0-1000)
    pub fn score(&self, metrics: &WalletMetrics) -> u32 {
        let w = &self.weights;

        let normalized_volume = normalize(metrics.total_volume, w.max_volume);
        let normalized_frequency = normalize(metrics.usage_frequency, w.max_frequency);
        let normalized_balance = normalize(metrics.avg_balance, w.max_balance);

        let weighted = normalized_volume * w.weight_volume
            + metrics.payment_punctuality * w.weight_punctuality
            + normalized_frequency * w.weight_frequency
            + metrics.diversification_score * w.weight_diversification
            + normalized_balance * w.weight_balance;

        let bonus = metrics.age_score * w.age_bonus + metrics.network_activity * w.network_bonus;

        let scaled = ((weighted + bonus) * MAX_SCORE as f64).min(MAX_SCORE as f64);
        if scaled.is_nan() || scaled <= 0.0 {
            return 0;
        }
        scaled.floor() as u32
    }
}

impl Default for ScoreComposer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

/// Scale a magnitude into 0.0-1.0 against its ceiling
fn normalize(value: f64, ceiling: f64) -> f64 {
    (value / ceiling).clamp(0.0, 1.0)
}
