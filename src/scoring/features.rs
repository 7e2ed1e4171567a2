//! Feature extraction from normalized wallet transactions
//!
//! Computes the eight behavioral metrics that feed the score:
//! - Volume (reference currency) and successful transaction count
//! - Punctuality (success rate) and usage frequency (per 30-day month)
//! - Diversification across transaction kinds and assets
//! - Balance estimate from flow patterns
//! - Wallet age and network activity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::scoring::pricing::{FixedPricing, PricingPolicy};
use crate::scoring::types::{Transaction, WalletMetrics};

/// Which identity counts as a distinct interaction for `network_activity`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkActivityKey {
    /// Distinct operation ids (historical behavior)
    #[default]
    TransactionId,
    /// Distinct counterparty addresses
    Counterparty,
}

/// Constants used by the feature formulas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Days per "month" when computing usage frequency
    #[serde(default = "default_days_per_month")]
    pub days_per_month: f64,

    /// Distinct kinds that count as fully diversified
    #[serde(default = "default_kind_diversity_cap")]
    pub kind_diversity_cap: f64,
    /// Distinct assets that count as fully diversified
    #[serde(default = "default_asset_diversity_cap")]
    pub asset_diversity_cap: f64,
    #[serde(default = "default_kind_diversity_weight")]
    pub kind_diversity_weight: f64,
    #[serde(default = "default_asset_diversity_weight")]
    pub asset_diversity_weight: f64,

    /// Multiplier on the mean transaction amount
    #[serde(default = "default_mean_balance_multiplier")]
    pub mean_balance_multiplier: f64,
    /// Multiplier on net inflow
    #[serde(default = "default_net_flow_multiplier")]
    pub net_flow_multiplier: f64,

    /// Wallets younger than this get `young_wallet_age_score`
    #[serde(default = "default_min_age_days")]
    pub min_age_days: i64,
    #[serde(default = "default_optimal_age_days")]
    pub optimal_age_days: f64,
    #[serde(default = "default_young_wallet_age_score")]
    pub young_wallet_age_score: f64,

    /// Distinct interactions that saturate `network_activity`
    #[serde(default = "default_max_interactions")]
    pub max_interactions: f64,
    #[serde(default)]
    pub network_activity_key: NetworkActivityKey,

    #[serde(default)]
    pub pricing: FixedPricing,
}

fn default_days_per_month() -> f64 {
    30.0
}

fn default_kind_diversity_cap() -> f64 {
    3.0
}

fn default_asset_diversity_cap() -> f64 {
    5.0
}

fn default_kind_diversity_weight() -> f64 {
    0.6
}

fn default_asset_diversity_weight() -> f64 {
    0.4
}

fn default_mean_balance_multiplier() -> f64 {
    10.0
}

fn default_net_flow_multiplier() -> f64 {
    0.1
}

fn default_min_age_days() -> i64 {
    30
}

fn default_optimal_age_days() -> f64 {
    365.0
}

fn default_young_wallet_age_score() -> f64 {
    0.3
}

fn default_max_interactions() -> f64 {
    50.0
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            days_per_month: default_days_per_month(),
            kind_diversity_cap: default_kind_diversity_cap(),
            asset_diversity_cap: default_asset_diversity_cap(),
            kind_diversity_weight: default_kind_diversity_weight(),
            asset_diversity_weight: default_asset_diversity_weight(),
            mean_balance_multiplier: default_mean_balance_multiplier(),
            net_flow_multiplier: default_net_flow_multiplier(),
            min_age_days: default_min_age_days(),
            optimal_age_days: default_optimal_age_days(),
            young_wallet_age_score: default_young_wallet_age_score(),
            max_interactions: default_max_interactions(),
            network_activity_key: NetworkActivityKey::default(),
            pricing: FixedPricing::default(),
        }
    }
}

impl FeatureConfig {
    /// Reject constants that would push a metric out of its range
    pub fn validate(&self) -> Result<()> {
        for (name, divisor) in [
            ("days_per_month", self.days_per_month),
            ("kind_diversity_cap", self.kind_diversity_cap),
            ("asset_diversity_cap", self.asset_diversity_cap),
            ("optimal_age_days", self.optimal_age_days),
            ("max_interactions", self.max_interactions),
        ] {
            if !divisor.is_finite() || divisor <= 0.0 {
                return Err(Error::Config(format!("features.{} must be positive", name)));
            }
        }

        for (name, value) in [
            ("kind_diversity_weight", self.kind_diversity_weight),
            ("asset_diversity_weight", self.asset_diversity_weight),
            ("mean_balance_multiplier", self.mean_balance_multiplier),
            ("net_flow_multiplier", self.net_flow_multiplier),
            ("pricing.native_price", self.pricing.native_price),
            ("pricing.issued_asset_price", self.pricing.issued_asset_price),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "features.{} must be finite and non-negative",
                    name
                )));
            }
        }

        let diversity_sum = self.kind_diversity_weight + self.asset_diversity_weight;
        if diversity_sum > 1.0 + 1e-9 {
            return Err(Error::Config(format!(
                "diversity weights must sum to at most 1.0, got {}",
                diversity_sum
            )));
        }

        if !(0.0..=1.0).contains(&self.young_wallet_age_score) {
            return Err(Error::Config(format!(
                "features.young_wallet_age_score must be within [0, 1], got {}",
                self.young_wallet_age_score
            )));
        }

        if self.min_age_days < 0 {
            return Err(Error::Config("features.min_age_days must not be negative".to_string()));
        }

        Ok(())
    }
}

/// Turns a transaction set into `WalletMetrics`
pub struct FeatureExtractor {
    config: FeatureConfig,
    pricing: Arc<dyn PricingPolicy>,
}

impl FeatureExtractor {
    /// Create an extractor using the config's fixed pricing
    pub fn new(config: FeatureConfig) -> Self {
        let pricing = Arc::new(config.pricing.clone());
        Self { config, pricing }
    }

    /// Create an extractor with a custom pricing policy
    pub fn with_pricing(config: FeatureConfig, pricing: Arc<dyn PricingPolicy>) -> Self {
        Self { config, pricing }
    }

    /// Compute all metrics. `now` anchors the age feature.
    pub fn extract(
        &self,
        transactions: &[Transaction],
        wallet: &str,
        now: DateTime<Utc>,
    ) -> WalletMetrics {
        if transactions.is_empty() {
            return WalletMetrics::default();
        }

        let metrics = WalletMetrics {
            total_volume: self.total_volume(transactions),
            transaction_count: transactions.iter().filter(|t| t.successful).count() as u32,
            avg_balance: self.estimate_balance(transactions),
            payment_punctuality: punctuality(transactions),
            usage_frequency: self.usage_frequency(transactions),
            diversification_score: self.diversification(transactions),
            age_score: self.age_score(transactions, now),
            network_activity: self.network_activity(transactions),
        };

        debug!(
            wallet = %wallet,
            transactions = transactions.len(),
            volume = %format!("{:.2}", metrics.total_volume),
            punctuality = %format!("{:.2}", metrics.payment_punctuality),
            frequency = %format!("{:.2}", metrics.usage_frequency),
            "Extracted wallet metrics"
        );

        metrics
    }

    fn total_volume(&self, transactions: &[Transaction]) -> f64 {
        transactions
            .iter()
            .map(|t| self.pricing.to_reference(&t.asset, t.amount))
            .sum()
    }

    fn usage_frequency(&self, transactions: &[Transaction]) -> f64 {
        let (Some(earliest), Some(latest)) = (
            transactions.iter().map(|t| t.timestamp).min(),
            transactions.iter().map(|t| t.timestamp).max(),
        ) else {
            return 0.0;
        };

        let span_days = (latest - earliest).num_days() as f64;
        let months = (span_days / self.config.days_per_month).max(1.0);

        transactions.len() as f64 / months
    }

    fn diversification(&self, transactions: &[Transaction]) -> f64 {
        let kinds: HashSet<_> = transactions.iter().map(|t| t.kind).collect();
        let assets: HashSet<_> = transactions.iter().map(|t| t.asset.as_str()).collect();

        let kind_diversity = (kinds.len() as f64 / self.config.kind_diversity_cap).min(1.0);
        let asset_diversity = (assets.len() as f64 / self.config.asset_diversity_cap).min(1.0);

        kind_diversity * self.config.kind_diversity_weight
            + asset_diversity * self.config.asset_diversity_weight
    }

    fn estimate_balance(&self, transactions: &[Transaction]) -> f64 {
        let (inflow, outflow) = transactions.iter().fold((0.0, 0.0), |(inflow, outflow), t| {
            if t.kind.is_outgoing() {
                (inflow, outflow + t.amount)
            } else {
                (inflow + t.amount, outflow)
            }
        });
        let net_flow = inflow - outflow;

        let mean_amount =
            transactions.iter().map(|t| t.amount).sum::<f64>() / transactions.len() as f64;

        (mean_amount * self.config.mean_balance_multiplier)
            .max(net_flow * self.config.net_flow_multiplier)
    }

    fn age_score(&self, transactions: &[Transaction], now: DateTime<Utc>) -> f64 {
        let Some(earliest) = transactions.iter().map(|t| t.timestamp).min() else {
            return 0.0;
        };

        let age_days = (now - earliest).num_days().max(0);
        if age_days < self.config.min_age_days {
            return self.config.young_wallet_age_score;
        }

        (age_days as f64 / self.config.optimal_age_days).min(1.0)
    }

    fn network_activity(&self, transactions: &[Transaction]) -> f64 {
        let distinct = match self.config.network_activity_key {
            NetworkActivityKey::TransactionId => transactions
                .iter()
                .map(|t| t.id.as_str())
                .collect::<HashSet<_>>()
                .len(),
            NetworkActivityKey::Counterparty => transactions
                .iter()
                .map(|t| t.counterparty())
                .collect::<HashSet<_>>()
                .len(),
        };

        (distinct as f64 / self.config.max_interactions).min(1.0)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

fn punctuality(transactions: &[Transaction]) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }
    let successful = transactions.iter().filter(|t| t.successful).count();
    successful as f64 / transactions.len() as f64
}
