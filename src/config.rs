//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::ledger::{Network, MAX_RECORDS};
use crate::scoring::features::FeatureConfig;
use crate::scoring::ScoringWeights;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub horizon: HorizonConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub scoring: ScoringWeights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HorizonConfig {
    #[serde(default)]
    pub network: Network,
    /// Overrides the network's public Horizon URL
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_elapsed_ms")]
    pub retry_max_elapsed_ms: u64,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            base_url: None,
            timeout_ms: default_timeout_ms(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_elapsed_ms: default_retry_max_elapsed_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// History considered for scoring
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Operations fetched per wallet (at most 200)
    #[serde(default = "default_max_records")]
    pub max_records: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            max_records: default_max_records(),
        }
    }
}

/// Longest lookback accepted from configuration
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_retry_max_elapsed_ms() -> u64 {
    2_000
}

fn default_lookback_days() -> i64 {
    90
}

fn default_max_records() -> u32 {
    MAX_RECORDS
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("horizon.network", "testnet")?
            .set_default("analysis.lookback_days", default_lookback_days())?
            .set_default("analysis.max_records", default_max_records() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix CREDIT_)
            .add_source(
                config::Environment::with_prefix("CREDIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.analysis.lookback_days) {
            anyhow::bail!(
                "lookback_days must be between 1 and {}, got {}",
                MAX_LOOKBACK_DAYS,
                self.analysis.lookback_days
            );
        }

        if self.analysis.max_records == 0 || self.analysis.max_records > MAX_RECORDS {
            anyhow::bail!(
                "max_records must be between 1 and {}, got {}",
                MAX_RECORDS,
                self.analysis.max_records
            );
        }

        if self.horizon.timeout_ms == 0 {
            anyhow::bail!("horizon.timeout_ms must be positive");
        }

        if let Some(ref base_url) = self.horizon.base_url {
            url::Url::parse(base_url)
                .with_context(|| format!("Invalid horizon.base_url: {}", base_url))?;
        }

        self.features.validate()?;
        self.scoring.validate()?;

        Ok(())
    }

    /// Horizon URL in effect
    pub fn horizon_url(&self) -> &str {
        self.horizon
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.horizon.network.horizon_url())
    }

    /// Get configuration for display
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Horizon:
    network: {}
    url: {}
    timeout: {}ms
  Analysis:
    lookback: {} days
    max_records: {}
  Features:
    native_price: {}
    network_activity_key: {:?}
  Scoring:
    weights: volume={} punctuality={} frequency={} diversification={} balance={}
    bonuses: age={} network={}
"#,
            self.horizon.network,
            mask_url(self.horizon_url()),
            self.horizon.timeout_ms,
            self.analysis.lookback_days,
            self.analysis.max_records,
            self.features.pricing.native_price,
            self.features.network_activity_key,
            self.scoring.weight_volume,
            self.scoring.weight_punctuality,
            self.scoring.weight_frequency,
            self.scoring.weight_diversification,
            self.scoring.weight_balance,
            self.scoring.age_bonus,
            self.scoring.network_bonus,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}
