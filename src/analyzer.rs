//! Wallet credit analysis
//!
//! Sequences ledger fetch -> parse -> feature extraction -> scoring -> advice.
//! A failed fetch is treated as an empty history, and an empty history
//! yields the fixed new-user result.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::ledger::{HorizonClient, LedgerSource, LookbackWindow, OperationParser};
use crate::scoring::{
    Advisor, CreditScore, FeatureExtractor, ScoreComposer, Transaction,
};

/// Credit analyzer over a ledger source
pub struct CreditAnalyzer<S: LedgerSource> {
    source: S,
    parser: OperationParser,
    extractor: FeatureExtractor,
    composer: ScoreComposer,
    advisor: Advisor,
    lookback_days: i64,
    max_records: u32,
}

impl CreditAnalyzer<HorizonClient> {
    /// Create an analyzer backed by Horizon
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HorizonClient::from_config(&config.horizon)?;
        Ok(Self::new(client, config))
    }
}

impl<S: LedgerSource> CreditAnalyzer<S> {
    /// Create an analyzer over any ledger source
    pub fn new(source: S, config: &Config) -> Self {
        Self {
            source,
            parser: OperationParser::new(),
            extractor: FeatureExtractor::new(config.features.clone()),
            composer: ScoreComposer::new(config.scoring.clone()),
            advisor: Advisor::default(),
            lookback_days: config.analysis.lookback_days,
            max_records: config.analysis.max_records,
        }
    }

    /// Replace the feature extractor (e.g. to inject a pricing policy)
    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Analyze a wallet as of now
    pub async fn analyze(&self, address: &str) -> Result<CreditScore> {
        self.analyze_at(address, Utc::now()).await
    }

    /// Analyze a wallet with the lookback window ending at `now`
    pub async fn analyze_at(&self, address: &str, now: DateTime<Utc>) -> Result<CreditScore> {
        info!(address = %address, source = self.source.name(), "Starting wallet analysis");

        let window = LookbackWindow::ending_at(now, self.lookback_days)?;

        let records = match self
            .source
            .fetch_operations(address, &window, self.max_records)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    address = %address,
                    error = %e,
                    "Ledger history unavailable, treating as empty"
                );
                Vec::new()
            }
        };

        let transactions = self.parser.parse_batch(&records, address, &window);

        if transactions.is_empty() {
            info!(address = %address, "No qualifying history, returning new-user score");
            return Ok(CreditScore::new_user(address, now));
        }

        self.analyze_transactions(address, &transactions, now)
    }

    /// Score an already-parsed, non-empty transaction set
    pub fn analyze_transactions(
        &self,
        address: &str,
        transactions: &[Transaction],
        now: DateTime<Utc>,
    ) -> Result<CreditScore> {
        if transactions.is_empty() {
            return Err(Error::InvariantViolation(
                "metrics requested for an empty transaction set".to_string(),
            ));
        }

        let metrics = self.extractor.extract(transactions, address, now);
        metrics.check_invariants()?;

        let terms = self.composer.compose(&metrics);
        let recommendations = self.advisor.advise(&metrics, terms.score());

        info!(
            address = %address,
            transactions = transactions.len(),
            score = terms.score(),
            risk = %terms.risk_level(),
            "Analysis complete"
        );

        Ok(CreditScore {
            address: address.to_string(),
            terms,
            metrics,
            recommendations,
            analyzed_at: now,
            new_user: false,
        })
    }
}
