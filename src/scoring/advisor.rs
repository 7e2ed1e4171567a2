//! Improvement recommendations
//!
//! Each rule tests one metric and contributes one fixed message. Rules are
//! evaluated in a fixed order and the output keeps that order.

use crate::scoring::types::WalletMetrics;

/// Thresholds below which a recommendation fires
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Transactions per month
    pub min_usage_frequency: f64,
    pub min_diversification: f64,
    pub min_punctuality: f64,
    pub min_avg_balance: f64,
    pub min_score: u32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            min_usage_frequency: 5.0,
            min_diversification: 0.5,
            min_punctuality: 0.9,
            min_avg_balance: 100.0,
            min_score: 300,
        }
    }
}

pub const INCREASE_FREQUENCY: &str = "Increase your transaction frequency to improve your score";
pub const DIVERSIFY: &str = "Diversify the transaction types and assets you use";
pub const KEEP_SUCCESS_RATE: &str = "Keep a high success rate on your transactions";
pub const RAISE_BALANCE: &str = "Maintain a higher average balance to demonstrate stability";
pub const BUILD_HISTORY: &str = "Keep using the Stellar network to build your history";
pub const EXCELLENT_PROFILE: &str = "Excellent profile! Keep up your good financial habits";

/// Rule-based advisor
#[derive(Debug, Clone, Default)]
pub struct Advisor {
    config: AdvisorConfig,
}

impl Advisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self { config }
    }

    /// Recommendations for a wallet, in rule order
    pub fn advise(&self, metrics: &WalletMetrics, score: u32) -> Vec<String> {
        let rules = [
            (
                metrics.usage_frequency < self.config.min_usage_frequency,
                INCREASE_FREQUENCY,
            ),
            (
                metrics.diversification_score < self.config.min_diversification,
                DIVERSIFY,
            ),
            (
                metrics.payment_punctuality < self.config.min_punctuality,
                KEEP_SUCCESS_RATE,
            ),
            (
                metrics.avg_balance < self.config.min_avg_balance,
                RAISE_BALANCE,
            ),
            (score < self.config.min_score, BUILD_HISTORY),
        ];

        let mut recommendations: Vec<String> = rules
            .iter()
            .filter(|(triggered, _)| *triggered)
            .map(|(_, message)| message.to_string())
            .collect();

        if recommendations.is_empty() {
            recommendations.push(EXCELLENT_PROFILE.to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong() -> WalletMetrics {
        WalletMetrics {
            total_volume: 20_000.0,
            transaction_count: 60,
            avg_balance: 900.0,
            payment_punctuality: 0.98,
            usage_frequency: 20.0,
            diversification_score: 0.8,
            age_score: 1.0,
            network_activity: 1.0,
        }
    }

    #[test]
    fn test_strong_profile_gets_single_positive_message() {
        let recs = Advisor::default().advise(&strong(), 800);
        assert_eq!(recs, vec![EXCELLENT_PROFILE.to_string()]);
    }

    #[test]
    fn test_all_rules_fire_in_order() {
        let recs = Advisor::default().advise(&WalletMetrics::default(), 0);
        assert_eq!(
            recs,
            vec![
                INCREASE_FREQUENCY,
                DIVERSIFY,
                KEEP_SUCCESS_RATE,
                RAISE_BALANCE,
                BUILD_HISTORY,
            ]
        );
    }

    #[test]
    fn test_single_rule() {
        let metrics = WalletMetrics {
            payment_punctuality: 0.85,
            ..strong()
        };
        let recs = Advisor::default().advise(&metrics, 700);
        assert_eq!(recs, vec![KEEP_SUCCESS_RATE.to_string()]);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let metrics = WalletMetrics {
            usage_frequency: 5.0,
            diversification_score: 0.5,
            payment_punctuality: 0.9,
            avg_balance: 100.0,
            ..strong()
        };
        let recs = Advisor::default().advise(&metrics, 300);
        assert_eq!(recs, vec![EXCELLENT_PROFILE.to_string()]);
    }

    #[test]
    fn test_advice_is_deterministic() {
        let advisor = Advisor::default();
        let metrics = WalletMetrics {
            usage_frequency: 2.0,
            avg_balance: 10.0,
            ..strong()
        };

        let first = advisor.advise(&metrics, 250);
        for _ in 0..10 {
            assert_eq!(advisor.advise(&metrics, 250), first);
        }
        assert_eq!(first, vec![INCREASE_FREQUENCY, RAISE_BALANCE, BUILD_HISTORY]);
    }
}
