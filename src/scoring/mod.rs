//! Credit scoring pipeline
//!
//! This module turns normalized transactions into a credit assessment:
//! - Feature extraction (eight behavioral metrics)
//! - Weighted score composition (0-1000)
//! - Tier / loan ceiling / rate lookup
//! - Improvement recommendations

pub mod advisor;
pub mod composer;
pub mod features;
pub mod pricing;
pub mod terms;
pub mod types;

pub use advisor::{Advisor, AdvisorConfig};
pub use composer::{ScoreComposer, ScoringWeights};
pub use features::{FeatureConfig, FeatureExtractor, NetworkActivityKey};
pub use pricing::{FixedPricing, PricingPolicy, NATIVE_SYMBOL};
pub use terms::{offers_for_score, LoanOffer, LoanTerms, LOAN_BANDS};
pub use types::{CreditScore, RiskLevel, Transaction, TransactionKind, WalletMetrics};
