//! CLI command implementations

use anyhow::{Context, Result};
use regex::Regex;
use tracing::info;

use crate::analyzer::CreditAnalyzer;
use crate::config::Config;
use crate::ledger::Network;
use crate::scoring::{offers_for_score, CreditScore};

/// Stellar account ids: 'G' followed by 55 base32 characters
const ACCOUNT_ID_PATTERN: &str = r"^G[A-Z2-7]{55}$";

/// Check that an address looks like a Stellar account id
pub fn validate_address(address: &str) -> Result<()> {
    let pattern = Regex::new(ACCOUNT_ID_PATTERN).context("Invalid account id pattern")?;
    if !pattern.is_match(address) {
        anyhow::bail!("Invalid Stellar address: {}", address);
    }
    Ok(())
}

/// Analyze a wallet and print its credit score
pub async fn analyze(
    config: &Config,
    address: &str,
    network: Option<Network>,
    json: bool,
) -> Result<()> {
    validate_address(address)?;

    let mut config = config.clone();
    if let Some(network) = network {
        config.horizon.network = network;
    }

    info!(
        "Analyzing {} on {} ({})",
        address,
        config.horizon.network,
        config.horizon_url()
    );

    let analyzer = CreditAnalyzer::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create analyzer: {}", e))?;
    let score = analyzer
        .analyze(address)
        .await
        .map_err(|e| anyhow::anyhow!("Analysis failed: {}", e))?;

    info!("{}", score.summary());

    if json {
        println!("{}", serde_json::to_string_pretty(&score)?);
    } else {
        print_score(&score);
    }

    Ok(())
}

fn print_score(score: &CreditScore) {
    println!("\n=== CREDIT SCORE ===\n");
    println!("Address: {}", score.address);
    if score.new_user {
        println!("(no qualifying history - new user score)");
    }
    println!("Score: {} / 1000", score.score());
    println!("Risk Level: {}", score.risk_level());
    println!("Max Loan: ${:.2}", score.max_loan_amount());
    println!("Interest Rate: {:.1}% per month", score.interest_rate() * 100.0);

    let m = &score.metrics;
    println!("\n=== METRICS ===\n");
    println!("Total Volume: ${:.2}", m.total_volume);
    println!("Successful Transactions: {}", m.transaction_count);
    println!("Estimated Balance: {:.2}", m.avg_balance);
    println!("Punctuality: {:.0}%", m.payment_punctuality * 100.0);
    println!("Frequency: {:.1} tx/month", m.usage_frequency);
    println!("Diversification: {:.2}", m.diversification_score);
    println!("Age Score: {:.2}", m.age_score);
    println!("Network Activity: {:.2}", m.network_activity);

    println!("\n=== RECOMMENDATIONS ===\n");
    for rec in &score.recommendations {
        println!("- {}", rec);
    }
}

/// Print the loan offers available at a score
pub fn offers(score: i64, json: bool) -> Result<()> {
    let offers = offers_for_score(score)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&offers)?);
        return Ok(());
    }

    println!("\n=== LOAN OFFERS (score {}) ===\n", score);
    if offers.is_empty() {
        println!("No offers available. Keep building your history.");
    }
    for offer in &offers {
        println!(
            "${:>8.2}  {:>4.1}%/month  {:>2} months  {}",
            offer.amount,
            offer.interest_rate * 100.0,
            offer.duration_months,
            offer.description
        );
    }

    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
