//! Stellar Credit - wallet credit scoring from on-chain payment history
//!
//! Scores are heuristics over public ledger data. They are not a credit
//! bureau rating and no loan is disbursed by this tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use stellar_credit::cli::commands;
use stellar_credit::config::Config;
use stellar_credit::ledger::Network;

/// Stellar Credit - score a wallet's payment history
#[derive(Parser)]
#[command(name = "stellar-credit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a wallet and print its credit score
    Analyze {
        /// Stellar account id (G...)
        address: String,

        /// Network to query: testnet or mainnet (overrides config)
        #[arg(long)]
        network: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the loan offers available at a score
    Offers {
        /// Credit score (0-1000)
        score: i64,

        /// Print the offers as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stellar_credit=info".parse()?),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze {
            address,
            network,
            json,
        } => match network.map(|n| n.parse::<Network>()).transpose() {
            Ok(network) => commands::analyze(&config, &address, network, json).await,
            Err(e) => Err(e.into()),
        },
        Commands::Offers { score, json } => commands::offers(score, json),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
