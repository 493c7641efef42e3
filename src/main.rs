use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use std::path::PathBuf;
use stockpicker::{
    config::Config,
    engine::{self, StockPickerClient},
    import, portfolio,
    store::{JsonDirStore, PortfolioStore},
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Import brokerage holdings and request stock-picker recommendations
#[derive(Parser)]
#[command(name = "stockpicker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .csv or .xlsx holdings file and print the validation result
    Import {
        file: PathBuf,
    },

    /// Import holdings, create a portfolio and request a recommendation
    Run {
        file: PathBuf,

        /// Uninvested cash
        #[arg(long, default_value_t = 0.0)]
        cash: f64,

        /// Monthly contribution
        #[arg(long, default_value_t = 0.0)]
        monthly: f64,

        /// Risk tolerance from 0 (cautious) to 100 (aggressive)
        #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u8).range(0..=100))]
        risk: u8,

        /// Currency of the average costs; defaults to STOCK_PICKER_CURRENCY
        #[arg(long)]
        currency: Option<String>,
    },

    /// List stored recommendations for the current portfolio, newest first
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // ─── logging to stderr, stdout carries JSON ──────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Import { file } => {
            let result = import::parse_file(&file)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Run {
            file,
            cash,
            monthly,
            risk,
            currency,
        } => {
            if cash < 0.0 || monthly < 0.0 {
                bail!("Cash and monthly contribution must be non-negative");
            }
            let token = config
                .token
                .clone()
                .context("STOCK_PICKER_TOKEN must be set to request a run")?;
            let currency = currency.unwrap_or_else(|| config.currency.clone());

            let result = import::parse_file(&file)?;
            for row in &result.invalid_rows {
                warn!(row = row.row_number, error = %row.error, "skipped holding");
            }
            let positions = import::validate_positions(&result.valid_rows);
            info!(positions = positions.len(), "holdings imported");

            let store = JsonDirStore::new(&config.data_dir)?;
            let created = portfolio::create_portfolio(&store, cash, monthly, risk, &positions)?;

            let client = StockPickerClient::new(Client::new(), config.upstream_url.as_str())?;
            let payload = engine::build_payload(risk, cash, &positions, &currency);
            let response = client.run(&payload, &token).await?;
            store.set_last_run(&response)?;

            let engine_result = engine::to_engine_result(&response)?;
            let saved = portfolio::save_recommendation(&store, &created.id, &engine_result)?;
            info!(portfolio = %created.id, recommendation = %saved.id, "recommendation stored");
            println!("{}", serde_json::to_string_pretty(&engine_result)?);
        }

        Commands::History => {
            let store = JsonDirStore::new(&config.data_dir)?;
            let Some(portfolio_id) = store.current_portfolio_id()? else {
                bail!("no current portfolio; run `stockpicker run` first");
            };
            let recs = portfolio::recommendations_for(&store, &portfolio_id)?;
            println!("{}", serde_json::to_string_pretty(&recs)?);
        }
    }

    Ok(())
}
