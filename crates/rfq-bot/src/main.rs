//! RFQ option order selector - Entry Point
//!
//! `watch`: poll the order source and log the best order for the configured query
//! `recommend`: map questionnaire answers to a risk profile and contract duration
//! `select`: offline selection over a saved order source response

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rfq_bot::app::recommend;
use rfq_bot::{AppConfig, Application};
use rfq_core::Asset;
use rfq_risk::{Goal, LossAversion, PsychologyProfile, TimePreference, TradeDuration};
use rfq_selector::Direction;
use tracing::{info, warn};

/// RFQ option order selector
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RFQ_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the order source and log the best order (default)
    Watch,

    /// Recommend a risk profile and contract duration
    Recommend {
        /// panic-sell | buy-the-dip
        #[arg(long)]
        loss_aversion: LossAversion,
        /// patient | impatient
        #[arg(long)]
        time_preference: TimePreference,
        /// steady-income | maximize-upside
        #[arg(long)]
        goal: Goal,
    },

    /// Select the best order from a saved order source response
    Select {
        /// Saved response body (`{ data: { orders, market_data } }`)
        #[arg(long)]
        file: PathBuf,
        /// MOON | DOOM (defaults to the configured query)
        #[arg(long)]
        direction: Option<Direction>,
        /// BTC | ETH (defaults to the configured query)
        #[arg(long)]
        asset: Option<Asset>,
        /// Only consider contracts within this bucket's horizon
        #[arg(long)]
        duration: Option<TradeDuration>,
        /// Evaluation time in unix seconds (defaults to now)
        #[arg(long)]
        now: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > RFQ_CONFIG env var > default
    let config_path = AppConfig::resolve_path(args.config);
    let (mut config, found) = AppConfig::load(&config_path)?;

    rfq_telemetry::init_logging(config.telemetry.log_level.as_deref())?;
    info!("Starting RFQ bot v{}", env!("CARGO_PKG_VERSION"));

    if found {
        info!(config_path = %config_path, "Configuration loaded");
    } else {
        warn!(path = %config_path, "Config file not found, using defaults");
    }

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => {
            let app = Application::new(config)?;
            app.run().await?;
        }

        Command::Recommend {
            loss_aversion,
            time_preference,
            goal,
        } => {
            let profile = PsychologyProfile::new(loss_aversion, time_preference, goal);
            let recommendation = recommend(&profile)?;
            println!("{}", serde_json::to_string_pretty(&recommendation)?);
        }

        Command::Select {
            file,
            direction,
            asset,
            duration,
            now,
        } => {
            if let Some(direction) = direction {
                config.query.direction = direction;
            }
            if let Some(asset) = asset {
                config.query.asset = asset;
            }
            if duration.is_some() {
                config.query.duration = duration;
            }

            let app = Application::new(config)?;
            let now = now
                .unwrap_or_else(|| u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0));
            let result = app.select_file(&file, &app.query(), now)?;

            println!("{}", serde_json::to_string_pretty(&Application::summarize(&result))?);
            if let Some(payload) = app.submission(&result) {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
        }
    }

    Ok(())
}
