use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use vitalair::api::AppState;
use vitalair::bot::{self, BotHandle, TelegramClient};
use vitalair::dataset::ReloadingDataset;
use vitalair::{ForecastStore, VitalAirConfig, VitalAirError, telemetry, web};

#[derive(Parser)]
#[command(name = "vitalair", version)]
#[command(about = "Air quality and health risk forecast dashboard and chat bot", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config dir, then ./config.toml)
    #[arg(short, long, env = "VITALAIR_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard web server, plus the bot when it is embedded
    Serve,
    /// Run only the Telegram bot
    Bot,
    /// Answer a single `<Location> <DD-MM-YYYY>` query
    Query {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List the locations in the forecast data
    Locations,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = VitalAirConfig::load_from_path(cli.config)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    telemetry::init_tracing(&config.logging)?;

    let store: Arc<dyn ForecastStore> = Arc::new(ReloadingDataset::new(
        &config.data.aqi_forecast_path,
        &config.data.hri_forecast_path,
    ));

    match cli.command {
        Commands::Serve => {
            warn_if_unavailable(store.as_ref());
            serve(&config, store).await
        }
        Commands::Bot => {
            warn_if_unavailable(store.as_ref());
            run_bot(&config, store).await
        }
        Commands::Query { text } => Ok(query(&text.join(" "), store.as_ref())),
        Commands::Locations => {
            store.refresh().context("Failed to load forecast data")?;
            for location in store.all_locations() {
                println!("{location}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Long-running commands keep going and retry the files on each request
fn warn_if_unavailable(store: &dyn ForecastStore) {
    if let Err(e) = store.refresh() {
        warn!("Forecast data unavailable at startup: {e}");
    }
}

async fn serve(config: &VitalAirConfig, store: Arc<dyn ForecastStore>) -> Result<ExitCode> {
    let bot = if config.runs_embedded_bot() {
        let client = TelegramClient::from_config(&config.bot)?;
        Some(BotHandle::spawn(client, store.clone(), config.bot.poll_timeout_seconds))
    } else {
        info!("Chat bot not embedded in this process");
        None
    };

    let served = web::run(AppState::new(store), &config.server).await;

    if let Some(bot) = bot {
        if let Err(e) = bot.stop().await {
            warn!("Chat bot did not stop cleanly: {e}");
        }
    }
    served.map(|()| ExitCode::SUCCESS)
}

async fn run_bot(config: &VitalAirConfig, store: Arc<dyn ForecastStore>) -> Result<ExitCode> {
    if !config.bot.enabled {
        warn!("Chat bot is disabled in the configuration");
        return Ok(ExitCode::SUCCESS);
    }
    let client = TelegramClient::from_config(&config.bot)?;
    let handle = BotHandle::spawn(client, store, config.bot.poll_timeout_seconds);

    web::shutdown_signal().await;
    handle.stop().await?;
    Ok(ExitCode::SUCCESS)
}

/// Print the reply the bot would send; failures exit non-zero
fn query(text: &str, store: &dyn ForecastStore) -> ExitCode {
    let (reply, code) = match bot::answer(text, store) {
        Ok(report) => (bot::format_report(&report), ExitCode::SUCCESS),
        Err(e) => {
            if !matches!(e, VitalAirError::Query(_)) {
                eprintln!("{e}");
            }
            (e.user_message(), ExitCode::FAILURE)
        }
    };
    println!("{reply}");
    code
}
