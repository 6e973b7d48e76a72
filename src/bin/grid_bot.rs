//! Grid trading bot binary (paper mode).
//!
//! Loads settings, builds the simulated venue, bootstraps the grid, and
//! drives it from the venue's notification feed while a background task
//! walks the simulated price.
//!
//! ```bash
//! cargo run --bin grid_bot -- --config config/grid_bot.toml
//! ```
//!
//! Any setting can be overridden from the environment, e.g.
//! `GRID_BOT__GRID__LEVERAGE=5`. A `.env` file in the working directory is
//! loaded first.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use rand::Rng;
use tokio::time::interval;

use perp_grid_bot::config::Settings;
use perp_grid_bot::errors::{BotError, BotResult};
use perp_grid_bot::events;
use perp_grid_bot::grid::{self, GridBot, RunnerConfig};
use perp_grid_bot::venue::PaperVenue;
use perp_grid_bot::BotContext;

const DEFAULT_CONFIG_PATH: &str = "config/grid_bot.toml";

#[tokio::main]
async fn main() {
    let env_file = dotenvy::dotenv().ok();

    // Parse arguments
    let args: Vec<String> = env::args().collect();
    let config_path = if args.len() > 2 && args[1] == "--config" {
        args[2].clone()
    } else {
        DEFAULT_CONFIG_PATH.to_string()
    };

    let settings = match Settings::new(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
            error!("Failed to load config from {}: {}", config_path, e);
            return;
        }
    };

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log.level.as_str()),
    )
    .init();

    match env_file {
        Some(path) => info!("Loaded environment from: {}", path.display()),
        None => info!("No .env file found, using system environment variables"),
    }
    info!("Loaded configuration from {}", config_path);

    if settings.bot.mode != "paper" {
        error!(
            "Unsupported mode '{}': only paper mode is wired in this build",
            settings.bot.mode
        );
        return;
    }

    match run_paper(settings).await {
        Ok(()) => info!("Shut down cleanly"),
        Err(BotError::FeedClosed) => info!("Notification feed closed, exiting"),
        Err(e) => {
            error!("Bot stopped: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run_paper(settings: Settings) -> BotResult<()> {
    let (events_tx, events_rx) = events::channel();
    let venue = Arc::new(PaperVenue::new(
        settings.bot.account_id.clone(),
        settings.paper.market_rules(),
        settings.paper.initial_price,
        events_tx,
    ));
    info!(
        "Paper venue up: price {}, tick size {}, walk step {} every {}ms",
        settings.paper.initial_price,
        settings.paper.tick_size,
        settings.paper.walk_step_pct,
        settings.paper.walk_interval_ms
    );

    let context = BotContext::new(
        settings.bot.account_id.clone(),
        venue.clone(),
        settings.submit.policy(),
    );
    let bot = GridBot::initialize(context, &settings.grid).await?;

    // Keep the simulated price moving so resting orders trade
    let walk = tokio::spawn(price_walk(
        venue,
        settings.paper.walk_step_pct,
        Duration::from_millis(settings.paper.walk_interval_ms),
    ));

    let outcome = grid::run(bot, events_rx, RunnerConfig::default()).await;
    walk.abort();
    outcome
}

/// Random walk for the simulated price: one multiplicative step per tick
async fn price_walk(venue: Arc<PaperVenue>, step_pct: f64, step: Duration) {
    let mut timer = interval(step);
    loop {
        timer.tick().await;
        let price = venue.current_price().await;
        let factor = 1.0 + rand::thread_rng().gen_range(-step_pct..=step_pct);
        venue.advance_price(price * factor).await;
    }
}
