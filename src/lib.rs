pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{EventBus, InMemoryEventBus};
use crate::providers::Oracle;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Currencies,
    Price { codes: Vec<String> },
    Watch { codes: Vec<String>, interval_secs: u64 },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Wallet oracle starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let events = Arc::new(InMemoryEventBus::new());
    let oracle = Arc::new(Oracle::new(&config.oracle, events.clone())?);

    let or_configured = |codes: Vec<String>| {
        if codes.is_empty() {
            config.currencies.clone()
        } else {
            codes
        }
    };

    match command {
        AppCommand::Currencies => cli::currencies::run(oracle.as_ref()).await,
        AppCommand::Price { codes } => cli::price::run(oracle.as_ref(), &or_configured(codes)).await,
        AppCommand::Watch {
            codes,
            interval_secs,
        } => {
            let events: &dyn EventBus = events.as_ref();
            cli::watch::run(
                oracle,
                events,
                or_configured(codes),
                Duration::from_secs(interval_secs.max(1)),
            )
            .await
        }
    }
}
