use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use wallet_oracle::cli::setup::setup;
use wallet_oracle::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for wallet_oracle::AppCommand {
    fn from(cmd: Commands) -> wallet_oracle::AppCommand {
        match cmd {
            Commands::Currencies => wallet_oracle::AppCommand::Currencies,
            Commands::Price { codes } => wallet_oracle::AppCommand::Price { codes },
            Commands::Watch {
                codes,
                interval_secs,
            } => wallet_oracle::AppCommand::Watch {
                codes,
                interval_secs,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Load and display every currency the oracle knows
    Currencies,
    /// Display current rates for the given currency codes
    Price {
        /// Currency codes, defaults to the configured list
        codes: Vec<String>,
    },
    /// Refresh rates periodically until interrupted
    Watch {
        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 30)]
        interval_secs: u64,

        /// Currency codes, defaults to the configured list
        codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => wallet_oracle::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
