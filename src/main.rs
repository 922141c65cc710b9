use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxconv::core::log::init_logging;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between the selected currencies
    Convert {
        /// Amount to convert; reuses the last amount when omitted
        amount: Option<String>,
        /// Source currency code
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Display the rate table for a base currency
    Rates {
        /// Base currency code; defaults to the selected source currency
        base: Option<String>,
    },
    /// List available currencies
    Currencies {
        /// Filter by code or name
        query: Option<String>,
    },
    /// Select the source and/or target currency
    Select {
        #[arg(short, long)]
        from: Option<String>,
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Swap source and target currencies
    Swap,
    /// Show the current selection and cached rates
    Status,
    /// Manage the rate cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove cached rate tables older than the given age
    Prune {
        /// Maximum age in hours
        #[arg(long, default_value_t = 24)]
        max_age_hours: u64,
    },
    /// Remove every cached rate table
    Clear,
}

impl From<Commands> for fxconv::AppCommand {
    fn from(cmd: Commands) -> fxconv::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                fxconv::AppCommand::Convert { amount, from, to }
            }
            Commands::Rates { base } => fxconv::AppCommand::Rates { base },
            Commands::Currencies { query } => fxconv::AppCommand::Currencies { query },
            Commands::Select { from, to } => fxconv::AppCommand::Select { from, to },
            Commands::Swap => fxconv::AppCommand::Swap,
            Commands::Status => fxconv::AppCommand::Status,
            Commands::Cache {
                action: CacheAction::Prune { max_age_hours },
            } => fxconv::AppCommand::CachePrune { max_age_hours },
            Commands::Cache {
                action: CacheAction::Clear,
            } => fxconv::AppCommand::CacheClear,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxconv::cli::setup::setup(),
        Some(cmd) => fxconv::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
