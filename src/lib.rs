pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::state::{AppState, StatePersistence, StorePersistence};
use crate::providers::{CachingRateProvider, FxRatesProvider};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Convert {
        amount: Option<String>,
        from: Option<String>,
        to: Option<String>,
    },
    Rates {
        base: Option<String>,
    },
    Currencies {
        query: Option<String>,
    },
    Select {
        from: Option<String>,
        to: Option<String>,
    },
    Swap,
    Status,
    CachePrune {
        max_age_hours: u64,
    },
    CacheClear,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxconv starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        base_url = %config.provider.base_url,
        ttl_secs = config.cache.ttl_secs,
        persist = config.cache.persist,
        "Loaded config"
    );

    let store = store::open_store(&config)?;
    let persistence: Arc<dyn StatePersistence> = Arc::new(StorePersistence::new(store.clone()));
    let mut state = AppState::load(persistence).await;

    let api_key = config.api_key();
    let source = FxRatesProvider::new(
        &config.provider.base_url,
        api_key.as_deref(),
        config.request_timeout(),
    )?;
    let provider = CachingRateProvider::new(source, store, config.ttl());

    match command {
        AppCommand::Convert { amount, from, to } => {
            cli::convert::run(
                &provider,
                &mut state,
                amount.as_deref(),
                from.as_deref(),
                to.as_deref(),
            )
            .await
        }
        AppCommand::Rates { base } => {
            let base = base.unwrap_or_else(|| state.from().code.clone());
            cli::rates::run(&provider, &base).await
        }
        AppCommand::Currencies { query } => {
            cli::currencies::run(&provider, query.as_deref()).await
        }
        AppCommand::Select { from, to } => {
            cli::select::select(&mut state, from.as_deref(), to.as_deref()).await
        }
        AppCommand::Swap => cli::select::swap(&mut state).await,
        AppCommand::Status => cli::select::status(&provider, &state).await,
        AppCommand::CachePrune { max_age_hours } => {
            cli::cache::prune(&provider, max_age_hours).await
        }
        AppCommand::CacheClear => cli::cache::clear(&provider).await,
    }
}
