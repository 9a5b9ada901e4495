//! SafeNav command line
//!
//! Manages blocking rules in the local store and evaluates URLs against
//! them, either one-shot (`check`) or as a stream on stdin (`watch`).

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{debug, info};

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};
use commands::ListKind;
use config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    let config = AppConfig::load(&cli.config, cli.store.as_deref())?;
    debug!("Configuration loaded: {:?}", config);

    let store = commands::open_store(&config).await?;
    info!("Using store {}", config.store_path.display());

    match cli.command {
        Commands::Check {
            urls,
            at,
            record,
            json,
        } => commands::check(&config, store, &urls, at, record, json).await,
        Commands::Domain { action } => commands::manage_list(store, ListKind::Domain, action).await,
        Commands::Keyword { action } => commands::manage_list(store, ListKind::Keyword, action).await,
        Commands::Whitelist { action } => {
            commands::manage_list(store, ListKind::Whitelist, action).await
        }
        Commands::Strict { state } => commands::set_strict(store, state.enabled()).await,
        Commands::Schedule { action } => commands::schedule(store, action).await,
        Commands::Filter { mode } => commands::set_filter(store, mode).await,
        Commands::History { limit, clear } => commands::history(store, limit, clear).await,
        Commands::Blocked { limit, clear } => commands::blocked(store, limit, clear).await,
        Commands::Stats { json } => commands::stats(store, json).await,
        Commands::Watch { prometheus } => commands::watch(&config, store, prometheus).await,
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("safenav=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("safenav=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Install the Prometheus recorder and return a handle for rendering
pub(crate) fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "safenav_navigations_total",
        "Navigations checked, by outcome"
    );
    metrics::describe_counter!("safenav_blocks_total", "Blocked navigations, by reason");

    info!("Metrics recorder installed");
    Ok(handle)
}
