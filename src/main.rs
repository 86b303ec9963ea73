use anyhow::{Context, Result};
use flight_crawler::cli::{Args, ConfigDiscovery, ExecutionMode, OnceConfig, ServiceConfig};
use flight_crawler::lifecycle::wait_for_signal;
use flight_crawler::{CrawlerConfig, CrawlerSystem, env};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mode = match args.mode() {
        Ok(mode) => mode,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match mode {
        ExecutionMode::Service(config) => run_service(config).await,
        ExecutionMode::Once(config) => run_once(config).await,
        ExecutionMode::ShowConfig { config_override } => show_config(config_override.as_ref()),
        ExecutionMode::InitConfig => {
            let path = ConfigDiscovery::create_default_user_config()?;
            println!("Configuration file: {:?}", path);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("flight_crawler=debug")
        } else {
            EnvFilter::new(env::DEFAULT_LOG_FILTER)
        }
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            builder.with_ansi(false).with_writer(Arc::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

fn load_config(
    config_override: Option<&PathBuf>,
    output_override: Option<PathBuf>,
) -> Result<CrawlerConfig> {
    let mut config = ConfigDiscovery::load(config_override)?;
    if let Some(output) = output_override {
        config.output_file = output;
    }
    Ok(config)
}

async fn run_service(service: ServiceConfig) -> Result<()> {
    let config = load_config(service.config_override.as_ref(), service.output_override)?;
    init_logging(service.verbose, config.log_file.as_deref())?;

    info!("Starting flight crawler, writing to {:?}", config.output_file);
    let system = CrawlerSystem::new(config)?;
    let report = system.run_until_shutdown(wait_for_signal()).await;

    info!(
        stopped = report.stopped,
        aborted = report.aborted,
        "Flight crawler stopped"
    );
    Ok(())
}

async fn run_once(once: OnceConfig) -> Result<()> {
    let config = load_config(once.config_override.as_ref(), once.output_override)?;
    init_logging(once.verbose, config.log_file.as_deref())?;

    let system = CrawlerSystem::new(config)?;
    let (search, validation) = system.run_once(once.validate).await;

    for flight in system.store().snapshot() {
        println!("{}\n{}", "-".repeat(40), flight);
    }

    println!(
        "\nSearched {} routes ({} failed), stored {} flights in {:?}",
        search.routes_searched,
        search.routes_failed,
        search.flights_stored,
        system.writer().path()
    );
    if let Some(validation) = validation {
        println!(
            "Validated {} flights: {} unchanged, {} repriced, {} invalidated, {} superseded, {} failed",
            validation.checked,
            validation.unchanged,
            validation.repriced,
            validation.invalidated,
            validation.superseded,
            validation.failed
        );
    }
    Ok(())
}

fn show_config(config_override: Option<&PathBuf>) -> Result<()> {
    ConfigDiscovery::show_discovery_info();

    let config = load_config(config_override, None)?;
    println!();
    println!("Effective configuration:");
    println!("{}", config.to_toml_string()?);

    if let Err(e) = config.validate() {
        println!("⚠ {}", e);
    }
    Ok(())
}
