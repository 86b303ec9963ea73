//! # Flight Crawler
//!
//! A Rust service that keeps the cheapest known flight per route and day.
//! Two concurrent loops share one result store: a daily search pass that
//! rebuilds the store from the flight-search API, and a periodic validation
//! pass that re-checks every stored fare against the booking-check API.
//!
//! ## Architecture Overview
//!
//! - **[`crawler`]**: HTTP adapter, flight records, result store, concurrency
//!   limiter, output writer and both schedulers
//! - **[`lifecycle`]**: Wiring, supervision and graceful shutdown on signals
//! - **[`cli`]**: Argument parsing and configuration discovery
//! - **[`env`]**: File names, paths and environment variable names
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flight_crawler::{CrawlerConfig, CrawlerSystem};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let system = CrawlerSystem::new(CrawlerConfig::default())?;
//!     let (search, _) = system.run_once(false).await;
//!     println!("Stored {} flights", search.flights_stored);
//!     Ok(())
//! }
//! ```

/// Polling and reconciliation core.
///
/// Everything the two scheduler loops need: the request capability, the
/// flight record, the shared store and the file dump.
pub mod crawler;

/// Process lifecycle: starts the scheduler loops and stops them on signals.
pub mod lifecycle;

/// Environment constants and path utilities.
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use crawler::{
    CrawlerConfig, CrawlerError, Flight, FlightApi, FlightStore, RouteDirection,
    SearchScheduler, ValidationScheduler,
};
pub use lifecycle::{CrawlerSystem, ShutdownReport, ShutdownSignal};
