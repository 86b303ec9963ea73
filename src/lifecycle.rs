//! # Service Lifecycle and Graceful Shutdown
//!
//! Wires the crawler subsystems together and supervises the two scheduler
//! loops for the lifetime of the process.
//!
//! ## Task Tree
//!
//! ```text
//! ┌──────────────────────────── CrawlerSystem ─────────────────────────────┐
//! │  root CancellationToken                                                │
//! │   ├── SearchScheduler::run_daily      ── per-route searches (JoinSet)  │
//! │   └── ValidationScheduler::run_periodic ── per-flight checks (JoinSet) │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancelling the root token unblocks every sleep, limiter wait and pending
//! request below it. Loops that fail to acknowledge within the configured
//! grace period are aborted.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use flight_crawler::{CrawlerConfig, CrawlerSystem};
//! use flight_crawler::lifecycle::wait_for_signal;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let system = CrawlerSystem::new(CrawlerConfig::default())?;
//!     let report = system.run_until_shutdown(wait_for_signal()).await;
//!     println!("Stopped after {:?}", report.signal);
//!     Ok(())
//! }
//! ```

use crate::crawler::{
    ConcurrencyLimiter, CrawlerConfig, FlightApi, FlightStore, HttpFlightApi, OutputWriter,
    PassReport, SearchScheduler, ValidationReport, ValidationScheduler,
};
use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Termination signals that trigger a graceful stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Hangup,
    Terminate,
    Interrupt,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Hangup => "SIGHUP",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Interrupt => "SIGINT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub signal: Option<ShutdownSignal>,
    /// Loops that acknowledged cancellation within the grace period.
    pub stopped: usize,
    /// Loops that had to be aborted.
    pub aborted: usize,
}

/// Resolves when the process receives SIGHUP, SIGTERM or SIGINT.
#[cfg(unix)]
pub async fn wait_for_signal() -> Option<ShutdownSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut hangup, mut terminate, mut interrupt) = match (
        signal(SignalKind::hangup()),
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(h), Ok(t), Ok(i)) => (h, t, i),
        _ => {
            warn!("Failed to install signal handlers, falling back to Ctrl-C");
            return tokio::signal::ctrl_c()
                .await
                .ok()
                .map(|_| ShutdownSignal::Interrupt);
        }
    };

    tokio::select! {
        _ = hangup.recv() => Some(ShutdownSignal::Hangup),
        _ = terminate.recv() => Some(ShutdownSignal::Terminate),
        _ = interrupt.recv() => Some(ShutdownSignal::Interrupt),
    }
}

/// Resolves on Ctrl-C where Unix signals are unavailable.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> Option<ShutdownSignal> {
    tokio::signal::ctrl_c()
        .await
        .ok()
        .map(|_| ShutdownSignal::Interrupt)
}

/// The running crawler: shared store, both schedulers and their supervisor.
pub struct CrawlerSystem {
    config: Arc<CrawlerConfig>,
    store: Arc<FlightStore>,
    writer: Arc<OutputWriter>,
    search: SearchScheduler,
    validation: ValidationScheduler,
    cancel: CancellationToken,
    loops: JoinSet<&'static str>,
}

impl CrawlerSystem {
    /// Build a system talking to the real flight APIs.
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let api = HttpFlightApi::new(config.request_timeout)
            .context("Failed to initialize HTTP client")?;
        Self::with_api(config, Arc::new(api))
    }

    /// Build a system on top of any `FlightApi` implementation.
    pub fn with_api(config: CrawlerConfig, api: Arc<dyn FlightApi>) -> Result<Self> {
        config.validate().context("Invalid crawler configuration")?;

        let config = Arc::new(config);
        let store = Arc::new(FlightStore::new());
        let writer = Arc::new(OutputWriter::new(&config.output_file));
        let limiter = ConcurrencyLimiter::new(config.max_concurrent_checks);

        let search = SearchScheduler::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&writer),
            Arc::clone(&config),
        );
        let validation = ValidationScheduler::new(
            api,
            Arc::clone(&store),
            Arc::clone(&writer),
            limiter,
            search.clone(),
            Arc::clone(&config),
        );

        Ok(Self {
            config,
            store,
            writer,
            search,
            validation,
            cancel: CancellationToken::new(),
            loops: JoinSet::new(),
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<FlightStore> {
        &self.store
    }

    pub fn writer(&self) -> &Arc<OutputWriter> {
        &self.writer
    }

    pub fn search(&self) -> &SearchScheduler {
        &self.search
    }

    pub fn validation(&self) -> &ValidationScheduler {
        &self.validation
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn both scheduler loops. Calling it again while they run is a no-op.
    pub fn start(&mut self) {
        if !self.loops.is_empty() {
            warn!("Crawler loops already running");
            return;
        }

        info!(
            routes = self.config.routes.len(),
            max_concurrent_checks = self.config.max_concurrent_checks,
            "Starting flight crawler"
        );

        let search = self.search.clone();
        let cancel = self.cancel.child_token();
        self.loops.spawn(async move {
            search.run_daily(cancel).await;
            "search"
        });

        let validation = self.validation.clone();
        let cancel = self.cancel.child_token();
        self.loops.spawn(async move {
            validation.run_periodic(cancel).await;
            "validation"
        });
    }

    /// Run until `signal` resolves, then stop everything gracefully.
    pub async fn run_until_shutdown<S>(mut self, signal: S) -> ShutdownReport
    where
        S: Future<Output = Option<ShutdownSignal>>,
    {
        self.start();

        let signal = signal.await;
        match signal {
            Some(signal) => info!("Received exit signal {}", signal),
            None => info!("Shutdown requested"),
        }

        let (stopped, aborted) = self.shutdown().await;
        ShutdownReport {
            signal,
            stopped,
            aborted,
        }
    }

    /// Cancel every outstanding task and wait for acknowledgement.
    ///
    /// Returns how many loops stopped on their own and how many were aborted.
    pub async fn shutdown(&mut self) -> (usize, usize) {
        info!("Cancelling {} outstanding scheduler loops", self.loops.len());
        self.cancel.cancel();

        let grace = self.config.shutdown_grace;
        let mut stopped = 0;
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = self.loops.join_next().await {
                match joined {
                    Ok(name) => info!("{} loop stopped", name),
                    Err(e) => warn!("Scheduler loop ended abnormally: {}", e),
                }
                stopped += 1;
            }
        })
        .await;

        let mut aborted = 0;
        if drained.is_err() {
            aborted = self.loops.len();
            warn!(
                "{} loops did not stop within {:?}, aborting",
                aborted, grace
            );
            self.loops.shutdown().await;
        }

        info!("Finished awaiting cancelled tasks");
        (stopped, aborted)
    }

    /// One search pass and, optionally, one validation pass.
    pub async fn run_once(&self, validate: bool) -> (PassReport, Option<ValidationReport>) {
        let search = self.search.run_pass(Local::now().date_naive()).await;
        let validation = if validate {
            Some(self.validation.run_pass(&self.cancel).await)
        } else {
            None
        };
        (search, validation)
    }
}

impl Drop for CrawlerSystem {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
