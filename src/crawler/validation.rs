use crate::crawler::client::{FlightApi, check_url};
use crate::crawler::dates::DateWindow;
use crate::crawler::flight::{CheckOutcome, CheckResponse, Flight};
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::output::OutputWriter;
use crate::crawler::search::SearchScheduler;
use crate::crawler::store::FlightStore;
use crate::crawler::types::{CrawlerConfig, CrawlerError, RouteDirection};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Delay before retry number `attempt` (starting at 1).
pub fn backoff_delay(unit: Duration, attempt: u32) -> Duration {
    unit.saturating_mul(attempt)
}

/// What a definitive check did to the stored flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckResolution {
    Unchanged,
    Repriced { old: f64, new: f64 },
    /// The fare is gone; `replacements` is what the follow-up search stored.
    Invalidated { replacements: Option<usize> },
    /// The store no longer holds this fare, so the result was dropped.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub checked: usize,
    pub unchanged: usize,
    pub repriced: usize,
    pub invalidated: usize,
    pub superseded: usize,
    pub failed: usize,
    pub lines_written: Option<usize>,
}

/// Re-checks every stored flight against the booking API on a fixed period.
#[derive(Clone)]
pub struct ValidationScheduler {
    api: Arc<dyn FlightApi>,
    store: Arc<FlightStore>,
    writer: Arc<OutputWriter>,
    limiter: ConcurrencyLimiter,
    search: SearchScheduler,
    config: Arc<CrawlerConfig>,
}

impl ValidationScheduler {
    pub fn new(
        api: Arc<dyn FlightApi>,
        store: Arc<FlightStore>,
        writer: Arc<OutputWriter>,
        limiter: ConcurrencyLimiter,
        search: SearchScheduler,
        config: Arc<CrawlerConfig>,
    ) -> Self {
        Self {
            api,
            store,
            writer,
            limiter,
            search,
            config,
        }
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Poll the check endpoint until it reports a definitive result.
    ///
    /// A limiter slot is held only while a request is in flight. Between
    /// attempts the task sleeps `retry_delay * attempt`. Without a configured
    /// attempt cap this keeps polling for as long as the provider answers
    /// "not yet checked".
    pub async fn await_check_outcome(
        &self,
        flight: &Flight,
        cancel: &CancellationToken,
    ) -> Result<CheckOutcome, CrawlerError> {
        let url = check_url(&self.config.api, flight.booking_token())?;
        let mut attempt: u32 = 0;

        loop {
            let body = {
                let _permit = self.limiter.acquire(cancel).await?;
                cancel
                    .run_until_cancelled(self.api.fetch(&url))
                    .await
                    .ok_or(CrawlerError::Cancelled)?
            };

            let outcome = match body {
                Some(body) => match CheckResponse::from_json(&body).and_then(|r| r.outcome()) {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        warn!("Unusable check response for {}: {}", flight.key(), e);
                        None
                    }
                },
                None => None,
            };

            if let Some(outcome) = outcome
                && outcome.is_definitive()
            {
                return Ok(outcome);
            }

            attempt += 1;
            if let Some(max) = self.config.max_check_attempts
                && attempt >= max
            {
                return Err(CrawlerError::AttemptsExhausted {
                    token_prefix: flight.token_prefix().to_string(),
                    attempts: attempt,
                });
            }

            let delay = backoff_delay(self.config.retry_delay, attempt);
            debug!(
                key = %flight.key(),
                attempt,
                "Flight not checked yet, retrying in {:?}",
                delay
            );
            cancel
                .run_until_cancelled(tokio::time::sleep(delay))
                .await
                .ok_or(CrawlerError::Cancelled)?;
        }
    }

    /// Validate one flight and apply the result to the store.
    pub async fn check_flight(
        &self,
        flight: &Flight,
        cancel: &CancellationToken,
    ) -> Result<CheckResolution, CrawlerError> {
        let key = flight.key();

        match self.await_check_outcome(flight, cancel).await? {
            CheckOutcome::Invalid => {
                if !self.store.mark_invalid(&key, flight.booking_token()) {
                    debug!("Invalid fare for {} was already replaced", key);
                    return Ok(CheckResolution::Superseded);
                }
                info!("Flight {} is no longer valid, searching a replacement", key);

                let route = RouteDirection::new(&flight.fly_from, &flight.fly_to);
                let window = DateWindow::new(flight.dep_date(), flight.arr_date());
                let search = cancel
                    .run_until_cancelled(self.search.search_route(&route, &window))
                    .await
                    .ok_or(CrawlerError::Cancelled)?;

                let replacements = match search {
                    Ok(accepted) => Some(accepted),
                    Err(e) => {
                        warn!("Replacement search for {} failed: {}", key, e);
                        None
                    }
                };
                Ok(CheckResolution::Invalidated { replacements })
            }
            CheckOutcome::PriceChanged(new) => {
                if !self.store.update_price(&key, flight.booking_token(), new) {
                    debug!("Repriced fare for {} was already replaced", key);
                    return Ok(CheckResolution::Superseded);
                }
                info!("Price of {} changed from {} to {}", key, flight.price, new);
                Ok(CheckResolution::Repriced {
                    old: flight.price,
                    new,
                })
            }
            CheckOutcome::Valid | CheckOutcome::Pending => Ok(CheckResolution::Unchanged),
        }
    }

    /// Check every stored flight concurrently, then write the store.
    ///
    /// Invalid entries are checked too, so a route day whose replacement
    /// search failed gets searched again on the next pass.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> ValidationReport {
        let pass_id = Uuid::new_v4();
        let started_at = Utc::now();
        let flights = self.store.snapshot();
        info!(%pass_id, flights = flights.len(), "Starting validation pass");

        let mut checks = JoinSet::new();
        for flight in flights {
            let scheduler = self.clone();
            let cancel = cancel.clone();
            checks.spawn(async move { scheduler.check_flight(&flight, &cancel).await });
        }

        let mut report = ValidationReport {
            pass_id,
            started_at,
            checked: 0,
            unchanged: 0,
            repriced: 0,
            invalidated: 0,
            superseded: 0,
            failed: 0,
            lines_written: None,
        };

        while let Some(joined) = checks.join_next().await {
            match joined {
                Ok(Ok(resolution)) => {
                    report.checked += 1;
                    match resolution {
                        CheckResolution::Unchanged => report.unchanged += 1,
                        CheckResolution::Repriced { .. } => report.repriced += 1,
                        CheckResolution::Invalidated { .. } => report.invalidated += 1,
                        CheckResolution::Superseded => report.superseded += 1,
                    }
                }
                Ok(Err(e)) if e.is_cancellation() => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!("Flight check failed: {}", e);
                }
                Err(e) => {
                    report.failed += 1;
                    error!("Check task failed: {}", e);
                }
            }
        }

        info!("Checked number of {} flights", report.checked);

        report.lines_written = match self.writer.write_snapshot(&self.store).await {
            Ok(lines) => Some(lines),
            Err(e) => {
                error!("{}", e);
                None
            }
        };
        report
    }

    /// Run a pass, then sleep `check_period`, until cancelled.
    pub async fn run_periodic(&self, cancel: CancellationToken) {
        loop {
            let pass = cancel.run_until_cancelled(self.run_pass(&cancel)).await;
            if pass.is_none() || cancel.is_cancelled() {
                break;
            }

            let slept = cancel
                .run_until_cancelled(tokio::time::sleep(self.config.check_period))
                .await;
            if slept.is_none() {
                break;
            }
        }
        info!("Validation scheduler stopped");
    }
}
