use crate::crawler::client::{FlightApi, search_url};
use crate::crawler::dates::{DateWindow, until_next_midnight};
use crate::crawler::flight::Flight;
use crate::crawler::output::OutputWriter;
use crate::crawler::store::FlightStore;
use crate::crawler::types::{CrawlerConfig, CrawlerError, RouteDirection};
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of one daily search pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub window: DateWindow,
    pub routes_searched: usize,
    pub routes_failed: usize,
    pub flights_stored: usize,
    pub lines_written: Option<usize>,
}

/// Refreshes the store once a day with one search per configured route.
#[derive(Clone)]
pub struct SearchScheduler {
    api: Arc<dyn FlightApi>,
    store: Arc<FlightStore>,
    writer: Arc<OutputWriter>,
    config: Arc<CrawlerConfig>,
}

impl SearchScheduler {
    pub fn new(
        api: Arc<dyn FlightApi>,
        store: Arc<FlightStore>,
        writer: Arc<OutputWriter>,
        config: Arc<CrawlerConfig>,
    ) -> Self {
        Self {
            api,
            store,
            writer,
            config,
        }
    }

    /// Search one route over `window` and merge the results into the store.
    ///
    /// Returns the number of candidates the store accepted. A failed fetch is
    /// logged and reported as an error; it is not retried here.
    pub async fn search_route(
        &self,
        route: &RouteDirection,
        window: &DateWindow,
    ) -> Result<usize, CrawlerError> {
        let url = search_url(&self.config.api, route, window)?;
        let body = self.api.fetch(&url).await.ok_or_else(|| CrawlerError::Http {
            url: url.to_string(),
            status: None,
            message: "no data returned".to_string(),
        })?;

        let entries = body
            .get("data")
            .and_then(|data| data.as_array())
            .ok_or_else(|| {
                CrawlerError::MalformedResponse(format!(
                    "search response for {} has no data array",
                    route
                ))
            })?;

        let mut accepted = 0;
        for entry in entries {
            match Flight::from_json(entry) {
                Ok(flight) => {
                    if self.store.upsert(flight) {
                        accepted += 1;
                    }
                }
                Err(e) => warn!("Skipping search entry for {}: {}", route, e),
            }
        }

        debug!(
            route = %route,
            entries = entries.len(),
            accepted,
            "Route search finished"
        );
        Ok(accepted)
    }

    /// Reset the store and search every configured route concurrently.
    pub async fn run_pass(&self, today: NaiveDate) -> PassReport {
        let pass_id = Uuid::new_v4();
        let started_at = Utc::now();
        let window = DateWindow::starting(today);

        self.store.clear();
        info!(%pass_id, routes = self.config.routes.len(), "Starting search pass");

        let mut searches = JoinSet::new();
        for route in self.config.routes.iter().cloned() {
            let scheduler = self.clone();
            searches.spawn(async move {
                let result = scheduler.search_route(&route, &window).await;
                (route, result)
            });
        }

        let mut routes_searched = 0;
        let mut routes_failed = 0;
        while let Some(joined) = searches.join_next().await {
            match joined {
                Ok((_, Ok(_))) => routes_searched += 1,
                Ok((route, Err(e))) => {
                    routes_failed += 1;
                    warn!("Search for {} yielded no updates: {}", route, e);
                }
                Err(e) => {
                    routes_failed += 1;
                    error!("Search task failed: {}", e);
                }
            }
        }

        let flights_stored = self.store.len();
        info!("Found {} flights for given directions", flights_stored);

        let lines_written = match self.writer.write_snapshot(&self.store).await {
            Ok(lines) => Some(lines),
            Err(e) => {
                error!("{}", e);
                None
            }
        };

        PassReport {
            pass_id,
            started_at,
            window,
            routes_searched,
            routes_failed,
            flights_stored,
            lines_written,
        }
    }

    /// Run a pass, then sleep until the next local midnight, until cancelled.
    pub async fn run_daily(&self, cancel: CancellationToken) {
        loop {
            let today = Local::now().date_naive();
            let pass = cancel.run_until_cancelled(self.run_pass(today)).await;
            if pass.is_none() {
                break;
            }

            let sleep_period = until_next_midnight(Local::now());
            debug!("Next search pass in {:?}", sleep_period);
            let slept = cancel
                .run_until_cancelled(tokio::time::sleep(sleep_period))
                .await;
            if slept.is_none() {
                break;
            }
        }
        info!("Search scheduler stopped");
    }
}
