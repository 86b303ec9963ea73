#![allow(dead_code)]

use flight_crawler::{CrawlerConfig, FlightApi, RouteDirection};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

pub const DEP_TIME: i64 = 1_717_236_000;

/// Scripted stand-in for the search and check endpoints.
#[derive(Default)]
pub struct MockFlightApi {
    searches: Mutex<HashMap<String, Value>>,
    checks: Mutex<HashMap<String, VecDeque<Value>>>,
    calls: Mutex<Vec<Url>>,
}

impl MockFlightApi {
    pub fn search_returns(&self, from: &str, to: &str, entries: Vec<Value>) {
        self.searches
            .lock()
            .unwrap()
            .insert(format!("{}-{}", from, to), json!({ "data": entries }));
    }

    /// Responses are served in order; the last one repeats.
    pub fn check_returns(&self, token: &str, responses: Vec<Value>) {
        self.checks
            .lock()
            .unwrap()
            .insert(token.to_string(), responses.into());
    }

    pub fn calls_to(&self, path_suffix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.path().ends_with(path_suffix))
            .count()
    }
}

impl FlightApi for MockFlightApi {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Option<Value>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(url.clone());
            let params: HashMap<String, String> = url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();

            if url.path().ends_with("/flights") {
                let key = format!("{}-{}", params.get("fly_from")?, params.get("fly_to")?);
                return self.searches.lock().unwrap().get(&key).cloned();
            }

            let token = params.get("booking_token")?;
            let mut checks = self.checks.lock().unwrap();
            let queue = checks.get_mut(token)?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    }
}

pub fn flight_entry(token: &str, from: &str, to: &str, price: f64, day_offset: i64) -> Value {
    let dep = DEP_TIME + day_offset * 86_400;
    json!({
        "booking_token": token,
        "cityCodeFrom": from,
        "cityCodeTo": to,
        "price": price,
        "dTime": dep,
        "aTime": dep + 7_200,
    })
}

pub fn not_checked() -> Value {
    json!({ "flights_checked": false })
}

pub fn checked_price_change(total: f64) -> Value {
    json!({
        "flights_checked": true,
        "flights_invalid": false,
        "price_change": true,
        "total": total,
    })
}

pub fn checked_unchanged() -> Value {
    json!({
        "flights_checked": true,
        "flights_invalid": false,
        "price_change": false,
    })
}

pub fn test_config(output_dir: &Path) -> CrawlerConfig {
    CrawlerConfig {
        routes: vec![
            RouteDirection::new("ALA", "TSE"),
            RouteDirection::new("TSE", "ALA"),
        ],
        retry_delay: Duration::from_millis(10),
        check_period: Duration::from_secs(900),
        shutdown_grace: Duration::from_secs(2),
        output_file: output_dir.join("output.txt"),
        ..CrawlerConfig::default()
    }
}
