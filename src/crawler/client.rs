use crate::crawler::dates::DateWindow;
use crate::crawler::types::{ApiConfig, CrawlerError, RouteDirection};
use futures::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

/// Request/response capability the schedulers talk to.
///
/// Failures are reported as `None`: callers treat "no data" as a normal
/// outcome and apply their own retry policy. Implementations never retry.
pub trait FlightApi: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Option<Value>>;
}

/// `FlightApi` over a real HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFlightApi {
    client: reqwest::Client,
}

impl HttpFlightApi {
    pub fn new(request_timeout: Duration) -> Result<Self, CrawlerError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("flight-crawler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CrawlerError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET `url` and decode the JSON body, classifying every failure.
    pub async fn try_fetch(&self, url: &Url) -> Result<Value, CrawlerError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CrawlerError::Http {
                url: url.to_string(),
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::Http {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        info!("Got response [{}] for URL: {}", status.as_u16(), url);

        response
            .json::<Value>()
            .await
            .map_err(|e| CrawlerError::Decode {
                context: url.to_string(),
                message: e.to_string(),
            })
    }
}

impl FlightApi for HttpFlightApi {
    fn fetch<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Option<Value>> {
        Box::pin(async move {
            match self.try_fetch(url).await {
                Ok(body) => Some(body),
                Err(e) => {
                    error!("Request failed: {}", e);
                    None
                }
            }
        })
    }
}

pub fn search_url(
    api: &ApiConfig,
    route: &RouteDirection,
    window: &DateWindow,
) -> Result<Url, CrawlerError> {
    let (date_from, date_to) = window.query_dates();
    Url::parse_with_params(
        &api.search_endpoint,
        &[
            ("fly_from", route.origin.as_str()),
            ("fly_to", route.destination.as_str()),
            ("date_from", date_from.as_str()),
            ("date_to", date_to.as_str()),
            ("sort", "date"),
            ("partner", api.partner.as_str()),
            ("one_per_date", "1"),
        ],
    )
    .map_err(|e| CrawlerError::Config(format!("invalid search endpoint: {}", e)))
}

pub fn check_url(api: &ApiConfig, booking_token: &str) -> Result<Url, CrawlerError> {
    let version = api.check_api_version.to_string();
    Url::parse_with_params(
        &api.check_endpoint,
        &[
            ("v", version.as_str()),
            ("booking_token", booking_token),
            ("bnum", "1"),
            ("pnum", "1"),
            ("affily", api.affiliate_id.as_str()),
        ],
    )
    .map_err(|e| CrawlerError::Config(format!("invalid check endpoint: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn params(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_search_url_parameters() {
        let api = ApiConfig::default();
        let window = DateWindow::starting(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        let url = search_url(&api, &RouteDirection::new("ALA", "TSE"), &window).unwrap();

        assert_eq!(url.path(), "/flights");
        let params = params(&url);
        assert_eq!(params["fly_from"], "ALA");
        assert_eq!(params["fly_to"], "TSE");
        assert_eq!(params["date_from"], "15/06/2024");
        assert_eq!(params["date_to"], "01/07/2024");
        assert_eq!(params["sort"], "date");
        assert_eq!(params["partner"], "picky");
        assert_eq!(params["one_per_date"], "1");
    }

    #[test]
    fn test_check_url_parameters() {
        let api = ApiConfig::default();
        let url = check_url(&api, "token+with/special=chars").unwrap();

        let params = params(&url);
        assert_eq!(params["booking_token"], "token+with/special=chars");
        assert_eq!(params["v"], "2");
        assert_eq!(params["bnum"], "1");
        assert_eq!(params["pnum"], "1");
        assert_eq!(params["affily"], "picky_kz");
    }

    #[test]
    fn test_invalid_endpoint() {
        let api = ApiConfig {
            check_endpoint: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            check_url(&api, "t"),
            Err(CrawlerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_yields_none() {
        let api = HttpFlightApi::new(Duration::from_millis(500)).unwrap();
        // Port 9 on localhost is closed in test environments
        let url = Url::parse("http://127.0.0.1:9/flights").unwrap();
        assert!(api.fetch(&url).await.is_none());
    }
}
