use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// An ordered (origin, destination) pair of location codes to search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteDirection {
    pub origin: String,
    pub destination: String,
}

impl RouteDirection {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for RouteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub routes: Vec<RouteDirection>,
    /// Unit of the linear backoff between check attempts.
    pub retry_delay: Duration,
    /// Pause between two validation passes.
    pub check_period: Duration,
    pub max_concurrent_checks: usize,
    /// Upper bound on check attempts per flight. `None` retries until the
    /// provider reports a definitive result.
    pub max_check_attempts: Option<u32>,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
    pub output_file: PathBuf,
    pub log_file: Option<PathBuf>,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub search_endpoint: String,
    pub check_endpoint: String,
    pub partner: String,
    pub affiliate_id: String,
    pub check_api_version: u32,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CrawlerError {
    #[error("HTTP request to {url} failed (status {status:?}): {message}")]
    Http {
        url: String,
        status: Option<u16>,
        message: String,
    },
    #[error("Failed to decode {context}: {message}")]
    Decode { context: String, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Invalid flight entry: {0}")]
    InvalidFlight(String),
    #[error("Failed to write output file {path:?}: {message}")]
    Output { path: PathBuf, message: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Gave up checking flight {token_prefix}.. after {attempts} attempts")]
    AttemptsExhausted { token_prefix: String, attempts: u32 },
    #[error("Operation cancelled")]
    Cancelled,
}

impl CrawlerError {
    /// Cancellation is an expected outcome during shutdown, not a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, CrawlerError::Cancelled)
    }
}

impl CrawlerConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path, content).context("Failed to write config file")
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    pub fn validate(&self) -> std::result::Result<(), CrawlerError> {
        if self.routes.is_empty() {
            return Err(CrawlerError::Config(
                "at least one route direction is required".to_string(),
            ));
        }

        for route in &self.routes {
            if route.origin.trim().is_empty() || route.destination.trim().is_empty() {
                return Err(CrawlerError::Config(format!(
                    "route {} has a blank location code",
                    route
                )));
            }
            if route.origin == route.destination {
                return Err(CrawlerError::Config(format!(
                    "route {} starts and ends at the same location",
                    route
                )));
            }
        }

        if self.max_concurrent_checks == 0 {
            return Err(CrawlerError::Config(
                "max_concurrent_checks must be greater than zero".to_string(),
            ));
        }

        if self.check_period.is_zero() {
            return Err(CrawlerError::Config(
                "check_period must be greater than zero".to_string(),
            ));
        }

        if self.max_check_attempts == Some(0) {
            return Err(CrawlerError::Config(
                "max_check_attempts must be greater than zero when set".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        let routes = [
            ("ALA", "TSE"),
            ("TSE", "ALA"),
            ("ALA", "MOW"),
            ("MOW", "ALA"),
            ("ALA", "CIT"),
            ("CIT", "ALA"),
            ("TSE", "MOW"),
            ("MOW", "TSE"),
            ("TSE", "LED"),
            ("LED", "TSE"),
        ]
        .into_iter()
        .map(|(origin, destination)| RouteDirection::new(origin, destination))
        .collect();

        Self {
            routes,
            retry_delay: Duration::from_secs(10),
            check_period: Duration::from_secs(900), // 15 minutes
            max_concurrent_checks: 30,
            max_check_attempts: None,
            request_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
            output_file: PathBuf::from(crate::env::DEFAULT_OUTPUT_FILE_NAME),
            log_file: None,
            api: ApiConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_endpoint: "https://api.skypicker.com/flights".to_string(),
            check_endpoint: "https://booking-api.skypicker.com/api/v0.1/check_flights"
                .to_string(),
            partner: "picky".to_string(),
            affiliate_id: "picky_kz".to_string(),
            check_api_version: 2,
        }
    }
}
