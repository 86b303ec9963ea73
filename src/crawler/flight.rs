use crate::crawler::dates::format_query_date;
use crate::crawler::types::CrawlerError;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One entry of the store: a route on a given departure day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlightKey {
    pub fly_from: String,
    pub fly_to: String,
    pub dep_date: NaiveDate,
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.fly_from,
            self.fly_to,
            format_query_date(self.dep_date)
        )
    }
}

/// A fare found by the search API.
///
/// The booking token identifies the fare for later checks and never changes
/// once the flight is constructed. Price and validity are updated by the
/// validation passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Flight {
    pub is_valid: bool,
    booking_token: String,
    pub fly_from: String,
    pub fly_to: String,
    pub price: f64,
    pub dep_time: DateTime<Local>,
    pub arr_time: DateTime<Local>,
}

/// Raw search entry as returned by the search endpoint.
#[derive(Debug, Deserialize)]
struct SearchEntry {
    booking_token: String,
    #[serde(rename = "cityCodeFrom")]
    city_code_from: String,
    #[serde(rename = "cityCodeTo")]
    city_code_to: String,
    price: f64,
    #[serde(rename = "dTime")]
    d_time: i64,
    #[serde(rename = "aTime")]
    a_time: i64,
}

impl Flight {
    pub fn new(
        booking_token: impl Into<String>,
        fly_from: impl Into<String>,
        fly_to: impl Into<String>,
        price: f64,
        dep_time: DateTime<Local>,
        arr_time: DateTime<Local>,
    ) -> Result<Self, CrawlerError> {
        let booking_token = booking_token.into();
        if booking_token.is_empty() {
            return Err(CrawlerError::InvalidFlight(
                "booking_token is empty".to_string(),
            ));
        }
        validate_price(price)?;

        Ok(Self {
            is_valid: true,
            booking_token,
            fly_from: fly_from.into(),
            fly_to: fly_to.into(),
            price,
            dep_time,
            arr_time,
        })
    }

    /// Build a flight from one entry of a search response's `data` array.
    pub fn from_json(entry: &Value) -> Result<Self, CrawlerError> {
        let raw = SearchEntry::deserialize(entry)
            .map_err(|e| CrawlerError::InvalidFlight(e.to_string()))?;

        Self::new(
            raw.booking_token,
            raw.city_code_from,
            raw.city_code_to,
            raw.price,
            local_from_unix(raw.d_time)?,
            local_from_unix(raw.a_time)?,
        )
    }

    pub fn booking_token(&self) -> &str {
        &self.booking_token
    }

    /// Short token prefix for log lines; full tokens are several hundred characters.
    pub fn token_prefix(&self) -> &str {
        let end = self
            .booking_token
            .char_indices()
            .nth(12)
            .map(|(idx, _)| idx)
            .unwrap_or(self.booking_token.len());
        &self.booking_token[..end]
    }

    pub fn dep_date(&self) -> NaiveDate {
        self.dep_time.date_naive()
    }

    pub fn arr_date(&self) -> NaiveDate {
        self.arr_time.date_naive()
    }

    pub fn dep_date_label(&self) -> String {
        format_query_date(self.dep_date())
    }

    pub fn arr_date_label(&self) -> String {
        format_query_date(self.arr_date())
    }

    pub fn key(&self) -> FlightKey {
        FlightKey {
            fly_from: self.fly_from.clone(),
            fly_to: self.fly_to.clone(),
            dep_date: self.dep_date(),
        }
    }

    pub fn set_price(&mut self, price: f64) -> Result<(), CrawlerError> {
        validate_price(price)?;
        self.price = price;
        Ok(())
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fly_from: {} | fly_to: {} | dep_time: {} | arr_time: {} | price: {}",
            self.fly_from,
            self.fly_to,
            self.dep_time.format(DISPLAY_TIME_FORMAT),
            self.arr_time.format(DISPLAY_TIME_FORMAT),
            self.price
        )
    }
}

fn validate_price(price: f64) -> Result<(), CrawlerError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CrawlerError::InvalidFlight(format!(
            "price must be a non-negative number, got {}",
            price
        )));
    }
    Ok(())
}

fn local_from_unix(secs: i64) -> Result<DateTime<Local>, CrawlerError> {
    Local
        .timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| CrawlerError::InvalidFlight(format!("timestamp {} out of range", secs)))
}

/// Body of the check endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub flights_checked: bool,
    #[serde(default)]
    pub flights_invalid: bool,
    #[serde(default)]
    pub price_change: bool,
    #[serde(default)]
    pub total: Option<f64>,
}

/// State of a flight after one check attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckOutcome {
    /// The provider has not finished checking the fare yet.
    Pending,
    Valid,
    Invalid,
    PriceChanged(f64),
}

impl CheckOutcome {
    pub fn is_definitive(&self) -> bool {
        !matches!(self, CheckOutcome::Pending)
    }
}

impl CheckResponse {
    pub fn from_json(body: &Value) -> Result<Self, CrawlerError> {
        CheckResponse::deserialize(body).map_err(|e| CrawlerError::Decode {
            context: "check response".to_string(),
            message: e.to_string(),
        })
    }

    pub fn outcome(&self) -> Result<CheckOutcome, CrawlerError> {
        if !self.flights_checked {
            return Ok(CheckOutcome::Pending);
        }
        if self.flights_invalid {
            return Ok(CheckOutcome::Invalid);
        }
        if self.price_change {
            return match self.total {
                Some(total) if total.is_finite() && total >= 0.0 => {
                    Ok(CheckOutcome::PriceChanged(total))
                }
                other => Err(CrawlerError::MalformedResponse(format!(
                    "price_change reported with unusable total {:?}",
                    other
                ))),
            };
        }
        Ok(CheckOutcome::Valid)
    }
}
