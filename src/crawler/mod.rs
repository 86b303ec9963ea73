pub mod client;
pub mod dates;
pub mod flight;
pub mod limiter;
pub mod output;
pub mod search;
pub mod store;
pub mod types;
pub mod validation;


pub use client::{FlightApi, HttpFlightApi};
pub use dates::DateWindow;
pub use flight::{CheckOutcome, CheckResponse, Flight, FlightKey};
pub use limiter::{ConcurrencyLimiter, LimiterPermit};
pub use output::OutputWriter;
pub use search::{PassReport, SearchScheduler};
pub use store::FlightStore;
pub use types::*;
pub use validation::{CheckResolution, ValidationReport, ValidationScheduler, backoff_delay};
