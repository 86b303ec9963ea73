//! CLI-specific functionality for the flight crawler
//!
//! This module contains all CLI-related code including argument parsing
//! and configuration discovery.

pub mod args;
pub mod config;

pub use args::{Args, ExecutionMode, OnceConfig, ServiceConfig};
pub use config::ConfigDiscovery;
