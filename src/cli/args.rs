//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `run`: Run both scheduler loops until a termination signal arrives
//! - `once`: Run a single search pass (and optionally a validation pass)
//! - `show-config`: Show configuration discovery and the effective configuration
//! - `init-config`: Write a default configuration file to the user directory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    Service(ServiceConfig),
    Once(OnceConfig),
    ShowConfig { config_override: Option<PathBuf> },
    InitConfig,
}

#[derive(Debug)]
pub struct ServiceConfig {
    pub config_override: Option<PathBuf>,
    pub output_override: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug)]
pub struct OnceConfig {
    pub config_override: Option<PathBuf>,
    pub output_override: Option<PathBuf>,
    pub validate: bool,
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(name = "flight-crawler")]
#[command(author = "Flight Crawler Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Tracks the cheapest flight per route and day and keeps re-validating the fares"
)]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the daily search and periodic validation loops until stopped
    Run {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Output file override
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// Enable verbose (debug) logging
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    /// Run a single search pass, print the results and exit
    Once {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
        /// Output file override
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// Also validate every found flight once
        #[arg(long = "validate")]
        validate: bool,
        /// Enable verbose (debug) logging
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
    /// Show configuration discovery information and the effective configuration
    ShowConfig {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,
    },
    /// Write a default configuration file to ~/.flight-crawler/config.toml
    InitConfig,
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::Run {
                config,
                output,
                verbose,
            }) => Ok(ExecutionMode::Service(ServiceConfig {
                config_override: config.clone(),
                output_override: output.clone(),
                verbose: *verbose,
            })),
            Some(Commands::Once {
                config,
                output,
                validate,
                verbose,
            }) => Ok(ExecutionMode::Once(OnceConfig {
                config_override: config.clone(),
                output_override: output.clone(),
                validate: *validate,
                verbose: *verbose,
            })),
            Some(Commands::ShowConfig { config }) => Ok(ExecutionMode::ShowConfig {
                config_override: config.clone(),
            }),
            Some(Commands::InitConfig) => Ok(ExecutionMode::InitConfig),
            None => Err(
                "No command specified. Use 'flight-crawler --help' to see available commands."
                    .to_string(),
            ),
        }
    }
}
