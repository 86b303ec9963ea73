//! Environment constants and path utilities for the flight crawler.
//!
//! This module centralizes all hardcoded paths, file names and environment
//! variable names used throughout the application.

use std::path::{Path, PathBuf};

/// Application directory name (hidden directory like .git, .vscode)
pub const APP_DIR_NAME: &str = ".flight-crawler";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration file name looked up directly in the working directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "flight-crawler.toml";

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV_VAR: &str = "FLIGHT_CRAWLER_CONFIG";

/// System-wide configuration directory (Unix-like systems)
pub const SYSTEM_CONFIG_DIR: &str = "/etc/flight-crawler";

/// Default output file for the flight dump
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "output.txt";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "flight_crawler=info";

/// Build the application directory path from a base directory
pub fn app_dir_path(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    app_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file paths in the current directory, in priority order
pub fn local_config_file_paths(current_dir: &Path) -> [PathBuf; 2] {
    [
        current_dir.join(LOCAL_CONFIG_FILE_NAME),
        app_dir_path(current_dir).join(CONFIG_FILE_NAME),
    ]
}

/// Build the system-wide config file path
pub fn system_config_file_path() -> PathBuf {
    Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME)
}
