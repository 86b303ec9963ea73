use flight_crawler::{CrawlerConfig, RouteDirection};
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_config_serialization_roundtrip() {
    let original_config = CrawlerConfig::default();

    let toml_str = original_config
        .to_toml_string()
        .expect("Should be able to serialize config to TOML");

    assert!(!toml_str.is_empty(), "TOML string should not be empty");
    assert!(toml_str.contains("output_file"), "Should contain output_file field");

    let deserialized_config = CrawlerConfig::from_toml_str(&toml_str)
        .expect("Should be able to deserialize TOML string");

    assert_eq!(original_config.routes, deserialized_config.routes);
    assert_eq!(original_config.output_file, deserialized_config.output_file);
    assert_eq!(original_config.retry_delay, deserialized_config.retry_delay);
    assert_eq!(original_config.check_period, deserialized_config.check_period);
    assert_eq!(
        original_config.max_concurrent_checks,
        deserialized_config.max_concurrent_checks
    );
    assert_eq!(
        original_config.max_check_attempts,
        deserialized_config.max_check_attempts
    );
}

#[test]
fn test_config_file_operations() {
    let original_config = CrawlerConfig::default();

    let temp_file = NamedTempFile::new().expect("Should be able to create temporary file");
    let temp_path = temp_file.path();

    original_config
        .to_toml_file(temp_path)
        .expect("Should be able to save config to file");

    let loaded_config =
        CrawlerConfig::from_toml_file(temp_path).expect("Should be able to load config from file");

    assert_eq!(original_config.routes, loaded_config.routes);
    assert_eq!(
        original_config.api.search_endpoint,
        loaded_config.api.search_endpoint
    );
    assert_eq!(
        original_config.api.affiliate_id,
        loaded_config.api.affiliate_id
    );
}

#[test]
fn test_config_toml_structure() {
    let toml_str = CrawlerConfig::default()
        .to_toml_string()
        .expect("Should be able to serialize config");

    assert!(toml_str.contains("[[routes]]"), "Should contain route tables");
    assert!(toml_str.contains("[api]"), "Should contain api section");
    assert!(toml_str.contains("max_concurrent_checks"), "Should contain max_concurrent_checks");
    assert!(toml_str.contains("check_endpoint"), "Should contain check_endpoint");
}

#[test]
fn test_default_matches_original_deployment() {
    let config = CrawlerConfig::default();

    assert_eq!(config.routes.len(), 10);
    assert_eq!(config.routes[0], RouteDirection::new("ALA", "TSE"));
    assert_eq!(config.retry_delay, Duration::from_secs(10));
    assert_eq!(config.check_period, Duration::from_secs(900));
    assert_eq!(config.max_concurrent_checks, 30);
    assert!(config.max_check_attempts.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_error_handling() {
    let result = CrawlerConfig::from_toml_file("non_existent_file.toml");
    assert!(result.is_err(), "Should fail when loading non-existent file");

    let invalid_toml = "invalid toml content [[[";
    let result = CrawlerConfig::from_toml_str(invalid_toml);
    assert!(result.is_err(), "Should fail when parsing invalid TOML");
}

#[test]
fn test_config_validation() {
    let same_endpoints = CrawlerConfig {
        routes: vec![RouteDirection::new("ALA", "ALA")],
        ..CrawlerConfig::default()
    };
    assert!(same_endpoints.validate().is_err());

    let blank_code = CrawlerConfig {
        routes: vec![RouteDirection::new("ALA", " ")],
        ..CrawlerConfig::default()
    };
    assert!(blank_code.validate().is_err());

    let no_slots = CrawlerConfig {
        max_concurrent_checks: 0,
        ..CrawlerConfig::default()
    };
    assert!(no_slots.validate().is_err());

    let zero_cap = CrawlerConfig {
        max_check_attempts: Some(0),
        ..CrawlerConfig::default()
    };
    assert!(zero_cap.validate().is_err());

    let no_routes = CrawlerConfig {
        routes: Vec::new(),
        ..CrawlerConfig::default()
    };
    assert!(no_routes.validate().is_err());
}

#[test]
fn test_config_customization() {
    let custom_config = CrawlerConfig {
        routes: vec![RouteDirection::new("TSE", "LED")],
        retry_delay: Duration::from_secs(3),
        max_check_attempts: Some(12),
        log_file: Some("crawler.log".into()),
        ..CrawlerConfig::default()
    };

    let toml_str = custom_config
        .to_toml_string()
        .expect("Should serialize custom config");
    let deserialized =
        CrawlerConfig::from_toml_str(&toml_str).expect("Should deserialize custom config");

    assert_eq!(custom_config.routes, deserialized.routes);
    assert_eq!(custom_config.retry_delay, deserialized.retry_delay);
    assert_eq!(deserialized.max_check_attempts, Some(12));
    assert_eq!(deserialized.log_file, Some("crawler.log".into()));
}
