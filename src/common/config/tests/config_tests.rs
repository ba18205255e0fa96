//! Unit tests for common-config crate

use std::io::Write;

use common_config::{CircuitBreakerConfig, EngineConfig, JitMode, SqlConfig};
use common_error::QuarryError;

#[test]
fn test_engine_config_default() {
    let config = EngineConfig::default();

    assert_eq!(config.sql.jit_mode, JitMode::Enabled);
    assert!(config.sql.column_pre_touch_enabled);
    assert_eq!(config.sql.page_frame_max_rows, 1_000_000);

    assert!(config.circuit_breaker.enabled);
    assert_eq!(config.circuit_breaker.throttle, 100);

    assert!(config.telemetry.enabled);
    assert_eq!(config.random.seed, None);
    assert_eq!(config.shared_query_worker_count, 0);
}

#[test]
fn test_parallel_flags_need_workers() {
    let mut config = EngineConfig::default();
    assert!(config.sql.parallel_filter_enabled);
    assert!(!config.parallel_filter_enabled());
    assert!(!config.parallel_group_by_enabled());
    assert!(!config.parallel_read_parquet_enabled());

    config.shared_query_worker_count = 4;
    assert!(config.parallel_filter_enabled());
    assert!(config.parallel_group_by_enabled());

    config.sql.parallel_read_parquet_enabled = false;
    assert!(!config.parallel_read_parquet_enabled());
}

#[test]
fn test_engine_config_serialization() {
    let mut config = EngineConfig::default();
    config.sql.jit_mode = JitMode::Scalar;
    config.circuit_breaker.throttle = 7;
    config.random.seed = Some(42);
    config.shared_query_worker_count = 2;

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: EngineConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(deserialized, config);
    assert!(json.contains("\"scalar\""));
}

#[test]
fn test_partial_json_uses_defaults() {
    let config = EngineConfig::from_json_str(r#"{"sql": {"jit_mode": "disabled"}}"#).unwrap();

    assert_eq!(config.sql.jit_mode, JitMode::Disabled);
    assert_eq!(config.sql.page_frame_max_rows, SqlConfig::default().page_frame_max_rows);
    assert_eq!(config.circuit_breaker, CircuitBreakerConfig::default());
}

#[test]
fn test_invalid_values_rejected() {
    let err = EngineConfig::from_json_str(r#"{"sql": {"page_frame_max_rows": 0}}"#).unwrap_err();
    assert!(matches!(err, QuarryError::InvalidConfig(_)));

    let err = EngineConfig::from_json_str(r#"{"circuit_breaker": {"throttle": 0}}"#).unwrap_err();
    assert!(matches!(err, QuarryError::InvalidConfig(_)));

    let err = EngineConfig::from_json_str(r#"{"circuit_breaker": {"query_timeout_micros": -1}}"#)
        .unwrap_err();
    assert!(matches!(err, QuarryError::InvalidConfig(_)));
    assert_eq!(
        err.to_string(),
        "InvalidConfig: circuit_breaker.query_timeout_micros must not be negative, got -1"
    );
}

#[test]
fn test_malformed_json_rejected() {
    let err = EngineConfig::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, QuarryError::SerdeJsonError(_)));
}

#[test]
fn test_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"telemetry": {{"enabled": false}}, "random": {{"seed": 7}}}}"#).unwrap();

    let config = EngineConfig::from_json_file(file.path()).unwrap();
    assert!(!config.telemetry.enabled);
    assert_eq!(config.random.seed, Some(7));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EngineConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, QuarryError::IoError(_)));
}
