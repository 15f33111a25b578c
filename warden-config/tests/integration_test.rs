//! Integration tests for configuration loading

use std::io::Write;
use std::time::Duration;
use warden_config::{ConfigError, ConfigLoader, LogFormat, LogLevel, WardenConfig};

/// Run `f` with every override this suite sets cleared
fn without_overrides<R>(f: impl FnOnce() -> R) -> R {
    temp_env::with_vars_unset(
        [
            "WARDEN_STATIC_CACHE_ENABLED",
            "WARDEN_PERSISTENT_CACHE_BACKEND",
            "WARDEN_PERSISTENT_CACHE_TTL",
            "WARDEN_LOG_LEVEL",
            "WARDEN_LOG_FORMAT",
        ],
        f,
    )
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_config_is_valid() {
    let config = WardenConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_sample_config_round_trips() {
    let sample = WardenConfig::generate_sample();
    let parsed: WardenConfig = serde_yaml::from_str(&sample).unwrap();
    assert_eq!(parsed, WardenConfig::default());
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
cache:
  static_cache:
    backend: lru
    capacity: 50
  persistent_cache:
    backend: ttl
    ttl: 120
logging:
  level: debug
  format: json
access:
  base_alias: node
"#,
    );

    without_overrides(|| {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();
        assert_eq!(config.cache.static_cache.backend, "lru");
        assert_eq!(config.cache.static_cache.capacity, 50);
        assert_eq!(config.cache.persistent_cache.ttl, Duration::from_secs(120));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.access.base_alias, "node");
        assert_eq!(config.access.relationship_table, "group_relationship_field_data");
    });
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = write_config("");
    let config = without_overrides(|| ConfigLoader::new().from_file(file.path()).unwrap());
    assert_eq!(config, WardenConfig::default());
}

#[test]
fn test_env_overrides() {
    temp_env::with_vars(
        vec![
            ("WARDEN_STATIC_CACHE_ENABLED", Some("false")),
            ("WARDEN_PERSISTENT_CACHE_BACKEND", Some("TTL")),
            ("WARDEN_PERSISTENT_CACHE_TTL", Some("30")),
            ("WARDEN_LOG_LEVEL", Some("trace")),
            ("WARDEN_LOG_FORMAT", Some("compact")),
        ],
        || {
            let config = ConfigLoader::new().from_env().unwrap();
            assert!(!config.cache.static_cache.enabled);
            assert_eq!(config.cache.persistent_cache.backend, "ttl");
            assert_eq!(config.cache.persistent_cache.ttl, Duration::from_secs(30));
            assert_eq!(config.logging.level, LogLevel::Trace);
            assert_eq!(config.logging.format, LogFormat::Compact);
        },
    );
}

#[test]
fn test_env_overrides_file() {
    let file = write_config("logging:\n  level: warn\n");
    temp_env::with_vars(vec![("WARDEN_LOG_LEVEL", Some("error"))], || {
        let config = ConfigLoader::new().load(Some(file.path())).unwrap();
        assert_eq!(config.logging.level, LogLevel::Error);
    });
}

#[test]
fn test_custom_prefix() {
    temp_env::with_vars(vec![("ACL_PERSISTENT_CACHE_CAPACITY", Some("7"))], || {
        let config = ConfigLoader::with_prefix("ACL").from_env().unwrap();
        assert_eq!(config.cache.persistent_cache.capacity, 7);
    });
}

#[test]
fn test_invalid_env_value() {
    temp_env::with_vars(vec![("WARDEN_PERSISTENT_CACHE_TTL", Some("soon"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
    });
}

#[test]
fn test_invalid_backend_fails_validation() {
    let file = write_config("cache:\n  persistent_cache:\n    backend: redis\n");
    let err = without_overrides(|| ConfigLoader::new().from_file(file.path()).unwrap_err());
    assert!(matches!(err, ConfigError::DomainError { .. }));
}

#[test]
fn test_static_ttl_must_not_outlive_persistent() {
    let file = write_config(
        "cache:\n  static_cache:\n    backend: ttl\n    ttl: 600\n  persistent_cache:\n    backend: ttl\n    ttl: 60\n",
    );
    let err = without_overrides(|| ConfigLoader::new().from_file(file.path()).unwrap_err());
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_missing_file() {
    let err = ConfigLoader::new()
        .from_file("/nonexistent/warden.yaml")
        .unwrap_err();
    assert!(matches!(err, ConfigError::FileReadError(_)));
}
