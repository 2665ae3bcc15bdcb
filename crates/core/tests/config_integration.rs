//! officer.toml 통합 설정 테스트
//!
//! - officer.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use std::io::Write;

use officer_core::config::OfficerConfig;
use officer_core::error::{ConfigError, OfficerError};

/// 환경변수를 설정하고 클로저 실행 후 원래 값으로 복원합니다.
fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: 테스트는 serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var(key, value);
    }

    let result = f();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

// =============================================================================
// officer.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../officer.toml.example");
    let config = OfficerConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert_eq!(config.log_source.path, "./accessLog.txt");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../officer.toml.example");
    let config = OfficerConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../officer.toml.example");
    let from_file = OfficerConfig::parse(content).expect("should parse");
    let from_code = OfficerConfig::default();

    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);

    assert_eq!(from_file.log_source.path, from_code.log_source.path);
    assert_eq!(from_file.log_source.json_logs, from_code.log_source.json_logs);
    assert_eq!(
        from_file.log_source.include_query_args,
        from_code.log_source.include_query_args
    );
    assert_eq!(
        from_file.log_source.max_accesslog_size_mb,
        from_code.log_source.max_accesslog_size_mb
    );
    assert_eq!(
        from_file.log_source.est_bytes_per_line,
        from_code.log_source.est_bytes_per_line
    );
    assert_eq!(
        from_file.log_source.poll_interval_ms,
        from_code.log_source.poll_interval_ms
    );
    assert_eq!(
        from_file.log_source.open_timeout_secs,
        from_code.log_source.open_timeout_secs
    );
    assert_eq!(
        from_file.log_source.max_line_length,
        from_code.log_source.max_line_length
    );

    assert_eq!(from_file.filter.rules_file, from_code.filter.rules_file);
    assert_eq!(
        from_file.filter.strict_whitelist,
        from_code.filter.strict_whitelist
    );
    assert!(
        (from_file.filter.pass_log_above_threshold_secs
            - from_code.filter.pass_log_above_threshold_secs)
            .abs()
            < f64::EPSILON
    );

    assert_eq!(from_file.rotation.enabled, from_code.rotation.enabled);
    assert_eq!(
        from_file.rotation.writer_process,
        from_code.rotation.writer_process
    );

    assert_eq!(from_file.metrics.listen_addr, from_code.metrics.listen_addr);
    assert_eq!(from_file.metrics.port, from_code.metrics.port);
    assert_eq!(from_file.metrics.endpoint, from_code.metrics.endpoint);
    assert_eq!(from_file.metrics.router_label, from_code.metrics.router_label);
}

// =============================================================================
// 부분 설정 로딩 테스트
// =============================================================================

#[test]
fn partial_config_filter_only() {
    let toml = r#"
[filter]
rules_file = "rules.yaml"
strict_whitelist = true
"#;
    let config = OfficerConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.filter.rules_file.as_deref(), Some("rules.yaml"));
    assert!(config.filter.strict_whitelist);
    // 나머지 섹션은 기본값
    assert!(config.rotation.enabled);
    assert_eq!(config.metrics.port, 8080);
}

#[test]
fn partial_config_metrics_only() {
    let toml = r#"
[metrics]
port = 9100
router_label = true
"#;
    let config = OfficerConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");

    assert_eq!(config.metrics.port, 9100);
    assert!(config.metrics.router_label);
    assert_eq!(config.metrics.listen_addr, "0.0.0.0");
}

#[test]
fn unknown_section_is_ignored() {
    let toml = r#"
[something_else]
key = "value"
"#;
    let config = OfficerConfig::parse(toml).expect("unknown sections should be ignored");
    assert_eq!(config.general.log_level, "info");
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;

    let result = with_env("OFFICER_GENERAL_LOG_LEVEL", "error", || {
        let mut config = OfficerConfig::parse(toml).expect("should parse");
        config.apply_env_overrides();
        config.general.log_level
    });

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_log_source_path() {
    let result = with_env("OFFICER_LOG_SOURCE_PATH", "/var/log/traefik/access.log", || {
        let mut config = OfficerConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.log_source.path
    });

    assert_eq!(result, "/var/log/traefik/access.log");
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let result = with_env("OFFICER_LOG_SOURCE_JSON_LOGS", "true", || {
        let mut config = OfficerConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.log_source.json_logs
    });

    assert!(result);
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let result = with_env("OFFICER_METRICS_PORT", "9999", || {
        let mut config = OfficerConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.metrics.port
    });

    assert_eq!(result, 9999);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_numeric_keeps_value() {
    let result = with_env("OFFICER_METRICS_PORT", "99999", || {
        let mut config = OfficerConfig::parse("[metrics]\nport = 9100").expect("should parse");
        config.apply_env_overrides();
        config.metrics.port
    });

    // u16 범위를 넘으므로 무시됨
    assert_eq!(result, 9100);
}

#[test]
#[serial_test::serial]
fn env_override_rules_file() {
    let result = with_env("OFFICER_FILTER_RULES_FILE", "/etc/officer/rules.json", || {
        let mut config = OfficerConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.filter.rules_file
    });

    assert_eq!(result.as_deref(), Some("/etc/officer/rules.json"));
}

#[test]
#[serial_test::serial]
fn env_override_missing_var_keeps_toml_value() {
    let toml = r#"
[general]
log_level = "warn"
"#;

    // SAFETY: 존재하지 않는 변수를 명시적으로 제거
    unsafe {
        std::env::remove_var("OFFICER_GENERAL_LOG_LEVEL");
    }

    let mut config = OfficerConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.general.log_level, "warn");
}

// =============================================================================
// 파일 로딩 / 에러 테스트
// =============================================================================

#[tokio::test]
#[serial_test::serial]
async fn load_from_file_applies_env_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[log_source]\nmax_accesslog_size_mb = 25").expect("write");

    let original = std::env::var("OFFICER_ROTATION_ENABLED").ok();
    // SAFETY: 테스트는 serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("OFFICER_ROTATION_ENABLED", "false");
    }

    let result = OfficerConfig::load(file.path()).await;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("OFFICER_ROTATION_ENABLED", val),
            None => std::env::remove_var("OFFICER_ROTATION_ENABLED"),
        }
    }

    let config = result.expect("should load");
    assert_eq!(config.log_source.max_accesslog_size_mb, 25);
    assert!(!config.rotation.enabled);
}

#[tokio::test]
#[serial_test::serial]
async fn load_or_default_without_path_uses_defaults() {
    let config = OfficerConfig::load_or_default(None)
        .await
        .expect("defaults should load");
    assert_eq!(config.log_source.path, "./accessLog.txt");
}

#[tokio::test]
async fn load_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[general]\nlog_format = \"xml\"").expect("write");

    let err = OfficerConfig::load(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        OfficerError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn empty_file_uses_defaults() {
    let config = OfficerConfig::parse("").expect("empty should parse");
    config.validate().expect("defaults should validate");
}

#[test]
fn wrong_type_returns_parse_error() {
    let toml = r#"
[metrics]
port = "not-a-number"
"#;
    let err = OfficerConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        OfficerError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn example_config_serialize_roundtrip() {
    let content = include_str!("../../../officer.toml.example");
    let original = OfficerConfig::parse(content).expect("should parse");
    let toml_str = toml::to_string_pretty(&original).expect("should serialize");
    let reparsed = OfficerConfig::parse(&toml_str).expect("should reparse");

    assert_eq!(original.log_source.path, reparsed.log_source.path);
    assert_eq!(
        original.rotation.writer_process,
        reparsed.rotation.writer_process
    );
}
