//! 설정 관리 -- officer.toml 파싱 및 런타임 설정
//!
//! [`OfficerConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`OFFICER_LOG_SOURCE_PATH=/var/log/traefik/access.log` 형식)
//! 3. 설정 파일 (`officer.toml`, 선택)
//! 4. 기본값 (`Default` 구현)
//!
//! 필터 규칙 파일(무시할 라우터, 화이트리스트 등)은 이 설정과 별개이며,
//! `filter.rules_file`에 경로만 기록됩니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), officer_core::error::OfficerError> {
//! use officer_core::config::OfficerConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = OfficerConfig::load("officer.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = OfficerConfig::parse("[log_source]\njson_logs = true")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, OfficerError};

/// traefik-officer 통합 설정
///
/// `officer.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfficerConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 액세스 로그 소스 설정
    #[serde(default)]
    pub log_source: LogSourceConfig,
    /// 필터 설정
    #[serde(default)]
    pub filter: FilterConfig,
    /// 로그 로테이션 설정
    #[serde(default)]
    pub rotation: RotationConfig,
    /// 메트릭 노출 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl OfficerConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, OfficerError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일 경로가 주어지면 파일에서, 아니면 기본값에서 시작합니다.
    ///
    /// 어느 쪽이든 환경변수 오버라이드와 검증을 거칩니다.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, OfficerError> {
        match path {
            Some(path) => Self::load(path).await,
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, OfficerError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OfficerError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                OfficerError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, OfficerError> {
        toml::from_str(toml_str).map_err(|e| {
            OfficerError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `OFFICER_{SECTION}_{FIELD}`
    /// 예: `OFFICER_METRICS_PORT=9100`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "OFFICER_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "OFFICER_GENERAL_LOG_FORMAT");

        // Log source
        override_string(&mut self.log_source.path, "OFFICER_LOG_SOURCE_PATH");
        override_bool(
            &mut self.log_source.json_logs,
            "OFFICER_LOG_SOURCE_JSON_LOGS",
        );
        override_bool(
            &mut self.log_source.include_query_args,
            "OFFICER_LOG_SOURCE_INCLUDE_QUERY_ARGS",
        );
        override_u64(
            &mut self.log_source.max_accesslog_size_mb,
            "OFFICER_LOG_SOURCE_MAX_ACCESSLOG_SIZE_MB",
        );
        override_u64(
            &mut self.log_source.est_bytes_per_line,
            "OFFICER_LOG_SOURCE_EST_BYTES_PER_LINE",
        );
        override_u64(
            &mut self.log_source.poll_interval_ms,
            "OFFICER_LOG_SOURCE_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.log_source.open_timeout_secs,
            "OFFICER_LOG_SOURCE_OPEN_TIMEOUT_SECS",
        );
        override_usize(
            &mut self.log_source.max_line_length,
            "OFFICER_LOG_SOURCE_MAX_LINE_LENGTH",
        );

        // Filter
        override_opt_string(&mut self.filter.rules_file, "OFFICER_FILTER_RULES_FILE");
        override_bool(
            &mut self.filter.strict_whitelist,
            "OFFICER_FILTER_STRICT_WHITELIST",
        );
        override_f64(
            &mut self.filter.pass_log_above_threshold_secs,
            "OFFICER_FILTER_PASS_LOG_ABOVE_THRESHOLD_SECS",
        );

        // Rotation
        override_bool(&mut self.rotation.enabled, "OFFICER_ROTATION_ENABLED");
        override_string(
            &mut self.rotation.writer_process,
            "OFFICER_ROTATION_WRITER_PROCESS",
        );

        // Metrics
        override_string(
            &mut self.metrics.listen_addr,
            "OFFICER_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "OFFICER_METRICS_PORT");
        override_string(&mut self.metrics.endpoint, "OFFICER_METRICS_ENDPOINT");
        override_bool(
            &mut self.metrics.router_label,
            "OFFICER_METRICS_ROUTER_LABEL",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), OfficerError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.log_source.path.trim().is_empty() {
            return Err(invalid("log_source.path", "must not be empty".to_owned()));
        }

        if self.log_source.max_accesslog_size_mb == 0 {
            return Err(invalid(
                "log_source.max_accesslog_size_mb",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.log_source.est_bytes_per_line == 0 {
            return Err(invalid(
                "log_source.est_bytes_per_line",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.log_source.poll_interval_ms == 0 {
            return Err(invalid(
                "log_source.poll_interval_ms",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.log_source.max_line_length == 0 {
            return Err(invalid(
                "log_source.max_line_length",
                "must be greater than 0".to_owned(),
            ));
        }

        let threshold = self.filter.pass_log_above_threshold_secs;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(invalid(
                "filter.pass_log_above_threshold_secs",
                "must be a non-negative number".to_owned(),
            ));
        }

        if self.rotation.enabled && self.rotation.writer_process.trim().is_empty() {
            return Err(invalid(
                "rotation.writer_process",
                "must not be empty when rotation is enabled".to_owned(),
            ));
        }

        if self.metrics.listen_addr.trim().is_empty() {
            return Err(invalid(
                "metrics.listen_addr",
                "must not be empty".to_owned(),
            ));
        }

        if !self.metrics.endpoint.starts_with('/') {
            return Err(invalid(
                "metrics.endpoint",
                "must start with '/'".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> OfficerError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 액세스 로그 소스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSourceConfig {
    /// 감시할 액세스 로그 경로
    pub path: String,
    /// JSON 형식 로그 여부
    pub json_logs: bool,
    /// 경로 레이블에 쿼리 인자 포함 여부
    pub include_query_args: bool,
    /// 로테이션 기준 파일 크기 (MB)
    pub max_accesslog_size_mb: u64,
    /// 한 줄의 추정 바이트 수 (로테이션 임계치 계산용)
    pub est_bytes_per_line: u64,
    /// 새 데이터 확인 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 파일 열기 대기 제한 (초). 0이면 무제한
    pub open_timeout_secs: u64,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for LogSourceConfig {
    fn default() -> Self {
        Self {
            path: "./accessLog.txt".to_owned(),
            json_logs: false,
            include_query_args: false,
            max_accesslog_size_mb: 10,
            est_bytes_per_line: 150,
            poll_interval_ms: 250,
            open_timeout_secs: 0,
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// 필터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// 필터 규칙 파일 경로 (JSON 또는 YAML)
    pub rules_file: Option<String>,
    /// 화이트리스트에 있는 경로만 허용
    pub strict_whitelist: bool,
    /// 이 시간(초)을 넘는 화이트리스트 요청은 원문을 stdout으로 출력
    pub pass_log_above_threshold_secs: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            rules_file: None,
            strict_whitelist: false,
            pass_log_above_threshold_secs: 1.0,
        }
    }
}

/// 로그 로테이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 로그를 쓰는 프로세스의 실행 파일 이름
    pub writer_process: String,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            writer_process: "traefik".to_owned(),
        }
    }
}

/// 메트릭 노출 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 바인드 주소
    pub listen_addr: String,
    /// 바인드 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
    /// 지연 시간 메트릭에 RouterName 레이블 추가
    pub router_label: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_owned(),
            port: 8080,
            endpoint: "/metrics".to_owned(),
            router_label: false,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.trim().is_empty() { None } else { Some(val) };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_f64(target: &mut f64, env_key: &str) {
    override_parsed(target, env_key, "f64");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}
