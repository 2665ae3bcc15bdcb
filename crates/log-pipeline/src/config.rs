//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`OfficerConfig`](officer_core::config::OfficerConfig)에서
//! 로그 파이프라인이 쓰는 값만 모아 평탄화한 설정입니다.
//!
//! # 사용 예시
//! ```ignore
//! use officer_core::config::OfficerConfig;
//! use officer_log_pipeline::config::PipelineConfig;
//!
//! let core_config = OfficerConfig::default();
//! let config = PipelineConfig::from_core(&core_config)?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use officer_core::config::OfficerConfig;
use officer_core::types::LogFormat;

use crate::collector::TailerConfig;
use crate::error::LogPipelineError;
use crate::rule::ClassifierOptions;

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 감시할 액세스 로그 경로
    pub log_path: String,
    /// 로그 문법
    pub format: LogFormat,
    /// 경로 레이블에 쿼리 인자 포함 여부
    pub include_query_args: bool,
    /// 필터 규칙 파일 경로
    pub rules_file: Option<String>,
    /// 화이트리스트 경로만 유지
    pub strict_whitelist: bool,
    /// 원문 출력 기준 (초)
    pub pass_log_above_threshold_secs: f64,
    /// 로테이션 활성화 여부
    pub rotation_enabled: bool,
    /// 로그를 쓰는 프로세스 이름
    pub writer_process: String,
    /// 로테이션 기준 크기 (MB)
    pub max_accesslog_size_mb: u64,
    /// 라인당 추정 바이트 수
    pub est_bytes_per_line: u64,
    /// 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 파일 열기 대기 제한 (초, 0 = 무제한)
    pub open_timeout_secs: u64,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
    /// 지연 시간 메트릭에 RouterName 레이블 추가
    pub router_label: bool,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 원문 출력 채널 용량
    pub pass_through_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_path: "./accessLog.txt".to_owned(),
            format: LogFormat::Text,
            include_query_args: false,
            rules_file: None,
            strict_whitelist: false,
            pass_log_above_threshold_secs: 1.0,
            rotation_enabled: true,
            writer_process: "traefik".to_owned(),
            max_accesslog_size_mb: 10,
            est_bytes_per_line: 150,
            poll_interval_ms: 250,
            open_timeout_secs: 0,
            max_line_length: 64 * 1024,
            router_label: false,
            pass_through_capacity: 1024,
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성하고 검증합니다.
    ///
    /// core 설정에 없는 확장 필드는 기본값이 적용됩니다.
    pub fn from_core(core: &OfficerConfig) -> Result<Self, LogPipelineError> {
        let config = Self {
            log_path: core.log_source.path.clone(),
            format: LogFormat::from_json_flag(core.log_source.json_logs),
            include_query_args: core.log_source.include_query_args,
            rules_file: core.filter.rules_file.clone(),
            strict_whitelist: core.filter.strict_whitelist,
            pass_log_above_threshold_secs: core.filter.pass_log_above_threshold_secs,
            rotation_enabled: core.rotation.enabled,
            writer_process: core.rotation.writer_process.clone(),
            max_accesslog_size_mb: core.log_source.max_accesslog_size_mb,
            est_bytes_per_line: core.log_source.est_bytes_per_line,
            poll_interval_ms: core.log_source.poll_interval_ms,
            open_timeout_secs: core.log_source.open_timeout_secs,
            max_line_length: core.log_source.max_line_length,
            router_label: core.metrics.router_label,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// 로테이션까지 읽을 라인 수
    ///
    /// `max_accesslog_size_mb * 1_000_000 / est_bytes_per_line`, 최소 1
    pub fn rotation_threshold_lines(&self) -> u64 {
        let bytes = self.max_accesslog_size_mb.saturating_mul(1_000_000);
        (bytes / self.est_bytes_per_line.max(1)).max(1)
    }

    /// 분류기 옵션
    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            include_query_args: self.include_query_args,
            strict_whitelist: self.strict_whitelist,
            pass_through_threshold_ms: self.pass_log_above_threshold_secs * 1000.0,
        }
    }

    /// 수집기 설정
    pub fn tailer_config(&self) -> TailerConfig {
        TailerConfig {
            path: PathBuf::from(&self.log_path),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            open_timeout: (self.open_timeout_secs > 0)
                .then(|| Duration::from_secs(self.open_timeout_secs)),
            max_line_length: self.max_line_length,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        const MAX_PASS_THROUGH_CAPACITY: usize = 1_000_000;

        if self.log_path.trim().is_empty() {
            return Err(LogPipelineError::Config {
                field: "log_path".to_owned(),
                reason: "log path must not be empty".to_owned(),
            });
        }

        if self.max_accesslog_size_mb == 0 {
            return Err(LogPipelineError::Config {
                field: "max_accesslog_size_mb".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.est_bytes_per_line == 0 {
            return Err(LogPipelineError::Config {
                field: "est_bytes_per_line".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(LogPipelineError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_line_length == 0 {
            return Err(LogPipelineError::Config {
                field: "max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if !self.pass_log_above_threshold_secs.is_finite() || self.pass_log_above_threshold_secs < 0.0
        {
            return Err(LogPipelineError::Config {
                field: "pass_log_above_threshold_secs".to_owned(),
                reason: "must be a non-negative number".to_owned(),
            });
        }

        if self.rotation_enabled && self.writer_process.trim().is_empty() {
            return Err(LogPipelineError::Config {
                field: "writer_process".to_owned(),
                reason: "must not be empty when rotation is enabled".to_owned(),
            });
        }

        if self.pass_through_capacity == 0 || self.pass_through_capacity > MAX_PASS_THROUGH_CAPACITY
        {
            return Err(LogPipelineError::Config {
                field: "pass_through_capacity".to_owned(),
                reason: format!("must be 1-{}", MAX_PASS_THROUGH_CAPACITY),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 액세스 로그 경로를 설정합니다.
    pub fn log_path(mut self, path: impl Into<String>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// 로그 문법을 설정합니다.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    /// 쿼리 인자 포함 여부를 설정합니다.
    pub fn include_query_args(mut self, include: bool) -> Self {
        self.config.include_query_args = include;
        self
    }

    /// 필터 규칙 파일을 설정합니다.
    pub fn rules_file(mut self, path: impl Into<String>) -> Self {
        self.config.rules_file = Some(path.into());
        self
    }

    /// strict 화이트리스트 모드를 설정합니다.
    pub fn strict_whitelist(mut self, strict: bool) -> Self {
        self.config.strict_whitelist = strict;
        self
    }

    /// 원문 출력 기준(초)을 설정합니다.
    pub fn pass_log_above_threshold_secs(mut self, secs: f64) -> Self {
        self.config.pass_log_above_threshold_secs = secs;
        self
    }

    /// 로테이션 활성화 여부를 설정합니다.
    pub fn rotation_enabled(mut self, enabled: bool) -> Self {
        self.config.rotation_enabled = enabled;
        self
    }

    /// 로테이션 기준 크기(MB)와 라인당 추정 바이트 수를 설정합니다.
    pub fn rotation_size(mut self, max_mb: u64, est_bytes_per_line: u64) -> Self {
        self.config.max_accesslog_size_mb = max_mb;
        self.config.est_bytes_per_line = est_bytes_per_line;
        self
    }

    /// 폴링 주기(밀리초)를 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 파일 열기 대기 제한(초)을 설정합니다.
    pub fn open_timeout_secs(mut self, secs: u64) -> Self {
        self.config.open_timeout_secs = secs;
        self
    }

    /// RouterName 레이블 사용 여부를 설정합니다.
    pub fn router_label(mut self, enabled: bool) -> Self {
        self.config.router_label = enabled;
        self
    }

    /// 원문 출력 채널 용량을 설정합니다.
    pub fn pass_through_capacity(mut self, capacity: usize) -> Self {
        self.config.pass_through_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
