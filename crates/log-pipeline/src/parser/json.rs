//! Traefik JSON 액세스 로그 파서
//!
//! `accessLog.format = "json"`으로 기록된 한 줄짜리 JSON 객체를 파싱합니다.
//! 알 수 없는 필드는 무시하고, 빠진 필드는 기본값을 사용합니다.
//!
//! `Duration`과 `Overhead`는 나노초 단위로 기록되므로 1,000,000으로 나눠
//! 밀리초로 변환합니다.
//!
//! # 사용 예시
//! ```ignore
//! use officer_log_pipeline::parser::JsonLogParser;
//!
//! let parser = JsonLogParser::default();
//! let parsed = parser.parse(r#"{"RequestPath":"/api","RequestMethod":"GET","Duration":12000000}"#)?;
//! assert_eq!(parsed.record.duration_ms, 12.0);
//! ```

use serde::Deserialize;

use officer_core::types::RequestRecord;

use super::ParsedLine;
use crate::error::LogPipelineError;

const FORMAT_NAME: &str = "json";

/// 나노초 → 밀리초 변환 계수
const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Traefik JSON 로그의 원본 필드
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct TraefikJsonLine {
    client_host: String,
    #[serde(rename = "StartUTC")]
    start_utc: String,
    router_name: String,
    request_method: String,
    request_path: String,
    request_protocol: String,
    origin_status: i64,
    origin_content_size: i64,
    request_count: i64,
    /// 나노초
    duration: f64,
    /// 나노초
    overhead: f64,
}

impl From<TraefikJsonLine> for RequestRecord {
    fn from(line: TraefikJsonLine) -> Self {
        Self {
            client_host: line.client_host,
            start_utc: line.start_utc,
            router_name: line.router_name,
            request_method: line.request_method,
            request_path: line.request_path,
            request_protocol: line.request_protocol,
            origin_status: line.origin_status,
            origin_content_size: line.origin_content_size,
            request_count: line.request_count,
            duration_ms: line.duration / NANOS_PER_MILLI,
            overhead_ms: Some(line.overhead / NANOS_PER_MILLI),
        }
    }
}

/// Traefik JSON 액세스 로그 파서
#[derive(Debug, Clone)]
pub struct JsonLogParser {
    /// 최대 허용 입력 크기 (바이트)
    max_input_size: usize,
}

impl Default for JsonLogParser {
    fn default() -> Self {
        Self {
            max_input_size: 1024 * 1024, // 1MB
        }
    }
}

impl JsonLogParser {
    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 한 줄을 파싱합니다.
    pub fn parse(&self, line: &str) -> Result<ParsedLine, LogPipelineError> {
        let line = line.trim_end_matches(['\r', '\n']);

        if line.len() > self.max_input_size {
            return Err(LogPipelineError::Parse {
                format: FORMAT_NAME.to_owned(),
                reason: format!(
                    "input too large: {} bytes (max: {})",
                    line.len(),
                    self.max_input_size
                ),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| LogPipelineError::Parse {
                format: FORMAT_NAME.to_owned(),
                reason: e.to_string(),
            })?;

        // 최상위가 JSON 객체여야 합니다
        if !value.is_object() {
            return Err(LogPipelineError::Parse {
                format: FORMAT_NAME.to_owned(),
                reason: "expected JSON object at top level".to_owned(),
            });
        }

        let raw: TraefikJsonLine =
            serde_json::from_value(value).map_err(|e| LogPipelineError::Parse {
                format: FORMAT_NAME.to_owned(),
                reason: e.to_string(),
            })?;

        let record = RequestRecord::from(raw);

        tracing::trace!(
            client_host = %record.client_host,
            router = %record.router_name,
            method = %record.request_method,
            path = %record.request_path,
            status = record.origin_status,
            duration_ms = record.duration_ms,
            overhead_ms = ?record.overhead_ms,
            "parsed json access log line"
        );

        Ok(ParsedLine {
            record,
            conversion_errors: Vec::new(),
        })
    }
}
