//! Traefik 텍스트 액세스 로그 파서
//!
//! Common Log Format을 확장한 Traefik 기본 액세스 로그 한 줄을 파싱합니다.
//!
//! # 형식
//! ```text
//! <ClientHost> - <ClientUsername> [<StartUTC>] "<Method> <Path> <Protocol>" <OriginStatus>
//!   <OriginContentSize> <Referrer> "<User-Agent>" <RequestCount> "<RouterName>" "<ServiceURL>" <Duration>ms
//! ```
//!
//! # 사용 예시
//! ```ignore
//! use officer_log_pipeline::parser::AccessLogParser;
//!
//! let parser = AccessLogParser::new()?;
//! let parsed = parser.parse(r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /api HTTP/1.1" 200 512 "-" "curl/8.0" 42 "api@docker" "http://10.0.0.5:8080" 12ms"#)?;
//! assert_eq!(parsed.record.duration_ms, 12.0);
//! ```

use regex::Regex;

use officer_core::types::RequestRecord;

use super::ParsedLine;
use crate::error::LogPipelineError;

/// 텍스트 액세스 로그 문법 (14개 캡처 그룹)
const ACCESS_LOG_PATTERN: &str = concat!(
    r"(\S+)",                       // 1 - ClientHost
    r"\s-\s",                       // - - 구분자
    r"(\S+)\s",                     // 2 - ClientUsername
    r"\[([^\]]+)\]\s",              // 3 - StartUTC
    r#""(\S*)\s?"#,                 // 4 - RequestMethod
    r#"((?:[^"]*(?:\\")?)*)\s"#,    // 5 - RequestPath
    r#"([^"]*)"\s"#,                // 6 - RequestProtocol
    r"(\S+)\s",                     // 7 - OriginStatus
    r"(\S+)\s",                     // 8 - OriginContentSize
    r#"("?\S+"?)\s"#,               // 9 - Referrer
    r#"("[^"]*")\s"#,               // 10 - User-Agent
    r"(\S+)\s",                     // 11 - RequestCount
    r#"("[^"]*"|-)\s"#,             // 12 - RouterName
    r#"("[^"]*"|-)\s"#,             // 13 - ServiceURL
    r"(\S+)",                       // 14 - Duration
);

const FORMAT_NAME: &str = "text";

/// 기본 최대 입력 크기
const DEFAULT_MAX_INPUT_SIZE: usize = 64 * 1024; // 64KB

/// Traefik 텍스트 액세스 로그 파서
///
/// 정규식은 생성 시 한 번만 컴파일합니다.
#[derive(Debug, Clone)]
pub struct AccessLogParser {
    regex: Regex,
    max_input_size: usize,
}

impl AccessLogParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Result<Self, LogPipelineError> {
        Ok(Self {
            regex: Regex::new(ACCESS_LOG_PATTERN)?,
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
        })
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(mut self, size: usize) -> Self {
        self.max_input_size = size;
        self
    }

    /// 한 줄을 파싱합니다.
    ///
    /// 문법과 맞지 않으면 `Parse` 에러를 반환합니다. 숫자 필드 변환 실패는
    /// 에러가 아니며, 해당 필드를 0으로 두고 `conversion_errors`에 담아 반환합니다.
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

        let caps = self
            .regex
            .captures(line)
            .ok_or_else(|| LogPipelineError::Parse {
                format: FORMAT_NAME.to_owned(),
                reason: "line does not match access log grammar".to_owned(),
            })?;

        let group = |idx: usize| caps.get(idx).map_or("", |m| m.as_str());
        let mut conversion_errors = Vec::new();

        let origin_status = parse_int("OriginStatus", group(7), &mut conversion_errors);
        let origin_content_size =
            parse_int("OriginContentSize", group(8), &mut conversion_errors);
        let request_count = parse_int("RequestCount", group(11), &mut conversion_errors);
        let duration_ms = parse_duration(group(14), &mut conversion_errors);

        let record = RequestRecord {
            client_host: group(1).to_owned(),
            start_utc: group(3).to_owned(),
            router_name: group(12).trim_matches(['\\', '"']).to_owned(),
            request_method: group(4).to_owned(),
            request_path: group(5).to_owned(),
            request_protocol: group(6).to_owned(),
            origin_status,
            origin_content_size,
            request_count,
            duration_ms,
            overhead_ms: None,
        };

        for err in &conversion_errors {
            tracing::warn!(error = %err, line, "field conversion failed, keeping record");
        }

        tracing::trace!(
            client_host = %record.client_host,
            router = %record.router_name,
            method = %record.request_method,
            path = %record.request_path,
            status = record.origin_status,
            duration_ms = record.duration_ms,
            "parsed access log line"
        );

        Ok(ParsedLine {
            record,
            conversion_errors,
        })
    }
}

/// 정수 필드를 변환합니다. `-`는 조용히 0으로 읽습니다.
fn parse_int(field: &str, raw: &str, errors: &mut Vec<LogPipelineError>) -> i64 {
    if raw == "-" {
        return 0;
    }
    match raw.parse::<i64>() {
        Ok(v) => v,
        Err(e) => {
            errors.push(LogPipelineError::Conversion {
                field: field.to_owned(),
                value: raw.to_owned(),
                reason: e.to_string(),
            });
            0
        }
    }
}

/// `12ms` 형태의 Duration을 밀리초 실수로 변환합니다.
fn parse_duration(raw: &str, errors: &mut Vec<LogPipelineError>) -> f64 {
    let value = raw.strip_suffix("ms").unwrap_or(raw);
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        Ok(_) => {
            errors.push(LogPipelineError::Conversion {
                field: "Duration".to_owned(),
                value: raw.to_owned(),
                reason: "not a finite number".to_owned(),
            });
            0.0
        }
        Err(e) => {
            errors.push(LogPipelineError::Conversion {
                field: "Duration".to_owned(),
                value: raw.to_owned(),
                reason: e.to_string(),
            });
            0.0
        }
    }
}
