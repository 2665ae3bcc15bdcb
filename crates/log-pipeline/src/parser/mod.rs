//! 로그 파싱 모듈 -- Traefik 텍스트/JSON 액세스 로그 파서
//!
//! 로그 문법은 설정(`json_logs`)에 따라 시작 시 한 번 결정되며,
//! 라인 내용을 보고 형식을 추측하지 않습니다.
//!
//! # 지원 형식
//! - Traefik 기본 텍스트 액세스 로그 ([`AccessLogParser`])
//! - Traefik JSON 액세스 로그 ([`JsonLogParser`])
//!
//! # 사용 예시
//! ```ignore
//! use officer_core::types::LogFormat;
//! use officer_log_pipeline::parser::LineParser;
//!
//! let parser = LineParser::for_format(LogFormat::Json)?;
//! let parsed = parser.parse(line)?;
//! ```

pub mod access_log;
pub mod json;

pub use access_log::AccessLogParser;
pub use json::JsonLogParser;

use officer_core::types::{LogFormat, RequestRecord};

use crate::error::LogPipelineError;

/// 파싱 결과
///
/// `conversion_errors`는 레코드를 버릴 정도는 아닌 필드 변환 실패 목록입니다.
/// 파서가 이미 경고 로그를 남겼습니다.
#[derive(Debug)]
pub struct ParsedLine {
    /// 추출된 레코드
    pub record: RequestRecord,
    /// 복구된 변환 에러
    pub conversion_errors: Vec<LogPipelineError>,
}

/// 라인 파서 -- 설정된 문법 하나로 고정됩니다.
#[derive(Debug, Clone)]
pub enum LineParser {
    /// 텍스트 문법
    Text(AccessLogParser),
    /// JSON 문법
    Json(JsonLogParser),
}

impl LineParser {
    /// 로그 문법에 맞는 파서를 생성합니다.
    pub fn for_format(format: LogFormat) -> Result<Self, LogPipelineError> {
        Ok(match format {
            LogFormat::Text => Self::Text(AccessLogParser::new()?),
            LogFormat::Json => Self::Json(JsonLogParser::default()),
        })
    }

    /// 최대 입력 크기를 설정합니다.
    pub fn with_max_input_size(self, size: usize) -> Self {
        match self {
            Self::Text(p) => Self::Text(p.with_max_input_size(size)),
            Self::Json(p) => Self::Json(p.with_max_input_size(size)),
        }
    }

    /// 이 파서의 문법
    pub fn format(&self) -> LogFormat {
        match self {
            Self::Text(_) => LogFormat::Text,
            Self::Json(_) => LogFormat::Json,
        }
    }

    /// 한 줄을 파싱합니다.
    pub fn parse(&self, line: &str) -> Result<ParsedLine, LogPipelineError> {
        match self {
            Self::Text(p) => p.parse(line),
            Self::Json(p) => p.parse(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_format_selects_variant() {
        assert_eq!(
            LineParser::for_format(LogFormat::Text).unwrap().format(),
            LogFormat::Text
        );
        assert_eq!(
            LineParser::for_format(LogFormat::Json).unwrap().format(),
            LogFormat::Json
        );
    }

    #[test]
    fn json_parser_does_not_sniff_text_lines() {
        let parser = LineParser::for_format(LogFormat::Json).unwrap();
        let text = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET / HTTP/1.1" 200 1 "-" "curl" 1 "a@docker" "http://b" 1ms"#;
        assert!(parser.parse(text).is_err());
    }

    #[test]
    fn text_parser_rejects_json_lines() {
        let parser = LineParser::for_format(LogFormat::Text).unwrap();
        assert!(parser.parse(r#"{"RequestPath":"/"}"#).is_err());
    }
}
