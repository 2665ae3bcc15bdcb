//! 도메인 타입 -- 파이프라인 전역에서 사용되는 공통 타입
//!
//! 두 가지 액세스 로그 문법(텍스트, JSON)은 모두 [`RequestRecord`] 하나로 정규화됩니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 요청 레코드
///
/// 액세스 로그 한 줄에서 추출한 요청 정보입니다. 집계가 끝나면 버려집니다.
///
/// `duration_ms`는 원본 문법과 관계없이 항상 밀리초 단위입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// 클라이언트 주소
    pub client_host: String,
    /// 요청 시작 시각 (원문 문자열)
    pub start_utc: String,
    /// 라우터 이름
    pub router_name: String,
    /// HTTP 메서드
    pub request_method: String,
    /// 요청 경로 (쿼리 포함 원문)
    pub request_path: String,
    /// 프로토콜 (HTTP/1.1 등)
    pub request_protocol: String,
    /// 백엔드 응답 상태 코드
    pub origin_status: i64,
    /// 백엔드 응답 크기 (바이트)
    pub origin_content_size: i64,
    /// 프록시 누적 요청 번호
    pub request_count: i64,
    /// 요청 처리 시간 (밀리초)
    pub duration_ms: f64,
    /// 프록시 오버헤드 (밀리초). JSON 로그에만 존재합니다.
    pub overhead_ms: Option<f64>,
}

impl fmt::Display for RequestRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} router={} status={} duration={:.3}ms",
            self.request_method,
            self.request_path,
            self.router_name,
            self.origin_status,
            self.duration_ms,
        )
    }
}

/// 로그 문법 종류
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Common Log Format 기반 텍스트 문법
    #[default]
    Text,
    /// 줄 단위 JSON 객체
    Json,
}

impl LogFormat {
    /// 설정 플래그에서 문법을 결정합니다.
    pub fn from_json_flag(json_logs: bool) -> Self {
        if json_logs { Self::Json } else { Self::Text }
    }

    /// 형식 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
