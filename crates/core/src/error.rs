//! 에러 타입 -- 도메인별 에러 정의

/// traefik-officer 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum OfficerError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 로그 로테이션 에러
    #[error("rotation error: {0}")]
    Rotation(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 로그 소스를 열 수 없음 (복구 불가)
    #[error("log source unavailable: {0}")]
    SourceUnavailable(String),
}

/// 파싱 에러
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 문법 불일치
    #[error("line does not match {format} grammar: {reason}")]
    Grammar { format: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_officer_error() {
        let err: OfficerError = ConfigError::InvalidValue {
            field: "general.log_level".to_owned(),
            reason: "bad".to_owned(),
        }
        .into();
        assert!(matches!(err, OfficerError::Config(_)));
        assert!(err.to_string().contains("general.log_level"));
    }

    #[test]
    fn source_unavailable_display() {
        let err = PipelineError::SourceUnavailable("/var/log/traefik/access.log".to_owned());
        assert!(err.to_string().contains("access.log"));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::Grammar {
            format: "json".to_owned(),
            reason: "expected value".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("json"));
        assert!(msg.contains("expected value"));
    }
}
