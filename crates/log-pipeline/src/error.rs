//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for OfficerError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 복구 가능 여부는 variant로 구분됩니다. `SourceUnavailable`만 파이프라인을
//! 종료시키고, 나머지는 해당 라인이나 로테이션 주기만 건너뜁니다.

use officer_core::error::{OfficerError, ParseError, PipelineError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 라인이 문법과 맞지 않음. 라인을 버립니다.
    #[error("parse error: {format}: {reason}")]
    Parse {
        /// 파서 형식 (text, json)
        format: String,
        /// 실패 사유
        reason: String,
    },

    /// 필드 값 변환 실패. 레코드는 유지됩니다.
    #[error("conversion error: field '{field}' value '{value}': {reason}")]
    Conversion {
        /// 필드 이름
        field: String,
        /// 원문 값
        value: String,
        /// 변환 실패 사유
        reason: String,
    },

    /// 필터 규칙 파일 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 로그를 쓰는 프로세스를 찾지 못함
    #[error("log writer process '{0}' not found")]
    WriterNotFound(String),

    /// 로테이션 단계 실패
    #[error("rotation failed at {step}: {reason}")]
    Rotation {
        /// 실패한 단계 (locate, delete, recreate, signal)
        step: &'static str,
        /// 실패 사유
        reason: String,
    },

    /// 로그 소스를 열 수 없음 (복구 불가)
    #[error("log source unavailable: {path}: {reason}")]
    SourceUnavailable {
        /// 로그 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl LogPipelineError {
    /// 파이프라인을 계속 진행할 수 있는 에러인지 확인합니다.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SourceUnavailable { .. })
    }
}

impl From<LogPipelineError> for OfficerError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Parse { format, reason } => {
                OfficerError::Parse(ParseError::Grammar { format, reason })
            }
            LogPipelineError::SourceUnavailable { path, reason } => OfficerError::Pipeline(
                PipelineError::SourceUnavailable(format!("{path}: {reason}")),
            ),
            LogPipelineError::WriterNotFound(_) | LogPipelineError::Rotation { .. } => {
                OfficerError::Rotation(err.to_string())
            }
            LogPipelineError::Io(e) => OfficerError::Io(e),
            other => OfficerError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = LogPipelineError::Parse {
            format: "text".to_owned(),
            reason: "line does not match access log grammar".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("text"));
        assert!(msg.contains("grammar"));
    }

    #[test]
    fn rule_load_error_display() {
        let err = LogPipelineError::RuleLoad {
            path: "/etc/traefik-officer/rules.json".to_owned(),
            reason: "invalid JSON".to_owned(),
        };
        assert!(err.to_string().contains("rules.json"));
    }

    #[test]
    fn rotation_error_display() {
        let err = LogPipelineError::Rotation {
            step: "delete",
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("delete"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn only_source_unavailable_is_fatal() {
        let fatal = LogPipelineError::SourceUnavailable {
            path: "access.log".to_owned(),
            reason: "timed out".to_owned(),
        };
        assert!(!fatal.is_recoverable());
        assert!(LogPipelineError::WriterNotFound("traefik".to_owned()).is_recoverable());
    }

    #[test]
    fn converts_to_officer_error() {
        let err: OfficerError = LogPipelineError::Config {
            field: "log_path".to_owned(),
            reason: "empty".to_owned(),
        }
        .into();
        assert!(matches!(err, OfficerError::Pipeline(PipelineError::InitFailed(_))));

        let err: OfficerError = LogPipelineError::WriterNotFound("traefik".to_owned()).into();
        assert!(matches!(err, OfficerError::Rotation(_)));

        let err: OfficerError = LogPipelineError::SourceUnavailable {
            path: "a.log".to_owned(),
            reason: "gone".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            OfficerError::Pipeline(PipelineError::SourceUnavailable(_))
        ));
    }
}
