//! 규칙 파일 로더 -- 필터 규칙 파일을 디스크에서 로드합니다.
//!
//! `.yml`/`.yaml` 확장자는 YAML로, 그 외는 JSON으로 읽습니다.
//! 규칙 파일이 없거나 읽을 수 없으면 경고를 남기고 빈 규칙 집합으로 동작합니다.

use std::path::Path;

use crate::error::LogPipelineError;

use super::matcher::RuleSet;
use super::types::RuleConfig;

/// 규칙 파일 최대 크기
const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
/// 규칙 수 상한
const MAX_RULES_COUNT: usize = 10_000;

/// 규칙 파일 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 규칙 파일을 로드하고 컴파일합니다.
    ///
    /// 경로가 없거나 로딩에 실패하면 빈 규칙 집합을 반환합니다.
    /// 이 함수는 실패하지 않습니다.
    pub async fn load_or_empty(path: Option<&Path>) -> RuleSet {
        let Some(path) = path else {
            tracing::info!("no rules file configured, all requests will be recorded");
            return RuleSet::empty();
        };

        match Self::load_file(path).await {
            Ok(config) => {
                let rules = RuleSet::compile(&config);
                tracing::info!(
                    path = %path.display(),
                    count = config.total_rules(),
                    invalid = rules.invalid_pattern_count(),
                    "loaded filter rules"
                );
                rules
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to load rules file, continuing with empty rule set"
                );
                RuleSet::empty()
            }
        }
    }

    /// 단일 규칙 파일을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<RuleConfig, LogPipelineError> {
        let path = path.as_ref();

        // 파일 크기 검증
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| LogPipelineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(LogPipelineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| LogPipelineError::RuleLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        let source = path.display().to_string();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");

        if is_yaml {
            Self::parse_yaml(&content, &source)
        } else {
            Self::parse_json(&content, &source)
        }
    }

    /// JSON 문자열을 파싱합니다.
    pub fn parse_json(json_str: &str, source: &str) -> Result<RuleConfig, LogPipelineError> {
        let config: RuleConfig =
            serde_json::from_str(json_str).map_err(|e| LogPipelineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("JSON parse error: {e}"),
            })?;
        Self::check_limits(config, source)
    }

    /// YAML 문자열을 파싱합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<RuleConfig, LogPipelineError> {
        let config: RuleConfig =
            serde_yaml::from_str(yaml_str).map_err(|e| LogPipelineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;
        Self::check_limits(config, source)
    }

    fn check_limits(config: RuleConfig, source: &str) -> Result<RuleConfig, LogPipelineError> {
        if config.total_rules() > MAX_RULES_COUNT {
            return Err(LogPipelineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("too many rules: max {MAX_RULES_COUNT}"),
            });
        }
        Ok(config)
    }
}
