//! 규칙 매칭 로직 -- 정규식 사전 컴파일 및 평가
//!
//! [`RuleSet`]은 [`RuleConfig`]의 정규식 목록을 로딩 시 한 번만 컴파일합니다.
//! 컴파일에 실패한 패턴은 규칙 집합에 남아 있지만 어떤 값에도 매칭되지 않습니다.

use regex::Regex;
use serde::Serialize;

use super::types::RuleConfig;

/// 정규식 패턴 하나
///
/// `regex`가 `None`이면 원본 패턴이 잘못된 것이며, 항상 매칭 실패입니다.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Option<Regex>,
}

impl CompiledPattern {
    /// 패턴을 컴파일합니다. 실패하면 경고를 남기고 매칭되지 않는 패턴을 반환합니다.
    pub fn compile(list: &'static str, source: &str) -> Self {
        let regex = match Regex::new(source) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(
                    list,
                    pattern = source,
                    error = %e,
                    "invalid rule pattern, it will never match"
                );
                None
            }
        };

        Self {
            source: source.to_owned(),
            regex,
        }
    }

    /// 원본 패턴 문자열
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 컴파일에 성공했는지 확인합니다.
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// 값이 패턴과 매칭되는지 확인합니다. 부분 매칭입니다.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(value))
    }
}

/// 컴파일된 필터 규칙 집합
///
/// 로딩 이후 변경되지 않습니다. 모든 목록은 파일에 적힌 순서를 유지합니다.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    ignored_namespaces: Vec<CompiledPattern>,
    ignored_routers: Vec<CompiledPattern>,
    ignored_paths: Vec<CompiledPattern>,
    merge_prefixes: Vec<String>,
    whitelist: Vec<String>,
}

impl RuleSet {
    /// 빈 규칙 집합을 생성합니다. 모든 레코드를 유지합니다.
    pub fn empty() -> Self {
        Self::default()
    }

    /// 원본 규칙에서 정규식을 컴파일해 규칙 집합을 만듭니다.
    pub fn compile(config: &RuleConfig) -> Self {
        let compile_all = |list: &'static str, patterns: &[String]| -> Vec<CompiledPattern> {
            patterns
                .iter()
                .map(|p| CompiledPattern::compile(list, p))
                .collect()
        };

        Self {
            ignored_namespaces: compile_all("IgnoredNamespaces", &config.ignored_namespaces),
            ignored_routers: compile_all("IgnoredRouters", &config.ignored_routers),
            ignored_paths: compile_all("IgnoredPathsRegex", &config.ignored_paths_regex),
            merge_prefixes: config.merge_paths_with_extensions.clone(),
            whitelist: config.whitelist_paths.clone(),
        }
    }

    /// 라우터 이름이 무시할 네임스페이스와 매칭되는지 확인합니다.
    pub fn matches_ignored_namespace(&self, router: &str) -> bool {
        any_match(&self.ignored_namespaces, router)
    }

    /// 라우터 이름이 무시할 라우터와 매칭되는지 확인합니다.
    pub fn matches_ignored_router(&self, router: &str) -> bool {
        any_match(&self.ignored_routers, router)
    }

    /// 경로가 무시할 경로 정규식과 매칭되는지 확인합니다.
    pub fn matches_ignored_path(&self, path: &str) -> bool {
        any_match(&self.ignored_paths, path)
    }

    /// 경로가 시작하는 첫 번째 병합 접두어를 반환합니다.
    pub fn merge_prefix_for(&self, path: &str) -> Option<&str> {
        self.merge_prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
            .map(String::as_str)
    }

    /// 경로가 화이트리스트 부분 문자열을 포함하는지 확인합니다.
    pub fn is_whitelisted(&self, path: &str) -> bool {
        self.whitelist.iter().any(|w| path.contains(w.as_str()))
    }

    /// 컴파일에 실패한 패턴 수
    pub fn invalid_pattern_count(&self) -> usize {
        self.ignored_namespaces
            .iter()
            .chain(&self.ignored_routers)
            .chain(&self.ignored_paths)
            .filter(|p| !p.is_valid())
            .count()
    }

    /// 규칙이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.ignored_namespaces.is_empty()
            && self.ignored_routers.is_empty()
            && self.ignored_paths.is_empty()
            && self.merge_prefixes.is_empty()
            && self.whitelist.is_empty()
    }

    /// 시작 배너용 요약을 반환합니다.
    pub fn summary(&self) -> RuleSummary {
        let sources = |patterns: &[CompiledPattern]| -> Vec<String> {
            patterns.iter().map(|p| p.source().to_owned()).collect()
        };

        RuleSummary {
            ignored_namespaces: sources(&self.ignored_namespaces),
            ignored_routers: sources(&self.ignored_routers),
            ignored_paths: sources(&self.ignored_paths),
            merge_paths: self.merge_prefixes.clone(),
            whitelist: self.whitelist.clone(),
        }
    }
}

/// 활성 규칙 목록 요약
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    /// 무시할 네임스페이스 패턴
    pub ignored_namespaces: Vec<String>,
    /// 무시할 라우터 패턴
    pub ignored_routers: Vec<String>,
    /// 무시할 경로 패턴
    pub ignored_paths: Vec<String>,
    /// 병합 접두어
    pub merge_paths: Vec<String>,
    /// 화이트리스트
    pub whitelist: Vec<String>,
}

fn any_match(patterns: &[CompiledPattern], value: &str) -> bool {
    patterns.iter().any(|p| p.is_match(value))
}
