//! 필터 규칙 데이터 타입
//!
//! 규칙 파일(JSON 또는 YAML)에서 역직렬화되는 구조체와
//! 분류 결과 타입을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 필터 규칙 파일의 원본 구조
///
/// 키 이름은 기존 규칙 파일과 호환되도록 PascalCase를 그대로 사용합니다.
/// 누락된 키는 빈 목록으로 취급합니다.
///
/// # JSON 스키마
/// ```json
/// {
///   "IgnoredNamespaces": ["^kube-system"],
///   "IgnoredRouters": ["^dashboard@"],
///   "IgnoredPathsRegex": ["^/static/"],
///   "MergePathsWithExtensions": ["/api/v1/users"],
///   "WhitelistPaths": ["/health"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RuleConfig {
    /// 라우터 이름에 매칭되면 버릴 네임스페이스 정규식
    pub ignored_namespaces: Vec<String>,
    /// 라우터 이름에 매칭되면 버릴 라우터 정규식
    pub ignored_routers: Vec<String>,
    /// 정규화된 경로에 매칭되면 버릴 정규식
    pub ignored_paths_regex: Vec<String>,
    /// 이 접두어로 시작하는 경로는 접두어로 합침
    pub merge_paths_with_extensions: Vec<String>,
    /// 이 부분 문자열을 포함하는 경로는 화이트리스트
    pub whitelist_paths: Vec<String>,
}

impl RuleConfig {
    /// 규칙이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.total_rules() == 0
    }

    /// 모든 목록의 규칙 수 합계를 반환합니다.
    pub fn total_rules(&self) -> usize {
        self.ignored_namespaces.len()
            + self.ignored_routers.len()
            + self.ignored_paths_regex.len()
            + self.merge_paths_with_extensions.len()
            + self.whitelist_paths.len()
    }
}

/// 레코드를 버린 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropReason {
    /// strict 모드에서 화이트리스트에 없음
    NotWhitelisted,
    /// `IgnoredNamespaces` 매칭
    IgnoredNamespace,
    /// `IgnoredRouters` 매칭
    IgnoredRouter,
    /// `IgnoredPathsRegex` 매칭
    IgnoredPath,
}

impl DropReason {
    /// 로그용 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotWhitelisted => "not_whitelisted",
            Self::IgnoredNamespace => "ignored_namespace",
            Self::IgnoredRouter => "ignored_router",
            Self::IgnoredPath => "ignored_path",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분류 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Decision {
    /// 지연 시간 메트릭에 기록
    Keep,
    /// 무시 카운터만 증가
    Drop(DropReason),
}

impl Decision {
    /// 유지 결정인지 확인합니다.
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// 분류 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// 정규화된 요청 경로 (메트릭 레이블 값)
    pub path: String,
    /// 화이트리스트 여부
    pub whitelisted: bool,
    /// 유지/버림 결정
    pub decision: Decision,
    /// 원문 라인을 진단 출력으로 내보낼지 여부
    pub pass_through: bool,
}
