//! 필터 규칙과 분류기 -- 요청 레코드의 메트릭 기록 여부 결정
//!
//! 운영자가 정의한 규칙 파일을 로드하여 메트릭 카디널리티를 통제합니다.
//!
//! # 규칙 형식
//! ```json
//! {
//!   "IgnoredNamespaces": ["^kube-system"],
//!   "IgnoredRouters": ["^dashboard@"],
//!   "IgnoredPathsRegex": ["^/static/"],
//!   "MergePathsWithExtensions": ["/api/v1/users"],
//!   "WhitelistPaths": ["/health"]
//! }
//! ```
//!
//! # 아키텍처
//! - [`Classifier`]: 경로 정규화와 유지/버림 결정
//! - [`loader`]: JSON/YAML 파일 로딩
//! - [`matcher`]: 정규식 사전 컴파일 및 매칭
//! - [`types`]: 규칙 데이터 구조와 분류 결과 정의

pub mod loader;
pub mod matcher;
pub mod types;

pub use loader::RuleLoader;
pub use matcher::{CompiledPattern, RuleSet, RuleSummary};
pub use types::{Classification, Decision, DropReason, RuleConfig};

use officer_core::types::RequestRecord;

/// 분류기 동작 옵션
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOptions {
    /// 경로에 쿼리 인자를 남길지 여부
    pub include_query_args: bool,
    /// 화이트리스트에 있는 경로만 유지
    pub strict_whitelist: bool,
    /// 이 시간(밀리초)을 넘는 화이트리스트 요청은 원문 출력 대상
    pub pass_through_threshold_ms: f64,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            include_query_args: false,
            strict_whitelist: false,
            pass_through_threshold_ms: 1000.0,
        }
    }
}

/// 분류기 -- 규칙 집합과 옵션에 대한 순수 함수
///
/// 같은 입력에는 항상 같은 결과를 돌려주며 내부 상태가 없습니다.
///
/// # 사용 예시
/// ```ignore
/// let rules = RuleLoader::load_or_empty(Some(Path::new("rules.json"))).await;
/// let classifier = Classifier::new(rules, ClassifierOptions::default());
///
/// let result = classifier.classify(&record);
/// if result.decision.is_keep() {
///     // 지연 시간 기록
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleSet,
    options: ClassifierOptions,
}

impl Classifier {
    /// 새 분류기를 생성합니다.
    pub fn new(rules: RuleSet, options: ClassifierOptions) -> Self {
        Self { rules, options }
    }

    /// 규칙 집합 참조
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// 분류기 옵션
    pub fn options(&self) -> &ClassifierOptions {
        &self.options
    }

    /// 요청 경로를 메트릭 레이블 값으로 정규화합니다.
    ///
    /// 1. 쿼리 인자를 제외하면 첫 `?`에서, 이어서 첫 `&`에서 자릅니다.
    /// 2. 병합 접두어로 시작하면 경로 전체를 그 접두어로 바꿉니다.
    pub fn normalize_path<'a>(&'a self, raw: &'a str) -> &'a str {
        let mut path = raw;
        if !self.options.include_query_args {
            if let Some(idx) = path.find('?') {
                path = &path[..idx];
            }
            if let Some(idx) = path.find('&') {
                path = &path[..idx];
            }
        }

        self.rules.merge_prefix_for(path).unwrap_or(path)
    }

    /// 레코드를 분류합니다.
    pub fn classify(&self, record: &RequestRecord) -> Classification {
        let path = self.normalize_path(&record.request_path).to_owned();
        let whitelisted = self.rules.is_whitelisted(&path);

        let decision = self.decide(&path, &record.router_name, whitelisted);

        let pass_through =
            whitelisted && record.duration_ms > self.options.pass_through_threshold_ms;

        Classification {
            path,
            whitelisted,
            decision,
            pass_through,
        }
    }

    fn decide(&self, path: &str, router: &str, whitelisted: bool) -> Decision {
        if whitelisted {
            return Decision::Keep;
        }

        if self.options.strict_whitelist {
            return Decision::Drop(DropReason::NotWhitelisted);
        }

        if self.rules.matches_ignored_namespace(router) {
            Decision::Drop(DropReason::IgnoredNamespace)
        } else if self.rules.matches_ignored_router(router) {
            Decision::Drop(DropReason::IgnoredRouter)
        } else if self.rules.matches_ignored_path(path) {
            Decision::Drop(DropReason::IgnoredPath)
        } else {
            Decision::Keep
        }
    }
}
