#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use officer_core::types::RequestRecord;
use officer_log_pipeline::rule::{Classifier, ClassifierOptions, RuleConfig, RuleSet};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 각 목록의 패턴 (목록당 최대 8개로 제한)
    ignored_namespaces: Vec<String>,
    ignored_routers: Vec<String>,
    ignored_paths_regex: Vec<String>,
    merge_paths_with_extensions: Vec<String>,
    whitelist_paths: Vec<String>,
    /// 분류 대상 레코드 필드값
    router_name: String,
    request_path: String,
    duration_ms: f64,
    include_query_args: bool,
    strict_whitelist: bool,
}

fn limit(patterns: Vec<String>) -> Vec<String> {
    patterns.into_iter().take(8).collect()
}

fuzz_target!(|input: FuzzInput| {
    let config = RuleConfig {
        ignored_namespaces: limit(input.ignored_namespaces),
        ignored_routers: limit(input.ignored_routers),
        ignored_paths_regex: limit(input.ignored_paths_regex),
        merge_paths_with_extensions: limit(input.merge_paths_with_extensions),
        whitelist_paths: limit(input.whitelist_paths),
    };

    let classifier = Classifier::new(
        RuleSet::compile(&config),
        ClassifierOptions {
            include_query_args: input.include_query_args,
            strict_whitelist: input.strict_whitelist,
            ..Default::default()
        },
    );

    let record = RequestRecord {
        router_name: input.router_name,
        request_path: input.request_path,
        duration_ms: input.duration_ms,
        ..Default::default()
    };

    // 분류는 크래시 없이 항상 결과를 반환해야 함
    let result = classifier.classify(&record);
    if result.whitelisted {
        assert!(result.decision.is_keep());
    }
});
