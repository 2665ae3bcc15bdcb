//! 분류기 벤치마크
//!
//! 규칙 수에 따른 분류 성능과 규칙 컴파일 비용을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use officer_core::types::RequestRecord;
use officer_log_pipeline::rule::{Classifier, ClassifierOptions, RuleConfig, RuleSet};

fn create_record(path: &str, router: &str) -> RequestRecord {
    RequestRecord {
        client_host: "10.0.0.1".to_owned(),
        router_name: router.to_owned(),
        request_method: "GET".to_owned(),
        request_path: path.to_owned(),
        request_protocol: "HTTP/1.1".to_owned(),
        origin_status: 200,
        duration_ms: 12.0,
        ..Default::default()
    }
}

/// 목록마다 `count`개의 규칙을 가진 설정
fn create_rules(count: usize) -> RuleConfig {
    RuleConfig {
        ignored_namespaces: (0..count).map(|i| format!("^ns-{i}-")).collect(),
        ignored_routers: (0..count).map(|i| format!("^router-{i}@")).collect(),
        ignored_paths_regex: (0..count).map(|i| format!(r"^/static/{i}/.*\.(js|css)$")).collect(),
        merge_paths_with_extensions: (0..count).map(|i| format!("/api/v{i}/users")).collect(),
        whitelist_paths: (0..count).map(|i| format!("/health/{i}")).collect(),
    }
}

fn bench_classify_single(c: &mut Criterion) {
    let classifier = Classifier::new(RuleSet::compile(&create_rules(1)), ClassifierOptions::default());
    let kept = create_record("/api/v0/users/42?expand=true", "users@docker");
    let dropped = create_record("/", "router-0@internal");

    let mut group = c.benchmark_group("classify_single");
    group.throughput(Throughput::Elements(1));

    group.bench_function("kept_with_merge", |b| {
        b.iter(|| classifier.classify(black_box(&kept)))
    });

    group.bench_function("dropped_by_router", |b| {
        b.iter(|| classifier.classify(black_box(&dropped)))
    });

    group.finish();
}

fn bench_rules_scaling(c: &mut Criterion) {
    // 어떤 규칙에도 걸리지 않아 모든 목록을 끝까지 확인하는 경로
    let record = create_record("/orders/123", "orders@docker");

    let mut group = c.benchmark_group("rules_scaling");

    for rule_count in [1, 10, 100].iter() {
        let classifier = Classifier::new(
            RuleSet::compile(&create_rules(*rule_count)),
            ClassifierOptions::default(),
        );

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::from_parameter(rule_count),
            rule_count,
            |b, _| b.iter(|| classifier.classify(black_box(&record))),
        );
    }

    group.finish();
}

fn bench_strict_whitelist(c: &mut Criterion) {
    let options = ClassifierOptions {
        strict_whitelist: true,
        ..Default::default()
    };
    let classifier = Classifier::new(RuleSet::compile(&create_rules(10)), options);
    let record = create_record("/health/7", "health@docker");

    let mut group = c.benchmark_group("strict_whitelist");
    group.throughput(Throughput::Elements(1));

    group.bench_function("whitelisted", |b| {
        b.iter(|| classifier.classify(black_box(&record)))
    });

    group.finish();
}

fn bench_rule_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_compilation");

    for rule_count in [1, 10, 100].iter() {
        let config = create_rules(*rule_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(rule_count),
            &config,
            |b, config| b.iter(|| RuleSet::compile(black_box(config))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classify_single,
    bench_rules_scaling,
    bench_strict_whitelist,
    bench_rule_compilation
);
criterion_main!(benches);
