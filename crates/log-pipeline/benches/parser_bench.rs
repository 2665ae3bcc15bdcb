//! 액세스 로그 파서 벤치마크
//!
//! Traefik 텍스트/JSON 파서의 처리량을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use officer_log_pipeline::parser::{AccessLogParser, JsonLogParser};

/// 텍스트 라인 (쿼리 없음)
const TEXT_SHORT: &str = r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET /health HTTP/1.1" 200 2 "-" "kube-probe/1.27" 1 "health@docker" "http://10.0.0.5:8080" 0ms"#;

/// 텍스트 라인 (긴 경로, 쿼리, 브라우저 User-Agent)
const TEXT_LONG: &str = r#"203.0.113.45 - - [31/Dec/2023:23:59:59 +0000] "POST /api/v1/users/550e8400-e29b-41d4-a716-446655440000/preferences?include=notifications&expand=true HTTP/2.0" 201 4096 "https://app.example.com/settings" "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36" 1048576 "users-api@kubernetescrd" "http://10.42.3.17:8080" 245ms"#;

/// JSON 라인 (필수 필드만)
const JSON_SHORT: &str = r#"{"RouterName":"health@docker","RequestMethod":"GET","RequestPath":"/health","Duration":150000,"Overhead":20000}"#;

/// JSON 라인 (Traefik 기본 출력에 가까운 전체 필드)
const JSON_LONG: &str = r#"{"ClientAddr":"203.0.113.45:51234","ClientHost":"203.0.113.45","ClientPort":"51234","ClientUsername":"-","DownstreamContentSize":4096,"DownstreamStatus":201,"Duration":245000000,"OriginContentSize":4096,"OriginDuration":243000000,"OriginStatus":201,"Overhead":2000000,"RequestAddr":"app.example.com","RequestContentSize":512,"RequestCount":1048576,"RequestHost":"app.example.com","RequestMethod":"POST","RequestPath":"/api/v1/users/550e8400/preferences?include=notifications","RequestPort":"-","RequestProtocol":"HTTP/2.0","RequestScheme":"https","RetryAttempts":0,"RouterName":"users-api@kubernetescrd","ServiceAddr":"10.42.3.17:8080","ServiceName":"users-api@kubernetescrd","ServiceURL":"http://10.42.3.17:8080","StartLocal":"2023-12-31T23:59:59.123456789Z","StartUTC":"2023-12-31T23:59:59.123456789Z","entryPointName":"websecure","level":"info","msg":"","time":"2023-12-31T23:59:59Z"}"#;

fn bench_text_parser(c: &mut Criterion) {
    let parser = AccessLogParser::new().unwrap();

    let mut group = c.benchmark_group("text_parser");

    // 짧은 라인
    group.throughput(Throughput::Elements(1));
    group.bench_function("short", |b| {
        b.iter(|| parser.parse(black_box(TEXT_SHORT)).unwrap())
    });

    // 긴 라인
    group.bench_function("long_with_query", |b| {
        b.iter(|| parser.parse(black_box(TEXT_LONG)).unwrap())
    });

    // 1000건 반복 처리량
    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                parser.parse(black_box(TEXT_SHORT)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_json_parser(c: &mut Criterion) {
    let parser = JsonLogParser::default();

    let mut group = c.benchmark_group("json_parser");

    group.throughput(Throughput::Elements(1));
    group.bench_function("short", |b| {
        b.iter(|| parser.parse(black_box(JSON_SHORT)).unwrap())
    });

    // Traefik이 실제로 쓰는 전체 필드
    group.bench_function("long_full_fields", |b| {
        b.iter(|| parser.parse(black_box(JSON_LONG)).unwrap())
    });

    group.throughput(Throughput::Elements(1000));
    group.bench_function("throughput_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                parser.parse(black_box(JSON_SHORT)).unwrap();
            }
        })
    });

    group.finish();
}

fn bench_parser_comparison(c: &mut Criterion) {
    let text_parser = AccessLogParser::new().unwrap();
    let json_parser = JsonLogParser::default();

    let mut group = c.benchmark_group("parser_comparison");
    group.throughput(Throughput::Elements(1000));

    group.bench_with_input(BenchmarkId::new("format", "text"), &TEXT_LONG, |b, &input| {
        b.iter(|| {
            for _ in 0..1000 {
                text_parser.parse(black_box(input)).unwrap();
            }
        })
    });

    group.bench_with_input(BenchmarkId::new("format", "json"), &JSON_LONG, |b, &input| {
        b.iter(|| {
            for _ in 0..1000 {
                json_parser.parse(black_box(input)).unwrap();
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_text_parser,
    bench_json_parser,
    bench_parser_comparison
);
criterion_main!(benches);
