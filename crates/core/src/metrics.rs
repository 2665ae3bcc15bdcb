//! 메트릭 상수, 설명 등록, 레코더 기반 [`MetricsSink`] 구현
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 기존 알림 규칙과의 호환을 위해 이름과 레이블 키는 바꾸지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `traefik_officer_`
//! - 레이블 키는 액세스 로그 필드 이름을 그대로 사용합니다 (`RequestPath` 등)
//!
//! # 사용 예시
//!
//! ```ignore
//! use std::sync::Arc;
//! use officer_core::metrics::RecorderSink;
//!
//! let (recorder, exporter) = PrometheusBuilder::new().build()?;
//! let sink = Arc::new(RecorderSink::new(Arc::new(recorder)));
//! ```

use std::sync::Arc;

use metrics::{Counter, Label, Recorder, Unit};

use crate::pipeline::{LatencyLabels, MetricsSink};

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 요청 경로 레이블 키
pub const LABEL_REQUEST_PATH: &str = "RequestPath";

/// HTTP 메서드 레이블 키
pub const LABEL_REQUEST_METHOD: &str = "RequestMethod";

/// 라우터 이름 레이블 키 (선택)
pub const LABEL_ROUTER_NAME: &str = "RouterName";

// ─── 메트릭 이름 ────────────────────────────────────────────────────

/// 처리된 액세스 로그 라인 수 (counter)
pub const LINES_PROCESSED: &str = "traefik_officer_lines_processed";

/// 지연 시간 메트릭에서 제외된 라인 수 (counter)
pub const LINES_IGNORED: &str = "traefik_officer_lines_ignored";

/// 서비스/엔드포인트별 지연 시간 (histogram, 밀리초)
pub const LATENCY: &str = "traefik_officer_latency";

/// 프록시 처리 오버헤드 (summary, 밀리초, JSON 로그 전용)
pub const OVERHEAD: &str = "traefik_officer_overhead";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 지연 시간 히스토그램 버킷 (밀리초)
pub const LATENCY_BUCKETS_MS: [f64; 13] = [
    0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 현재 레코더에 등록합니다.
///
/// 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(LINES_PROCESSED, "Number of access log lines processed");
    describe_counter!(
        LINES_IGNORED,
        "Number of access log lines ignored from latency metrics"
    );
    describe_histogram!(
        LATENCY,
        Unit::Milliseconds,
        "Latency metrics per service / endpoint"
    );
    describe_histogram!(
        OVERHEAD,
        Unit::Milliseconds,
        "The overhead caused by traefik processing of requests"
    );
}

/// `metrics` 레코더에 기록하는 [`MetricsSink`]
///
/// 레코더는 전역으로 설치하지 않고 이 값이 소유합니다. 모든 기록은
/// `metrics::with_local_recorder`를 거쳐 주입된 레코더로만 향합니다.
/// 카운터 핸들은 생성 시 한 번 등록해 두고, 레이블이 붙는 분포는 관측할 때마다
/// 레코더의 레지스트리에서 찾습니다.
pub struct RecorderSink {
    recorder: Arc<dyn Recorder + Send + Sync>,
    processed: Counter,
    ignored: Counter,
}

impl RecorderSink {
    /// 레코더를 감싸고 카운터와 설명을 등록합니다.
    pub fn new(recorder: Arc<dyn Recorder + Send + Sync>) -> Self {
        let (processed, ignored) = metrics::with_local_recorder(recorder.as_ref(), || {
            describe_all();
            (
                metrics::counter!(LINES_PROCESSED),
                metrics::counter!(LINES_IGNORED),
            )
        });

        Self {
            recorder,
            processed,
            ignored,
        }
    }

    /// 지연 시간 레이블 목록을 만듭니다.
    fn latency_labels(labels: LatencyLabels<'_>) -> Vec<Label> {
        let mut out = Vec::with_capacity(3);
        out.push(Label::new(LABEL_REQUEST_PATH, labels.path.to_owned()));
        out.push(Label::new(LABEL_REQUEST_METHOD, labels.method.to_owned()));
        if let Some(router) = labels.router {
            out.push(Label::new(LABEL_ROUTER_NAME, router.to_owned()));
        }
        out
    }
}

impl MetricsSink for RecorderSink {
    fn increment_processed(&self) {
        self.processed.increment(1);
    }

    fn increment_ignored(&self) {
        self.ignored.increment(1);
    }

    fn observe_latency(&self, labels: LatencyLabels<'_>, millis: f64) {
        let labels = Self::latency_labels(labels);
        metrics::with_local_recorder(self.recorder.as_ref(), || {
            metrics::histogram!(LATENCY, labels).record(millis);
        });
    }

    fn observe_overhead(&self, millis: f64) {
        metrics::with_local_recorder(self.recorder.as_ref(), || {
            metrics::histogram!(OVERHEAD).record(millis);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[LINES_PROCESSED, LINES_IGNORED, LATENCY, OVERHEAD];

    #[test]
    fn all_metrics_start_with_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("traefik_officer_"),
                "Metric '{}' does not start with 'traefik_officer_' prefix",
                name
            );
        }
    }

    #[test]
    fn latency_buckets_are_sorted() {
        let buckets = LATENCY_BUCKETS_MS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }

    #[test]
    fn latency_labels_include_router_only_when_present() {
        let without = RecorderSink::latency_labels(LatencyLabels {
            path: "/api",
            method: "GET",
            router: None,
        });
        assert_eq!(without.len(), 2);
        assert_eq!(without[0].key(), LABEL_REQUEST_PATH);
        assert_eq!(without[1].value(), "GET");

        let with = RecorderSink::latency_labels(LatencyLabels {
            path: "/api",
            method: "GET",
            router: Some("api@docker"),
        });
        assert_eq!(with.len(), 3);
        assert_eq!(with[2].key(), LABEL_ROUTER_NAME);
        assert_eq!(with[2].value(), "api@docker");
    }

    #[test]
    fn recorder_sink_accepts_observations() {
        let sink = RecorderSink::new(Arc::new(metrics::NoopRecorder));
        sink.increment_processed();
        sink.increment_ignored();
        sink.observe_latency(
            LatencyLabels {
                path: "/health",
                method: "GET",
                router: None,
            },
            3.5,
        );
        sink.observe_overhead(0.25);
    }
}
