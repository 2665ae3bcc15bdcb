//! 집계기 -- 분류 결과를 메트릭 상태에 반영합니다.
//!
//! 메트릭 상태는 생성 시 주입된 [`MetricsSink`]이며, 전역 레지스트리를 쓰지 않습니다.

use std::sync::Arc;

use officer_core::pipeline::{LatencyLabels, MetricsSink};
use officer_core::types::{LogFormat, RequestRecord};

use crate::rule::Classification;

/// 집계기
pub struct Aggregator {
    sink: Arc<dyn MetricsSink>,
    format: LogFormat,
    router_label: bool,
}

impl Aggregator {
    /// 새 집계기를 생성합니다.
    ///
    /// `format`이 JSON일 때만 오버헤드 분포를 기록합니다.
    pub fn new(sink: Arc<dyn MetricsSink>, format: LogFormat, router_label: bool) -> Self {
        Self {
            sink,
            format,
            router_label,
        }
    }

    /// 분류가 끝난 레코드 하나를 기록합니다.
    pub fn record(&self, record: &RequestRecord, classification: &Classification) {
        self.sink.increment_processed();

        if !classification.decision.is_keep() {
            self.sink.increment_ignored();
            return;
        }

        let labels = LatencyLabels {
            path: &classification.path,
            method: &record.request_method,
            router: self.router_label.then_some(record.router_name.as_str()),
        };
        self.sink.observe_latency(labels, record.duration_ms);

        if self.format == LogFormat::Json {
            if let Some(overhead) = record.overhead_ms {
                self.sink.observe_overhead(overhead);
            }
        }
    }
}
