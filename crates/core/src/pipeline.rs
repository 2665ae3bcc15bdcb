//! 파이프라인 trait -- 모듈 확장 포인트 정의

use std::future::Future;

use serde::Serialize;

use crate::error::OfficerError;

/// 모듈 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능/기능 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 생명주기를 가지는 파이프라인 모듈
///
/// `officer-daemon`은 이 trait을 통해 모듈을 시작/정지하고 상태를 확인합니다.
pub trait Pipeline: Send {
    /// 모듈을 시작합니다. 백그라운드 태스크를 스폰하고 즉시 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), OfficerError>> + Send;

    /// 모듈을 정지합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), OfficerError>> + Send;

    /// 현재 헬스 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 지연 시간 분포의 레이블 값
///
/// `router`는 라우터 레이블이 활성화된 경우에만 `Some`입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyLabels<'a> {
    /// 정규화된 요청 경로
    pub path: &'a str,
    /// HTTP 메서드
    pub method: &'a str,
    /// 라우터 이름
    pub router: Option<&'a str>,
}

/// 메트릭 상태에 대한 쓰기 인터페이스
///
/// 집계기는 생성 시점에 이 trait 객체를 주입받습니다. 전역 레지스트리를 직접
/// 건드리지 않으므로 테스트에서는 인메모리 구현으로 대체할 수 있습니다.
///
/// 쓰기는 파이프라인 태스크 하나에서만 일어나고, 읽기(스크레이프)는 다른
/// 태스크에서 동시에 일어납니다. 구현체는 이를 견뎌야 합니다.
pub trait MetricsSink: Send + Sync {
    /// 파싱에 성공한 라인 수를 1 증가시킵니다.
    fn increment_processed(&self);

    /// 분류기가 버린 라인 수를 1 증가시킵니다.
    fn increment_ignored(&self);

    /// 지연 시간(밀리초)을 기록합니다.
    fn observe_latency(&self, labels: LatencyLabels<'_>, millis: f64);

    /// 프록시 오버헤드(밀리초)를 기록합니다.
    fn observe_overhead(&self, millis: f64);
}
