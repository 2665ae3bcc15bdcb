//! 파이프라인 오케스트레이션 -- 수집/파싱/분류/집계의 전체 흐름을 관리합니다.
//!
//! [`LogPipeline`]은 core의 [`Pipeline`](officer_core::pipeline::Pipeline) trait을 구현하여
//! `officer-daemon`에서 시작/정지/헬스 체크 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! FileTailer -> LineParser -> Classifier -> Aggregator -> MetricsSink
//!     |                           |
//!  RotationCoordinator        pass-through -> mpsc -> stdout
//! ```
//!
//! 모든 단계는 태스크 하나에서 한 줄씩 순서대로 실행됩니다. 로테이션도 같은
//! 루프 안에서 라인 수 기준에 도달했을 때 동기적으로 실행됩니다.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use officer_core::error::OfficerError;
use officer_core::pipeline::{HealthStatus, MetricsSink, Pipeline};

use crate::aggregate::Aggregator;
use crate::collector::{FileTailer, TailState};
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::parser::LineParser;
use crate::rotation::{ProcessControl, ProcfsControl, RotationCoordinator};
use crate::rule::{Classifier, Decision, DropReason, RuleLoader};

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 한 줄 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// 지연 시간이 기록됨
    Recorded,
    /// 분류기가 버림
    Ignored(DropReason),
    /// 파싱 실패로 건너뜀
    Unparsed,
}

/// 파싱/분류/집계 단계 묶음
///
/// 파일 I/O 없이 라인 하나를 끝까지 처리합니다.
pub struct LineProcessor {
    parser: LineParser,
    classifier: Classifier,
    aggregator: Aggregator,
    pass_through_tx: Option<mpsc::Sender<String>>,
    parse_errors: Arc<AtomicU64>,
}

impl LineProcessor {
    /// 새 처리기를 생성합니다.
    pub fn new(
        parser: LineParser,
        classifier: Classifier,
        aggregator: Aggregator,
        pass_through_tx: Option<mpsc::Sender<String>>,
    ) -> Self {
        Self {
            parser,
            classifier,
            aggregator,
            pass_through_tx,
            parse_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 파싱에 실패한 라인 수
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    /// 라인 하나를 처리합니다.
    ///
    /// 파싱에 실패한 라인은 어떤 카운터도 바꾸지 않습니다.
    pub fn process_line(&self, line: &str) -> LineOutcome {
        let parsed = match self.parser.parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                let count = self.parse_errors.fetch_add(1, Ordering::Relaxed) + 1;
                if should_warn_parse_failure(count) {
                    tracing::warn!(
                        error = %e,
                        format = self.parser.format().as_str(),
                        parse_errors = count,
                        "skipping unparseable line, check that json_logs matches the access log format"
                    );
                } else {
                    tracing::debug!(error = %e, "skipping unparseable line");
                }
                return LineOutcome::Unparsed;
            }
        };

        let classification = self.classifier.classify(&parsed.record);
        self.aggregator.record(&parsed.record, &classification);

        if classification.pass_through {
            self.pass_through(line);
        }

        match classification.decision {
            Decision::Keep => {
                tracing::trace!(
                    path = %classification.path,
                    method = %parsed.record.request_method,
                    duration_ms = parsed.record.duration_ms,
                    "recorded request"
                );
                LineOutcome::Recorded
            }
            Decision::Drop(reason) => {
                tracing::trace!(path = %classification.path, reason = %reason, "ignored request");
                LineOutcome::Ignored(reason)
            }
        }
    }

    fn pass_through(&self, line: &str) {
        let Some(tx) = &self.pass_through_tx else {
            return;
        };
        match tx.try_send(line.to_owned()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("pass-through channel full, dropping slow request line");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("pass-through channel closed");
            }
        }
    }
}

/// 처음 이 개수만큼의 파싱 실패는 모두 경고합니다.
const PARSE_WARN_BURST: u64 = 10;

/// 그 이후에는 이 간격마다 한 번만 경고합니다.
const PARSE_WARN_EVERY: u64 = 1000;

/// 누적 파싱 실패 수가 `count`일 때 경고 로그를 남길지 결정합니다.
fn should_warn_parse_failure(count: u64) -> bool {
    count <= PARSE_WARN_BURST || count % PARSE_WARN_EVERY == 0
}

/// 파이프라인 태스크가 소유하는 상태
struct PipelineWorker {
    tailer: FileTailer,
    processor: LineProcessor,
    rotation: Option<RotationCoordinator>,
    rotation_threshold: u64,
    lines_read: Arc<AtomicU64>,
    rotations: Arc<AtomicU64>,
}

impl PipelineWorker {
    async fn run(mut self, cancel: CancellationToken) -> Result<(), LogPipelineError> {
        loop {
            let line = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("pipeline worker cancelled");
                    return Ok(());
                }
                line = self.tailer.next_line() => line,
            };

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, "log source failed, stopping pipeline worker");
                    return Err(e);
                }
            };

            self.lines_read.fetch_add(1, Ordering::Relaxed);
            self.processor.process_line(&line);

            if self.tailer.lines_since_rotation() >= self.rotation_threshold {
                self.maybe_rotate();
            }
        }
    }

    fn maybe_rotate(&mut self) {
        let Some(coordinator) = &self.rotation else {
            return;
        };

        tracing::debug!(
            lines = self.tailer.lines_since_rotation(),
            threshold = self.rotation_threshold,
            "rotation threshold reached"
        );

        match self.tailer.rotate(coordinator) {
            Ok(()) => {
                self.rotations.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!(error = %e, "log rotation skipped");
            }
        }
    }
}

/// 로그 파이프라인 -- 수집/파싱/분류/집계의 전체 흐름을 관리합니다.
///
/// core의 `Pipeline` trait을 구현하여 `officer-daemon`에서
/// 시작/정지/헬스 체크 생명주기로 관리됩니다.
///
/// # 사용 예시
/// ```ignore
/// use officer_log_pipeline::{LogPipeline, LogPipelineBuilder};
///
/// let (mut pipeline, pass_rx) = LogPipelineBuilder::new()
///     .config(config)
///     .metrics_sink(sink)
///     .build()?;
///
/// // Pipeline trait으로 시작
/// pipeline.start().await?;
/// ```
pub struct LogPipeline {
    /// 파이프라인 설정
    config: PipelineConfig,
    /// 현재 상태
    state: PipelineState,
    /// 메트릭 상태
    sink: Arc<dyn MetricsSink>,
    /// 로그 로테이션에 쓰는 프로세스 제어
    control: Arc<dyn ProcessControl>,
    /// 원문 출력 채널 송신측 (start에서 워커로 이동)
    pass_through_tx: Option<mpsc::Sender<String>>,
    /// 워커 정지 신호
    cancel: CancellationToken,
    /// 워커가 어떤 이유로든 끝나면 취소됨
    done: CancellationToken,
    /// 수집기 상태 구독
    tail_state: Option<watch::Receiver<TailState>>,
    /// 워커 태스크 핸들
    task: Option<tokio::task::JoinHandle<Result<(), LogPipelineError>>>,
    /// 읽은 라인 카운터
    lines_read: Arc<AtomicU64>,
    /// 파싱 에러 카운터
    parse_errors: Arc<AtomicU64>,
    /// 성공한 로테이션 카운터
    rotations: Arc<AtomicU64>,
}

impl LogPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 파이프라인 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 읽은 라인 수를 반환합니다.
    pub fn lines_read(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    /// 파싱 에러 수를 반환합니다.
    pub fn parse_error_count(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }

    /// 성공한 로테이션 수를 반환합니다.
    pub fn rotation_count(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// 워커 태스크가 끝나면 취소되는 토큰을 반환합니다.
    ///
    /// 데몬은 이 토큰으로 로그 소스 실패를 감지합니다.
    pub fn done_token(&self) -> CancellationToken {
        self.done.clone()
    }
}

impl Pipeline for LogPipeline {
    async fn start(&mut self) -> Result<(), OfficerError> {
        if self.state == PipelineState::Running {
            return Err(officer_core::error::PipelineError::AlreadyRunning.into());
        }
        if self.state == PipelineState::Stopped {
            return Err(officer_core::error::PipelineError::InitFailed(
                "pipeline was stopped; rebuild it to restart".to_owned(),
            )
            .into());
        }

        tracing::info!(path = %self.config.log_path, "starting log pipeline");

        // 1. 규칙 로드 (실패 시 빈 규칙)
        let rules =
            RuleLoader::load_or_empty(self.config.rules_file.as_deref().map(Path::new)).await;
        let summary = rules.summary();
        tracing::info!(
            ignored_namespaces = ?summary.ignored_namespaces,
            ignored_routers = ?summary.ignored_routers,
            ignored_paths = ?summary.ignored_paths,
            merge_paths = ?summary.merge_paths,
            whitelist = ?summary.whitelist,
            "loaded filter rules"
        );

        // 2. 단계 구성
        let parser = LineParser::for_format(self.config.format)
            .map_err(OfficerError::from)?
            .with_max_input_size(self.config.max_line_length);
        let classifier = Classifier::new(rules, self.config.classifier_options());
        let aggregator = Aggregator::new(
            Arc::clone(&self.sink),
            self.config.format,
            self.config.router_label,
        );
        let processor = LineProcessor {
            parser,
            classifier,
            aggregator,
            pass_through_tx: self.pass_through_tx.take(),
            parse_errors: Arc::clone(&self.parse_errors),
        };

        let tailer = FileTailer::new(self.config.tailer_config());
        self.tail_state = Some(tailer.subscribe());

        let rotation = self.config.rotation_enabled.then(|| {
            RotationCoordinator::new(Arc::clone(&self.control), &self.config.writer_process)
        });

        let worker = PipelineWorker {
            tailer,
            processor,
            rotation,
            rotation_threshold: self.config.rotation_threshold_lines(),
            lines_read: Arc::clone(&self.lines_read),
            rotations: Arc::clone(&self.rotations),
        };

        tracing::info!(
            format = %self.config.format,
            rotation_enabled = self.config.rotation_enabled,
            rotation_threshold_lines = worker.rotation_threshold,
            "pipeline configured"
        );

        // 3. 워커 태스크 스폰
        let cancel = self.cancel.clone();
        let done = self.done.clone();
        let task = tokio::spawn(async move {
            let result = worker.run(cancel).await;
            done.cancel();
            result
        });

        self.task = Some(task);
        self.state = PipelineState::Running;
        tracing::info!("log pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), OfficerError> {
        if self.state != PipelineState::Running {
            return Err(officer_core::error::PipelineError::NotRunning.into());
        }

        tracing::info!("stopping log pipeline");

        self.cancel.cancel();
        self.state = PipelineState::Stopped;

        let Some(task) = self.task.take() else {
            return Ok(());
        };

        let result = match task.await {
            Ok(result) => result.map_err(OfficerError::from),
            Err(e) => {
                tracing::error!(error = %e, "pipeline worker task panicked");
                Err(officer_core::error::PipelineError::InitFailed(format!(
                    "worker task failed: {e}"
                ))
                .into())
            }
        };

        tracing::info!(
            lines_read = self.lines_read(),
            parse_errors = self.parse_error_count(),
            rotations = self.rotation_count(),
            "log pipeline stopped"
        );
        result
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                if self.done.is_cancelled() {
                    return HealthStatus::Unhealthy("pipeline worker exited".to_owned());
                }
                let tail_state = self.tail_state.as_ref().map(|rx| *rx.borrow());
                match tail_state {
                    Some(TailState::Failed) => {
                        HealthStatus::Unhealthy("log source unavailable".to_owned())
                    }
                    Some(TailState::WaitingForFile) => HealthStatus::Degraded(format!(
                        "waiting for log file {}",
                        self.config.log_path
                    )),
                    _ => HealthStatus::Healthy,
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 로그 파이프라인 빌더
///
/// 파이프라인을 구성하고 원문 출력 채널을 생성합니다.
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    sink: Option<Arc<dyn MetricsSink>>,
    control: Option<Arc<dyn ProcessControl>>,
    pass_through_tx: Option<mpsc::Sender<String>>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            sink: None,
            control: None,
            pass_through_tx: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 메트릭 상태를 지정합니다. 필수입니다.
    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 프로세스 제어 구현을 지정합니다.
    ///
    /// 지정하지 않으면 [`ProcfsControl`]을 사용합니다.
    pub fn process_control(mut self, control: Arc<dyn ProcessControl>) -> Self {
        self.control = Some(control);
        self
    }

    /// 외부 원문 출력 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn pass_through_sender(mut self, tx: mpsc::Sender<String>) -> Self {
        self.pass_through_tx = Some(tx);
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    /// - `LogPipeline`: 파이프라인 인스턴스
    /// - `Option<mpsc::Receiver<String>>`: 원문 출력 수신 채널
    ///   (외부 pass_through_sender를 설정한 경우 None)
    pub fn build(self) -> Result<(LogPipeline, Option<mpsc::Receiver<String>>), LogPipelineError> {
        self.config.validate()?;

        let sink = self.sink.ok_or_else(|| LogPipelineError::Config {
            field: "metrics_sink".to_owned(),
            reason: "a metrics sink is required".to_owned(),
        })?;

        let control = self
            .control
            .unwrap_or_else(|| Arc::new(ProcfsControl) as Arc<dyn ProcessControl>);

        let (pass_through_tx, pass_through_rx) = if let Some(tx) = self.pass_through_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.pass_through_capacity);
            (tx, Some(rx))
        };

        let pipeline = LogPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            sink,
            control,
            pass_through_tx: Some(pass_through_tx),
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
            tail_state: None,
            task: None,
            lines_read: Arc::new(AtomicU64::new(0)),
            parse_errors: Arc::new(AtomicU64::new(0)),
            rotations: Arc::new(AtomicU64::new(0)),
        };

        Ok((pipeline, pass_through_rx))
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
