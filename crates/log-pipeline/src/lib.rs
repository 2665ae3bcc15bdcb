#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 액세스 로그 파일 감시 (tail -F 방식)
//! - [`parser`]: Traefik 텍스트/JSON 액세스 로그 파서
//! - [`rule`]: 필터 규칙 로딩과 분류기
//! - [`aggregate`]: 분류 결과를 메트릭 상태에 반영
//! - [`rotation`]: 로그 파일 로테이션과 프로세스 시그널
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileTailer -> LineParser -> Classifier -> Aggregator -> MetricsSink
//!     |             |              |
//!  rotation     text/JSON      JSON/YAML rules
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rotation;

pub mod collector;
pub mod parser;
pub mod rule;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LineOutcome, LineProcessor, LogPipeline, LogPipelineBuilder};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 파서
pub use parser::{AccessLogParser, JsonLogParser, LineParser, ParsedLine};

// 분류기
pub use rule::{Classification, Classifier, ClassifierOptions, Decision, DropReason, RuleLoader, RuleSet};

// 집계
pub use aggregate::Aggregator;

// 수집기
pub use collector::{FileTailer, TailState, TailerConfig};

// 로테이션
pub use rotation::{ProcessControl, ProcessHandle, ProcfsControl, RotationCoordinator};
