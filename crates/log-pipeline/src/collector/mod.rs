//! 로그 수집 모듈 -- 액세스 로그 파일에서 라인을 읽어옵니다.
//!
//! # 수집 소스
//! - [`FileTailer`]: 파일 감시 (tail -F 방식)
//!
//! 수집기는 파이프라인 태스크가 단독으로 소유하며, 라인은 채널을 거치지 않고
//! [`FileTailer::next_line`]으로 한 줄씩 직접 전달됩니다.

pub mod file;

pub use file::{FileTailer, TailState, TailerConfig};
