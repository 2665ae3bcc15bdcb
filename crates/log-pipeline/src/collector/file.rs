//! 파일 기반 액세스 로그 수집기
//!
//! 로그 파일을 감시하며 새로 추가된 완전한 라인을 순서대로 돌려줍니다.
//! `tail -F`와 유사한 동작을 비동기 폴링 방식으로 구현합니다.
//!
//! # 상태 전이
//! ```text
//! WaitingForFile -> Streaming -> Rotating -> Streaming -> ...
//!        |
//!        +--(open_timeout 초과)--> Failed
//! ```
//!
//! # 로테이션 감지
//! - inode 변경 감지 (파일이 교체/재생성된 경우): 이전 핸들을 끝까지 읽은 뒤 새 파일을 처음부터 읽음
//! - 파일 크기 축소 감지 (truncation): 읽기 위치를 0으로 되돌림
//! - 경로가 사라진 경우: 파일이 다시 생길 때까지 이전 핸들을 계속 폴링

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::LogPipelineError;
use crate::rotation::RotationCoordinator;

/// 파일 수집기 설정
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// 감시할 파일 경로
    pub path: PathBuf,
    /// 새 데이터 확인 주기
    pub poll_interval: Duration,
    /// 파일 열기 대기 제한. `None`이면 무제한
    pub open_timeout: Option<Duration>,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./accessLog.txt"),
            poll_interval: Duration::from_millis(250),
            open_timeout: None,
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// 수집기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TailState {
    /// 파일이 없거나 열 수 없어 대기 중
    WaitingForFile,
    /// 새 라인을 읽는 중
    Streaming,
    /// 로그 로테이션 진행 중
    Rotating,
    /// 복구 불가
    Failed,
}

/// 파일 식별자 (Unix에서는 device + inode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(metadata: &std::fs::Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(_metadata: &std::fs::Metadata) -> Option<Self> {
        None
    }
}

/// 파일 기반 로그 수집기
///
/// 파일 핸들, 읽기 위치, 파일 식별자, 미완성 라인 버퍼, 로테이션 이후 라인 수를
/// 단독으로 소유합니다. 로테이션은 [`FileTailer::rotate`]로만 상태를 바꿉니다.
pub struct FileTailer {
    config: TailerConfig,
    state: watch::Sender<TailState>,
    reader: Option<BufReader<File>>,
    offset: u64,
    identity: Option<FileIdentity>,
    /// 개행 문자를 아직 받지 못한 라인 조각
    partial: Vec<u8>,
    /// 최대 길이를 넘은 라인의 나머지를 버리는 중
    discarding: bool,
    /// 다음 EOF에서 경로의 새 파일로 전환
    pending_switch: bool,
    lines_since_rotation: u64,
    waiting_since: Option<Instant>,
}

impl FileTailer {
    /// 새 수집기를 생성합니다. 파일은 첫 [`next_line`](Self::next_line) 호출 시 엽니다.
    pub fn new(config: TailerConfig) -> Self {
        Self {
            config,
            state: watch::Sender::new(TailState::WaitingForFile),
            reader: None,
            offset: 0,
            identity: None,
            partial: Vec::new(),
            discarding: false,
            pending_switch: false,
            lines_since_rotation: 0,
            waiting_since: None,
        }
    }

    /// 현재 상태
    pub fn state(&self) -> TailState {
        *self.state.borrow()
    }

    /// 상태 변화를 구독합니다.
    ///
    /// 수집기를 소유한 태스크 밖에서 상태를 확인할 때 사용합니다.
    pub fn subscribe(&self) -> watch::Receiver<TailState> {
        self.state.subscribe()
    }

    /// 감시 중인 경로
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// 현재 파일에서의 읽기 위치 (바이트)
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 마지막 로테이션 이후 읽은 라인 수
    pub fn lines_since_rotation(&self) -> u64 {
        self.lines_since_rotation
    }

    /// 다음 완전한 라인을 반환합니다.
    ///
    /// 새 데이터가 없으면 `poll_interval`마다 다시 확인하며 기다립니다.
    /// 반환되는 라인에는 줄바꿈 문자가 포함되지 않습니다.
    ///
    /// # Errors
    /// `open_timeout`이 지나도록 파일을 열지 못하면 `SourceUnavailable`을 반환하며,
    /// 이후 호출도 같은 에러를 반환합니다.
    pub async fn next_line(&mut self) -> Result<String, LogPipelineError> {
        loop {
            match self.state() {
                TailState::Failed => return Err(self.unavailable("reader has failed")),
                TailState::WaitingForFile => {
                    if !self.try_open().await {
                        self.check_open_timeout()?;
                        tokio::time::sleep(self.config.poll_interval).await;
                    }
                }
                TailState::Streaming | TailState::Rotating => {
                    if let Some(line) = self.read_step().await {
                        return Ok(line);
                    }
                }
            }
        }
    }

    /// 로그 로테이션을 수행합니다.
    ///
    /// 결과와 관계없이 라인 카운터를 초기화하고 `Streaming`으로 돌아갑니다.
    /// 성공하면 이전 파일을 끝까지 읽은 뒤 새 파일로 전환합니다.
    pub fn rotate(&mut self, coordinator: &RotationCoordinator) -> Result<(), LogPipelineError> {
        let previous = self.state();
        self.set_state(TailState::Rotating);

        let result = coordinator.rotate(&self.config.path);
        if result.is_ok() {
            self.pending_switch = true;
        }

        self.lines_since_rotation = 0;
        let next = match previous {
            TailState::WaitingForFile | TailState::Failed => previous,
            TailState::Streaming | TailState::Rotating => TailState::Streaming,
        };
        self.set_state(next);
        result
    }

    /// 파일 열기를 시도합니다. 성공하면 처음부터 읽습니다.
    async fn try_open(&mut self) -> bool {
        let file = match File::open(&self.config.path).await {
            Ok(file) => file,
            Err(e) => {
                if self.waiting_since.is_none() {
                    tracing::info!(
                        path = %self.config.path.display(),
                        error = %e,
                        "waiting for access log file"
                    );
                    self.waiting_since = Some(Instant::now());
                }
                return false;
            }
        };

        let identity = match file.metadata().await {
            Ok(metadata) => FileIdentity::of(&metadata),
            Err(_) => None,
        };

        tracing::info!(path = %self.config.path.display(), "opened access log file");

        self.reader = Some(BufReader::new(file));
        self.identity = identity;
        self.offset = 0;
        self.partial.clear();
        self.discarding = false;
        self.pending_switch = false;
        self.waiting_since = None;
        self.set_state(TailState::Streaming);
        true
    }

    fn check_open_timeout(&mut self) -> Result<(), LogPipelineError> {
        let (Some(timeout), Some(since)) = (self.config.open_timeout, self.waiting_since) else {
            return Ok(());
        };

        if since.elapsed() >= timeout {
            self.set_state(TailState::Failed);
            tracing::error!(
                path = %self.config.path.display(),
                timeout_secs = timeout.as_secs(),
                "access log file could not be opened in time"
            );
            return Err(self.unavailable(&format!(
                "could not open file within {}s",
                timeout.as_secs()
            )));
        }
        Ok(())
    }

    /// 한 번 읽고, 완전한 라인이 있으면 반환합니다.
    async fn read_step(&mut self) -> Option<String> {
        let Some(reader) = self.reader.as_mut() else {
            self.set_state(TailState::WaitingForFile);
            return None;
        };

        // 한 번에 최대 길이 + "\r\n"까지만 버퍼에 쌓음
        let limit = (self.config.max_line_length + 2)
            .saturating_sub(self.partial.len())
            .max(1) as u64;
        let read = match reader
            .take(limit)
            .read_until(b'\n', &mut self.partial)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(
                    path = %self.config.path.display(),
                    error = %e,
                    "read failed, reopening access log"
                );
                self.reset_handle();
                return None;
            }
        };

        if read == 0 {
            self.on_eof().await;
            return None;
        }

        self.offset += read as u64;

        if self.partial.last() != Some(&b'\n') {
            // 라인 끝을 아직 받지 못함
            if self.partial.len() > self.config.max_line_length {
                tracing::warn!(
                    path = %self.config.path.display(),
                    length = self.partial.len(),
                    max = self.config.max_line_length,
                    "line exceeds max length, discarding"
                );
                self.partial.clear();
                self.discarding = true;
            }
            return None;
        }

        let mut bytes = std::mem::take(&mut self.partial);
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        if std::mem::take(&mut self.discarding) {
            return None;
        }

        if bytes.len() > self.config.max_line_length {
            tracing::warn!(
                path = %self.config.path.display(),
                length = bytes.len(),
                max = self.config.max_line_length,
                "line exceeds max length, discarding"
            );
            return None;
        }

        self.lines_since_rotation += 1;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// EOF에서 파일 교체와 truncation을 확인하고, 변화가 없으면 대기합니다.
    async fn on_eof(&mut self) {
        if self.pending_switch {
            // 이전 핸들을 끝까지 읽었으므로 새 파일로 전환
            if !self.partial.is_empty() {
                tracing::debug!(
                    bytes = self.partial.len(),
                    "dropping incomplete trailing line of previous file"
                );
            }
            self.reset_handle();
            if self.try_open().await {
                return;
            }
            tokio::time::sleep(self.config.poll_interval).await;
            return;
        }

        match tokio::fs::metadata(&self.config.path).await {
            Ok(metadata) => {
                let identity = FileIdentity::of(&metadata);
                if identity.is_some() && identity != self.identity {
                    tracing::info!(
                        path = %self.config.path.display(),
                        "access log file was replaced, switching after draining old handle"
                    );
                    self.pending_switch = true;
                    return;
                }

                if metadata.len() < self.offset {
                    tracing::info!(
                        path = %self.config.path.display(),
                        size = metadata.len(),
                        offset = self.offset,
                        "access log file was truncated, reading from start"
                    );
                    if self.seek_to_start().await {
                        return;
                    }
                }
            }
            Err(_) => {
                // 경로가 사라짐: 이전 핸들을 계속 폴링
            }
        }

        tokio::time::sleep(self.config.poll_interval).await;
    }

    async fn seek_to_start(&mut self) -> bool {
        let Some(reader) = self.reader.as_mut() else {
            return false;
        };
        match reader.seek(SeekFrom::Start(0)).await {
            Ok(_) => {
                self.offset = 0;
                self.partial.clear();
                self.discarding = false;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "seek failed, reopening access log");
                self.reset_handle();
                false
            }
        }
    }

    fn reset_handle(&mut self) {
        self.reader = None;
        self.identity = None;
        self.offset = 0;
        self.partial.clear();
        self.discarding = false;
        self.pending_switch = false;
        self.set_state(TailState::WaitingForFile);
    }

    fn set_state(&self, next: TailState) {
        self.state.send_if_modified(|current| {
            let changed = *current != next;
            *current = next;
            changed
        });
    }

    fn unavailable(&self, reason: &str) -> LogPipelineError {
        LogPipelineError::SourceUnavailable {
            path: self.config.path.display().to_string(),
            reason: reason.to_owned(),
        }
    }
}
