//! 로그 로테이션 -- 계속 커지는 액세스 로그 파일의 크기를 제한합니다.
//!
//! 로그를 쓰는 프로세스(Traefik)는 이 프로그램이 제어하지 않습니다.
//! 파일을 지우고 빈 파일을 다시 만든 뒤 `SIGUSR1`을 보내 Traefik이
//! 로그 파일을 다시 열게 합니다.
//!
//! 2단계(삭제)와 4단계(시그널) 사이에 기록된 라인은 유실될 수 있습니다.
//! 수집기의 파일 교체 감지가 이후 라인을 이어서 읽습니다.

use std::path::Path;
use std::sync::Arc;

use crate::error::LogPipelineError;

/// 찾은 프로세스
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    /// 프로세스 ID
    pub pid: u32,
    /// 실행 파일 이름
    pub name: String,
}

/// 프로세스 조회와 시그널 전송 능력
///
/// 운영체제 경계를 이 trait 하나로 좁혀 테스트에서 가짜 구현으로 대체합니다.
pub trait ProcessControl: Send + Sync {
    /// 실행 파일 이름으로 프로세스를 찾습니다.
    fn locate(&self, name: &str) -> Result<Option<ProcessHandle>, LogPipelineError>;

    /// 프로세스에 로그 파일을 다시 열라는 시그널을 보냅니다.
    fn signal(&self, handle: &ProcessHandle) -> Result<(), LogPipelineError>;
}

/// `/proc` 기반 [`ProcessControl`]
///
/// 이름이 같은 프로세스가 여럿이면 PID가 가장 작은 프로세스를 선택합니다.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcfsControl;

/// 커널이 `comm`에 보관하는 최대 길이
#[cfg(unix)]
const COMM_MAX_LEN: usize = 15;

#[cfg(unix)]
impl ProcessControl for ProcfsControl {
    fn locate(&self, name: &str) -> Result<Option<ProcessHandle>, LogPipelineError> {
        let entries = std::fs::read_dir("/proc").map_err(|e| LogPipelineError::Rotation {
            step: "locate",
            reason: format!("failed to read /proc: {e}"),
        })?;

        let wanted: String = name.chars().take(COMM_MAX_LEN).collect();
        let mut found: Option<u32> = None;

        for entry in entries.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };

            // 조회 도중 종료된 프로세스는 건너뜀
            let Ok(comm) = std::fs::read_to_string(entry.path().join("comm")) else {
                continue;
            };

            if comm.trim_end() == wanted && found.is_none_or(|current| pid < current) {
                found = Some(pid);
            }
        }

        Ok(found.map(|pid| ProcessHandle {
            pid,
            name: name.to_owned(),
        }))
    }

    fn signal(&self, handle: &ProcessHandle) -> Result<(), LogPipelineError> {
        let pid = libc::pid_t::try_from(handle.pid).map_err(|_| LogPipelineError::Rotation {
            step: "signal",
            reason: format!("pid {} out of range", handle.pid),
        })?;

        // SAFETY: kill(2)는 메모리를 건드리지 않으며, 대상 PID와 시그널 번호만 전달합니다.
        let result = unsafe { libc::kill(pid, libc::SIGUSR1) };

        if result == 0 {
            Ok(())
        } else {
            Err(LogPipelineError::Rotation {
                step: "signal",
                reason: std::io::Error::last_os_error().to_string(),
            })
        }
    }
}

#[cfg(not(unix))]
impl ProcessControl for ProcfsControl {
    fn locate(&self, _name: &str) -> Result<Option<ProcessHandle>, LogPipelineError> {
        Err(LogPipelineError::Rotation {
            step: "locate",
            reason: "process lookup is only supported on unix".to_owned(),
        })
    }

    fn signal(&self, _handle: &ProcessHandle) -> Result<(), LogPipelineError> {
        Err(LogPipelineError::Rotation {
            step: "signal",
            reason: "signals are only supported on unix".to_owned(),
        })
    }
}

/// 로그 로테이션 코디네이터
pub struct RotationCoordinator {
    control: Arc<dyn ProcessControl>,
    writer_process: String,
}

impl RotationCoordinator {
    /// 새 코디네이터를 생성합니다.
    pub fn new(control: Arc<dyn ProcessControl>, writer_process: impl Into<String>) -> Self {
        Self {
            control,
            writer_process: writer_process.into(),
        }
    }

    /// 로그를 쓰는 프로세스 이름
    pub fn writer_process(&self) -> &str {
        &self.writer_process
    }

    /// 로테이션 한 주기를 실행합니다.
    ///
    /// 1. 로그를 쓰는 프로세스를 찾습니다. 없으면 아무것도 건드리지 않습니다.
    /// 2. 현재 파일을 삭제합니다. 실패하면 다시 만들지 않습니다.
    /// 3. 같은 경로에 빈 파일을 만듭니다.
    /// 4. 프로세스에 로그 파일을 다시 열라는 시그널을 보냅니다.
    pub fn rotate(&self, path: &Path) -> Result<(), LogPipelineError> {
        let handle = match self.control.locate(&self.writer_process) {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                tracing::warn!(
                    writer = %self.writer_process,
                    "could not find log writer process, not rotating"
                );
                return Err(LogPipelineError::WriterNotFound(
                    self.writer_process.clone(),
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "process lookup failed, not rotating");
                return Err(e);
            }
        };

        tracing::info!(
            writer = %handle.name,
            pid = handle.pid,
            path = %path.display(),
            "rotating access log"
        );

        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to delete access log");
            return Err(LogPipelineError::Rotation {
                step: "delete",
                reason: e.to_string(),
            });
        }

        if let Err(e) = std::fs::File::create(path) {
            tracing::error!(path = %path.display(), error = %e, "failed to recreate access log");
            return Err(LogPipelineError::Rotation {
                step: "recreate",
                reason: e.to_string(),
            });
        }

        if let Err(e) = self.control.signal(&handle) {
            tracing::error!(pid = handle.pid, error = %e, "failed to signal log writer");
            return Err(e);
        }

        tracing::info!(pid = handle.pid, "access log rotated");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! 테스트용 [`ProcessControl`]

    use std::sync::Mutex;

    use super::*;

    /// 호출을 기록하는 가짜 프로세스 제어
    #[derive(Default)]
    pub struct FakeControl {
        pub pid: Option<u32>,
        pub fail_signal: bool,
        pub signals: Mutex<Vec<u32>>,
    }

    impl FakeControl {
        pub fn with_writer(pid: u32) -> Self {
            Self {
                pid: Some(pid),
                ..Default::default()
            }
        }

        pub fn signal_count(&self) -> usize {
            self.signals.lock().unwrap().len()
        }
    }

    impl ProcessControl for FakeControl {
        fn locate(&self, name: &str) -> Result<Option<ProcessHandle>, LogPipelineError> {
            Ok(self.pid.map(|pid| ProcessHandle {
                pid,
                name: name.to_owned(),
            }))
        }

        fn signal(&self, handle: &ProcessHandle) -> Result<(), LogPipelineError> {
            if self.fail_signal {
                return Err(LogPipelineError::Rotation {
                    step: "signal",
                    reason: "operation not permitted".to_owned(),
                });
            }
            self.signals.lock().unwrap().push(handle.pid);
            Ok(())
        }
    }
}
