// src/exec/process.rs

//! A spawned executable with piped stdio and a pump per output stream.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info, trace, warn};

use crate::errors::{InteractError, Result};
use crate::exec::peer::Peer;
use crate::exec::pump::StreamPump;
use crate::types::{Side, StreamKind};

/// Owns one child process and the pumps draining its stdout and stderr.
///
/// The child is killed when this value is dropped.
#[derive(Debug)]
pub struct ManagedProcess {
    side: Side,
    path: PathBuf,
    child: Child,
    stdin: Option<ChildStdin>,
    last_exit_code: Option<i32>,
    stdout: StreamPump,
    stderr: StreamPump,
}

impl ManagedProcess {
    /// Launch `path` with all three standard streams piped.
    ///
    /// A bare relative name like `a.out` is resolved against the current
    /// directory, never against `PATH`. Callers are expected to have checked
    /// that the file exists; anything that still prevents the launch is
    /// reported as [`InteractError::Launch`].
    ///
    /// On unix the child leads its own process group, so a Ctrl-C typed at
    /// the terminal reaches only the harness.
    pub async fn spawn(side: Side, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let program = resolve_program(&path);

        let mut child = spawn_piped(&program)
            .await
            .map_err(|source| InteractError::Launch {
                path: path.clone(),
                source,
            })?;

        info!(
            side = %side,
            path = %path.display(),
            pid = child.id(),
            "spawned process"
        );

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(|s| StreamPump::start(s, format!("{side} {}", StreamKind::Stdout)));
        let stderr = child
            .stderr
            .take()
            .map(|s| StreamPump::start(s, format!("{side} {}", StreamKind::Stderr)));

        let (Some(stdout), Some(stderr)) = (stdout, stderr) else {
            return Err(InteractError::Launch {
                path,
                source: std::io::Error::other("child output pipes were not captured"),
            });
        };

        Ok(Self {
            side,
            path,
            child,
            stdin,
            last_exit_code: None,
            stdout,
            stderr,
        })
    }

    /// Poll the OS for the process state without waiting.
    ///
    /// Caches the exit code once the process is gone; after that this always
    /// returns false.
    pub fn is_running(&mut self) -> bool {
        if self.last_exit_code.is_some() {
            return false;
        }

        match self.child.try_wait() {
            Ok(Some(status)) => {
                let code = exit_code_of(status);
                info!(
                    side = %self.side,
                    path = %self.path.display(),
                    exit_code = code,
                    "process exited"
                );
                self.last_exit_code = Some(code);
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(side = %self.side, error = %e, "failed to poll process status");
                true
            }
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.last_exit_code
    }

    /// Non-blocking: the oldest pending line of `stream`, if any.
    pub fn get_line(&mut self, stream: StreamKind) -> Option<String> {
        self.pump_mut(stream).try_pop()
    }

    pub fn stream_open(&self, stream: StreamKind) -> bool {
        self.pump(stream).is_alive()
    }

    pub fn any_stream_pump_alive(&self) -> bool {
        self.stdout.is_alive() || self.stderr.is_alive()
    }

    /// Write `text` to the process's stdin and flush.
    ///
    /// Does nothing once the process has exited. A broken pipe is logged and
    /// closes our end of stdin; it is never returned to the caller.
    pub async fn write(&mut self, text: &str) {
        if !self.is_running() {
            trace!(side = %self.side, "process exited; dropping write");
            return;
        }
        let side = self.side;
        let Some(stdin) = self.stdin.as_mut() else {
            trace!(side = %side, "stdin already closed; dropping write");
            return;
        };

        let res = async {
            stdin.write_all(text.as_bytes()).await?;
            stdin.flush().await
        }
        .await;

        if let Err(e) = res {
            debug!(side = %side, error = %e, "write to stdin failed; closing pipe");
            self.stdin = None;
        }
    }

    /// Ask the OS to kill the process. Safe to call any number of times.
    pub fn terminate(&mut self) {
        self.stdin = None;
        if !self.is_running() {
            return;
        }

        match self.child.start_kill() {
            Ok(()) => debug!(side = %self.side, "termination requested"),
            Err(e) => debug!(side = %self.side, error = %e, "kill failed; process already gone"),
        }
    }

    fn pump(&self, stream: StreamKind) -> &StreamPump {
        match stream {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        }
    }

    fn pump_mut(&mut self, stream: StreamKind) -> &mut StreamPump {
        match stream {
            StreamKind::Stdout => &mut self.stdout,
            StreamKind::Stderr => &mut self.stderr,
        }
    }
}

impl Peer for ManagedProcess {
    fn side(&self) -> Side {
        self.side
    }

    fn is_running(&mut self) -> bool {
        ManagedProcess::is_running(self)
    }

    fn exit_code(&self) -> Option<i32> {
        self.last_exit_code
    }

    fn get_line(&mut self, stream: StreamKind) -> Option<String> {
        ManagedProcess::get_line(self, stream)
    }

    fn stream_open(&self, stream: StreamKind) -> bool {
        ManagedProcess::stream_open(self, stream)
    }

    fn any_stream_pump_alive(&self) -> bool {
        ManagedProcess::any_stream_pump_alive(self)
    }

    fn write<'a>(&'a mut self, text: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(ManagedProcess::write(self, text))
    }

    fn terminate(&mut self) {
        ManagedProcess::terminate(self)
    }
}

/// Linux `ETXTBSY`: the executable is still open for writing somewhere,
/// typically a compiler that has only just produced it.
const TEXT_FILE_BUSY: i32 = 26;
const SPAWN_ATTEMPTS: u32 = 5;

async fn spawn_piped(program: &Path) -> std::io::Result<Child> {
    let mut attempt = 1;
    loop {
        let mut cmd = Command::new(program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let res = cmd.spawn();

        match res {
            Err(e)
                if cfg!(target_os = "linux")
                    && e.raw_os_error() == Some(TEXT_FILE_BUSY)
                    && attempt < SPAWN_ATTEMPTS =>
            {
                debug!(
                    program = %program.display(),
                    attempt,
                    "executable busy; retrying spawn"
                );
                tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// `a.out` → `./a.out`; anything with a directory component is left alone.
fn resolve_program(path: &Path) -> PathBuf {
    let bare = path
        .parent()
        .is_none_or(|parent| parent.as_os_str().is_empty());
    if path.is_relative() && bare {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}

/// Exit code, with death-by-signal mapped to the shell convention `128 + n`.
fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
