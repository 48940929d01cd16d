use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use interact::exec::Peer;
use interact::types::{Side, StreamKind};

/// Exit code reported by a fake that was terminated while running
/// (`128 + SIGKILL`, like a real killed process).
pub const KILLED_EXIT_CODE: i32 = 137;

type Responder = Box<dyn FnMut(&str) -> Vec<String> + Send>;

/// What the test can observe about a [`FakePeer`] after handing it to the
/// relay loop.
#[derive(Debug, Default)]
pub struct ProbeState {
    /// Every line written to the fake while it was running, in order.
    pub received: Vec<String>,
    /// Writes that arrived after the fake had exited.
    pub dropped_writes: usize,
    pub terminate_calls: usize,
    /// True if `terminate()` found the fake still running.
    pub killed: bool,
    pub final_exit_code: Option<i32>,
}

/// Shared handle to a fake's [`ProbeState`].
#[derive(Debug, Clone, Default)]
pub struct FakeProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl FakeProbe {
    pub fn received(&self) -> Vec<String> {
        self.inner.lock().unwrap().received.clone()
    }

    pub fn dropped_writes(&self) -> usize {
        self.inner.lock().unwrap().dropped_writes
    }

    pub fn terminate_calls(&self) -> usize {
        self.inner.lock().unwrap().terminate_calls
    }

    pub fn killed(&self) -> bool {
        self.inner.lock().unwrap().killed
    }

    pub fn final_exit_code(&self) -> Option<i32> {
        self.inner.lock().unwrap().final_exit_code
    }
}

/// A scripted participant that never spawns a process.
///
/// By default it runs until terminated and produces no output. Builder
/// methods queue output, make it exit, or make it answer input.
pub struct FakePeer {
    side: Side,
    stdout: VecDeque<String>,
    stderr: VecDeque<String>,
    exit: Option<(usize, i32)>,
    exit_after_input: Option<(usize, i32)>,
    polls: usize,
    exited: Option<i32>,
    responder: Option<Responder>,
    never_reads: bool,
    probe: FakeProbe,
}

impl FakePeer {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            stdout: VecDeque::new(),
            stderr: VecDeque::new(),
            exit: None,
            exit_after_input: None,
            polls: 0,
            exited: None,
            responder: None,
            never_reads: false,
            probe: FakeProbe::default(),
        }
    }

    pub fn with_stdout<I, L>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.stdout.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn with_stderr<I, L>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.stderr.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Report as exited with `code` from the first liveness poll on.
    pub fn exits_with(self, code: i32) -> Self {
        self.exits_after_polls(0, code)
    }

    /// Stay alive for `polls` liveness polls, then exit with `code`.
    pub fn exits_after_polls(mut self, polls: usize, code: i32) -> Self {
        self.exit = Some((polls, code));
        self
    }

    /// Exit with `code` once `lines` lines of input have been received.
    pub fn exits_after_input(mut self, lines: usize, code: i32) -> Self {
        self.exit_after_input = Some((lines, code));
        self
    }

    /// Answer every received line with the lines `f` returns (on stdout).
    pub fn responding<F>(mut self, f: F) -> Self
    where
        F: FnMut(&str) -> Vec<String> + Send + 'static,
    {
        self.responder = Some(Box::new(f));
        self
    }

    /// Every write while running hangs forever, like a full pipe to a
    /// process that never reads its stdin.
    pub fn never_reads(mut self) -> Self {
        self.never_reads = true;
        self
    }

    pub fn probe(&self) -> FakeProbe {
        self.probe.clone()
    }

    fn exit_now(&mut self, code: i32) {
        if self.exited.is_none() {
            self.exited = Some(code);
            self.probe.inner.lock().unwrap().final_exit_code = Some(code);
        }
    }
}

impl Peer for FakePeer {
    fn side(&self) -> Side {
        self.side
    }

    fn is_running(&mut self) -> bool {
        if self.exited.is_some() {
            return false;
        }
        if let Some((after, code)) = self.exit {
            if self.polls >= after {
                self.exit_now(code);
                return false;
            }
        }
        self.polls += 1;
        true
    }

    fn exit_code(&self) -> Option<i32> {
        self.exited
    }

    fn get_line(&mut self, stream: StreamKind) -> Option<String> {
        match stream {
            StreamKind::Stdout => self.stdout.pop_front(),
            StreamKind::Stderr => self.stderr.pop_front(),
        }
    }

    /// A fake's "pipes" close when it exits; queued lines stay poppable.
    fn stream_open(&self, _stream: StreamKind) -> bool {
        self.exited.is_none()
    }

    fn write<'a>(&'a mut self, text: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        if !self.is_running() {
            self.probe.inner.lock().unwrap().dropped_writes += 1;
            return Box::pin(std::future::ready(()));
        }
        if self.never_reads {
            return Box::pin(std::future::pending());
        }

        let received = {
            let mut probe = self.probe.inner.lock().unwrap();
            probe.received.push(text.to_string());
            probe.received.len()
        };

        if let Some(responder) = self.responder.as_mut() {
            let replies = responder(text);
            self.stdout.extend(replies);
        }

        if let Some((lines, code)) = self.exit_after_input {
            if received >= lines {
                self.exit_now(code);
            }
        }

        Box::pin(std::future::ready(()))
    }

    fn terminate(&mut self) {
        let running = self.exited.is_none();
        {
            let mut probe = self.probe.inner.lock().unwrap();
            probe.terminate_calls += 1;
            if running {
                probe.killed = true;
            }
        }
        if running {
            self.exit_now(KILLED_EXIT_CODE);
        }
    }
}
