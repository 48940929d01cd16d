// src/engine/relay.rs

use std::fmt;
use std::io::Write;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::core::{PeerStatus, check_termination, exchange_finished};
use crate::engine::{FailureReason, RelayOptions, RelayState, SessionOutcome};
use crate::errors::Result;
use crate::exec::Peer;
use crate::present::Presenter;
use crate::types::{Side, StreamKind};

/// Drives one session between a solution and an interactor.
///
/// Lines are relayed in both directions by polling non-blocking queues, so
/// the loop itself never waits on either participant's output. The
/// transcript (header, both stdout streams, both stderr streams, and the
/// final diagnostic) is written to `out`.
pub struct RelayLoop<S: Peer, I: Peer, W: Write> {
    solution: S,
    interactor: I,
    presenter: Presenter,
    options: RelayOptions,
    out: W,
    priming: Option<String>,
    shutdown: Option<oneshot::Receiver<()>>,
    state: RelayState,
}

impl<S: Peer, I: Peer, W: Write> fmt::Debug for RelayLoop<S, I, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayLoop")
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: Peer, I: Peer, W: Write> RelayLoop<S, I, W> {
    pub fn new(
        solution: S,
        interactor: I,
        presenter: Presenter,
        options: RelayOptions,
        out: W,
    ) -> Self {
        Self {
            solution,
            interactor,
            presenter,
            options,
            out,
            priming: None,
            shutdown: None,
            state: RelayState::Priming,
        }
    }

    /// Feed `input` to the interactor, line by line, before relaying starts.
    pub fn with_priming(mut self, input: impl Into<String>) -> Self {
        self.priming = Some(input.into());
        self
    }

    /// Stop the session with [`FailureReason::Interrupted`] once `rx` fires.
    pub fn with_shutdown(mut self, rx: oneshot::Receiver<()>) -> Self {
        self.shutdown = Some(rx);
        self
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the session to completion.
    ///
    /// Crashes, timeouts, and interrupts are part of the returned outcome;
    /// an `Err` only means the transcript could not be written.
    pub async fn run(&mut self) -> Result<SessionOutcome> {
        info!(
            timeout_secs = self.options.timeout.as_secs_f64(),
            primed = self.priming.is_some(),
            "session started"
        );

        self.emit_raw(&self.presenter.header())?;

        let mut failure = self.prime().await;

        if failure.is_none() {
            self.transition(RelayState::Running);
            failure = self.relay().await?;
        }

        self.transition(RelayState::Draining);
        self.drain().await?;

        self.transition(RelayState::Done);
        let outcome = match failure {
            Some(reason) => {
                self.emit_raw("\n")?;
                self.emit_raw(&self.presenter.error(&reason.to_string()))?;
                SessionOutcome::Failed(reason)
            }
            None => SessionOutcome::Completed,
        };

        info!(?outcome, "session finished");
        Ok(outcome)
    }

    fn transition(&mut self, next: RelayState) {
        debug_assert!(next >= self.state, "relay state moved backwards");
        debug!(from = ?self.state, to = ?next, "relay state transition");
        self.state = next;
    }

    /// Write the priming input to the interactor, within its own timeout
    /// budget. An interactor that stops reading cannot hang the harness.
    async fn prime(&mut self) -> Option<FailureReason> {
        let input = self.priming.take()?;
        let deadline = Instant::now() + self.options.timeout;

        let mut count = 0usize;
        for line in input.split_inclusive('\n') {
            if self.interrupted() {
                warn!(lines = count, "interrupt received while priming");
                return Some(FailureReason::Interrupted);
            }
            if tokio::time::timeout_at(deadline, self.interactor.write(line))
                .await
                .is_err()
            {
                warn!(lines = count, "interactor is not reading its input; priming timed out");
                return Some(FailureReason::Timeout(self.options.timeout));
            }
            count += 1;
        }
        debug!(lines = count, "primed interactor");
        None
    }

    async fn relay(&mut self) -> Result<Option<FailureReason>> {
        let started = Instant::now();
        let deadline = started + self.options.timeout;

        loop {
            self.flush_stderr()?;

            // Before polling: a peer that died of the same Ctrl-C must not
            // turn the interrupt into a crash report.
            if self.interrupted() {
                warn!("interrupt received; stopping session");
                return Ok(Some(FailureReason::Interrupted));
            }

            let solution = PeerStatus::poll(&mut self.solution);
            let interactor = PeerStatus::poll(&mut self.interactor);

            if let Some(reason) =
                check_termination(started.elapsed(), self.options.timeout, solution, interactor)
            {
                warn!(%reason, "stopping session");
                return Ok(Some(reason));
            }

            let stdout_closed = !self.solution.stream_open(StreamKind::Stdout)
                && !self.interactor.stream_open(StreamKind::Stdout);
            let mut relayed_any = false;

            if let Some(line) = self.solution.get_line(StreamKind::Stdout) {
                self.emit(&line, Side::Solution)?;
                if tokio::time::timeout_at(deadline, self.interactor.write(&line))
                    .await
                    .is_err()
                {
                    debug!("write to interactor blocked past the deadline");
                }
                relayed_any = true;
            }

            if let Some(line) = self.interactor.get_line(StreamKind::Stdout) {
                self.emit(&line, Side::Interactor)?;
                if tokio::time::timeout_at(deadline, self.solution.write(&line))
                    .await
                    .is_err()
                {
                    debug!("write to solution blocked past the deadline");
                }
                relayed_any = true;
            }

            if exchange_finished(solution, interactor, stdout_closed, relayed_any) {
                info!("both processes exited cleanly");
                return Ok(None);
            }

            if relayed_any {
                tokio::task::yield_now().await;
            } else {
                self.idle().await;
            }
        }
    }

    async fn drain(&mut self) -> Result<()> {
        self.solution.terminate();
        self.interactor.terminate();

        let grace_deadline = Instant::now() + self.options.drain_grace;
        loop {
            // Sample before flushing so the final flush sees every line.
            let busy = self.solution.is_running()
                || self.interactor.is_running()
                || self.solution.any_stream_pump_alive()
                || self.interactor.any_stream_pump_alive();

            self.flush_stderr()?;

            if !busy {
                break;
            }
            if Instant::now() >= grace_deadline {
                warn!(
                    grace_secs = self.options.drain_grace.as_secs_f64(),
                    "output pipes still open after termination; giving up on draining"
                );
                break;
            }
            self.idle().await;
        }

        debug!(
            solution_exit = ?self.solution.exit_code(),
            interactor_exit = ?self.interactor.exit_code(),
            "session drained"
        );
        Ok(())
    }

    fn interrupted(&mut self) -> bool {
        let Some(rx) = self.shutdown.as_mut() else {
            return false;
        };
        match rx.try_recv() {
            Ok(()) => true,
            Err(oneshot::error::TryRecvError::Empty) => false,
            Err(oneshot::error::TryRecvError::Closed) => {
                // Sender dropped without firing; stop checking.
                self.shutdown = None;
                false
            }
        }
    }

    async fn idle(&self) {
        if self.options.poll_interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// Print every pending stderr line, solution first.
    fn flush_stderr(&mut self) -> Result<()> {
        while let Some(line) = self.solution.get_line(StreamKind::Stderr) {
            self.emit(&line, Side::Solution)?;
        }
        while let Some(line) = self.interactor.get_line(StreamKind::Stderr) {
            self.emit(&line, Side::Interactor)?;
        }
        Ok(())
    }

    fn emit(&mut self, line: &str, side: Side) -> Result<()> {
        let formatted = self.presenter.line(line, side);
        self.emit_raw(&formatted)
    }

    fn emit_raw(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
