// src/engine/mod.rs

//! Session engine for interact.
//!
//! This module ties together:
//! - the two participants of a session (solution and interactor)
//! - the relay of stdout lines between them
//! - stderr forwarding to the terminal
//! - timeout, crash, and interrupt detection
//! - the shutdown sequence
//!
//! The pure termination decisions live in [`core`]; the async relay loop
//! that polls processes and writes the transcript is in [`relay`].

use std::fmt;
use std::time::Duration;

use crate::config::HarnessConfig;
use crate::types::Side;

/// Phase of a relay session. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelayState {
    /// Feeding the optional input file to the interactor.
    Priming,
    /// Relaying lines and watching for a terminal condition.
    Running,
    /// Both processes told to stop; flushing remaining stderr.
    Draining,
    /// Finished.
    Done,
}

/// Why a session ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The wall-clock budget ran out.
    Timeout(Duration),
    /// The solution exited with a non-zero code.
    SolutionCrashed { exit_code: i32 },
    /// The interactor exited with a non-zero code.
    InteractorCrashed { exit_code: i32 },
    /// The user pressed Ctrl-C.
    Interrupted,
}

impl FailureReason {
    pub fn crashed(side: Side, exit_code: i32) -> Self {
        match side {
            Side::Solution => FailureReason::SolutionCrashed { exit_code },
            Side::Interactor => FailureReason::InteractorCrashed { exit_code },
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Timeout(budget) => write!(
                f,
                "Terminating interaction due to the timeout ({} seconds).",
                budget.as_secs_f64()
            ),
            FailureReason::SolutionCrashed { exit_code } => {
                write!(f, "Solution got RE (exit code {exit_code}).")
            }
            FailureReason::InteractorCrashed { exit_code } => {
                write!(f, "Interactor got RE (exit code {exit_code}).")
            }
            FailureReason::Interrupted => f.write_str("Interaction interrupted."),
        }
    }
}

/// Final result of a session.
///
/// The harness never judges the exchange itself; a clean completion only
/// means nobody crashed and the clock did not run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Failed(FailureReason),
}

impl SessionOutcome {
    pub fn failure(&self) -> Option<FailureReason> {
        match self {
            SessionOutcome::Completed => None,
            SessionOutcome::Failed(reason) => Some(*reason),
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, SessionOutcome::Completed)
    }
}

/// Timing knobs for a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Budget measured from the start of `Running`. Priming gets the same
    /// budget on its own.
    pub timeout: Duration,
    /// Sleep after an iteration that relayed nothing. Zero means just yield.
    pub poll_interval: Duration,
    /// Upper bound on how long `Draining` waits for pipes to close.
    ///
    /// A grandchild that inherited a pipe can keep it open after the direct
    /// child is killed.
    pub drain_grace: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self::from(&HarnessConfig::default())
    }
}

impl From<&HarnessConfig> for RelayOptions {
    fn from(cfg: &HarnessConfig) -> Self {
        Self {
            timeout: cfg.timeout(),
            poll_interval: cfg.poll_interval(),
            drain_grace: Duration::from_secs(2),
        }
    }
}

pub mod core;
pub mod relay;

pub use self::core::{PeerStatus, check_termination, exchange_finished};
pub use relay::RelayLoop;
