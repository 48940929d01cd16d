// src/engine/core.rs

//! Pure termination decisions for the relay loop.
//!
//! Nothing here touches processes, channels, or clocks; the relay loop
//! samples the world into [`PeerStatus`] values and elapsed time, and these
//! functions decide whether the session has to stop. This keeps the rules
//! unit-testable without Tokio.

use std::time::Duration;

use crate::engine::FailureReason;
use crate::exec::Peer;
use crate::types::Side;

/// Snapshot of one participant taken at the top of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerStatus {
    pub side: Side,
    pub running: bool,
    pub exit_code: Option<i32>,
}

impl PeerStatus {
    /// Poll `peer` once and capture the result.
    pub fn poll<P: Peer + ?Sized>(peer: &mut P) -> Self {
        let running = peer.is_running();
        Self {
            side: peer.side(),
            running,
            exit_code: peer.exit_code(),
        }
    }

    /// Exited with anything other than 0.
    pub fn crashed(&self) -> Option<i32> {
        if self.running {
            return None;
        }
        match self.exit_code {
            Some(0) => None,
            Some(code) => Some(code),
            None => Some(-1),
        }
    }
}

/// Decide whether the session must stop early.
///
/// Checked in a fixed order: timeout first, then the solution, then the
/// interactor. Only the first matching reason is reported.
pub fn check_termination(
    elapsed: Duration,
    timeout: Duration,
    solution: PeerStatus,
    interactor: PeerStatus,
) -> Option<FailureReason> {
    if elapsed > timeout {
        return Some(FailureReason::Timeout(timeout));
    }

    [solution, interactor]
        .into_iter()
        .find_map(|status| status.crashed().map(|code| FailureReason::crashed(status.side, code)))
}

/// The exchange is over when nobody is running, both stdout pumps have
/// closed, and this iteration found nothing left to relay.
///
/// `stdout_closed` must be sampled *before* the queues were popped, so that
/// a line enqueued right before a pump closed cannot be missed.
pub fn exchange_finished(
    solution: PeerStatus,
    interactor: PeerStatus,
    stdout_closed: bool,
    relayed_any: bool,
) -> bool {
    !solution.running && !interactor.running && stdout_closed && !relayed_any
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(side: Side) -> PeerStatus {
        PeerStatus {
            side,
            running: true,
            exit_code: None,
        }
    }

    fn exited(side: Side, code: i32) -> PeerStatus {
        PeerStatus {
            side,
            running: false,
            exit_code: Some(code),
        }
    }

    const BUDGET: Duration = Duration::from_secs(1);

    #[test]
    fn both_running_within_budget_continues() {
        let reason = check_termination(
            Duration::from_millis(10),
            BUDGET,
            running(Side::Solution),
            running(Side::Interactor),
        );
        assert_eq!(reason, None);
    }

    #[test]
    fn timeout_wins_over_crashes() {
        let reason = check_termination(
            Duration::from_millis(1001),
            BUDGET,
            exited(Side::Solution, 1),
            exited(Side::Interactor, 2),
        );
        assert_eq!(reason, Some(FailureReason::Timeout(BUDGET)));
    }

    #[test]
    fn elapsed_equal_to_budget_is_not_a_timeout() {
        let reason = check_termination(
            BUDGET,
            BUDGET,
            running(Side::Solution),
            running(Side::Interactor),
        );
        assert_eq!(reason, None);
    }

    #[test]
    fn solution_crash_is_reported_before_interactor_crash() {
        let reason = check_termination(
            Duration::ZERO,
            BUDGET,
            exited(Side::Solution, 139),
            exited(Side::Interactor, 1),
        );
        assert_eq!(reason, Some(FailureReason::SolutionCrashed { exit_code: 139 }));
    }

    #[test]
    fn interactor_crash_while_solution_runs() {
        let reason = check_termination(
            Duration::ZERO,
            BUDGET,
            running(Side::Solution),
            exited(Side::Interactor, 3),
        );
        assert_eq!(reason, Some(FailureReason::InteractorCrashed { exit_code: 3 }));
    }

    #[test]
    fn clean_exits_are_not_failures() {
        let reason = check_termination(
            Duration::ZERO,
            BUDGET,
            exited(Side::Solution, 0),
            exited(Side::Interactor, 0),
        );
        assert_eq!(reason, None);
    }

    #[test]
    fn finished_requires_everyone_stopped_and_drained() {
        let sol = exited(Side::Solution, 0);
        let int = exited(Side::Interactor, 0);

        assert!(exchange_finished(sol, int, true, false));
        assert!(!exchange_finished(sol, int, false, false), "stdout still open");
        assert!(!exchange_finished(sol, int, true, true), "line relayed this iteration");
        assert!(!exchange_finished(running(Side::Solution), int, true, false));
    }
}
