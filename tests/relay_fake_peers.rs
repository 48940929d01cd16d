// tests/relay_fake_peers.rs
//
// State-machine tests for the relay loop against scripted fakes. No child
// processes are spawned, so every interleaving here is deterministic.

use std::error::Error;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use interact::config::DisplaySection;
use interact::engine::{FailureReason, RelayLoop, RelayOptions, RelayState, SessionOutcome};
use interact::present::Presenter;
use interact::types::Side;
use interact_test_utils::fake_peer::{FakePeer, KILLED_EXIT_CODE};
use interact_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const PAD: &str = "    ";

fn plain_presenter() -> Presenter {
    Presenter::new(&DisplaySection {
        color: false,
        padding: PAD.len(),
        ..DisplaySection::default()
    })
}

fn options(timeout: Duration) -> RelayOptions {
    RelayOptions {
        timeout,
        poll_interval: Duration::from_millis(1),
        drain_grace: Duration::from_secs(1),
    }
}

fn relay(
    solution: FakePeer,
    interactor: FakePeer,
    timeout: Duration,
) -> RelayLoop<FakePeer, FakePeer, Vec<u8>> {
    RelayLoop::new(
        solution,
        interactor,
        plain_presenter(),
        options(timeout),
        Vec::new(),
    )
}

/// Transcript lines after the three-line header.
fn body_lines(relay: RelayLoop<FakePeer, FakePeer, Vec<u8>>) -> Vec<String> {
    let text = String::from_utf8(relay.into_output()).expect("transcript is utf-8");
    text.lines().skip(3).map(str::to_string).collect()
}

#[tokio::test]
async fn question_and_answer_are_relayed_verbatim() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution)
        .with_stdout(["? 5\n"])
        .exits_after_input(1, 0);
    let interactor = FakePeer::new(Side::Interactor)
        .responding(|_| vec![">\n".to_string()])
        .exits_after_input(1, 0);
    let (sol_probe, int_probe) = (solution.probe(), interactor.probe());

    let mut relay = relay(solution, interactor, Duration::from_secs(5));
    let outcome = with_timeout(relay.run()).await?;

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(relay.state(), RelayState::Done);
    assert_eq!(int_probe.received(), vec!["? 5\n"]);
    assert_eq!(sol_probe.received(), vec![">\n"]);
    assert!(!sol_probe.killed() && !int_probe.killed());

    assert_eq!(body_lines(relay), vec!["? 5".to_string(), format!("{PAD}>")]);
    Ok(())
}

#[tokio::test]
async fn solution_crash_is_detected_and_both_sides_are_stopped() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution).exits_with(1);
    let interactor = FakePeer::new(Side::Interactor);
    let (sol_probe, int_probe) = (solution.probe(), interactor.probe());

    let mut relay = relay(solution, interactor, Duration::from_secs(5));
    let outcome = with_timeout(relay.run()).await?;

    assert_eq!(
        outcome,
        SessionOutcome::Failed(FailureReason::SolutionCrashed { exit_code: 1 })
    );
    assert!(sol_probe.terminate_calls() >= 1);
    assert!(int_probe.killed(), "interactor must be terminated before Done");
    assert_eq!(int_probe.final_exit_code(), Some(KILLED_EXIT_CODE));

    let lines = body_lines(relay);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Solution got RE (exit code 1).")
    );
    Ok(())
}

#[tokio::test]
async fn interactor_crash_reports_its_stderr_first() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution);
    let interactor = FakePeer::new(Side::Interactor)
        .with_stderr(["wrong answer\n"])
        .exits_after_polls(2, 3);
    let sol_probe = solution.probe();

    let mut relay = relay(solution, interactor, Duration::from_secs(5));
    let outcome = with_timeout(relay.run()).await?;

    assert_eq!(
        outcome.failure(),
        Some(FailureReason::InteractorCrashed { exit_code: 3 })
    );
    assert!(sol_probe.killed());

    let lines = body_lines(relay);
    assert_eq!(lines[0], format!("{PAD}wrong answer"));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Interactor got RE (exit code 3).")
    );
    Ok(())
}

#[tokio::test]
async fn silent_processes_hit_the_timeout() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution);
    let interactor = FakePeer::new(Side::Interactor);
    let (sol_probe, int_probe) = (solution.probe(), interactor.probe());
    let budget = Duration::from_millis(100);

    let started = Instant::now();
    let mut relay = relay(solution, interactor, budget);
    let outcome = with_timeout(relay.run()).await?;
    let elapsed = started.elapsed();

    assert_eq!(outcome, SessionOutcome::Failed(FailureReason::Timeout(budget)));
    assert!(elapsed >= budget, "stopped early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "overshoot too large: {elapsed:?}");
    assert!(sol_probe.killed() && int_probe.killed());

    let lines = body_lines(relay);
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Terminating interaction due to the timeout (0.1 seconds).")
    );
    Ok(())
}

#[tokio::test]
async fn stderr_is_flushed_before_stdout_is_relayed() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution)
        .with_stderr(["debug: n=1\n"])
        .with_stdout(["1\n"])
        .exits_after_polls(1, 0);
    let interactor = FakePeer::new(Side::Interactor).exits_after_input(1, 0);

    let mut relay = relay(solution, interactor, Duration::from_secs(5));
    let outcome = with_timeout(relay.run()).await?;

    assert!(outcome.is_clean());
    assert_eq!(body_lines(relay), vec!["debug: n=1", "1"]);
    Ok(())
}

#[tokio::test]
async fn priming_reaches_the_interactor_before_relaying() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution).exits_with(0);
    let interactor = FakePeer::new(Side::Interactor)
        .responding(|line| vec![line.to_string()])
        .exits_after_input(2, 0);
    let (sol_probe, int_probe) = (solution.probe(), interactor.probe());

    let mut relay =
        relay(solution, interactor, Duration::from_secs(5)).with_priming("3\n4 5\n");
    let outcome = with_timeout(relay.run()).await?;

    assert!(outcome.is_clean());
    assert_eq!(int_probe.received(), vec!["3\n", "4 5\n"]);
    // The solution had already exited; the echoed lines are dropped quietly.
    assert_eq!(sol_probe.dropped_writes(), 2);
    assert!(sol_probe.received().is_empty());

    assert_eq!(body_lines(relay), vec![format!("{PAD}3"), format!("{PAD}4 5")]);
    Ok(())
}

#[tokio::test]
async fn pending_output_is_relayed_after_both_exit_cleanly() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution)
        .with_stdout(["a\n", "b\n", "c\n"])
        .exits_with(0);
    let interactor = FakePeer::new(Side::Interactor).exits_with(0);

    let mut relay = relay(solution, interactor, Duration::from_secs(5));
    let outcome = with_timeout(relay.run()).await?;

    assert_eq!(outcome, SessionOutcome::Completed);
    assert_eq!(body_lines(relay), vec!["a", "b", "c"]);
    Ok(())
}

#[tokio::test]
async fn clean_completion_prints_no_diagnostic() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution).exits_with(0);
    let interactor = FakePeer::new(Side::Interactor).exits_with(0);
    let (sol_probe, int_probe) = (solution.probe(), interactor.probe());

    let mut relay = relay(solution, interactor, Duration::from_secs(5));
    let outcome = with_timeout(relay.run()).await?;

    assert_eq!(outcome, SessionOutcome::Completed);
    // Termination is unconditional at session end, and harmless on exited peers.
    assert_eq!(sol_probe.terminate_calls(), 1);
    assert_eq!(int_probe.terminate_calls(), 1);
    assert!(!sol_probe.killed() && !int_probe.killed());
    assert!(body_lines(relay).is_empty());
    Ok(())
}

#[tokio::test]
async fn interrupt_stops_a_running_session() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution);
    let interactor = FakePeer::new(Side::Interactor);
    let int_probe = interactor.probe();

    let (tx, rx) = oneshot::channel();
    tx.send(()).expect("receiver alive");

    let mut relay = relay(solution, interactor, Duration::from_secs(5)).with_shutdown(rx);
    let outcome = with_timeout(relay.run()).await?;

    assert_eq!(outcome, SessionOutcome::Failed(FailureReason::Interrupted));
    assert!(int_probe.killed());
    Ok(())
}

#[tokio::test]
async fn interrupt_is_not_mistaken_for_a_crash() -> TestResult {
    init_tracing();

    // Ctrl-C at a terminal can also kill the children with SIGINT (130).
    let solution = FakePeer::new(Side::Solution).exits_with(130);
    let interactor = FakePeer::new(Side::Interactor).exits_with(130);

    let (tx, rx) = oneshot::channel();
    tx.send(()).expect("receiver alive");

    let mut relay = relay(solution, interactor, Duration::from_secs(5)).with_shutdown(rx);
    let outcome = with_timeout(relay.run()).await?;

    assert_eq!(outcome, SessionOutcome::Failed(FailureReason::Interrupted));
    assert_eq!(
        body_lines(relay).last().map(String::as_str),
        Some("Interaction interrupted.")
    );
    Ok(())
}

#[tokio::test]
async fn stalled_priming_runs_into_the_timeout() -> TestResult {
    init_tracing();

    let solution = FakePeer::new(Side::Solution);
    let interactor = FakePeer::new(Side::Interactor).never_reads();
    let (sol_probe, int_probe) = (solution.probe(), interactor.probe());
    let budget = Duration::from_millis(100);

    let started = Instant::now();
    let mut relay = relay(solution, interactor, budget).with_priming("1\n2\n3\n");
    let outcome = with_timeout(relay.run()).await?;
    let elapsed = started.elapsed();

    assert_eq!(outcome, SessionOutcome::Failed(FailureReason::Timeout(budget)));
    assert!(elapsed < Duration::from_secs(1), "overshoot too large: {elapsed:?}");
    assert_eq!(relay.state(), RelayState::Done);
    assert!(sol_probe.killed() && int_probe.killed());
    assert!(int_probe.received().is_empty());
    Ok(())
}
