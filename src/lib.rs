// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod present;
pub mod types;

use std::fs;
use std::path::Path;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::HarnessConfig;
use crate::engine::{RelayLoop, RelayOptions, SessionOutcome};
use crate::errors::{InteractError, Result};
use crate::exec::ManagedProcess;
use crate::present::Presenter;
use crate::types::Side;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config resolution (file + CLI overrides)
/// - input file checks
/// - spawning both processes
/// - the relay loop, writing the transcript to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<SessionOutcome> {
    let config = config::resolve(&args)?;
    debug!(?config, "resolved configuration");

    let session = SessionPaths {
        solution: &args.solution,
        interactor: &args.interactor,
        input: args.input.as_deref(),
    };
    session.check()?;

    let priming = match session.input {
        Some(path) => Some(fs::read_to_string(path)?),
        None => None,
    };

    // Ctrl-C → interrupt the session; the relay loop still drains.
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(());
    });

    run_session(&session, &config, priming, Some(shutdown_rx), std::io::stdout()).await
}

/// Executable and input paths of one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionPaths<'a> {
    pub solution: &'a Path,
    pub interactor: &'a Path,
    pub input: Option<&'a Path>,
}

impl SessionPaths<'_> {
    /// Fail with [`InteractError::MissingFile`] for the first path that is
    /// not an existing file. Nothing is spawned before this passes.
    pub fn check(&self) -> Result<()> {
        let required = [Some(self.solution), Some(self.interactor), self.input];
        for path in required.into_iter().flatten() {
            if !path.is_file() {
                return Err(InteractError::MissingFile(path.to_path_buf()));
            }
        }
        Ok(())
    }
}

/// Spawn both processes and run one relay session, writing the transcript
/// to `out`.
pub async fn run_session<W: std::io::Write>(
    paths: &SessionPaths<'_>,
    config: &HarnessConfig,
    priming: Option<String>,
    shutdown: Option<oneshot::Receiver<()>>,
    out: W,
) -> Result<SessionOutcome> {
    let solution = ManagedProcess::spawn(Side::Solution, paths.solution).await?;
    let interactor = ManagedProcess::spawn(Side::Interactor, paths.interactor).await?;

    let mut relay = RelayLoop::new(
        solution,
        interactor,
        Presenter::new(config.display()),
        RelayOptions::from(config),
        out,
    );
    if let Some(input) = priming {
        relay = relay.with_priming(input);
    }
    if let Some(rx) = shutdown {
        relay = relay.with_shutdown(rx);
    }

    let outcome = relay.run().await?;
    info!(clean = outcome.is_clean(), "interaction finished");
    Ok(outcome)
}
