// src/logging.rs

//! Diagnostics for `interact`, written to stderr with `tracing`.
//!
//! Stdout carries the transcript, so nothing here ever writes there. The
//! filter comes from `--log-level`, else from `INTERACT_LOG`, else `warn`.
//! `INTERACT_LOG` takes full `EnvFilter` directives, so
//! `INTERACT_LOG=interact::engine=debug` narrows output to the relay loop.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "INTERACT_LOG";

const DEFAULT_DIRECTIVES: &str = "warn";

/// Install the global subscriber. Call once, before the session starts.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = filter_directives(cli_level, env.as_deref());

    let (filter, rejected) = match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_DIRECTIVES), Some(e)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    if let Some(e) = rejected {
        tracing::warn!(env = LOG_ENV, error = %e, "ignoring invalid log filter");
    }
    Ok(())
}

/// The CLI flag wins over the environment; blank values count as unset.
fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level_directive(level).to_string();
    }
    env.map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES)
        .to_string()
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_beats_environment() {
        assert_eq!(
            filter_directives(Some(LogLevel::Debug), Some("interact=trace")),
            "debug"
        );
    }

    #[test]
    fn environment_directives_pass_through() {
        assert_eq!(
            filter_directives(None, Some(" interact::engine=debug ")),
            "interact::engine=debug"
        );
    }

    #[test]
    fn blank_or_missing_environment_means_warn() {
        assert_eq!(filter_directives(None, Some("  ")), "warn");
        assert_eq!(filter_directives(None, None), "warn");
    }
}
