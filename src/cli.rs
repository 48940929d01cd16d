// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `interact`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "interact",
    version,
    about = "Run a solution against an interactor, relaying their stdin/stdout.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the executable solution.
    #[arg(long = "sol", value_name = "PATH")]
    pub solution: PathBuf,

    /// Path to the executable interactor.
    #[arg(long = "int", value_name = "PATH")]
    pub interactor: PathBuf,

    /// Timeout in seconds for the whole interaction.
    ///
    /// Default: 10 (or `[session].timeout` from the config file).
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Path to an input file fed to the interactor before the session starts.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Optional TOML config file with session and display settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Sleep between relay iterations that moved no data.
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Print the transcript without ANSI colours.
    #[arg(long)]
    pub no_color: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `INTERACT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_and_optional_flags() {
        let args = CliArgs::try_parse_from([
            "interact", "--sol", "a.out", "--int", "judge", "--timeout", "2.5", "--input",
            "in.txt", "--no-color",
        ])
        .unwrap();

        assert_eq!(args.solution, PathBuf::from("a.out"));
        assert_eq!(args.interactor, PathBuf::from("judge"));
        assert_eq!(args.timeout, Some(2.5));
        assert_eq!(args.input, Some(PathBuf::from("in.txt")));
        assert!(args.no_color);
        assert!(args.config.is_none());
    }

    #[test]
    fn interactor_is_required() {
        assert!(CliArgs::try_parse_from(["interact", "--sol", "a.out"]).is_err());
    }
}
