// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `procdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procdag",
    version,
    about = "Start a set of processes in dependency order and supervise them.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (TOML).
    ///
    /// Default: `Procdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Procdag.toml")]
    pub config: String,

    /// Resolve root tasks concurrently instead of one after another.
    ///
    /// Overrides `[supervisor].mode` from the config file.
    #[arg(long = "async")]
    pub run_async: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks and dependency edges, but don't start
    /// any process.
    #[arg(long)]
    pub dry_run: bool,
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
