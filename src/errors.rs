// src/errors.rs

//! Crate-wide error type.
//!
//! Every failure the supervisor can hit is returned to the caller as a
//! [`SupervisorError`]. Nothing is logged-and-swallowed inside the resolver;
//! variants carry the task name they concern so callers don't have to scrape
//! log lines to find out what went wrong.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Bad task configuration: unknown waiter, missing dependency target,
    /// unparsable file contents.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A dependency edge leads back to a task that is already being resolved.
    #[error("circular dependency detected: {0}")]
    Cycle(String),

    /// Executable not resolvable, or the OS refused to spawn it.
    #[error("failed to spawn task '{task}': {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    /// Failure while waiting on a running process.
    #[error("runtime error in task '{task}': {source}")]
    Runtime {
        task: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran to completion but did not exit successfully.
    #[error("task '{task}' (pid {pid:?}) exited with code {code:?}")]
    NonZeroExit {
        task: String,
        pid: Option<u32>,
        code: Option<i32>,
    },

    /// The readiness probe could not even be set up.
    #[error("readiness probe error: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SupervisorError {
    /// True for the error kinds that abort resolution because of bad input
    /// rather than a misbehaving process.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SupervisorError::ConfigError(_) | SupervisorError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SupervisorError>;
