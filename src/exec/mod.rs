// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`process`] wraps one OS child process spawned with
//!   `tokio::process::Command`: lazy idempotent start, wait, terminal state.
//! - [`environ`] holds the `KEY=VALUE` list helpers the process uses for its
//!   environment.

pub mod environ;
pub mod process;

pub use process::{Process, ProcessState};
