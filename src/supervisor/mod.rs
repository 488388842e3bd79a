// src/supervisor/mod.rs

//! Process supervision core.
//!
//! - [`process_task`] binds a spawned [`Process`](crate::exec::Process) to the
//!   task definition that produced it.
//! - [`registry`] is the [`ProcessSupervisor`]: the lock-protected list of
//!   everything started in this run, with idempotent start and bulk wait.
//! - [`resolver`] walks dependency edges depth-first, applying readiness
//!   waiters, before starting a task.
//! - [`execute`] drives every root of a [`Tasks`](crate::task::Tasks)
//!   registry, either sequentially or one Tokio task per root.

pub mod execute;
pub mod process_task;
pub mod registry;
pub mod resolver;

pub use execute::{ExecutionHandle, RootFailure};
pub use process_task::ProcessTask;
pub use registry::{ProcessSupervisor, SELF_RUNNING_ENV, is_self_running};
pub use resolver::{wait_run, wait_run_task};
