// src/supervisor/execute.rs

//! Execution modes.
//!
//! Every task in the registry is treated as a root and resolved in
//! registration order. Tasks already started as someone's dependency are
//! skipped by the supervisor's idempotent start.
//!
//! - [`ProcessSupervisor::execute`]: one root after another on the calling
//!   task; the first failure aborts the run.
//! - [`ProcessSupervisor::execute_async`]: one Tokio task per root. Each unit
//!   resolves its root and then waits for the root's process to exit. The
//!   returned [`ExecutionHandle`] joins all of them.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};

use crate::errors::{Result, SupervisorError};
use crate::supervisor::{ProcessSupervisor, wait_run, wait_run_task};
use crate::task::{TaskName, Tasks};

/// One root whose unit of work failed.
#[derive(Debug)]
pub struct RootFailure {
    pub task: TaskName,
    pub error: SupervisorError,
}

/// Join handle over all root units scheduled by
/// [`ProcessSupervisor::execute_async`].
#[derive(Debug)]
pub struct ExecutionHandle {
    units: JoinSet<Result<()>>,
    roots: HashMap<Id, TaskName>,
}

impl ExecutionHandle {
    /// Number of root units that have not been joined yet.
    pub fn pending(&self) -> usize {
        self.units.len()
    }

    /// Cancel every root unit that has not finished. Started children keep
    /// running; cancelled units are reported as failures by `wait_all`.
    pub fn abort_all(&mut self) {
        self.units.abort_all();
    }

    /// Wait for every root unit and return the most recently recorded
    /// failure, if any. Earlier failures are dropped; use
    /// [`wait_all`](Self::wait_all) to keep them.
    pub async fn wait(self) -> Result<()> {
        match self.wait_all().await.pop() {
            Some(failure) => Err(failure.error),
            None => Ok(()),
        }
    }

    /// Wait for every root unit and return all failures in completion order.
    pub async fn wait_all(mut self) -> Vec<RootFailure> {
        let mut failures = Vec::new();

        while let Some(joined) = self.units.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_err) => {
                    let id = join_err.id();
                    (
                        id,
                        Err(SupervisorError::Other(anyhow!(
                            "root unit aborted: {join_err}"
                        ))),
                    )
                }
            };
            let task = self.roots.remove(&id).unwrap_or_default();

            match result {
                Ok(()) => debug!(task = %task, "root unit finished"),
                Err(error) => {
                    warn!(task = %task, error = %error, "root unit failed");
                    failures.push(RootFailure { task, error });
                }
            }
        }

        failures
    }
}

impl ProcessSupervisor {
    /// Resolve and start every root sequentially.
    ///
    /// Returns once everything is started; use
    /// [`wait`](ProcessSupervisor::wait) to join the processes.
    pub async fn execute(self: &Arc<Self>, tasks: &Tasks) -> Result<()> {
        info!(roots = tasks.len(), "executing tasks sequentially");
        for task in tasks.iter() {
            wait_run(tasks, self, task).await?;
        }
        Ok(())
    }

    /// Schedule one unit of work per root and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn execute_async(self: &Arc<Self>, tasks: Arc<Tasks>) -> ExecutionHandle {
        info!(roots = tasks.len(), "executing tasks concurrently");
        let mut units = JoinSet::new();
        let mut roots = HashMap::new();

        for task in tasks.iter() {
            let def = task.clone();
            let tasks = Arc::clone(&tasks);
            let supervisor = Arc::clone(self);

            let name = def.name.clone();
            let unit = units.spawn(async move {
                let process_task = wait_run_task(&tasks, &supervisor, &def).await?;
                process_task.wait_success().await?;
                Ok::<(), SupervisorError>(())
            });
            roots.insert(unit.id(), name);
        }

        ExecutionHandle { units, roots }
    }
}
