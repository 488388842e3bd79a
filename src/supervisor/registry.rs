// src/supervisor/registry.rs

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::{Result, SupervisorError};
use crate::exec::environ;
use crate::supervisor::ProcessTask;
use crate::task::TaskDefinition;

/// Environment marker injected into the re-executed host binary.
pub const SELF_RUNNING_ENV: &str = "NOKOWEBAPI_SELF_RUNNING";

/// Whether the current process was launched by a supervisor as its "self"
/// task. Host programs check this to avoid bootstrapping their tasks again.
pub fn is_self_running() -> bool {
    std::env::var(SELF_RUNNING_ENV).is_ok_and(|v| v == "1")
}

/// Registry of every process task started during one run.
///
/// Invariant: at most one [`ProcessTask`] per task name (case-insensitive)
/// for the lifetime of the supervisor. The check and the insert happen in
/// one critical section, so concurrent resolvers racing on a shared
/// dependency start it exactly once.
#[derive(Debug, Default)]
pub struct ProcessSupervisor {
    started: Mutex<Vec<Arc<ProcessTask>>>,
    /// Arguments given to the host binary when it is re-executed as `self`.
    self_args: Vec<String>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_self_args(mut self, args: Vec<String>) -> Self {
        self.self_args = args;
        self
    }

    pub fn self_args(&self) -> &[String] {
        &self.self_args
    }

    /// Register and spawn `process_task`, unless a task with the same name was
    /// already started, in which case the existing entry is returned and
    /// nothing is spawned.
    ///
    /// A task whose spawn fails is not registered.
    pub async fn start_process_task(&self, mut process_task: ProcessTask) -> Result<Arc<ProcessTask>> {
        let mut started = self.started.lock().await;

        if let Some(existing) = started.iter().find(|pt| pt.task().is_named(process_task.name())) {
            debug!(task = %existing.name(), "task already started; skipping");
            return Ok(Arc::clone(existing));
        }

        process_task.start_exclusive()?;

        let process_task = Arc::new(process_task);
        started.push(Arc::clone(&process_task));
        Ok(process_task)
    }

    /// Start a task definition, routing the `self` task through
    /// [`run_self`](Self::run_self).
    pub async fn start_task(&self, task: &TaskDefinition) -> Result<Arc<ProcessTask>> {
        if task.is_self() {
            self.run_self(task).await
        } else {
            self.start_process_task(ProcessTask::new(task.clone())).await
        }
    }

    /// Re-launch the current executable as a managed child.
    ///
    /// The task's `exec` and `args` are replaced by the current executable
    /// and [`self_args`](Self::self_args), and `NOKOWEBAPI_SELF_RUNNING=1` is
    /// added to its environment.
    pub async fn run_self(&self, task: &TaskDefinition) -> Result<Arc<ProcessTask>> {
        let exe = std::env::current_exe().map_err(|source| SupervisorError::Spawn {
            task: task.name.clone(),
            source,
        })?;

        let mut def = task.clone();
        def.exec = exe.to_string_lossy().into_owned();
        def.args = self.self_args.clone();
        environ::set(&mut def.environ, SELF_RUNNING_ENV, "1");

        info!(task = %def.name, exec = %def.exec, args = ?def.args, "re-executing self");
        self.start_process_task(ProcessTask::new(def)).await
    }

    pub async fn get_process_task(&self, name: &str) -> Option<Arc<ProcessTask>> {
        self.started
            .lock()
            .await
            .iter()
            .find(|pt| pt.task().is_named(name))
            .cloned()
    }

    /// Started task names in registration order.
    pub async fn task_names(&self) -> Vec<String> {
        self.started
            .lock()
            .await
            .iter()
            .map(|pt| pt.name().to_string())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.started.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.started.lock().await.is_empty()
    }

    async fn snapshot(&self) -> Vec<Arc<ProcessTask>> {
        self.started.lock().await.clone()
    }

    /// Wait on every started task in registration order.
    ///
    /// Fail-fast: the first failure (wait error or non-zero exit) is returned
    /// immediately and the remaining tasks are not waited on.
    pub async fn wait(&self) -> Result<()> {
        for pt in self.snapshot().await {
            let state = pt.wait_success().await?;
            info!(
                task = %pt.name(),
                pid = ?state.pid,
                exit_code = ?state.exit_code,
                "task finished"
            );
        }
        Ok(())
    }

    /// Kill every started child that is still running.
    pub async fn kill_all(&self) {
        for pt in self.snapshot().await {
            if let Err(e) = pt.process().lock().await.kill().await {
                warn!(task = %pt.name(), error = %e, "failed to kill process");
            }
        }
    }
}
