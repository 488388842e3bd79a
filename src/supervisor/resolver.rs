// src/supervisor/resolver.rs

//! Dependency resolution.
//!
//! For a target task the resolver, per dependency edge and in list order:
//! 1. rejects edges that lead back onto the current resolution path
//!    (a direct self-edge, or a longer loop like A -> B -> A),
//! 2. resolves and starts the dependency first (depth-first, post-order),
//! 3. runs the edge's readiness waiter against it.
//!
//! Only then is the target itself started through the supervisor. Siblings
//! are always resolved sequentially.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::{Result, SupervisorError};
use crate::supervisor::{ProcessSupervisor, ProcessTask};
use crate::task::{TaskDefinition, Tasks};
use crate::wait::Waiter;

type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Arc<ProcessTask>>> + Send + 'a>>;

/// How the final "start the target" step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartMode {
    /// Direct call on the resolving task.
    Inline,
    /// Dispatched onto its own Tokio task; the resolver awaits a oneshot.
    Spawned,
}

/// Resolve `task`'s dependencies and start it, all on the calling task.
pub async fn wait_run(
    tasks: &Tasks,
    supervisor: &Arc<ProcessSupervisor>,
    task: &TaskDefinition,
) -> Result<Arc<ProcessTask>> {
    let mut path = Vec::new();
    resolve(tasks, supervisor, task, &mut path, StartMode::Inline).await
}

/// Same as [`wait_run`], but every start is dispatched onto its own Tokio
/// task and awaited through a single-slot completion signal.
pub async fn wait_run_task(
    tasks: &Tasks,
    supervisor: &Arc<ProcessSupervisor>,
    task: &TaskDefinition,
) -> Result<Arc<ProcessTask>> {
    let mut path = Vec::new();
    resolve(tasks, supervisor, task, &mut path, StartMode::Spawned).await
}

fn resolve<'a>(
    tasks: &'a Tasks,
    supervisor: &'a Arc<ProcessSupervisor>,
    task: &'a TaskDefinition,
    path: &'a mut Vec<String>,
    mode: StartMode,
) -> ResolveFuture<'a> {
    Box::pin(async move {
        path.push(task.name.clone());

        for dep in tasks.get_depends_on_task(task)? {
            if dep.target.is_named(&task.name) {
                return Err(SupervisorError::Cycle(format!(
                    "task '{}' depends on itself",
                    task.name
                )));
            }
            if path.iter().any(|n| dep.target.is_named(n)) {
                return Err(SupervisorError::Cycle(format!(
                    "{} -> {}",
                    path.join(" -> "),
                    dep.target.name
                )));
            }

            let waiter: Waiter = dep.waiter.parse()?;

            debug!(task = %task.name, dependency = %dep.target.name, ?waiter, "resolving dependency");
            resolve(tasks, supervisor, dep.target, path, mode).await?;
            waiter.wait_for(dep.target, dep.params).await?;
        }

        path.pop();
        start(supervisor, task, mode).await
    })
}

async fn start(
    supervisor: &Arc<ProcessSupervisor>,
    task: &TaskDefinition,
    mode: StartMode,
) -> Result<Arc<ProcessTask>> {
    match mode {
        StartMode::Inline => supervisor.start_task(task).await,
        StartMode::Spawned => {
            let (done_tx, done_rx) = oneshot::channel();
            let supervisor = Arc::clone(supervisor);
            let def = task.clone();

            tokio::spawn(async move {
                let result = supervisor.start_task(&def).await;
                let _ = done_tx.send(result);
            });

            done_rx.await.map_err(|_| {
                SupervisorError::Other(anyhow!(
                    "start of task '{}' was dropped before completing",
                    task.name
                ))
            })?
        }
    }
}
