// src/supervisor/process_task.rs

use tokio::sync::{Mutex, watch};

use crate::errors::{Result, SupervisorError};
use crate::exec::{Process, ProcessState};
use crate::task::TaskDefinition;

/// A task definition paired with the process started for it.
///
/// The process sits behind its own lock so that waiting on one child never
/// blocks the supervisor registry. State queries go through a `watch`
/// receiver and never wait for that lock.
#[derive(Debug)]
pub struct ProcessTask {
    task: TaskDefinition,
    process: Mutex<Process>,
    state: watch::Receiver<ProcessState>,
}

impl ProcessTask {
    /// Build an idle process for `task`.
    pub fn new(task: TaskDefinition) -> Self {
        let process = Process::from_task(&task);
        Self::with_process(task, process)
    }

    pub fn with_process(task: TaskDefinition, process: Process) -> Self {
        let state = process.subscribe();
        Self {
            task,
            process: Mutex::new(process),
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.task.name
    }

    pub fn task(&self) -> &TaskDefinition {
        &self.task
    }

    pub fn process(&self) -> &Mutex<Process> {
        &self.process
    }

    /// Spawn without going through the async lock; only valid before the
    /// task is shared.
    pub(crate) fn start_exclusive(&mut self) -> Result<()> {
        self.process.get_mut().start()
    }

    /// Last published state.
    pub fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    /// Polls the child when nobody else holds it; otherwise the holder is
    /// blocked in `wait` and the published state is current.
    pub fn is_running(&self) -> bool {
        match self.process.try_lock() {
            Ok(mut process) => process.is_running(),
            Err(_) => {
                let state = self.state();
                state.started && !state.exited
            }
        }
    }

    /// Block until the child exits and return its terminal state.
    pub async fn wait(&self) -> Result<ProcessState> {
        self.process.lock().await.wait().await
    }

    /// Like [`wait`](Self::wait) but a non-zero exit becomes an error.
    pub async fn wait_success(&self) -> Result<ProcessState> {
        let state = self.wait().await?;
        if state.success() {
            Ok(state)
        } else {
            Err(SupervisorError::NonZeroExit {
                task: self.task.name.clone(),
                pid: state.pid,
                code: state.exit_code,
            })
        }
    }
}
