// src/exec/process.rs

//! One supervised OS process.
//!
//! Lifecycle: idle -> started (`start`) -> exited (`wait`). `run` is
//! `start` + `wait`. The child is spawned at most once per `Process`; every
//! later `start` is a no-op and every later `wait` returns the recorded
//! terminal state.
//!
//! State changes are published on a `watch` channel; [`Process::subscribe`]
//! hands out readers that never contend with a caller blocked in `wait`.

use std::io;
use std::path::PathBuf;

use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::errors::{Result, SupervisorError};
use crate::exec::environ;
use crate::task::TaskDefinition;
use crate::types::StreamPolicy;

/// Observable state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessState {
    pub pid: Option<u32>,
    pub started: bool,
    pub exited: bool,
    /// `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessState {
    pub fn success(&self) -> bool {
        self.exited && self.exit_code == Some(0)
    }
}

#[derive(Debug)]
pub struct Process {
    /// Label used in logs and errors (the task name).
    label: String,
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
    environ: Vec<String>,
    stdin: StreamPolicy,
    stdout: StreamPolicy,
    stderr: StreamPolicy,
    child: Option<Child>,
    state: watch::Sender<ProcessState>,
}

impl Process {
    /// A process bound to the supervisor's console streams with an empty
    /// environment.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        Self {
            label: program.clone(),
            program,
            args,
            workdir: None,
            environ: Vec::new(),
            stdin: StreamPolicy::Console,
            stdout: StreamPolicy::Console,
            stderr: StreamPolicy::Console,
            child: None,
            state: watch::Sender::new(ProcessState::default()),
        }
    }

    /// Build an idle process from a task definition.
    pub fn from_task(task: &TaskDefinition) -> Self {
        Self {
            label: task.name.clone(),
            program: task.exec.clone(),
            args: task.args.clone(),
            workdir: task.workdir.clone(),
            environ: task.environ.clone(),
            stdin: task.stdin,
            stdout: task.stdout,
            stderr: task.stderr,
            child: None,
            state: watch::Sender::new(ProcessState::default()),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn environ(&self) -> &[String] {
        &self.environ
    }

    pub fn has_env(&self, key: &str) -> bool {
        environ::has(&self.environ, key)
    }

    /// Value for `key`, or `None` when the key is absent.
    pub fn get_env(&self, key: &str) -> Option<&str> {
        environ::get(&self.environ, key)
    }

    /// Replace or append `key`. Returns `true` if an entry was replaced.
    ///
    /// Changes after `start` do not reach the running child.
    pub fn set_env(&mut self, key: &str, value: &str) -> bool {
        environ::set(&mut self.environ, key, value)
    }

    pub fn del_env(&mut self, key: &str) -> bool {
        environ::del(&mut self.environ, key)
    }

    pub fn stdin(&self) -> StreamPolicy {
        self.stdin
    }

    pub fn stdout(&self) -> StreamPolicy {
        self.stdout
    }

    pub fn stderr(&self) -> StreamPolicy {
        self.stderr
    }

    pub fn set_stdin(&mut self, policy: StreamPolicy) {
        self.stdin = policy;
    }

    pub fn set_stdout(&mut self, policy: StreamPolicy) {
        self.stdout = policy;
    }

    pub fn set_stderr(&mut self, policy: StreamPolicy) {
        self.stderr = policy;
    }

    pub fn state(&self) -> ProcessState {
        *self.state.borrow()
    }

    /// A reader of this process's state that does not need `&self`.
    pub fn subscribe(&self) -> watch::Receiver<ProcessState> {
        self.state.subscribe()
    }

    fn record_exit(&mut self, code: Option<i32>) {
        self.child = None;
        self.state.send_modify(|state| {
            state.exited = true;
            state.exit_code = code;
        });
    }

    /// Spawn the child if it has not been spawned yet. Does not block.
    pub fn start(&mut self) -> Result<()> {
        if self.state().started {
            debug!(task = %self.label, pid = ?self.state().pid, "process already started");
            return Ok(());
        }

        // Look up on the supervisor's PATH; the child gets only `environ`.
        let resolved = which::which(&self.program).map_err(|e| SupervisorError::Spawn {
            task: self.label.clone(),
            source: io::Error::new(
                io::ErrorKind::NotFound,
                format!("executable '{}' not found: {e}", self.program),
            ),
        })?;

        let mut cmd = Command::new(&resolved);
        cmd.args(&self.args)
            .env_clear()
            .envs(environ::pairs(&self.environ))
            .stdin(self.stdin.to_stdio())
            .stdout(self.stdout.to_stdio())
            .stderr(self.stderr.to_stdio())
            .kill_on_drop(true);

        if let Some(dir) = self.workdir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            task: self.label.clone(),
            source,
        })?;

        let pid = child.id();
        self.child = Some(child);
        self.state.send_replace(ProcessState {
            pid,
            started: true,
            exited: false,
            exit_code: None,
        });

        info!(
            task = %self.label,
            pid = ?pid,
            exec = %resolved.display(),
            "process started"
        );
        Ok(())
    }

    /// Start (if needed) and block until the child exits.
    pub async fn run(&mut self) -> Result<ProcessState> {
        self.start()?;
        self.wait().await
    }

    /// Start (if needed) and block until the child exits, returning its
    /// terminal state. A non-zero exit is not an error at this level.
    pub async fn wait(&mut self) -> Result<ProcessState> {
        if self.state().exited {
            return Ok(self.state());
        }
        self.start()?;

        let Some(child) = self.child.as_mut() else {
            return Ok(self.state());
        };

        let status = child.wait().await.map_err(|source| SupervisorError::Runtime {
            task: self.label.clone(),
            source,
        })?;

        self.record_exit(status.code());

        let state = self.state();
        info!(
            task = %self.label,
            pid = ?state.pid,
            exit_code = ?state.exit_code,
            success = status.success(),
            "process exited"
        );
        Ok(state)
    }

    /// False if never started or already exited.
    pub fn is_running(&mut self) -> bool {
        let state = self.state();
        if !state.started || state.exited {
            return false;
        }
        let Some(child) = self.child.as_mut() else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.record_exit(status.code());
                false
            }
            Err(e) => {
                warn!(task = %self.label, error = %e, "failed to poll process state");
                false
            }
        }
    }

    /// Kill the child if it is running and reap it.
    ///
    /// A child that already exited on its own keeps its exit code.
    pub async fn kill(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        let Some(child) = self.child.as_mut() else {
            return Ok(());
        };

        child.kill().await.map_err(|source| SupervisorError::Runtime {
            task: self.label.clone(),
            source,
        })?;

        self.record_exit(None);
        info!(task = %self.label, pid = ?self.state().pid, "process killed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Process {
        let mut p = Process::new("sh", vec!["-c".into(), script.into()]);
        p.set_stdout(StreamPolicy::Discard);
        p.set_stderr(StreamPolicy::Discard);
        p.set_stdin(StreamPolicy::Discard);
        p.set_env("PATH", &std::env::var("PATH").unwrap_or_default());
        p
    }

    #[tokio::test]
    async fn wait_reports_exit_code() {
        let mut p = sh("exit 3");
        let state = p.wait().await.unwrap();
        assert!(state.exited);
        assert_eq!(state.exit_code, Some(3));
        assert!(!state.success());
        assert!(state.pid.is_some());
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let mut p = sh("exit 0");
        p.start().unwrap();
        let pid = p.state().pid;
        p.start().unwrap();
        assert_eq!(p.state().pid, pid);
        assert!(p.run().await.unwrap().success());
        assert_eq!(p.state().pid, pid);
    }

    #[tokio::test]
    async fn missing_executable_fails_fast() {
        let mut p = Process::new("definitely-not-a-real-binary-procdag", vec![]);
        let err = p.start().unwrap_err();
        assert!(matches!(err, SupervisorError::Spawn { .. }));
        assert!(!p.state().started);
    }

    #[tokio::test]
    async fn environment_is_not_inherited() {
        let mut p = sh("test -z \"$HOME\" && test \"$ONLY\" = yes");
        p.set_env("ONLY", "yes");
        assert!(p.run().await.unwrap().success());
    }

    #[tokio::test]
    async fn is_running_tracks_lifecycle() {
        let mut p = sh("sleep 5");
        assert!(!p.is_running());
        p.start().unwrap();
        assert!(p.is_running());
        p.kill().await.unwrap();
        assert!(!p.is_running());
        assert_eq!(p.state().exit_code, None);
    }

    #[tokio::test]
    async fn kill_after_natural_exit_keeps_exit_code() {
        let mut p = sh("exit 7");
        p.start().unwrap();
        let mut state = p.subscribe();
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;

        p.kill().await.unwrap();

        assert!(state.has_changed().unwrap());
        let state = *state.borrow_and_update();
        assert!(state.exited);
        assert_eq!(state.exit_code, Some(7));
    }

    #[tokio::test]
    async fn subscribers_see_start_and_exit() {
        let mut p = sh("exit 0");
        let state = p.subscribe();
        assert!(!state.borrow().started);

        p.start().unwrap();
        assert!(state.borrow().started);
        assert_eq!(state.borrow().pid, p.state().pid);

        p.wait().await.unwrap();
        assert!(state.borrow().exited);
        assert_eq!(state.borrow().exit_code, Some(0));
    }
}
