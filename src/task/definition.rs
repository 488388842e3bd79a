// src/task/definition.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::task::{SELF_TASK_NAME, TaskName};
use crate::types::StreamPolicy;

/// Polling budget for waiters that need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitParams {
    /// Maximum number of probe attempts.
    pub iterations: u32,
    /// Pause between two attempts.
    pub duration: Duration,
}

impl Default for WaitParams {
    fn default() -> Self {
        Self {
            iterations: 12,
            duration: Duration::from_secs(1),
        }
    }
}

/// Where a task can be reached over the network.
///
/// Only used by readiness probes; the supervisor never binds anything itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoint {
    /// URL scheme, e.g. `http`.
    pub scheme: String,
    /// Application protocol label, e.g. `HTTP/2` or `HTTP/1.1`.
    pub protocol: String,
    pub address: String,
    pub port: u16,
}

impl NetworkEndpoint {
    /// Root URL of the endpoint: `scheme://address:port/`.
    pub fn url(&self) -> String {
        let scheme = if self.scheme.is_empty() {
            "http"
        } else {
            self.scheme.as_str()
        };
        format!("{}://{}:{}/", scheme, self.address, self.port)
    }
}

/// A directed edge from a task to a task it must wait on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Name of the target task in the registry.
    pub target: TaskName,
    /// Waiter strategy name (`"none"`, `"wait-for-http-alive"`).
    ///
    /// Kept as the raw configured string; an unknown name only fails when the
    /// edge is actually resolved.
    pub waiter: String,
    pub params: Option<WaitParams>,
}

impl DependencyEdge {
    pub fn new(target: impl Into<String>, waiter: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            waiter: waiter.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: WaitParams) -> Self {
        self.params = Some(params);
        self
    }
}

/// Static description of one supervised process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    pub name: TaskName,
    /// Executable path or bare name looked up on `PATH`.
    pub exec: String,
    pub args: Vec<String>,
    /// Working directory; `None` means the supervisor's own.
    pub workdir: Option<PathBuf>,
    /// `KEY=VALUE` entries handed verbatim to the child.
    pub environ: Vec<String>,
    pub stdin: StreamPolicy,
    pub stdout: StreamPolicy,
    pub stderr: StreamPolicy,
    pub network: Option<NetworkEndpoint>,
    pub depends_on: Vec<DependencyEdge>,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>, exec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exec: exec.into(),
            args: Vec::new(),
            workdir: None,
            environ: Vec::new(),
            stdin: StreamPolicy::Discard,
            stdout: StreamPolicy::Discard,
            stderr: StreamPolicy::Discard,
            network: None,
            depends_on: Vec::new(),
        }
    }

    /// Case-insensitive name comparison used by every lookup.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Whether this is the re-exec task of the host binary.
    pub fn is_self(&self) -> bool {
        self.is_named(SELF_TASK_NAME)
    }
}
