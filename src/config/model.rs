// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::config::duration::deserialize_opt_duration;
use crate::task::{DependencyEdge, NetworkEndpoint, TaskDefinition, Tasks, WaitParams};
use crate::types::{ExecutionMode, StreamPolicy};
use crate::wait::WAITER_NONE;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [supervisor]
/// self_args = ["serve"]
/// mode = "async"
///
/// [[task]]
/// name = "self"
/// exec = "procdag"
/// stdout = "console"
/// network = { scheme = "http", address = "127.0.0.1", port = 8080 }
///
/// [[task]]
/// name = "worker"
/// exec = "worker-bin"
/// depends_on = [{ target = "self", waiter = "wait-for-http-alive" }]
/// ```
///
/// Tasks are an array so that registration order is the file order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub supervisor: SupervisorSection,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// A validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, which runs validation.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub supervisor: SupervisorSection,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(supervisor: SupervisorSection, task: Vec<TaskConfig>) -> Self {
        Self { supervisor, task }
    }

    /// Build the in-memory task registry handed to the supervisor.
    pub fn to_tasks(&self) -> Tasks {
        Tasks::new(self.task.iter().map(TaskConfig::to_definition).collect())
    }
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupervisorSection {
    /// Arguments passed to the host binary when the `self` task re-executes it.
    #[serde(default)]
    pub self_args: Vec<String>,

    /// `"sync"` (default) or `"async"`.
    #[serde(default)]
    pub mode: ExecutionMode,
}

fn discard() -> StreamPolicy {
    StreamPolicy::Discard
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub name: String,

    /// Executable path or name looked up on `PATH`.
    pub exec: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub workdir: Option<String>,

    /// `KEY=VALUE` entries; the child inherits nothing else.
    #[serde(default)]
    pub environ: Vec<String>,

    /// `"console"` inherits the stream, anything else discards it.
    #[serde(default = "discard")]
    pub stdin: StreamPolicy,

    #[serde(default = "discard")]
    pub stdout: StreamPolicy,

    #[serde(default = "discard")]
    pub stderr: StreamPolicy,

    #[serde(default)]
    pub network: Option<NetworkConfig>,

    #[serde(default)]
    pub depends_on: Vec<DependsOnConfig>,
}

impl TaskConfig {
    pub fn to_definition(&self) -> TaskDefinition {
        TaskDefinition {
            name: self.name.clone(),
            exec: self.exec.clone(),
            args: self.args.clone(),
            workdir: self
                .workdir
                .as_deref()
                .filter(|w| !w.is_empty())
                .map(PathBuf::from),
            environ: self.environ.clone(),
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
            network: self.network.as_ref().map(NetworkConfig::to_endpoint),
            depends_on: self.depends_on.iter().map(DependsOnConfig::to_edge).collect(),
        }
    }
}

/// `network = { ... }` table of a task.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    pub address: String,

    pub port: u16,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_protocol() -> String {
    "HTTP/2".to_string()
}

impl NetworkConfig {
    pub fn to_endpoint(&self) -> NetworkEndpoint {
        NetworkEndpoint {
            scheme: self.scheme.clone(),
            protocol: self.protocol.clone(),
            address: self.address.clone(),
            port: self.port,
        }
    }
}

/// One entry of `depends_on = [...]`.
#[derive(Debug, Clone, Deserialize)]
pub struct DependsOnConfig {
    pub target: String,

    /// Waiter name. Unknown names are accepted here and rejected when the
    /// edge is resolved.
    #[serde(default = "default_waiter")]
    pub waiter: String,

    #[serde(default)]
    pub params: Option<ParamsConfig>,
}

fn default_waiter() -> String {
    WAITER_NONE.to_string()
}

impl DependsOnConfig {
    pub fn to_edge(&self) -> DependencyEdge {
        DependencyEdge {
            target: self.target.clone(),
            waiter: self.waiter.clone(),
            params: self.params.as_ref().map(ParamsConfig::to_params),
        }
    }
}

/// `params = { iterations = 12, duration = "1s" }`; missing fields fall back
/// to the waiter defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamsConfig {
    #[serde(default)]
    pub iterations: Option<u32>,

    #[serde(default, deserialize_with = "deserialize_opt_duration")]
    pub duration: Option<Duration>,
}

impl ParamsConfig {
    pub fn to_params(&self) -> WaitParams {
        let defaults = WaitParams::default();
        WaitParams {
            iterations: self.iterations.unwrap_or(defaults.iterations),
            duration: self.duration.unwrap_or(defaults.duration),
        }
    }
}
