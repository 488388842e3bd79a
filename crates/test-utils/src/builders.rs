#![allow(dead_code)]

use std::time::Duration;

use procdag::task::{DependencyEdge, NetworkEndpoint, TaskDefinition, Tasks, WaitParams};
use procdag::types::StreamPolicy;

/// Builder for `Tasks` to simplify test setup.
#[derive(Default)]
pub struct TasksBuilder {
    tasks: Vec<TaskDefinition>,
}

impl TasksBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: TaskDefinition) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn build(self) -> Tasks {
        Tasks::new(self.tasks)
    }
}

/// Builder for `TaskDefinition`.
///
/// Tasks built with [`TaskBuilder::sh`] run a shell snippet with the test
/// process's `PATH`, so the snippet can call ordinary tools.
pub struct TaskBuilder {
    task: TaskDefinition,
}

impl TaskBuilder {
    pub fn new(name: &str, exec: &str) -> Self {
        Self {
            task: TaskDefinition::new(name, exec),
        }
    }

    pub fn sh(name: &str, script: &str) -> Self {
        Self::new(name, "sh")
            .arg("-c")
            .arg(script)
            .env("PATH", &std::env::var("PATH").unwrap_or_default())
    }

    /// A task that exits successfully right away.
    pub fn noop(name: &str) -> Self {
        Self::sh(name, "exit 0")
    }

    /// A task that stays alive for `secs` seconds.
    pub fn sleeper(name: &str, secs: f64) -> Self {
        Self::sh(name, &format!("sleep {secs}"))
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.task.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.task.environ.push(format!("{key}={value}"));
        self
    }

    pub fn stdout(mut self, policy: StreamPolicy) -> Self {
        self.task.stdout = policy;
        self
    }

    pub fn after(self, target: &str) -> Self {
        self.depends_on(target, "none")
    }

    pub fn depends_on(mut self, target: &str, waiter: &str) -> Self {
        self.task.depends_on.push(DependencyEdge::new(target, waiter));
        self
    }

    pub fn depends_on_with(
        mut self,
        target: &str,
        waiter: &str,
        iterations: u32,
        duration: Duration,
    ) -> Self {
        self.task.depends_on.push(
            DependencyEdge::new(target, waiter).with_params(WaitParams {
                iterations,
                duration,
            }),
        );
        self
    }

    pub fn network(mut self, address: &str, port: u16, protocol: &str) -> Self {
        self.task.network = Some(NetworkEndpoint {
            scheme: "http".to_string(),
            protocol: protocol.to_string(),
            address: address.to_string(),
            port,
        });
        self
    }

    pub fn build(self) -> TaskDefinition {
        self.task
    }
}
