// src/task/registry.rs

use std::collections::HashSet;

use crate::errors::{Result, SupervisorError};
use crate::task::{TaskDefinition, WaitParams};
use crate::wait::Waiter;

/// A dependency edge with its target looked up in the registry.
#[derive(Debug, Clone)]
pub struct ResolvedDependency<'a> {
    pub target: &'a TaskDefinition,
    /// Raw waiter name, parsed when the edge is resolved.
    pub waiter: String,
    /// Defaulted to `{12, 1s}` when the waiter needs params and none were set.
    pub params: Option<WaitParams>,
}

/// Ordered collection of task definitions.
///
/// Names are expected to be unique but this is not enforced; with duplicates,
/// lookup returns the first match in registration order.
#[derive(Debug, Clone, Default)]
pub struct Tasks {
    tasks: Vec<TaskDefinition>,
}

impl Tasks {
    pub fn new(tasks: Vec<TaskDefinition>) -> Self {
        Self { tasks }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// First task whose name matches case-insensitively.
    pub fn get_task(&self, name: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.is_named(name))
    }

    /// Resolve every dependency edge of `task` against this registry.
    ///
    /// Fails with a configuration error on the first edge whose target does
    /// not exist.
    pub fn get_depends_on_task(&self, task: &TaskDefinition) -> Result<Vec<ResolvedDependency<'_>>> {
        task.depends_on
            .iter()
            .map(|edge| {
                let target = self.get_task(&edge.target).ok_or_else(|| {
                    SupervisorError::ConfigError(format!(
                        "task '{}' depends on unknown task '{}'",
                        task.name, edge.target
                    ))
                })?;

                let needs_params = edge
                    .waiter
                    .parse::<Waiter>()
                    .map(Waiter::needs_params)
                    .unwrap_or(false);
                let params = match edge.params {
                    None if needs_params => Some(WaitParams::default()),
                    other => other,
                };

                Ok(ResolvedDependency {
                    target,
                    waiter: edge.waiter.clone(),
                    params,
                })
            })
            .collect()
    }

    /// Names that appear more than once (compared case-insensitively),
    /// lowercased, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for task in &self.tasks {
            let key = task.name.to_lowercase();
            if !seen.insert(key.clone()) && !dups.contains(&key) {
                dups.push(key);
            }
        }
        dups
    }
}

impl From<Vec<TaskDefinition>> for Tasks {
    fn from(tasks: Vec<TaskDefinition>) -> Self {
        Tasks::new(tasks)
    }
}
