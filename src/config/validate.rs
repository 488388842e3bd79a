// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SupervisorError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SupervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.supervisor, raw.task))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_fields(cfg)?;
    warn_duplicate_names(cfg);
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SupervisorError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_fields(cfg: &RawConfigFile) -> Result<()> {
    for (idx, task) in cfg.task.iter().enumerate() {
        if task.name.trim().is_empty() {
            return Err(SupervisorError::ConfigError(format!(
                "task #{} has an empty name",
                idx + 1
            )));
        }
        if task.exec.trim().is_empty() {
            return Err(SupervisorError::ConfigError(format!(
                "task '{}' has an empty `exec`",
                task.name
            )));
        }
    }
    Ok(())
}

// Duplicates are tolerated: lookups resolve to the first registered task.
fn warn_duplicate_names(cfg: &RawConfigFile) {
    let mut seen = HashSet::new();
    for task in cfg.task.iter() {
        if !seen.insert(task.name.to_lowercase()) {
            warn!(
                task = %task.name,
                "duplicate task name; lookups will resolve to the first definition"
            );
        }
    }
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    let names: HashSet<String> = cfg.task.iter().map(|t| t.name.to_lowercase()).collect();

    for task in cfg.task.iter() {
        for dep in task.depends_on.iter() {
            if !names.contains(&dep.target.to_lowercase()) {
                return Err(SupervisorError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `depends_on`",
                    task.name, dep.target
                )));
            }
            if dep.target.eq_ignore_ascii_case(&task.name) {
                return Err(SupervisorError::Cycle(format!(
                    "task '{}' depends on itself",
                    task.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dependency -> dependent.
    let lowered: Vec<(String, Vec<String>)> = cfg
        .task
        .iter()
        .map(|t| {
            (
                t.name.to_lowercase(),
                t.depends_on.iter().map(|d| d.target.to_lowercase()).collect(),
            )
        })
        .collect();

    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for (name, _) in lowered.iter() {
        graph.add_node(name.as_str());
    }

    for (name, deps) in lowered.iter() {
        for dep in deps.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(SupervisorError::Cycle(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}
