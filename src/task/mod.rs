// src/task/mod.rs

//! Declarative task model.
//!
//! - [`definition`] holds the immutable description of one task and its
//!   dependency edges.
//! - [`registry`] is the ordered collection of task definitions with
//!   name lookup and dependency-edge resolution.

pub mod definition;
pub mod registry;

pub use definition::{DependencyEdge, NetworkEndpoint, TaskDefinition, WaitParams};
pub use registry::{ResolvedDependency, Tasks};

/// Canonical task name type.
pub type TaskName = String;

/// Name of the task that re-executes the host binary.
pub const SELF_TASK_NAME: &str = "self";
