// src/config/mod.rs

//! Configuration loading and validation for procdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like dependency targets and cycles
//!   (`validate.rs`).
//! - Parse duration strings (`duration.rs`).
//!
//! The supervisor itself only consumes the in-memory [`Tasks`](crate::task::Tasks)
//! produced by [`ConfigFile::to_tasks`].

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{
    ConfigFile, DependsOnConfig, NetworkConfig, ParamsConfig, RawConfigFile, SupervisorSection,
    TaskConfig,
};
