// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Parse a task file already in memory. No semantic checks.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Read and parse a task file. No semantic checks; see [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let raw = parse_str(&fs::read_to_string(path)?)?;
    debug!(path = %path.display(), tasks = raw.task.len(), "task file parsed");
    Ok(raw)
}

/// Read, parse and validate a task file.
///
/// Rejected: no tasks, empty names or executables, unknown `depends_on`
/// targets, dependency cycles. Unknown waiter names pass here and fail when
/// the edge is resolved.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}
