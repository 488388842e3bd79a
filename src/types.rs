use std::process::Stdio;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// What a child process gets bound to for one of its standard streams.
///
/// - `Console`: inherit the supervisor's own stream.
/// - `Discard`: bind to the null device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPolicy {
    Console,
    Discard,
}

impl Default for StreamPolicy {
    fn default() -> Self {
        StreamPolicy::Console
    }
}

impl StreamPolicy {
    /// Parse the config spelling: `"console"` inherits, anything else
    /// (including the empty string) discards.
    pub fn from_config_str(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("console") {
            StreamPolicy::Console
        } else {
            StreamPolicy::Discard
        }
    }

    pub fn to_stdio(self) -> Stdio {
        match self {
            StreamPolicy::Console => Stdio::inherit(),
            StreamPolicy::Discard => Stdio::null(),
        }
    }
}

impl<'de> Deserialize<'de> for StreamPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(StreamPolicy::from_config_str(&s))
    }
}

/// How the root tasks of a registry are driven.
///
/// - `Sync`: each root is resolved and started one after another.
/// - `Async`: each root is resolved in its own Tokio task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sync,
    Async,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Sync
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sync" => Ok(ExecutionMode::Sync),
            "async" => Ok(ExecutionMode::Async),
            other => Err(format!(
                "invalid execution mode: {other} (expected \"sync\" or \"async\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_console_inherits() {
        assert_eq!(StreamPolicy::from_config_str("console"), StreamPolicy::Console);
        assert_eq!(StreamPolicy::from_config_str(" Console "), StreamPolicy::Console);
        assert_eq!(StreamPolicy::from_config_str(""), StreamPolicy::Discard);
        assert_eq!(StreamPolicy::from_config_str("file"), StreamPolicy::Discard);
    }

    #[test]
    fn execution_mode_parses_case_insensitively() {
        assert_eq!("ASYNC".parse::<ExecutionMode>(), Ok(ExecutionMode::Async));
        assert!("parallel".parse::<ExecutionMode>().is_err());
    }
}
