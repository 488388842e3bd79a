// src/wait/waiter.rs

use std::str::FromStr;

use tracing::debug;

use crate::errors::{Result, SupervisorError};
use crate::task::{TaskDefinition, WaitParams};
use crate::wait::http_alive::HttpAliveProbe;

pub const WAITER_NONE: &str = "none";
pub const WAITER_HTTP_ALIVE: &str = "wait-for-http-alive";

/// Readiness strategy attached to a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waiter {
    /// Return immediately.
    None,
    /// Poll the dependency's network endpoint with HTTP HEAD.
    HttpAlive,
}

impl Waiter {
    /// Whether the strategy consumes [`WaitParams`].
    pub fn needs_params(self) -> bool {
        matches!(self, Waiter::HttpAlive)
    }

    /// Block until `target` is considered ready.
    ///
    /// `wait-for-http-alive` is best-effort: running out of attempts is logged
    /// by the probe and reported as success here, so a slow dependency does
    /// not abort the run.
    pub async fn wait_for(self, target: &TaskDefinition, params: Option<WaitParams>) -> Result<()> {
        match self {
            Waiter::None => {
                debug!(task = %target.name, "waiter 'none'; not waiting");
                Ok(())
            }
            Waiter::HttpAlive => {
                let endpoint = target.network.as_ref().ok_or_else(|| {
                    SupervisorError::ConfigError(format!(
                        "task '{}' uses waiter '{}' but has no network endpoint",
                        target.name, WAITER_HTTP_ALIVE
                    ))
                })?;
                let probe = HttpAliveProbe::new(endpoint)?;
                let outcome = probe
                    .poll(&target.name, params.unwrap_or_default())
                    .await;
                debug!(task = %target.name, alive = outcome.is_alive(), "readiness wait finished");
                Ok(())
            }
        }
    }
}

impl FromStr for Waiter {
    type Err = SupervisorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            WAITER_NONE => Ok(Waiter::None),
            WAITER_HTTP_ALIVE => Ok(Waiter::HttpAlive),
            other => Err(SupervisorError::ConfigError(format!(
                "unrecognized waiter '{other}' (expected \"{WAITER_NONE}\" or \"{WAITER_HTTP_ALIVE}\")"
            ))),
        }
    }
}
