// src/wait/mod.rs

//! Readiness waiters.
//!
//! A waiter runs between "dependency started" and "dependent may start".
//! [`waiter`] maps the configured strategy name onto a [`Waiter`] and drives
//! it; [`http_alive`] is the HTTP HEAD poller behind `wait-for-http-alive`.

pub mod http_alive;
pub mod waiter;

pub use http_alive::{DEFAULT_ATTEMPT_TIMEOUT, HttpAliveProbe, ProbeOutcome};
pub use waiter::{Waiter, WAITER_HTTP_ALIVE, WAITER_NONE};
