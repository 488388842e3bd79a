// src/wait/http_alive.rs

//! HTTP HEAD readiness poller.
//!
//! Wire behaviour:
//! - `HEAD scheme://address:port/`
//! - HTTP/2 with prior knowledge unless the endpoint says `HTTP/1.x`
//! - no keep-alive, no pooled connections; HTTP/1 requests also carry
//!   `Connection: close` (the header is illegal in HTTP/2)
//! - direct connection, proxies from the environment are ignored
//! - any response counts as alive, whatever the status code
//!
//! The pause between attempts comes from the edge's `WaitParams`; the time a
//! single attempt may take is a separate limit, [`DEFAULT_ATTEMPT_TIMEOUT`]
//! unless overridden.

use std::time::Duration;

use reqwest::header::{CONNECTION, HeaderValue};
use reqwest::{Client, StatusCode, Version};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::{Result, SupervisorError};
use crate::task::{NetworkEndpoint, WaitParams};

/// Upper bound for one HEAD request, connect included.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered on the given (1-based) attempt.
    Alive { attempt: u32, status: StatusCode },
    /// Every attempt failed at the transport level.
    Exhausted { attempts: u32 },
}

impl ProbeOutcome {
    pub fn is_alive(&self) -> bool {
        matches!(self, ProbeOutcome::Alive { .. })
    }
}

#[derive(Debug, Clone)]
pub struct HttpAliveProbe {
    client: Client,
    url: String,
    version: Version,
    attempt_timeout: Duration,
}

impl HttpAliveProbe {
    pub fn new(endpoint: &NetworkEndpoint) -> Result<Self> {
        let version = protocol_version(&endpoint.protocol);

        let builder = Client::builder()
            .no_proxy()
            .pool_max_idle_per_host(0)
            .tcp_keepalive(None::<Duration>);
        let builder = if version == Version::HTTP_2 {
            builder.http2_prior_knowledge()
        } else {
            builder.http1_only()
        };

        let client = builder
            .build()
            .map_err(|e| SupervisorError::Probe(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: endpoint.url(),
            version,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        })
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Probe up to `params.iterations` times, sleeping `params.duration`
    /// between attempts.
    ///
    /// Exhaustion is logged, never returned as an error.
    pub async fn poll(&self, task: &str, params: WaitParams) -> ProbeOutcome {
        let iterations = params.iterations.max(1);

        for attempt in 1..=iterations {
            match self.probe_once().await {
                Ok(status) => {
                    debug!(
                        task = %task,
                        url = %self.url,
                        attempt,
                        status = %status,
                        "readiness probe answered"
                    );
                    return ProbeOutcome::Alive { attempt, status };
                }
                Err(e) => {
                    debug!(
                        task = %task,
                        url = %self.url,
                        attempt,
                        error = %e,
                        "readiness probe failed"
                    );
                }
            }

            if attempt < iterations {
                sleep(params.duration).await;
            }
        }

        warn!(
            task = %task,
            url = %self.url,
            attempts = iterations,
            "readiness probe exhausted; assuming dependency is started"
        );
        ProbeOutcome::Exhausted {
            attempts: iterations,
        }
    }

    async fn probe_once(&self) -> reqwest::Result<StatusCode> {
        let mut request = self
            .client
            .head(&self.url)
            .version(self.version)
            .timeout(self.attempt_timeout);
        if self.version != Version::HTTP_2 {
            request = request.header(CONNECTION, HeaderValue::from_static("close"));
        }
        Ok(request.send().await?.status())
    }
}

fn protocol_version(protocol: &str) -> Version {
    match protocol.trim().to_uppercase().as_str() {
        "HTTP/1.1" => Version::HTTP_11,
        "HTTP/1.0" => Version::HTTP_10,
        _ => Version::HTTP_2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_defaults_to_http2() {
        assert_eq!(protocol_version(""), Version::HTTP_2);
        assert_eq!(protocol_version("HTTP/2"), Version::HTTP_2);
        assert_eq!(protocol_version("http/1.1"), Version::HTTP_11);
    }
}
