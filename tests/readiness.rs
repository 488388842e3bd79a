// tests/readiness.rs

mod common;
use crate::common::builders::{TaskBuilder, TasksBuilder};
use crate::common::{closed_port, init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use procdag::supervisor::{ProcessSupervisor, wait_run};
use procdag::task::{NetworkEndpoint, WaitParams};
use procdag::wait::{HttpAliveProbe, ProbeOutcome, WAITER_HTTP_ALIVE};

type TestResult = Result<(), Box<dyn Error>>;

fn endpoint(port: u16, protocol: &str) -> NetworkEndpoint {
    NetworkEndpoint {
        scheme: "http".to_string(),
        protocol: protocol.to_string(),
        address: "127.0.0.1".to_string(),
        port,
    }
}

/// Minimal HTTP/1.1 server answering every request with `status_line`.
/// Returns the bound port.
async fn spawn_http1_server(status_line: &'static str) -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let response =
                    format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    Ok(port)
}

/// Client connection preface every HTTP/2 prior-knowledge client sends first.
const H2_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Frame header: 24-bit length, type, flags, 31-bit stream id.
fn h2_frame(kind: u8, flags: u8, stream: u32, payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    let mut frame = Vec::with_capacity(9 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes()[1..]);
    frame.push(kind);
    frame.push(flags);
    frame.extend_from_slice(&stream.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Minimal plaintext HTTP/2 server: checks the client preface, then answers
/// the first request stream with `:status 200`. Sends `true` on `seen` once a
/// well-formed preface arrived. Returns the bound port.
async fn spawn_h2_server(seen: tokio::sync::oneshot::Sender<bool>) -> std::io::Result<u16> {
    const SETTINGS: u8 = 0x4;
    const HEADERS: u8 = 0x1;
    const ACK: u8 = 0x1;
    const END_STREAM_END_HEADERS: u8 = 0x5;
    // HPACK static table entry 8 is `:status: 200`.
    const STATUS_200: u8 = 0x88;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        let mut preface = [0u8; 24];
        if socket.read_exact(&mut preface).await.is_err() || preface != H2_PREFACE {
            let _ = seen.send(false);
            return;
        }
        let _ = seen.send(true);

        if socket.write_all(&h2_frame(SETTINGS, 0, 0, &[])).await.is_err() {
            return;
        }

        loop {
            let mut header = [0u8; 9];
            if socket.read_exact(&mut header).await.is_err() {
                return;
            }
            let len = u32::from_be_bytes([0, header[0], header[1], header[2]]) as usize;
            let (kind, flags) = (header[3], header[4]);
            let stream = u32::from_be_bytes([header[5], header[6], header[7], header[8]]) & 0x7fff_ffff;

            let mut payload = vec![0u8; len];
            if socket.read_exact(&mut payload).await.is_err() {
                return;
            }

            let reply = match kind {
                SETTINGS if flags & ACK == 0 => h2_frame(SETTINGS, ACK, 0, &[]),
                HEADERS => h2_frame(HEADERS, END_STREAM_END_HEADERS, stream, &[STATUS_200]),
                _ => continue,
            };
            if socket.write_all(&reply).await.is_err() {
                return;
            }
            if kind == HEADERS {
                break;
            }
        }

        // Drain until the client hangs up so the response is not reset.
        let _ = tokio::io::copy(&mut socket, &mut tokio::io::sink()).await;
    });

    Ok(port)
}

#[tokio::test]
async fn default_protocol_speaks_http2_prior_knowledge() -> TestResult {
    init_tracing();
    let (seen_tx, seen_rx) = tokio::sync::oneshot::channel();
    let port = spawn_h2_server(seen_tx).await?;

    let probe = HttpAliveProbe::new(&endpoint(port, "HTTP/2"))?;
    let params = WaitParams {
        iterations: 1,
        duration: Duration::from_millis(10),
    };

    let outcome = with_timeout(probe.poll("api", params)).await;

    assert!(with_timeout(seen_rx).await?, "client did not send the HTTP/2 preface");
    match outcome {
        ProbeOutcome::Alive { attempt, status } => {
            assert_eq!(attempt, 1);
            assert_eq!(status.as_u16(), 200);
        }
        other => panic!("expected Alive, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn slow_endpoint_is_alive_even_with_zero_pause() -> TestResult {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = socket
            .write_all(b"HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n")
            .await;
        let _ = socket.shutdown().await;
    });

    let probe = HttpAliveProbe::new(&endpoint(port, "HTTP/1.1"))?;
    let params = WaitParams {
        iterations: 1,
        duration: Duration::ZERO,
    };

    let outcome = with_timeout(probe.poll("slow", params)).await;

    assert!(outcome.is_alive(), "got {outcome:?}");
    Ok(())
}

#[tokio::test]
async fn attempt_timeout_bounds_a_hung_endpoint() -> TestResult {
    init_tracing();
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let probe = HttpAliveProbe::new(&endpoint(port, "HTTP/1.1"))?
        .with_attempt_timeout(Duration::from_millis(100));
    let params = WaitParams {
        iterations: 2,
        duration: Duration::from_millis(10),
    };

    let started = Instant::now();
    let outcome = with_timeout(probe.poll("hung", params)).await;

    assert_eq!(outcome, ProbeOutcome::Exhausted { attempts: 2 });
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[tokio::test]
async fn probe_gives_up_after_its_budget() -> TestResult {
    init_tracing();
    let probe = HttpAliveProbe::new(&endpoint(closed_port(), "HTTP/2"))?;
    let params = WaitParams {
        iterations: 3,
        duration: Duration::from_millis(10),
    };

    let started = Instant::now();
    let outcome = with_timeout(probe.poll("dead", params)).await;

    assert_eq!(outcome, ProbeOutcome::Exhausted { attempts: 3 });
    assert!(started.elapsed() < Duration::from_secs(2));
    Ok(())
}

#[tokio::test]
async fn any_status_code_counts_as_alive() -> TestResult {
    init_tracing();
    let port = spawn_http1_server("HTTP/1.1 503 Service Unavailable").await?;
    let probe = HttpAliveProbe::new(&endpoint(port, "HTTP/1.1"))?;

    let outcome = with_timeout(probe.poll("api", WaitParams::default())).await;

    match outcome {
        ProbeOutcome::Alive { attempt, status } => {
            assert_eq!(attempt, 1);
            assert_eq!(status.as_u16(), 503);
        }
        other => panic!("expected Alive, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn probe_targets_the_endpoint_root() -> TestResult {
    let probe = HttpAliveProbe::new(&endpoint(8080, "HTTP/2"))?;
    assert_eq!(probe.url(), "http://127.0.0.1:8080/");
    Ok(())
}

#[tokio::test]
async fn exhausted_probe_still_starts_the_dependent() -> TestResult {
    init_tracing();
    let tasks = TasksBuilder::new()
        .with_task(
            TaskBuilder::sleeper("api", 0.5)
                .network("127.0.0.1", closed_port(), "HTTP/2")
                .build(),
        )
        .with_task(
            TaskBuilder::noop("client")
                .depends_on_with("api", WAITER_HTTP_ALIVE, 3, Duration::from_millis(10))
                .build(),
        )
        .build();
    let supervisor = Arc::new(ProcessSupervisor::new());

    let started = Instant::now();
    with_timeout(wait_run(&tasks, &supervisor, tasks.get_task("client").unwrap())).await?;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(supervisor.task_names().await, vec!["api", "client"]);
    with_timeout(supervisor.wait()).await?;
    Ok(())
}

#[tokio::test]
async fn live_endpoint_releases_the_dependent() -> TestResult {
    init_tracing();
    let port = spawn_http1_server("HTTP/1.1 200 OK").await?;
    let tasks = TasksBuilder::new()
        .with_task(
            TaskBuilder::sleeper("api", 0.2)
                .network("127.0.0.1", port, "HTTP/1.1")
                .build(),
        )
        .with_task(
            TaskBuilder::noop("client")
                .depends_on("api", WAITER_HTTP_ALIVE)
                .build(),
        )
        .build();
    let supervisor = Arc::new(ProcessSupervisor::new());

    // Default params are 12 x 1s; answering on the first attempt keeps this fast.
    let started = Instant::now();
    with_timeout(supervisor.execute(&tasks)).await?;
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(supervisor.len().await, 2);
    with_timeout(supervisor.wait()).await?;
    Ok(())
}
