#![allow(dead_code)]

pub use procdag_test_utils::builders;
pub use procdag_test_utils::{init_tracing, with_timeout};

use std::net::TcpListener;

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
