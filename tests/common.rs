//! Shared helpers for the TCP integration tests.

#![allow(dead_code)]

use simlink::config::{AppConfig, NetworkConfig};
use simlink::streaming::wire;
use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

/// Generous bound for anything that should happen "promptly"
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Loopback config on ephemeral ports with short idle intervals
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::ephemeral();
    config.network.status_idle_ms = 10;
    config.network.read_timeout_ms = 100;
    config.network.join_timeout_ms = 1000;
    config.capture.width = 32;
    config.capture.height = 24;
    config
}

pub fn test_network() -> NetworkConfig {
    test_config().network
}

/// Poll `condition` every few ms until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Connect with a read timeout so a broken server fails the test instead of hanging it
pub fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(TIMEOUT)).expect("read timeout");
    stream
}

pub fn read_frame(stream: &mut TcpStream) -> Vec<u8> {
    wire::read_frame(stream, wire::DEFAULT_MAX_FRAME_LEN).expect("read frame")
}

/// Read until exactly `expected.len()` bytes arrived, returned as text
pub fn read_text(stream: &mut TcpStream, expected_len: usize) -> String {
    let mut buf = vec![0u8; expected_len];
    stream.read_exact(&mut buf).expect("read status");
    String::from_utf8(buf).expect("utf-8 status")
}

/// True if nothing arrives on `stream` within `window`
pub fn stays_silent(stream: &mut TcpStream, window: Duration) -> bool {
    stream.set_read_timeout(Some(window)).expect("read timeout");
    let mut buf = [0u8; 1];
    let silent = match stream.read(&mut buf) {
        Ok(_) => false,
        Err(e) => matches!(
            e.kind(),
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
        ),
    };
    stream.set_read_timeout(Some(TIMEOUT)).expect("read timeout");
    silent
}
