//! Per-channel client slot and listener plumbing shared by all three servers.
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Listener polls accept() every 10ms (non-blocking) so it sees shutdown
//! 2. Client arrives -> socket switched back to blocking, slot attached
//! 3. Channel session loop runs until the client leaves or an I/O error
//! 4. Slot detached, socket closed, back to step 1
//! ```
//!
//! A channel serves clients strictly one after another. A second client that
//! connects while a session is running waits in the listen backlog until the
//! first session ends.
//!
//! On shutdown [`ConnectionSlot::close`] shuts the active socket down from
//! another thread, which wakes a session parked in `read`/`write` with an error
//! that the session loop treats as a normal exit.

use crate::core::shutdown::ShutdownSignal;
use crate::error::{Error, Result};
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::io::{self, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Accept poll interval (responsive connection acceptance and shutdown)
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long the idle-branch liveness probe waits for the peer
const PROBE_TIMEOUT: Duration = Duration::from_millis(1);

/// Tracks the single active client of a channel
#[derive(Debug, Default)]
pub struct ConnectionSlot {
    /// Clone of the session socket, used only to force-close it
    handle: Mutex<Option<(TcpStream, SocketAddr)>>,
    connected: AtomicBool,
}

impl ConnectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted client
    ///
    /// Keeps a cloned handle so [`close`](Self::close) can unblock the session
    /// thread. If cloning fails the session still runs, it just relies on the
    /// read/write timeouts to notice shutdown.
    pub fn attach(&self, stream: &TcpStream, addr: SocketAddr) {
        let clone = match stream.try_clone() {
            Ok(s) => Some((s, addr)),
            Err(e) => {
                warn!("Failed to clone client handle for {}: {}", addr, e);
                None
            }
        };
        *self.handle.lock() = clone;
        self.connected.store(true, Ordering::Release);
    }

    /// Forget the current client (the session owns and closes its own socket)
    pub fn detach(&self) {
        self.connected.store(false, Ordering::Release);
        self.handle.lock().take();
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn mark_connected(&self) {
        self.connected.store(true, Ordering::Release);
    }

    /// Address of the current client
    pub fn peer(&self) -> Option<SocketAddr> {
        self.handle.lock().as_ref().map(|(_, addr)| *addr)
    }

    /// Clear the connected flag and shut the active socket down
    pub fn close(&self) {
        self.connected.store(false, Ordering::Release);
        if let Some((stream, addr)) = self.handle.lock().take() {
            debug!("Closing client {}", addr);
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// Bind a listener and switch it to non-blocking accept
pub fn bind_listener<A: ToSocketAddrs + std::fmt::Display>(addr: A) -> Result<TcpListener> {
    let listener = TcpListener::bind(&addr)
        .map_err(|e| Error::Other(format!("Failed to bind to {}: {}", addr, e)))?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Wait for the next client, or `None` once shutdown is triggered
///
/// The returned stream is back in blocking mode.
pub fn accept_next(
    listener: &TcpListener,
    shutdown: &ShutdownSignal,
    channel: &str,
) -> Option<(TcpStream, SocketAddr)> {
    while !shutdown.is_triggered() {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nonblocking(false) {
                    error!("[{}] Failed to set socket to blocking mode: {}", channel, e);
                    let _ = stream.shutdown(Shutdown::Both);
                    continue;
                }
                return Some((stream, addr));
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                if shutdown.is_triggered() {
                    debug!("[{}] Accept interrupted by shutdown: {}", channel, e);
                    break;
                }
                error!("[{}] Accept error: {}", channel, e);
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
    None
}

/// True for errors that mean the peer is gone rather than a local fault
pub fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
    )
}

/// Check whether the peer has closed an idle outbound-only connection
///
/// Outbound channels never read, so without this a client that leaves while
/// nothing is being written would hold the slot until the next write. Any
/// bytes the client sends are discarded.
pub fn peer_closed(stream: &mut TcpStream) -> bool {
    if stream.set_read_timeout(Some(PROBE_TIMEOUT)).is_err() {
        return true;
    }
    let mut scratch = [0u8; 64];
    match io::Read::read(stream, &mut scratch) {
        Ok(0) => true,
        Ok(_) => false,
        Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => false,
        Err(ref e) if e.kind() == ErrorKind::Interrupted => false,
        Err(_) => true,
    }
}

/// Log a session-ending error at the right level
///
/// Disconnects and anything during shutdown are expected and go to debug.
pub fn log_session_error(channel: &str, addr: SocketAddr, e: &Error, shutdown: &ShutdownSignal) {
    if shutdown.is_triggered() {
        debug!("[{}] Session {} ended by shutdown: {}", channel, addr, e);
    } else if e.is_disconnect() {
        debug!("[{}] Client {} disconnected: {}", channel, addr, e);
    } else {
        error!("[{}] Session {} failed: {}", channel, addr, e);
    }
}
