//! TCP command channel for controller input
//!
//! Accepts one controller at a time and republishes the latest command text
//! to the simulation tick. The channel never interprets commands; mapping a
//! token to motion happens on the tick thread so evaluation always sees a
//! consistent body orientation.
//!
//! # Session Loop
//!
//! ```text
//! accept ──▶ read(buf) ──▶ decode + trim ──▶ SharedCommand::publish
//!   ▲           │
//!   │           ├─ timeout  -> check shutdown, read again
//!   └───────────┴─ 0 bytes / error -> close, accept next client
//! ```
//!
//! Every read of up to `command_buffer_size` bytes is one command. Empty or
//! garbage text is still published (it resolves to an unknown command).
//!
//! # Safety Features
//!
//! - **Read timeout**: bounded so the session notices shutdown
//! - **Fixed buffer**: a client cannot make the channel allocate

use crate::config::NetworkConfig;
use crate::core::shutdown::{ShutdownSignal, join_bounded};
use crate::error::{Error, Result};
use crate::streaming::connection::{self, ConnectionSlot};
use crate::streaming::wire;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use std::io::{ErrorKind, Read};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const CHANNEL: &str = "command";

#[derive(Debug, Default)]
struct CommandCell {
    raw: String,
    fresh: bool,
}

/// Latest raw command text, written by the channel thread and read by the tick
///
/// Text and the "new data" flag change together under one lock, so the tick
/// never sees a flag without its text.
#[derive(Debug, Default)]
pub struct SharedCommand {
    cell: Mutex<CommandCell>,
}

impl SharedCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current text and mark it unread
    pub fn publish(&self, raw: impl Into<String>) {
        let mut cell = self.cell.lock();
        cell.raw = raw.into();
        cell.fresh = true;
    }

    /// Take the text if it arrived since the last call
    pub fn take_fresh(&self) -> Option<String> {
        let mut cell = self.cell.lock();
        if !cell.fresh {
            return None;
        }
        cell.fresh = false;
        Some(cell.raw.clone())
    }

    pub fn has_fresh(&self) -> bool {
        self.cell.lock().fresh
    }
}

/// Command channel server
pub struct CommandChannel {
    local_addr: SocketAddr,
    slot: Arc<ConnectionSlot>,
    thread: Option<JoinHandle<()>>,
    shutdown: ShutdownSignal,
}

impl CommandChannel {
    /// Bind the listener and spawn the channel thread
    pub fn start(
        config: &NetworkConfig,
        shared: Arc<SharedCommand>,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        let listener = connection::bind_listener(config.command_address())?;
        let local_addr = listener.local_addr()?;
        let slot = Arc::new(ConnectionSlot::new());

        let session = Session {
            shared,
            slot: Arc::clone(&slot),
            shutdown: shutdown.clone(),
            buffer: vec![0u8; config.command_buffer_size.max(1)],
            read_timeout: config.read_timeout(),
        };

        let thread = thread::Builder::new()
            .name("command-channel".to_string())
            .spawn(move || session.accept_loop(listener))
            .map_err(|source| Error::ThreadSpawn {
                name: "command-channel",
                source,
            })?;

        info!("Command listener started on {}", local_addr);

        Ok(Self {
            local_addr,
            slot,
            thread: Some(thread),
            shutdown,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn slot(&self) -> &Arc<ConnectionSlot> {
        &self.slot
    }

    /// Close the active client and wait (bounded) for the thread to exit
    ///
    /// The caller is expected to have triggered the shared shutdown signal.
    pub fn stop(&mut self, timeout: Duration) {
        if !self.shutdown.is_triggered() {
            warn!("Stopping command channel without a shutdown signal");
        }
        self.slot.close();
        if let Some(handle) = self.thread.take() {
            join_bounded(handle, timeout);
        }
    }
}

struct Session {
    shared: Arc<SharedCommand>,
    slot: Arc<ConnectionSlot>,
    shutdown: ShutdownSignal,
    buffer: Vec<u8>,
    read_timeout: Duration,
}

impl Session {
    fn accept_loop(mut self, listener: TcpListener) {
        while let Some((stream, addr)) = connection::accept_next(&listener, &self.shutdown, CHANNEL)
        {
            info!("Controller connected for commands: {}", addr);
            self.slot.attach(&stream, addr);

            match self.serve(stream) {
                Ok(count) => info!("Controller {} disconnected ({} commands)", addr, count),
                Err(e) => connection::log_session_error(CHANNEL, addr, &e, &self.shutdown),
            }
            self.slot.detach();
        }
        debug!("Command listener exiting");
    }

    /// Read commands until the client leaves; returns the number received
    fn serve(&mut self, mut stream: TcpStream) -> Result<u64> {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to disable Nagle on command socket: {}", e);
        }
        stream.set_read_timeout(Some(self.read_timeout))?;

        let mut count = 0u64;
        let result = loop {
            if self.shutdown.is_triggered() || !self.slot.is_connected() {
                break Ok(count);
            }
            match stream.read(&mut self.buffer) {
                Ok(0) => break Ok(count),
                Ok(n) => {
                    let text = wire::decode_command(&self.buffer[..n]);
                    trace!("Received command: [{}]", text);
                    self.shared.publish(text);
                    count += 1;
                }
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => break Err(Error::Io(e)),
            }
        };

        let _ = stream.shutdown(Shutdown::Both);
        result
    }
}

// Dropping a running channel stops the whole process-wide signal it shares.
impl Drop for CommandChannel {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown.trigger();
            self.stop(Duration::from_millis(500));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_fresh_clears_flag() {
        let shared = SharedCommand::new();
        assert!(shared.take_fresh().is_none());

        shared.publish("W");
        assert!(shared.has_fresh());
        assert_eq!(shared.take_fresh().as_deref(), Some("W"));
        assert!(shared.take_fresh().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let shared = SharedCommand::new();
        shared.publish("W");
        shared.publish("Q");
        shared.publish("STOP");
        assert_eq!(shared.take_fresh().as_deref(), Some("STOP"));
        assert!(shared.take_fresh().is_none());
    }

    #[test]
    fn test_same_text_republished_is_fresh_again() {
        let shared = SharedCommand::new();
        shared.publish("W");
        shared.take_fresh();
        shared.publish("W");
        assert_eq!(shared.take_fresh().as_deref(), Some("W"));
    }
}
