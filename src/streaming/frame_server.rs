//! Frame stream server.
//!
//! Pushes encoded frames from the [`FrameBuffer`] to one connected client
//! using the length-prefixed format in [`crate::streaming::wire`].
//!
//! # Session Loop
//!
//! ```text
//! take_latest() ─▶ Some(frame) ─▶ write prefix + payload, flush
//!      │
//!      └────────▶ None ─▶ liveness probe, sleep frame_idle_ms, retry
//! ```
//!
//! The idle sleep (a few ms) keeps the loop off the CPU while bounding the
//! latency it adds. Sockets are tuned for latency on connect: Nagle disabled
//! and an explicit send buffer size.
//!
//! Any write error ends the session and the server goes back to accepting;
//! a client error never takes the thread down.

use crate::config::NetworkConfig;
use crate::core::shutdown::{ShutdownSignal, join_bounded};
use crate::error::{Error, Result};
use crate::streaming::connection::{self, ConnectionSlot};
use crate::streaming::frame_buffer::FrameBuffer;
use crate::streaming::wire;
use log::{debug, info, trace, warn};
use std::io::BufWriter;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const CHANNEL: &str = "frame";

/// Per-session counters
#[derive(Debug, Default, Clone, Copy)]
struct SessionStats {
    frames: u64,
    bytes: u64,
}

/// Frame stream server
pub struct FrameStreamServer {
    local_addr: SocketAddr,
    slot: Arc<ConnectionSlot>,
    thread: Option<JoinHandle<()>>,
    shutdown: ShutdownSignal,
}

impl FrameStreamServer {
    /// Bind the listener and spawn the stream thread
    pub fn start(
        config: &NetworkConfig,
        buffer: Arc<FrameBuffer>,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        let listener = connection::bind_listener(config.frame_address())?;
        let local_addr = listener.local_addr()?;
        let slot = Arc::new(ConnectionSlot::new());

        let streamer = Streamer {
            buffer,
            slot: Arc::clone(&slot),
            shutdown: shutdown.clone(),
            idle: config.frame_idle(),
            send_buffer_size: config.send_buffer_size,
        };

        let thread = thread::Builder::new()
            .name("frame-stream".to_string())
            .spawn(move || streamer.accept_loop(listener))
            .map_err(|source| Error::ThreadSpawn {
                name: "frame-stream",
                source,
            })?;

        info!("Frame listener started on {}", local_addr);

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

    /// Connection slot, also consulted by the tick to skip capture when nobody watches
    pub fn slot(&self) -> &Arc<ConnectionSlot> {
        &self.slot
    }

    /// Close the active client and wait (bounded) for the thread to exit
    pub fn stop(&mut self, timeout: Duration) {
        if !self.shutdown.is_triggered() {
            warn!("Stopping frame stream without a shutdown signal");
        }
        self.slot.close();
        if let Some(handle) = self.thread.take() {
            join_bounded(handle, timeout);
        }
    }
}

impl Drop for FrameStreamServer {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown.trigger();
            self.stop(Duration::from_millis(500));
        }
    }
}

struct Streamer {
    buffer: Arc<FrameBuffer>,
    slot: Arc<ConnectionSlot>,
    shutdown: ShutdownSignal,
    idle: Duration,
    send_buffer_size: usize,
}

impl Streamer {
    fn accept_loop(self, listener: TcpListener) {
        while let Some((stream, addr)) = connection::accept_next(&listener, &self.shutdown, CHANNEL)
        {
            self.tune(&stream);
            self.slot.attach(&stream, addr);
            info!("Client connected for frame streaming: {}", addr);

            let mut stats = SessionStats::default();
            match self.serve(&stream, &mut stats) {
                Ok(()) => debug!("[{}] Session {} ended", CHANNEL, addr),
                Err(e) => connection::log_session_error(CHANNEL, addr, &e, &self.shutdown),
            }

            self.slot.detach();
            let _ = stream.shutdown(Shutdown::Both);
            info!(
                "Frame client {} disconnected ({} frames, {} bytes)",
                addr, stats.frames, stats.bytes
            );
        }
        debug!("Frame listener exiting");
    }

    /// Low-latency socket options; failures are logged, not fatal
    fn tune(&self, stream: &TcpStream) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to disable Nagle on frame socket: {}", e);
        }
        if let Err(e) = socket2::SockRef::from(stream).set_send_buffer_size(self.send_buffer_size) {
            warn!(
                "Failed to set frame socket send buffer to {}: {}",
                self.send_buffer_size, e
            );
        }
    }

    fn serve(&self, stream: &TcpStream, stats: &mut SessionStats) -> Result<()> {
        let mut probe = stream.try_clone()?;
        // Buffer sized so prefix and payload of a typical frame leave in one syscall
        let mut writer = BufWriter::with_capacity(64 * 1024, stream);

        while !self.shutdown.is_triggered() && self.slot.is_connected() {
            match self.buffer.take_latest() {
                Some(frame) => {
                    wire::write_frame(&mut writer, &frame.data)?;
                    stats.frames += 1;
                    stats.bytes += frame.len() as u64;
                    trace!("Sent frame #{} ({} bytes)", frame.sequence, frame.len());
                }
                None => {
                    if connection::peer_closed(&mut probe) {
                        return Ok(());
                    }
                    thread::sleep(self.idle);
                }
            }
        }
        Ok(())
    }
}
