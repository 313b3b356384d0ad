//! Status notification channel.
//!
//! Delivers completion messages such as `SIMULATION_ENDED:SUCCESS` to one
//! connected client, in the order they were raised. Messages raised while no
//! client is connected stay queued and go out once one connects.
//!
//! # Delivery
//!
//! ```text
//! StatusNotifier::notify ─▶ StatusQueue ─▶ pop ─▶ write + flush
//!                                  ▲                  │
//!                                  └── requeue_front ◀┘ (write failed)
//! ```

use crate::config::NetworkConfig;
use crate::core::shutdown::{ShutdownSignal, join_bounded};
use crate::error::{Error, Result};
use crate::streaming::connection::{self, ConnectionSlot};
use crate::streaming::status_queue::StatusQueue;
use crate::streaming::wire;
use log::{debug, info, trace, warn};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const CHANNEL: &str = "status";

/// Sent when a run completes successfully
pub const SIMULATION_SUCCESS: &str = "SIMULATION_ENDED:SUCCESS";
/// Sent when a run fails
pub const SIMULATION_FAILURE: &str = "SIMULATION_ENDED:FAILURE";

/// Inbound API for raising status notifications
///
/// Cheap to clone and safe to use from any thread. Never blocks on the network.
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    queue: Arc<StatusQueue>,
}

impl StatusNotifier {
    pub fn new(queue: Arc<StatusQueue>) -> Self {
        Self { queue }
    }

    /// Report the end of a simulation run
    pub fn notify(&self, success: bool) {
        let message = if success {
            SIMULATION_SUCCESS
        } else {
            SIMULATION_FAILURE
        };
        info!("Simulation ended: {}", message);
        self.queue.push(message);
    }

    /// Enqueue arbitrary text
    pub fn notify_message(&self, message: impl Into<String>) {
        self.queue.push(message);
    }

    /// Messages not yet delivered
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Status channel server
pub struct StatusServer {
    local_addr: SocketAddr,
    slot: Arc<ConnectionSlot>,
    thread: Option<JoinHandle<()>>,
    shutdown: ShutdownSignal,
}

impl StatusServer {
    /// Bind the listener and spawn the status thread
    pub fn start(
        config: &NetworkConfig,
        queue: Arc<StatusQueue>,
        shutdown: ShutdownSignal,
    ) -> Result<Self> {
        let listener = connection::bind_listener(config.status_address())?;
        let local_addr = listener.local_addr()?;
        let slot = Arc::new(ConnectionSlot::new());

        let sender = Sender {
            queue,
            slot: Arc::clone(&slot),
            shutdown: shutdown.clone(),
            idle: config.status_idle(),
        };

        let thread = thread::Builder::new()
            .name("status-server".to_string())
            .spawn(move || sender.accept_loop(listener))
            .map_err(|source| Error::ThreadSpawn {
                name: "status-server",
                source,
            })?;

        info!("Status listener started on {}", local_addr);

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
    pub fn stop(&mut self, timeout: Duration) {
        if !self.shutdown.is_triggered() {
            warn!("Stopping status server without a shutdown signal");
        }
        self.slot.close();
        if let Some(handle) = self.thread.take() {
            join_bounded(handle, timeout);
        }
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown.trigger();
            self.stop(Duration::from_millis(500));
        }
    }
}

struct Sender {
    queue: Arc<StatusQueue>,
    slot: Arc<ConnectionSlot>,
    shutdown: ShutdownSignal,
    idle: Duration,
}

impl Sender {
    fn accept_loop(self, listener: TcpListener) {
        while let Some((stream, addr)) = connection::accept_next(&listener, &self.shutdown, CHANNEL)
        {
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to disable Nagle on status socket: {}", e);
            }
            self.slot.attach(&stream, addr);
            info!(
                "Client connected for status: {} ({} pending)",
                addr,
                self.queue.len()
            );

            match self.serve(&stream) {
                Ok(sent) => info!("Status client {} disconnected ({} sent)", addr, sent),
                Err(e) => connection::log_session_error(CHANNEL, addr, &e, &self.shutdown),
            }

            self.slot.detach();
            let _ = stream.shutdown(Shutdown::Both);
        }
        debug!("Status listener exiting");
    }

    fn serve(&self, stream: &TcpStream) -> Result<u64> {
        let mut probe = stream.try_clone()?;
        let mut writer = stream;
        let mut sent = 0u64;

        while !self.shutdown.is_triggered() && self.slot.is_connected() {
            // Writes to a closed peer still succeed locally, so check before taking a message
            if connection::peer_closed(&mut probe) {
                return Ok(sent);
            }
            match self.queue.pop() {
                Some(message) => {
                    if let Err(e) = wire::write_status(&mut writer, &message) {
                        self.queue.requeue_front(message);
                        return Err(e);
                    }
                    trace!("Sent status [{}]", message);
                    sent += 1;
                }
                None => thread::sleep(self.idle),
            }
        }
        Ok(sent)
    }
}
