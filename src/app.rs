//! Application orchestration for the SimLink bridge
//!
//! Owns the shared state, the three TCP channels and the simulation tick, and
//! coordinates shutdown.
//!
//! # Threads
//!
//! ```text
//! host thread      ── SimulationTick::tick (via run() or the embedder's loop)
//! command-channel  ── CommandChannel  ─▶ SharedCommand ─▶ tick
//! frame-stream     ── FrameStreamServer ◀─ FrameBuffer ◀─ tick
//! status-server    ── StatusServer ◀─ StatusQueue ◀─ StatusNotifier
//! signal-handler   ── SIGINT/SIGTERM ─▶ ShutdownSignal (daemon only)
//! ```

use crate::config::AppConfig;
use crate::core::host::RenderHost;
use crate::core::shutdown::ShutdownSignal;
use crate::error::{Error, Result};
use crate::simulation::{SimulationTick, TickReport};
use crate::streaming::{
    CommandChannel, FrameBuffer, FrameStreamServer, SharedCommand, StatusNotifier, StatusQueue,
    StatusServer,
};
use log::{debug, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Interval between statistics lines in [`SimLinkApp::run`]
const STATS_INTERVAL: Duration = Duration::from_secs(10);

/// Main application structure that manages all components
pub struct SimLinkApp {
    config: AppConfig,
    shutdown: ShutdownSignal,
    frames: Arc<FrameBuffer>,
    status: Arc<StatusQueue>,
    command_channel: CommandChannel,
    frame_server: FrameStreamServer,
    status_server: StatusServer,
    tick: SimulationTick,
    stopped: bool,
}

impl SimLinkApp {
    /// Validate the configuration, bind all three listeners and start their threads
    ///
    /// Fails without leaving any thread behind if a listener cannot bind.
    pub fn start(config: AppConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing SimLink bridge");

        let shutdown = ShutdownSignal::new();
        let commands = Arc::new(SharedCommand::new());
        let frames = Arc::new(FrameBuffer::new(config.capture.retention.policy()));
        let status = Arc::new(StatusQueue::new(config.network.status_backlog_warning));

        // Channels already started are stopped by their Drop if a later one fails
        let command_channel =
            CommandChannel::start(&config.network, Arc::clone(&commands), shutdown.clone())?;
        let frame_server =
            FrameStreamServer::start(&config.network, Arc::clone(&frames), shutdown.clone())?;
        let status_server =
            StatusServer::start(&config.network, Arc::clone(&status), shutdown.clone())?;

        let tick = SimulationTick::new(
            &config.motion,
            &config.capture,
            commands,
            Arc::clone(&frames),
            Arc::clone(frame_server.slot()),
        );

        info!("✓ SimLink bridge started");
        info!("  Commands: {}", command_channel.local_addr());
        info!("  Frames:   {}", frame_server.local_addr());
        info!("  Status:   {}", status_server.local_addr());

        Ok(Self {
            config,
            shutdown,
            frames,
            status,
            command_channel,
            frame_server,
            status_server,
            tick,
            stopped: false,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to raise status notifications from any thread
    pub fn notifier(&self) -> StatusNotifier {
        StatusNotifier::new(Arc::clone(&self.status))
    }

    /// Signal shared by every thread; triggering it stops [`run`](Self::run)
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    pub fn frame_buffer(&self) -> &Arc<FrameBuffer> {
        &self.frames
    }

    pub fn command_addr(&self) -> SocketAddr {
        self.command_channel.local_addr()
    }

    pub fn frame_addr(&self) -> SocketAddr {
        self.frame_server.local_addr()
    }

    pub fn status_addr(&self) -> SocketAddr {
        self.status_server.local_addr()
    }

    pub fn is_running(&self) -> bool {
        !self.stopped && !self.shutdown.is_triggered()
    }

    /// Run one simulation tick on the caller's thread
    pub fn tick(&mut self, host: &mut dyn RenderHost, dt: f32) -> TickReport {
        self.tick.tick(host, dt)
    }

    /// Drive the tick at the configured rate until shutdown is requested
    ///
    /// Releases the host's render target and shuts everything down on exit.
    pub fn run(&mut self, host: &mut dyn RenderHost) -> Result<()> {
        let interval = self.config.simulation.tick_interval();
        info!(
            "Simulation loop running at {:.1} Hz",
            self.config.simulation.tick_rate_hz
        );

        let mut last_tick = Instant::now();
        let mut last_stats = Instant::now();

        while !self.shutdown.is_triggered() {
            let started = Instant::now();
            let dt = started.duration_since(last_tick).as_secs_f32();
            last_tick = started;

            self.tick.tick(host, dt);

            if last_stats.elapsed() >= STATS_INTERVAL {
                self.log_statistics();
                last_stats = Instant::now();
            }

            // Sleep for the remainder of the tick interval
            let elapsed = started.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }

        info!("Shutdown signal received, stopping...");
        self.shutdown_with_host(host);
        Ok(())
    }

    /// Release the host's render target, then [`shutdown`](Self::shutdown)
    ///
    /// For hosts that drive [`tick`](Self::tick) from their own loop.
    pub fn shutdown_with_host(&mut self, host: &mut dyn RenderHost) {
        host.release_render_target();
        self.shutdown();
    }

    /// Stop every channel and drain undelivered status messages
    ///
    /// Does not touch the render host; use
    /// [`shutdown_with_host`](Self::shutdown_with_host) to release its render
    /// target as well. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.shutdown.trigger();

        let timeout = self.config.network.join_timeout();
        self.command_channel.stop(timeout);
        self.frame_server.stop(timeout);
        self.status_server.stop(timeout);

        for message in self.status.drain() {
            warn!("Undelivered status message: {}", message);
        }

        let stats = self.frames.stats();
        debug!(
            "Frames: {} published, {} sent, {} dropped",
            stats.published, stats.taken, stats.dropped
        );
        info!("✓ SimLink bridge stopped");
    }

    fn log_statistics(&self) {
        self.tick.log_stats();
        let stats = self.frames.stats();
        info!(
            "Frames: {} published, {} sent, {} dropped | clients: command={} frame={} status={} | {} status pending",
            stats.published,
            stats.taken,
            stats.dropped,
            self.command_channel.slot().is_connected(),
            self.frame_server.slot().is_connected(),
            self.status_server.slot().is_connected(),
            self.status.len()
        );
    }
}

impl Drop for SimLinkApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Trigger `shutdown` on SIGINT or SIGTERM, from a dedicated thread
pub fn install_signal_handler(shutdown: ShutdownSignal) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Received signal {}, initiating shutdown...", sig);
                shutdown.trigger();
            }
        })
        .map_err(|source| Error::ThreadSpawn {
            name: "signal-handler",
            source,
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::MockHost;

    #[test]
    fn test_start_and_shutdown_idempotent() {
        let mut app = SimLinkApp::start(AppConfig::ephemeral()).unwrap();
        assert!(app.is_running());
        assert_ne!(app.command_addr().port(), 0);
        assert_ne!(app.frame_addr(), app.status_addr());

        app.shutdown();
        assert!(!app.is_running());
        app.shutdown();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AppConfig::ephemeral();
        config.capture.width = 0;
        assert!(matches!(
            SimLinkApp::start(config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_run_returns_on_shutdown() {
        let mut app = SimLinkApp::start(AppConfig::ephemeral()).unwrap();
        let signal = app.shutdown_signal();
        let trigger = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            signal.trigger();
        });

        let mut host = MockHost::new(1.7);
        app.run(&mut host).unwrap();
        trigger.join().unwrap();

        assert!(host.render_target_released());
        assert!(host.counters().moves > 0);
        assert!(!app.is_running());
    }

    #[test]
    fn test_shutdown_with_host_releases_render_target() {
        let mut app = SimLinkApp::start(AppConfig::ephemeral()).unwrap();
        let mut host = MockHost::new(1.7);
        app.tick(&mut host, 0.1);

        app.shutdown_with_host(&mut host);
        assert!(host.render_target_released());
        assert!(!app.is_running());
    }

    #[test]
    fn test_undelivered_status_drained_on_shutdown() {
        let mut app = SimLinkApp::start(AppConfig::ephemeral()).unwrap();
        let notifier = app.notifier();
        notifier.notify(true);
        assert_eq!(notifier.pending(), 1);
        app.shutdown();
        assert_eq!(notifier.pending(), 0);
    }
}
