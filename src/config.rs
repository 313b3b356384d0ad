//! Configuration for the SimLink daemon
//!
//! Loaded from a TOML file. Every field has a default, so an empty file (or no
//! file at all) yields a working setup that matches the reference controller:
//!
//! | Parameter | Default |
//! |-----------|---------|
//! | command / frame / status port | 5000 / 5001 / 5002 |
//! | capture size | 640 x 480 |
//! | target FPS | 60 |
//! | JPEG quality | 100 |
//! | move / yaw / pitch speed | 5 u/s, 90 °/s, 60 °/s |
//! | pitch bounds | -80° .. 80° |

use crate::error::{Error, Result};
use crate::streaming::frame_buffer::{DEFAULT_FIFO_CAPACITY, RetentionPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub capture: CaptureConfig,
    pub motion: MotionConfig,
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
}

/// TCP channel configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Interface all three listeners bind to
    pub bind_host: String,
    /// Inbound command channel port (0 = ephemeral)
    pub command_port: u16,
    /// Outbound frame stream port (0 = ephemeral)
    pub frame_port: u16,
    /// Outbound status channel port (0 = ephemeral)
    pub status_port: u16,
    /// Fixed read buffer for the command channel; one read = one command
    pub command_buffer_size: usize,
    /// SO_SNDBUF applied to frame stream clients
    pub send_buffer_size: usize,
    /// Frame stream sleep when no frame is pending (ms)
    pub frame_idle_ms: u64,
    /// Status channel sleep when the queue is empty (ms)
    pub status_idle_ms: u64,
    /// Command socket read timeout, bounds shutdown latency (ms)
    pub read_timeout_ms: u64,
    /// Bounded wait per channel thread on shutdown (ms)
    pub join_timeout_ms: u64,
    /// Warn each time the undelivered status backlog crosses a multiple of this
    pub status_backlog_warning: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            command_port: 5000,
            frame_port: 5001,
            status_port: 5002,
            command_buffer_size: 1024,
            send_buffer_size: 65536,
            frame_idle_ms: 5,
            status_idle_ms: 100,
            read_timeout_ms: 500,
            join_timeout_ms: 2000,
            status_backlog_warning: 64,
        }
    }
}

impl NetworkConfig {
    pub fn command_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.command_port)
    }

    pub fn frame_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.frame_port)
    }

    pub fn status_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.status_port)
    }

    pub fn frame_idle(&self) -> Duration {
        Duration::from_millis(self.frame_idle_ms)
    }

    pub fn status_idle(&self) -> Duration {
        Duration::from_millis(self.status_idle_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Retention discipline for captured frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionKind {
    /// Keep only the newest unconsumed frame
    Latest,
    /// Keep up to `capacity` frames in publish order
    Fifo,
}

/// Frame buffer retention configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub policy: RetentionKind,
    /// FIFO capacity (ignored for `latest`)
    pub capacity: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            policy: RetentionKind::Latest,
            capacity: DEFAULT_FIFO_CAPACITY,
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> RetentionPolicy {
        match self.policy {
            RetentionKind::Latest => RetentionPolicy::LatestWins,
            RetentionKind::Fifo => RetentionPolicy::BoundedFifo {
                capacity: self.capacity,
            },
        }
    }
}

/// Frame capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    /// Capture rate, independent of the tick rate (0 disables capture)
    pub target_fps: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Skip render and encode while no frame client is connected
    pub require_client: bool,
    pub retention: RetentionConfig,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            target_fps: 60,
            jpeg_quality: 100,
            require_client: true,
            retention: RetentionConfig::default(),
        }
    }
}

impl CaptureConfig {
    /// Time between captures, `None` when capture is disabled
    pub fn frame_interval(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs_f64(1.0 / self.target_fps as f64))
    }
}

/// Character motion configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Linear speed (world units per second)
    pub speed: f32,
    /// Yaw speed (degrees per second)
    pub rotation_speed: f32,
    /// Pitch speed (degrees per second)
    pub pitch_speed: f32,
    /// Lower pitch bound (degrees)
    pub min_pitch: f32,
    /// Upper pitch bound (degrees)
    pub max_pitch: f32,
    /// Fixed yaw added to the body yaw before interpreting relative commands
    ///
    /// Compensates camera rigs mounted at an angle to the body (e.g. 90.0 for a
    /// rig where "forward" should travel along the body's right axis).
    pub yaw_offset: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            rotation_speed: 90.0,
            pitch_speed: 60.0,
            min_pitch: -80.0,
            max_pitch: 80.0,
            yaw_offset: 0.0,
        }
    }
}

/// Standalone simulation loop configuration (daemon only)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Tick rate of the built-in loop (Hz)
    pub tick_rate_hz: f64,
    /// Eye height of the mock character
    pub start_height: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            start_height: 1.7,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins if set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use simlink::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("simlink.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Defaults with every port set to 0 (for tests and embedding)
    pub fn ephemeral() -> Self {
        let mut config = Self::default();
        config.network.bind_host = "127.0.0.1".to_string();
        config.network.command_port = 0;
        config.network.frame_port = 0;
        config.network.status_port = 0;
        config
    }

    /// Reject values the channels or the tick cannot run with
    pub fn validate(&self) -> Result<()> {
        let net = &self.network;
        let ports = [net.command_port, net.frame_port, net.status_port];
        for (i, a) in ports.iter().enumerate() {
            if *a != 0 && ports[i + 1..].contains(a) {
                return Err(Error::Config(format!("port {} assigned to two channels", a)));
            }
        }
        if net.command_buffer_size == 0 {
            return Err(Error::Config("command_buffer_size must be > 0".into()));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(Error::Config(format!(
                "capture size must be non-zero, got {}x{}",
                self.capture.width, self.capture.height
            )));
        }
        if self.capture.retention.policy == RetentionKind::Fifo
            && self.capture.retention.capacity == 0
        {
            return Err(Error::Config("fifo retention capacity must be > 0".into()));
        }
        let (min_pitch, max_pitch) = (self.motion.min_pitch, self.motion.max_pitch);
        if min_pitch.is_nan() || max_pitch.is_nan() || min_pitch > max_pitch {
            return Err(Error::Config(format!(
                "min_pitch {} exceeds max_pitch {}",
                min_pitch, max_pitch
            )));
        }
        let tick_rate = self.simulation.tick_rate_hz;
        if !tick_rate.is_finite() || tick_rate <= 0.0 {
            return Err(Error::Config(format!(
                "tick_rate_hz must be positive, got {}",
                tick_rate
            )));
        }
        Ok(())
    }
}
