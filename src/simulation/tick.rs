//! Per-tick motion application and frame capture.
//!
//! # Tick Sequence
//!
//! ```text
//! 1. Pick up fresh command text (if any) and parse it
//! 2. Derive the motion intent for the current command
//! 3. Move: body-frame vector rotated by body yaw (+ offset), scaled by speed·dt
//! 4. Yaw: rotate the body if the intent asks for it
//! 5. Pitch: accumulate, clamp, apply to the view only
//! 6. Capture: when the gate fires and someone is watching, render → encode → publish
//! ```
//!
//! The tick runs on the host's thread and never touches a socket. Everything
//! it shares with the channels goes through [`SharedCommand`],
//! [`FrameBuffer`] and the frame channel's [`ConnectionSlot`].

use crate::config::{CaptureConfig, MotionConfig};
use crate::core::host::RenderHost;
use crate::core::types::Vec3;
use crate::error::{Error, Result};
use crate::motion::{Command, MotionIntent, PitchAccumulator};
use crate::simulation::capture::CaptureGate;
use crate::simulation::encoder::{FrameEncoder, JpegEncoder};
use crate::streaming::{ConnectionSlot, FrameBuffer, SharedCommand};
use log::{debug, error, info, trace, warn};
use std::sync::Arc;

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Command in effect for this tick
    pub command: Command,
    /// World-space displacement passed to the host
    pub displacement: Vec3,
    /// Body yaw change in degrees (0 when not rotating)
    pub yaw_delta: f32,
    /// View pitch after this tick
    pub pitch: f32,
    /// A frame was published
    pub captured: bool,
}

/// Running totals, logged periodically by the app
#[derive(Debug, Default, Clone, Copy)]
pub struct TickStats {
    pub ticks: u64,
    pub captures: u64,
    pub capture_errors: u64,
    /// Captures skipped because no frame client was connected
    pub skipped_no_client: u64,
}

/// Simulation tick state
pub struct SimulationTick {
    motion: MotionConfig,
    width: u32,
    height: u32,
    require_client: bool,

    command: Command,
    pitch: PitchAccumulator,
    gate: CaptureGate,
    encoder: Box<dyn FrameEncoder>,

    commands: Arc<SharedCommand>,
    frames: Arc<FrameBuffer>,
    frame_slot: Arc<ConnectionSlot>,

    stats: TickStats,
}

impl SimulationTick {
    /// Build a tick with a JPEG encoder at the configured quality
    pub fn new(
        motion: &MotionConfig,
        capture: &CaptureConfig,
        commands: Arc<SharedCommand>,
        frames: Arc<FrameBuffer>,
        frame_slot: Arc<ConnectionSlot>,
    ) -> Self {
        Self {
            motion: motion.clone(),
            width: capture.width,
            height: capture.height,
            require_client: capture.require_client,
            command: Command::default(),
            pitch: PitchAccumulator::new(motion.min_pitch, motion.max_pitch),
            gate: CaptureGate::new(capture.frame_interval()),
            encoder: Box::new(JpegEncoder::new(capture.jpeg_quality)),
            commands,
            frames,
            frame_slot,
            stats: TickStats::default(),
        }
    }

    /// Replace the frame encoder
    pub fn with_encoder(mut self, encoder: Box<dyn FrameEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn pitch(&self) -> f32 {
        self.pitch.current()
    }

    pub fn capture_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, host: &mut dyn RenderHost, dt: f32) -> TickReport {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.stats.ticks += 1;

        if let Some(raw) = self.commands.take_fresh() {
            let command = Command::parse(&raw);
            if command != self.command {
                debug!("Command: {} -> {} ([{}])", self.command, command, raw);
                self.command = command;
            }
        }
        let intent = MotionIntent::from_command(self.command);

        let heading = host.character_yaw() + self.motion.yaw_offset;
        let displacement = intent
            .move_vector
            .rotated_about_y(heading)
            .scale(self.motion.speed * dt);
        host.move_character(displacement);

        let yaw_delta = intent.rotation_rate * self.motion.rotation_speed * dt;
        if yaw_delta != 0.0 {
            host.rotate_character(yaw_delta);
        }

        let pitch = self
            .pitch
            .apply(intent.pitch_rate * self.motion.pitch_speed * dt);
        host.set_view_rotation(pitch, host.character_yaw());

        let captured = self.gate.advance(dt) && self.capture(host);

        TickReport {
            command: self.command,
            displacement,
            yaw_delta,
            pitch,
            captured,
        }
    }

    fn capture(&mut self, host: &mut dyn RenderHost) -> bool {
        if self.require_client && !self.frame_slot.is_connected() {
            self.stats.skipped_no_client += 1;
            return false;
        }

        match self.render_and_encode(host) {
            Ok(data) => {
                let frame = self.frames.publish(data);
                self.stats.captures += 1;
                trace!("Captured frame #{} ({} bytes)", frame.sequence, frame.len());
                true
            }
            Err(Error::RenderSourceUnavailable) => {
                error!("Render source unavailable, frame capture disabled");
                self.gate.disable();
                false
            }
            Err(e) => {
                self.stats.capture_errors += 1;
                warn!("Frame capture failed: {}", e);
                false
            }
        }
    }

    fn render_and_encode(&mut self, host: &mut dyn RenderHost) -> Result<Vec<u8>> {
        let raw = host.render_frame(self.width, self.height)?;
        self.encoder.encode(&raw)
    }

    /// Log a one-line summary of the running totals
    pub fn log_stats(&self) {
        info!(
            "Tick stats: {} ticks, {} captures, {} capture errors, {} skipped (no client), command {}",
            self.stats.ticks,
            self.stats.captures,
            self.stats.capture_errors,
            self.stats.skipped_no_client,
            self.command
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RawFrame;
    use crate::devices::mock::MockHost;
    use crate::streaming::RetentionPolicy;
    use approx::assert_relative_eq;

    struct Fixture {
        tick: SimulationTick,
        commands: Arc<SharedCommand>,
        frames: Arc<FrameBuffer>,
        slot: Arc<ConnectionSlot>,
    }

    fn fixture(motion: MotionConfig, capture: CaptureConfig) -> Fixture {
        let commands = Arc::new(SharedCommand::new());
        let frames = Arc::new(FrameBuffer::new(RetentionPolicy::LatestWins));
        let slot = Arc::new(ConnectionSlot::new());
        let tick = SimulationTick::new(
            &motion,
            &capture,
            Arc::clone(&commands),
            Arc::clone(&frames),
            Arc::clone(&slot),
        );
        Fixture {
            tick,
            commands,
            frames,
            slot,
        }
    }

    fn small_capture() -> CaptureConfig {
        CaptureConfig {
            width: 16,
            height: 8,
            target_fps: 10,
            ..CaptureConfig::default()
        }
    }

    fn default_fixture() -> Fixture {
        fixture(MotionConfig::default(), small_capture())
    }

    #[test]
    fn test_forward_moves_along_facing() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);
        f.commands.publish("W");

        let report = f.tick.tick(&mut host, 0.1);
        assert_eq!(report.command, Command::Forward);
        assert_relative_eq!(report.displacement.z, 0.5, epsilon = 1e-6);
        assert_relative_eq!(report.displacement.x, 0.0, epsilon = 1e-6);
        assert_eq!(report.yaw_delta, 0.0);
        assert_eq!(report.pitch, 0.0);
        assert_eq!(host.counters().rotations, 0);
    }

    #[test]
    fn test_unknown_text_is_stationary() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);
        f.commands.publish("W");
        f.tick.tick(&mut host, 0.1);

        f.commands.publish("XYZ\n");
        let report = f.tick.tick(&mut host, 0.1);
        assert_eq!(report.command, Command::Unknown);
        assert!(report.displacement.is_zero());
        // Host still sees the zero move
        assert_eq!(host.counters().moves, 2);
    }

    #[test]
    fn test_command_persists_until_replaced() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);
        f.commands.publish("D");
        for _ in 0..5 {
            let report = f.tick.tick(&mut host, 0.1);
            assert_eq!(report.command, Command::StrafeRight);
        }
        assert_relative_eq!(host.position().x, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_forward_follows_body_yaw() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);
        host.rotate_character(90.0);
        f.commands.publish("w");

        let report = f.tick.tick(&mut host, 1.0);
        assert_relative_eq!(report.displacement.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(report.displacement.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_yaw_offset_rotates_relative_commands() {
        let motion = MotionConfig {
            yaw_offset: 90.0,
            ..MotionConfig::default()
        };
        let mut f = fixture(motion, small_capture());
        let mut host = MockHost::new(0.0);
        f.commands.publish("W");

        let report = f.tick.tick(&mut host, 1.0);
        assert_relative_eq!(report.displacement.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(report.displacement.z, 0.0, epsilon = 1e-5);
        // The body itself is not turned by the offset
        assert_eq!(host.yaw(), 0.0);
    }

    #[test]
    fn test_yaw_commands_rotate_body() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);

        f.commands.publish("Q");
        let report = f.tick.tick(&mut host, 0.5);
        assert_relative_eq!(report.yaw_delta, -45.0);
        assert!(report.displacement.is_zero());

        f.commands.publish("E");
        f.tick.tick(&mut host, 1.0);
        assert_relative_eq!(host.yaw(), 45.0, epsilon = 1e-4);
        // View yaw follows the body
        assert_relative_eq!(host.view().1, 45.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pitch_is_clamped_and_view_only() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);

        f.commands.publish("Z");
        for _ in 0..100 {
            f.tick.tick(&mut host, 0.1);
        }
        assert_eq!(f.tick.pitch(), 80.0);
        assert_eq!(host.view().0, 80.0);
        assert_eq!(host.yaw(), 0.0);

        f.commands.publish("3");
        for _ in 0..100 {
            f.tick.tick(&mut host, 0.1);
        }
        assert_eq!(f.tick.pitch(), -80.0);
    }

    #[test]
    fn test_view_rotation_applied_every_tick() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);
        for _ in 0..4 {
            f.tick.tick(&mut host, 0.01);
        }
        assert_eq!(host.counters().view_updates, 4);
    }

    #[test]
    fn test_bad_dt_is_zero() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);
        f.commands.publish("W");
        for dt in [-1.0, f32::NAN, f32::INFINITY] {
            let report = f.tick.tick(&mut host, dt);
            assert!(report.displacement.is_zero());
            assert!(!report.captured);
        }
    }

    #[test]
    fn test_capture_skipped_without_client() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);

        let report = f.tick.tick(&mut host, 0.2);
        assert!(!report.captured);
        assert_eq!(host.counters().renders, 0);
        assert_eq!(f.tick.stats().skipped_no_client, 1);
        assert!(f.frames.is_empty());
    }

    #[test]
    fn test_capture_publishes_when_client_connected() {
        let mut f = default_fixture();
        let mut host = MockHost::new(0.0);
        f.slot.mark_connected();

        let report = f.tick.tick(&mut host, 0.2);
        assert!(report.captured);
        let frame = f.frames.take_latest().unwrap();
        assert_eq!(&frame.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_capture_rate_independent_of_tick_rate() {
        let capture = CaptureConfig {
            require_client: false,
            ..small_capture()
        };
        let mut f = fixture(MotionConfig::default(), capture);
        let mut host = MockHost::new(0.0);

        // 10 Hz capture, 0.04 s ticks: overshoot dropped, so every third tick
        let captured = (0..30)
            .filter(|_| f.tick.tick(&mut host, 0.04).captured)
            .count();
        assert_eq!(captured, 10);
        assert_eq!(host.counters().renders, 10);
    }

    #[test]
    fn test_missing_render_source_disables_capture() {
        let capture = CaptureConfig {
            require_client: false,
            ..small_capture()
        };
        let mut f = fixture(MotionConfig::default(), capture);
        let mut host = MockHost::without_render_source(0.0);
        f.commands.publish("W");

        let report = f.tick.tick(&mut host, 0.2);
        assert!(!report.captured);
        assert!(!f.tick.capture_enabled());

        // Motion keeps working
        let report = f.tick.tick(&mut host, 0.2);
        assert!(report.displacement.z > 0.0);
        assert_eq!(host.counters().renders, 1);
    }

    struct FailingEncoder;

    impl FrameEncoder for FailingEncoder {
        fn encode(&mut self, _frame: &RawFrame) -> Result<Vec<u8>> {
            Err(Error::Capture("boom".into()))
        }
    }

    #[test]
    fn test_encode_failure_skips_one_cycle() {
        let capture = CaptureConfig {
            require_client: false,
            ..small_capture()
        };
        let f = fixture(MotionConfig::default(), capture);
        let frames = f.frames;
        let mut tick = f.tick.with_encoder(Box::new(FailingEncoder));
        let mut host = MockHost::new(0.0);

        assert!(!tick.tick(&mut host, 0.2).captured);
        assert!(!tick.tick(&mut host, 0.2).captured);
        assert!(tick.capture_enabled());
        assert_eq!(tick.stats().capture_errors, 2);
        assert!(frames.is_empty());
    }
}
