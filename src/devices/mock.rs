//! Headless render host for running without a game engine
//!
//! Tracks a character pose with plain kinematics (no collisions) and renders a
//! synthetic RGB gradient that shifts with the pose, so a viewer can see the
//! commands take effect:
//!
//! | Channel | Driven by |
//! |---------|-----------|
//! | Red | column + body yaw |
//! | Green | row + view pitch |
//! | Blue | distance travelled on the ground plane |

use crate::core::host::RenderHost;
use crate::core::types::{RawFrame, Vec3};
use crate::error::{Error, Result};

/// Call counters, for tests and stats
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MockCounters {
    /// Render attempts, including failed ones
    pub renders: u64,
    pub moves: u64,
    pub rotations: u64,
    pub view_updates: u64,
}

/// Mock render host
#[derive(Debug, Clone)]
pub struct MockHost {
    position: Vec3,
    /// Body yaw in degrees, normalized to (-180, 180]
    yaw: f32,
    view_pitch: f32,
    view_yaw: f32,
    has_render_source: bool,
    render_target_released: bool,
    counters: MockCounters,
}

impl MockHost {
    /// Character at the origin with eye height `start_height`
    pub fn new(start_height: f32) -> Self {
        Self {
            position: Vec3::new(0.0, start_height, 0.0),
            yaw: 0.0,
            view_pitch: 0.0,
            view_yaw: 0.0,
            has_render_source: true,
            render_target_released: false,
            counters: MockCounters::default(),
        }
    }

    /// Host with no camera; every render reports the source unavailable
    pub fn without_render_source(start_height: f32) -> Self {
        Self {
            has_render_source: false,
            ..Self::new(start_height)
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// View (pitch, yaw) in degrees
    #[inline]
    pub fn view(&self) -> (f32, f32) {
        (self.view_pitch, self.view_yaw)
    }

    pub fn counters(&self) -> MockCounters {
        self.counters
    }

    pub fn render_target_released(&self) -> bool {
        self.render_target_released
    }
}

impl RenderHost for MockHost {
    fn render_frame(&mut self, width: u32, height: u32) -> Result<RawFrame> {
        self.counters.renders += 1;
        if !self.has_render_source {
            return Err(Error::RenderSourceUnavailable);
        }
        if self.render_target_released {
            return Err(Error::Capture("render target released".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(Error::Capture(format!(
                "invalid render size {}x{}",
                width, height
            )));
        }

        let red_shift = (self.yaw + 180.0) / 360.0 * 255.0;
        let green_shift = self.view_pitch * 255.0 / 180.0;
        let travelled = self.position.x.hypot(self.position.z);
        let blue = ((travelled * 16.0) % 256.0) as u8;

        let mut pixels =
            Vec::with_capacity(width as usize * height as usize * RawFrame::BYTES_PER_PIXEL);
        for y in 0..height {
            let green = (y as f32 * 255.0 / height as f32 + green_shift).rem_euclid(256.0) as u8;
            for x in 0..width {
                let red = (x as f32 * 255.0 / width as f32 + red_shift).rem_euclid(256.0) as u8;
                pixels.extend_from_slice(&[red, green, blue]);
            }
        }
        Ok(RawFrame::new(width, height, pixels))
    }

    fn move_character(&mut self, displacement: Vec3) {
        self.counters.moves += 1;
        self.position = self.position + displacement;
    }

    fn rotate_character(&mut self, yaw_degrees: f32) {
        self.counters.rotations += 1;
        self.yaw = normalize_degrees(self.yaw + yaw_degrees);
    }

    fn character_yaw(&self) -> f32 {
        self.yaw
    }

    fn set_view_rotation(&mut self, pitch_degrees: f32, yaw_degrees: f32) {
        self.counters.view_updates += 1;
        self.view_pitch = pitch_degrees;
        self.view_yaw = yaw_degrees;
    }

    fn release_render_target(&mut self) {
        self.render_target_released = true;
    }
}

/// Wrap to (-180, 180]
fn normalize_degrees(mut degrees: f32) -> f32 {
    degrees = degrees.rem_euclid(360.0);
    if degrees > 180.0 {
        degrees -= 360.0;
    }
    degrees
}
