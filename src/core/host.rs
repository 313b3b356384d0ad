//! RenderHost trait definition

use crate::core::types::{RawFrame, Vec3};
use crate::error::Result;

/// Simulation/render host abstraction
///
/// The host owns the character, its camera and the physics. The tick only
/// calls into it; nothing here may block on network I/O.
pub trait RenderHost: Send {
    /// Render the host camera into an offscreen target and read back RGB24 pixels
    ///
    /// Returns [`crate::Error::RenderSourceUnavailable`] if the host has no
    /// camera; any other error is treated as a one-off capture failure.
    fn render_frame(&mut self, width: u32, height: u32) -> Result<RawFrame>;

    /// Move the character by a world-space displacement
    fn move_character(&mut self, displacement: Vec3);

    /// Rotate the character body about the world vertical axis
    fn rotate_character(&mut self, yaw_degrees: f32);

    /// Current body yaw in degrees
    fn character_yaw(&self) -> f32;

    /// Orient the viewpoint only; the body transform is untouched
    fn set_view_rotation(&mut self, pitch_degrees: f32, yaw_degrees: f32);

    /// Release the offscreen render target on shutdown
    fn release_render_target(&mut self) {}
}
