//! Core data types shared between the tick and the streaming threads.
//!
//! Key types:
//! - [`Vec3`]: frame-local or world-space vector (x = right, y = up, z = forward)
//! - [`RawFrame`]: uncompressed RGB24 pixels handed back by the render host
//! - [`EncodedFrame`]: compressed frame bytes plus publish order

use std::ops::{Add, Neg};
use std::sync::Arc;

/// Three-component vector in the host's left-handed, y-up convention
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    /// Local forward axis
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);
    /// Local right axis
    pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Multiply every component by `factor`
    #[inline]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Euclidean length
    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Rotate about the vertical axis by `degrees`, clockwise seen from above.
    ///
    /// With this convention a body at yaw θ faces `(sin θ, 0, cos θ)` and its
    /// right-hand side is `(cos θ, 0, -sin θ)`.
    pub fn rotated_about_y(self, degrees: f32) -> Self {
        if degrees == 0.0 {
            return self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(
            self.x * cos + self.z * sin,
            self.y,
            -self.x * sin + self.z * cos,
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Uncompressed frame read back from the render host
///
/// Pixels are tightly packed RGB24 rows, top row first.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawFrame {
    /// Bytes per pixel for RGB24
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Buffer length this frame's dimensions require
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * Self::BYTES_PER_PIXEL
    }
}

/// Compressed frame ready for the wire
///
/// `sequence` is assigned by the frame buffer at publish time and increases
/// by one per publish, so consumers can tell frames apart and detect skips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub sequence: u64,
    pub data: Arc<[u8]>,
}

impl EncodedFrame {
    pub fn new(sequence: u64, data: Vec<u8>) -> Self {
        Self {
            sequence,
            data: data.into(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
