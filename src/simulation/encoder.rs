//! Frame compression

use crate::core::types::RawFrame;
use crate::error::{Error, Result};
use image::ExtendedColorType;
use image::codecs::jpeg;

/// Compresses raw RGB24 frames for the wire
pub trait FrameEncoder: Send {
    fn encode(&mut self, frame: &RawFrame) -> Result<Vec<u8>>;
}

/// Baseline JPEG encoder
#[derive(Debug, Clone)]
pub struct JpegEncoder {
    quality: u8,
    /// Reused output buffer capacity from the previous frame
    last_len: usize,
}

impl JpegEncoder {
    /// Quality is clamped to 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            last_len: 0,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl FrameEncoder for JpegEncoder {
    fn encode(&mut self, frame: &RawFrame) -> Result<Vec<u8>> {
        if frame.width == 0 || frame.height == 0 {
            return Err(Error::Capture(format!(
                "empty frame {}x{}",
                frame.width, frame.height
            )));
        }
        if frame.pixels.len() != frame.expected_len() {
            return Err(Error::Capture(format!(
                "pixel buffer is {} bytes, expected {} for {}x{} RGB",
                frame.pixels.len(),
                frame.expected_len(),
                frame.width,
                frame.height
            )));
        }

        let mut out = Vec::with_capacity(self.last_len);
        jpeg::JpegEncoder::new_with_quality(&mut out, self.quality).encode(
            &frame.pixels,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )?;
        self.last_len = out.len();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RawFrame {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 4) as u8, (y * 4) as u8, 128]);
            }
        }
        RawFrame::new(width, height, pixels)
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(JpegEncoder::new(0).quality(), 1);
        assert_eq!(JpegEncoder::new(255).quality(), 100);
        assert_eq!(JpegEncoder::new(75).quality(), 75);
    }

    #[test]
    fn test_encode_produces_decodable_jpeg() {
        let mut encoder = JpegEncoder::new(90);
        let bytes = encoder.encode(&gradient(32, 16)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 16);
    }

    #[test]
    fn test_wrong_pixel_len_rejected() {
        let mut encoder = JpegEncoder::new(90);
        let frame = RawFrame::new(4, 4, vec![0; 10]);
        assert!(matches!(encoder.encode(&frame), Err(Error::Capture(_))));
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let frame = gradient(64, 64);
        let high = JpegEncoder::new(100).encode(&frame).unwrap();
        let low = JpegEncoder::new(10).encode(&frame).unwrap();
        assert!(low.len() < high.len());
    }
}
