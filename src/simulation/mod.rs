//! Tick-side work: motion application, capture pacing and frame encoding

pub mod capture;
pub mod encoder;
pub mod tick;

pub use capture::CaptureGate;
pub use encoder::{FrameEncoder, JpegEncoder};
pub use tick::{SimulationTick, TickReport, TickStats};
