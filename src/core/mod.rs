//! Core types, the render host seam, and shutdown coordination

pub mod host;
pub mod shutdown;
pub mod types;

pub use host::RenderHost;
pub use shutdown::ShutdownSignal;
pub use types::{EncodedFrame, RawFrame, Vec3};
