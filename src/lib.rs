//! SimLink - TCP bridge between a 3D simulation host and external controllers
//!
//! Three independent TCP channels connect one simulated character to the
//! outside world:
//!
//! - **Command channel (default 5000)**: inbound ASCII movement tokens
//! - **Frame stream (default 5001)**: outbound length-prefixed JPEG frames
//! - **Status channel (default 5002)**: outbound completion notifications
//!
//! The host drives [`SimLinkApp::tick`] from its own loop (or calls
//! [`SimLinkApp::run`]) and implements [`RenderHost`] for the character,
//! camera and renderer.

pub mod app;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod motion;
pub mod simulation;
pub mod streaming;

// Re-export commonly used types
pub use app::SimLinkApp;
pub use config::AppConfig;
pub use crate::core::{RenderHost, ShutdownSignal};
pub use error::{Error, Result};
pub use streaming::StatusNotifier;
