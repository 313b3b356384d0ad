//! Command decoding and per-tick motion derivation

pub mod commands;
pub mod intent;
pub mod pitch;

pub use commands::Command;
pub use intent::MotionIntent;
pub use pitch::PitchAccumulator;
