//! Render host implementations

pub mod mock;

pub use mock::MockHost;
