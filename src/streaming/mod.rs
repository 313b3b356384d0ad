//! TCP channels and the shared buffers between them and the tick

pub mod command_channel;
pub mod connection;
pub mod frame_buffer;
pub mod frame_server;
pub mod status_queue;
pub mod status_server;
pub mod wire;

pub use command_channel::{CommandChannel, SharedCommand};
pub use connection::ConnectionSlot;
pub use frame_buffer::{FrameBuffer, FrameBufferStats, RetentionPolicy};
pub use frame_server::FrameStreamServer;
pub use status_queue::StatusQueue;
pub use status_server::{SIMULATION_FAILURE, SIMULATION_SUCCESS, StatusNotifier, StatusServer};
