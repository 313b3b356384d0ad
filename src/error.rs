//! Error types for SimLink

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// SimLink error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (socket bind, accept, read, write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Configuration serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Image encoder failure
    #[error("Encode error: {0}")]
    Encode(#[from] image::ImageError),

    /// Render-to-buffer or pixel readback failed for one frame
    #[error("Capture error: {0}")]
    Capture(String),

    /// Host has no render source; capture cannot ever succeed
    #[error("No render source available")]
    RenderSourceUnavailable,

    /// Payload does not fit the 4-byte length prefix (or exceeds the reader limit)
    #[error("Frame too large: {len} bytes (limit {limit})")]
    FrameTooLarge {
        /// Payload length
        len: usize,
        /// Largest accepted length
        limit: usize,
    },

    /// Background thread could not be spawned
    #[error("Failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        /// Thread name
        name: &'static str,
        /// Underlying OS error
        source: std::io::Error,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for I/O errors that just mean the peer went away.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::Io(e) => crate::streaming::connection::is_disconnect(e),
            _ => false,
        }
    }
}
