//! Error types for stepviz-demo.

use thiserror::Error;

/// Result type for demo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the demo.
#[derive(Debug, Error)]
pub enum Error {
    /// The playback engine rejected an operation.
    #[error("playback error: {0}")]
    Engine(#[from] stepviz_core::Error),

    /// Report serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid command-line argument.
    #[error("invalid argument {name}: {value:?}")]
    InvalidArgument { name: &'static str, value: String },
}
