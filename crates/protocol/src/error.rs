//! Error types for the Somfy RTS codec

use thiserror::Error;

/// Codec error types
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("No Somfy frame found in capture")]
    NoFrameFound,

    #[error("Malformed capture: {msg}")]
    MalformedCapture { msg: String },

    #[error("Invalid input: {msg}")]
    InvalidInput { msg: String },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
