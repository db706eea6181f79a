//! Error types for the RfRaw grammar

use thiserror::Error;

/// RfRaw parsing and assembly error types
#[derive(Error, Debug)]
pub enum RfRawError {
    #[error("Malformed capture: {msg}")]
    MalformedCapture { msg: String },

    #[error("Protocol error: {0}")]
    Protocol(#[from] somfy_protocol::ProtocolError),
}

/// Result type for RfRaw operations
pub type Result<T> = std::result::Result<T, RfRawError>;
