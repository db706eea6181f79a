//! Somfy RfRaw - Sonoff RF bridge raw pulse-train grammar
//!
//! This crate parses sniffed B1 capture strings and assembles B0
//! transmit commands, bridging the bridge's wire grammar and the
//! `somfy-protocol` codec.

pub mod capture;
pub mod error;
pub mod transmit;

pub use error::{Result, RfRawError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        capture::Capture,
        error::{Result, RfRawError},
        transmit::{build_raw_command, SyncTokens},
    };
}
