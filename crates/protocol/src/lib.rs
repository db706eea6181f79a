//! Somfy Protocol - RTS frame codec
//!
//! This crate provides the Somfy RTS codec core: pulse-duration
//! classification, Manchester decoding/encoding, the frame sync state
//! machine, and the 7-byte frame with its checksum and obfuscation.

pub mod error;
pub mod frame;
pub mod manchester;
pub mod pulse;
pub mod sync;

pub use error::{ProtocolError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        error::{ProtocolError, Result},
        frame::{Command, SomfyFrame},
        manchester::{ManchesterDecoder, FRAME_BITS},
        pulse::{classify, BucketTable, PulseRole},
        sync::{extract_frame, FrameSync, SyncState},
    };
}
