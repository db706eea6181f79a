//! Frame synchronization state machine
//!
//! Walks the classified pulse stream of a capture: four hardware-sync
//! pulses, one software-sync pulse, then the Manchester payload up to
//! the inter-frame gap. Any unexpected symbol drops back to `Unknown`
//! and sync hunting restarts; captures usually carry several frame
//! repetitions, so a desync mid-frame is not fatal.

use tracing::debug;

use crate::manchester::{ManchesterDecoder, FRAME_BITS};
use crate::pulse::{BucketTable, PulseRole};
use crate::{ProtocolError, Result};

/// Synchronization states, in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unknown,
    HwSync1,
    HwSync2,
    HwSync3,
    HwSync4,
    SwSync,
    Payload,
    Done,
}

/// Sync state machine driving a [`ManchesterDecoder`] through the
/// payload region of a capture.
#[derive(Debug)]
pub struct FrameSync {
    state: SyncState,
    decoder: ManchesterDecoder,
}

impl FrameSync {
    pub fn new() -> Self {
        Self {
            state: SyncState::Unknown,
            decoder: ManchesterDecoder::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Feed one classified pulse.
    ///
    /// Returns the decoded frame value once the inter-frame gap closes
    /// a payload, or `MalformedCapture` if the completed run is not a
    /// 56-bit frame. Desyncs are recovered internally.
    pub fn feed(&mut self, role: PulseRole) -> Result<Option<u64>> {
        use SyncState::*;

        self.state = match (self.state, role) {
            // Hardware sync advances one step from wherever we are; a
            // preamble longer than four pulses starts the hunt over.
            (Unknown, PulseRole::HardwareSync) => HwSync1,
            (HwSync1, PulseRole::HardwareSync) => HwSync2,
            (HwSync2, PulseRole::HardwareSync) => HwSync3,
            (HwSync3, PulseRole::HardwareSync) => HwSync4,
            (_, PulseRole::HardwareSync) => Unknown,

            (HwSync4, PulseRole::SoftwareSync) => SwSync,

            // The sync tail carries the leading half of the first
            // payload bit, hence the asymmetric decoder seeding.
            (SwSync, PulseRole::Long) => {
                self.decoder.start(1, true);
                Payload
            }
            (SwSync, PulseRole::Short) => {
                self.decoder.start(0, false);
                Payload
            }

            (Payload, PulseRole::Short) => {
                self.decoder.on_short_pulse();
                Payload
            }
            (Payload, PulseRole::Long) => {
                if self.decoder.on_long_pulse() {
                    Payload
                } else {
                    debug!("desync inside payload, restarting sync hunt");
                    Unknown
                }
            }
            (Payload, PulseRole::InterFrameGap) => {
                let (value, count) = self.decoder.finish();
                if count != FRAME_BITS {
                    return Err(ProtocolError::MalformedCapture {
                        msg: format!("frame completed with {} bits, expected {}", count, FRAME_BITS),
                    });
                }
                self.state = Done;
                return Ok(Some(value));
            }

            (Done, _) => Done,
            _ => Unknown,
        };
        Ok(None)
    }
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a whole capture's bucket-index stream through the state
/// machine and return the first complete frame value.
///
/// Nibbles referencing buckets outside the table are malformed;
/// a capture that never completes a frame is `NoFrameFound`.
pub fn extract_frame(table: &BucketTable, stream: &[u8]) -> Result<u64> {
    let mut sync = FrameSync::new();
    for (offset, &nibble) in stream.iter().enumerate() {
        let role = table
            .role(nibble as usize)
            .ok_or_else(|| ProtocolError::MalformedCapture {
                msg: format!(
                    "nibble {:X} at offset {} exceeds bucket table of {}",
                    nibble,
                    offset,
                    table.len()
                ),
            })?;
        if let Some(value) = sync.feed(role)? {
            debug!(bits = %format!("{:014X}", value), "frame acquired");
            return Ok(value);
        }
    }
    Err(ProtocolError::NoFrameFound)
}
