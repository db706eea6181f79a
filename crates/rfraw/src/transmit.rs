//! B0 transmit-command assembly
//!
//! The bridge firmware accepts a raw pulse-train command of the form
//! `RfRaw AA B0 <len> <body> 55`: repeat count and bucket table,
//! fourteen hardware-sync tokens, one software-sync token, the long
//! token carrying the sync tail into the payload, the Manchester
//! payload, a closing short token and the `4` terminator. The length
//! byte is half the hex-digit count of the body with spaces removed.

use tracing::debug;

use crate::{Result, RfRawError};

/// Buckets carried in a transmit command.
pub const TRANSMIT_BUCKETS: usize = 5;

/// Hardware-sync token repetitions in the preamble.
const HW_SYNC_REPEATS: usize = 14;

/// Terminator token closing the pulse stream.
const TERMINATOR: char = '4';

/// Calibrated single-digit timing tokens from one remote's profile.
#[derive(Debug, Clone)]
pub struct SyncTokens {
    pub hw_sync: String,
    pub sw_sync: String,
    pub long: String,
    pub short: String,
}

/// Assemble a complete B0 command string.
///
/// `payload` is the Manchester-encoded bit stream produced with the
/// same long/short tokens.
pub fn build_raw_command(
    repeat: u8,
    buckets: &[u32],
    tokens: &SyncTokens,
    payload: &str,
) -> Result<String> {
    if buckets.len() != TRANSMIT_BUCKETS {
        return Err(RfRawError::MalformedCapture {
            msg: format!(
                "transmit command needs {} buckets, got {}",
                TRANSMIT_BUCKETS,
                buckets.len()
            ),
        });
    }

    let body = format!(
        "05 {:02X} {:04X} {:04X} {:04X} {:04X} {:04X} {}{}{}{}{}{}",
        repeat,
        buckets[0],
        buckets[1],
        buckets[2],
        buckets[3],
        buckets[4],
        tokens.hw_sync.repeat(HW_SYNC_REPEATS),
        tokens.sw_sync,
        tokens.long,
        payload,
        tokens.short,
        TERMINATOR,
    );
    let len = body.chars().filter(|c| !c.is_whitespace()).count() / 2;
    let command = format!("RfRaw AA B0 {:02X} {} 55", len, body);
    debug!(len, "assembled B0 command");
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Capture;
    use quickcheck_macros::quickcheck;
    use somfy_protocol::manchester;
    use somfy_protocol::prelude::*;

    const BUCKETS: [u32; 5] = [0x9E2, 0x12CA, 0x4F6, 0x28A, 0x6AE0];

    fn canonical_tokens() -> SyncTokens {
        SyncTokens {
            hw_sync: "0".to_string(),
            sw_sync: "1".to_string(),
            long: "2".to_string(),
            short: "3".to_string(),
        }
    }

    #[test]
    fn test_command_layout() {
        let cmd = build_raw_command(1, &BUCKETS, &canonical_tokens(), "2332").unwrap();
        // Body: "05 01 09E2 12CA 04F6 028A 6AE0" + 14x"0" + "1" + "2"
        // + payload + "3" + "4" = 24 + 14 + 8 = 46 digits -> len 0x17.
        assert_eq!(
            cmd,
            "RfRaw AA B0 17 05 01 09E2 12CA 04F6 028A 6AE0 0000000000000012233234 55"
        );
    }

    #[test]
    fn test_length_byte_counts_half_digits() {
        let cmd = build_raw_command(3, &BUCKETS, &canonical_tokens(), "33").unwrap();
        let tokens: Vec<&str> = cmd.split_whitespace().collect();
        let len = usize::from_str_radix(tokens[3], 16).unwrap();
        let digits: usize = tokens[4..tokens.len() - 1].iter().map(|t| t.len()).sum();
        assert_eq!(len, digits / 2);
    }

    #[test]
    fn test_rejects_wrong_bucket_count() {
        assert!(matches!(
            build_raw_command(1, &BUCKETS[..4], &canonical_tokens(), "33"),
            Err(RfRawError::MalformedCapture { .. })
        ));
    }

    #[quickcheck]
    fn prop_length_byte_is_half_the_body_digits(repeat: u8, bits: Vec<bool>) -> bool {
        let payload: String = bits.iter().map(|&b| if b { '2' } else { '3' }).collect();
        let cmd = build_raw_command(repeat, &BUCKETS, &canonical_tokens(), &payload).unwrap();

        let tokens: Vec<&str> = cmd.split_whitespace().collect();
        let len = usize::from_str_radix(tokens[3], 16).unwrap();
        let digits: usize = tokens[4..tokens.len() - 1].iter().map(|t| t.len()).sum();
        cmd.starts_with("RfRaw AA B0 ") && cmd.ends_with(" 55") && len == digits / 2
    }

    #[test]
    fn test_generated_command_decodes_back() {
        // Full encode path: frame -> obfuscate -> bits -> Manchester
        // -> B0 body; then re-read the pulse stream as a capture.
        let mut frame = SomfyFrame::build(Command::Up, 5, 0xC0FFEE);
        let plain = frame;
        frame.obfuscate();

        let bits = manchester::frame_bits(frame.to_bits());
        let payload = manchester::encode(&bits, "2", "3").unwrap();
        let cmd = build_raw_command(1, &BUCKETS, &canonical_tokens(), &payload).unwrap();

        // Pulse stream is everything after the bucket table.
        let tokens: Vec<&str> = cmd.split_whitespace().collect();
        let stream = tokens[11];
        let b1 = format!(
            "AA B1 5 {:04X} {:04X} {:04X} {:04X} {:04X} {} 55",
            BUCKETS[0], BUCKETS[1], BUCKETS[2], BUCKETS[3], BUCKETS[4], stream
        );
        let decoded = Capture::parse(&b1).unwrap().decode().unwrap();
        assert_eq!(decoded, plain);
        assert!(decoded.checksum_valid());
        assert_eq!(decoded.rolling_code(), 5);
        assert_eq!(decoded.device_id(), 0xC0FFEE);
    }
}
