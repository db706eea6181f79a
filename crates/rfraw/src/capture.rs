//! B1 capture grammar
//!
//! A sniffed transmission arrives from the bridge as a space-separated
//! line: `AA B1 <bucket-count> <bucket0-hex> ... <nibble-stream> 55`,
//! where each digit of the nibble stream references one bucket for one
//! timing symbol.

use tracing::debug;

use somfy_protocol::prelude::*;

use crate::{Result, RfRawError};

/// One parsed sniffed transmission. Transient: lives for the duration
/// of a single decode.
#[derive(Debug, Clone)]
pub struct Capture {
    buckets: Vec<u32>,
    stream: Vec<u8>,
}

impl Capture {
    /// Parse a B1 capture line.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        Self::from_tokens(&tokens)
    }

    /// Parse an already-tokenized B1 capture (e.g. CLI arguments).
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        if tokens.len() < 5 {
            return Err(RfRawError::MalformedCapture {
                msg: format!("expected at least 5 tokens, got {}", tokens.len()),
            });
        }
        if !tokens[0].eq_ignore_ascii_case("AA") || !tokens[1].eq_ignore_ascii_case("B1") {
            return Err(RfRawError::MalformedCapture {
                msg: format!("expected 'AA B1' markers, got '{} {}'", tokens[0], tokens[1]),
            });
        }

        let count: usize = tokens[2].parse().map_err(|_| RfRawError::MalformedCapture {
            msg: format!("invalid bucket count '{}'", tokens[2]),
        })?;
        if count == 0 || count > 16 {
            return Err(RfRawError::MalformedCapture {
                msg: format!("bucket count {} outside nibble-indexable range", count),
            });
        }
        if tokens.len() < count + 4 {
            return Err(RfRawError::MalformedCapture {
                msg: format!(
                    "declared {} buckets but capture holds {} tokens",
                    count,
                    tokens.len()
                ),
            });
        }

        let mut buckets = Vec::with_capacity(count);
        for (i, token) in tokens[3..3 + count].iter().enumerate() {
            let value = u32::from_str_radix(token, 16).map_err(|_| RfRawError::MalformedCapture {
                msg: format!("bucket {} is not a hex duration: '{}'", i, token),
            })?;
            buckets.push(value);
        }

        let data = tokens[3 + count];
        let mut stream = Vec::with_capacity(data.len());
        for (offset, c) in data.chars().enumerate() {
            let nibble = c.to_digit(16).ok_or_else(|| RfRawError::MalformedCapture {
                msg: format!("non-hex digit '{}' at stream offset {}", c, offset),
            })? as u8;
            if nibble as usize >= count {
                return Err(RfRawError::MalformedCapture {
                    msg: format!(
                        "nibble {:X} at stream offset {} exceeds bucket table of {}",
                        nibble, offset, count
                    ),
                });
            }
            stream.push(nibble);
        }

        debug!(buckets = ?buckets, pulses = stream.len(), "parsed B1 capture");
        Ok(Self { buckets, stream })
    }

    /// Raw bucket durations in capture order.
    pub fn buckets(&self) -> &[u32] {
        &self.buckets
    }

    /// The bucket-index stream, one entry per timing symbol.
    pub fn stream(&self) -> &[u8] {
        &self.stream
    }

    /// Classify the buckets of this capture.
    pub fn bucket_table(&self) -> BucketTable {
        BucketTable::from_durations(&self.buckets)
    }

    /// Run the capture through the full decode pipeline: classify,
    /// sync, Manchester-decode, deobfuscate.
    pub fn decode(&self) -> Result<SomfyFrame> {
        let table = self.bucket_table();
        let bits = extract_frame(&table, &self.stream)?;
        let mut frame = SomfyFrame::from_bits(bits);
        frame.deobfuscate();
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_capture() {
        let capture = Capture::parse("AA B1 5 09E2 12CA 04F6 028A 6AE0 00001233 55").unwrap();
        assert_eq!(capture.buckets(), &[0x9E2, 0x12CA, 0x4F6, 0x28A, 0x6AE0]);
        assert_eq!(capture.stream(), &[0, 0, 0, 0, 1, 2, 3, 3]);
    }

    #[test]
    fn test_parse_rejects_bad_markers() {
        assert!(matches!(
            Capture::parse("AA B0 5 09E2 12CA 04F6 028A 6AE0 0000"),
            Err(RfRawError::MalformedCapture { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_truncated_bucket_list() {
        assert!(matches!(
            Capture::parse("AA B1 5 09E2 12CA 04F6"),
            Err(RfRawError::MalformedCapture { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_out_of_range_nibble() {
        // Stream digit 7 references a bucket past the 5-entry table.
        let err = Capture::parse("AA B1 5 09E2 12CA 04F6 028A 6AE0 00071233 55");
        assert!(matches!(err, Err(RfRawError::MalformedCapture { .. })));
    }

    #[test]
    fn test_parse_rejects_non_hex_bucket() {
        assert!(matches!(
            Capture::parse("AA B1 5 09E2 12CA 04F6 028A XYZ0 0000"),
            Err(RfRawError::MalformedCapture { .. })
        ));
    }

    #[test]
    fn test_decode_no_frame() {
        let capture = Capture::parse("AA B1 5 09E2 12CA 04F6 028A 6AE0 00001233 55").unwrap();
        assert!(matches!(
            capture.decode(),
            Err(RfRawError::Protocol(ProtocolError::NoFrameFound))
        ));
    }
}
