//! Mark 5B payload: a fixed 10,000-byte block, 8 channels of 2-bit samples at fan-out 4.

use std::io::Read;

use crate::codec;
use crate::error::Result;
use crate::mark5b::header::{read_exact_or_eof, PAYLOAD_SIZE};

/// Raw Mark 5B payload bytes, decodable to an 8-channel, 2-bit sample array.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark5bPayload {
    bytes: Vec<u8>,
}

impl Mark5bPayload {
    /// Wrap exactly [`PAYLOAD_SIZE`] bytes of raw payload.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != PAYLOAD_SIZE {
            return Err(crate::error::VdifError::ShapeMismatch {
                reason: format!("Mark 5B payload must be {PAYLOAD_SIZE} bytes, got {}", bytes.len()),
            });
        }
        Ok(Self { bytes })
    }

    /// Read a payload from a blocking reader.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = vec![0u8; PAYLOAD_SIZE];
        read_exact_or_eof(reader, &mut buf)?;
        Self::from_bytes(buf)
    }

    /// Encode a sample-major `[sample][channel]` array into a payload.
    pub fn from_samples(samples: &[[f32; 8]]) -> Result<Self> {
        let rows: Vec<Vec<f32>> = samples.iter().map(|row| row.to_vec()).collect();
        Self::from_bytes(codec::encode(8, 2, 4, &rows)?)
    }

    /// Decode this payload into an 5000-sample × 8-channel array.
    pub fn decode(&self) -> Result<Vec<[f32; 8]>> {
        codec::decode_8chan_2bit_fanout4(&self.bytes)
    }

    /// The raw, still-packed payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
