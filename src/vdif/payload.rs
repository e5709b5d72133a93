//! VDIF payload: raw packed bytes, decoded against a header-derived `(nchan, bps, fanout)`
//! layout via the shared [`crate::codec`] registry.

use std::io::Read;

use crate::codec;
use crate::error::{Result, VdifError};
use crate::vdif::header::{read_exact_or_eof, VdifHeader};

/// Raw VDIF payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdifPayload {
    bytes: Vec<u8>,
}

impl VdifPayload {
    /// Wrap payload bytes as-is; no size check, since that depends on the owning header.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Read exactly `size` bytes of payload from a blocking reader.
    pub fn from_reader<R: Read>(reader: &mut R, size: usize) -> Result<Self> {
        let mut buf = vec![0u8; size];
        read_exact_or_eof(reader, &mut buf)?;
        Ok(Self { bytes: buf })
    }

    /// Encode a sample-major `[sample][channel]` array into a payload, dispatching to the
    /// codec registered for `header`'s `(nchan, bps, fanout)`.
    pub fn from_samples(samples: &[Vec<f32>], header: &VdifHeader) -> Result<Self> {
        let nchan = header.nchan()?;
        let bps = header.bps()?;
        let bytes = codec::encode(nchan, bps, header.fanout(), samples)?;
        Ok(Self { bytes })
    }

    /// Decode this payload against `header`'s `(nchan, bps, fanout)` layout.
    pub fn decode(&self, header: &VdifHeader) -> Result<Vec<Vec<f32>>> {
        let nchan = header.nchan()?;
        let bps = header.bps()?;
        codec::decode(nchan, bps, header.fanout(), &self.bytes)
    }

    /// The raw, still-packed payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in this payload.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Check this payload's length against `header.payloadsize()`.
    pub fn verify(&self, header: &VdifHeader) -> Result<()> {
        let expected = header.payloadsize()?;
        if self.bytes.len() != expected {
            return Err(VdifError::ShapeMismatch { reason: format!("header payloadsize is {expected} but payload is {} bytes", self.bytes.len()) });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdif::header::VdifVariant;
    use std::collections::HashMap;

    fn mark5b_over_vdif_header() -> VdifHeader {
        let mut values = HashMap::new();
        for (name, value) in [
            ("ref_epoch", 28u64),
            ("seconds", 0),
            ("frame_nr", 0),
            ("vdif_version", 0),
            ("lg2_nchan", 3),
            ("frame_length", 1254),
            ("complex_data", 0),
            ("bits_per_sample", 1),
            ("thread_id", 0),
            ("station_id", 0),
            ("m5b_bcd_jday", 0x821),
            ("m5b_bcd_seconds", 0x19801),
        ] {
            values.insert(name, value);
        }
        VdifHeader::from_keys(VdifVariant::Mark5bOverVdif, &values).unwrap()
    }

    #[test]
    fn encode_then_decode_round_trips_through_header_layout() {
        let header = mark5b_over_vdif_header();
        let samples: Vec<Vec<f32>> = (0..5000).map(|i| (0..8).map(|c| if (i + c) % 2 == 0 { 1.0 } else { -1.0 }).collect()).collect();
        let payload = VdifPayload::from_samples(&samples, &header).unwrap();
        payload.verify(&header).unwrap();
        assert_eq!(payload.decode(&header).unwrap(), samples);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let header = mark5b_over_vdif_header();
        let payload = VdifPayload::from_bytes(vec![0u8; 10]);
        let err = payload.verify(&header).unwrap_err();
        assert!(matches!(err, VdifError::ShapeMismatch { .. }));
    }
}
