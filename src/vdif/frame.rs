//! A VDIF frame: one header immediately followed by its payload.

use std::collections::HashMap;
use std::io::{Read, Seek, Write};

use crate::error::{Result, VdifError};
use crate::mark5b::Mark5bFrame;
use crate::vdif::header::{VdifHeader, VdifVariant};
use crate::vdif::payload::VdifPayload;

/// An owned VDIF header + payload pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VdifFrame {
    /// This frame's header.
    pub header: VdifHeader,
    /// This frame's payload.
    pub payload: VdifPayload,
}

impl VdifFrame {
    /// Read a header then its payload from a seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let header = VdifHeader::from_reader(reader)?;
        let size = header.payloadsize()?;
        let payload = VdifPayload::from_reader(reader, size)?;
        let frame = Self { header, payload };
        frame.verify()?;
        Ok(frame)
    }

    /// Write this frame's header then payload to a blocking writer.
    pub fn to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.header.to_bytes())?;
        writer.write_all(self.payload.as_bytes())?;
        Ok(())
    }

    /// Cross-check header and payload agree on size.
    pub fn verify(&self) -> Result<()> {
        self.header.verify()?;
        self.payload.verify(&self.header)
    }

    /// Decode this frame's payload into samples, via the header's layout.
    pub fn data(&self) -> Result<Vec<Vec<f32>>> {
        self.payload.decode(&self.header)
    }

    /// Build a Mark 5B-over-VDIF (EDV 0xAB) frame embedding `frame`'s header and payload
    /// unchanged: `ref_mjd` resolves the Mark 5B BCD day field's thousand-day ambiguity, the
    /// same way [`crate::mark5b::Mark5bHeader::time`] does. The resulting header's
    /// [`VdifHeader::mark5b_time`] equals `frame.header.time(ref_mjd)`, and the payload bytes
    /// are copied verbatim, per spec.md section 8.4's canonical fixture 6.
    pub fn from_mark5b(frame: &Mark5bFrame, ref_mjd: f64) -> Result<Self> {
        let mut values = HashMap::new();
        // seconds/ref_epoch/m5b_bcd_jday/m5b_bcd_seconds have no field default and are
        // overwritten below by set_mark5b_time; placeholders here just satisfy from_keys.
        values.insert("seconds", 0);
        values.insert("ref_epoch", 0);
        values.insert("m5b_bcd_jday", 0);
        values.insert("m5b_bcd_seconds", 0);
        values.insert("lg2_nchan", (frame.header.nchan().trailing_zeros()) as u64);
        values.insert("complex_data", 0);
        values.insert("bits_per_sample", (frame.header.bps() - 1) as u64);
        values.insert("thread_id", 0);
        values.insert("station_id", frame.header.get_u64("user")? & 0xFFFF);
        values.insert("m5b_user", frame.header.get_u64("user")?);
        values.insert("m5b_internal_tvg", frame.header.get_u64("internal_tvg")?);
        values.insert("m5b_year", frame.header.get_u64("year")?);
        values.insert("m5b_frame_nr", frame.header.get_u64("frame_nr")?);
        values.insert("m5b_crcc", frame.header.get_u64("crcc")?);
        let header = VdifHeader::from_keys(VdifVariant::Mark5bOverVdif, &values)?;
        let header = header.set_mark5b_time(frame.header.time(ref_mjd)?)?;
        let payload = VdifPayload::from_bytes(frame.payload.as_bytes().to_vec());
        let vframe = Self { header, payload };
        vframe.verify()?;
        Ok(vframe)
    }
}

/// Skip a payload of `size` bytes in a seekable reader without decoding it, used by
/// [`crate::vdif::VdifFrameSet::from_reader`] and [`crate::vdif::frame_rate`] to fast-forward
/// past threads/frames that aren't of interest.
pub(crate) fn skip_payload<R: Seek>(reader: &mut R, size: usize) -> Result<()> {
    reader.seek(std::io::SeekFrom::Current(size as i64)).map_err(VdifError::Io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdif::header::VdifVariant;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn fixture_values() -> HashMap<&'static str, u64> {
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
        values
    }

    fn fixture_frame_bytes() -> Vec<u8> {
        let header = VdifHeader::from_keys(VdifVariant::Mark5bOverVdif, &fixture_values()).unwrap();
        let mut bytes = header.to_bytes();
        bytes.extend(vec![0u8; 10_000]);
        bytes
    }

    #[test]
    fn frame_reads_header_then_payload() {
        let mut cursor = Cursor::new(fixture_frame_bytes());
        let frame = VdifFrame::from_reader(&mut cursor).unwrap();
        assert_eq!(frame.header.nchan().unwrap(), 8);
        assert_eq!(frame.data().unwrap().len(), 5000);
    }

    #[test]
    fn read_then_write_round_trips() {
        let bytes = fixture_frame_bytes();
        let mut cursor = Cursor::new(bytes.clone());
        let frame = VdifFrame::from_reader(&mut cursor).unwrap();
        let mut out = Vec::new();
        frame.to_writer(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn short_read_is_end_of_stream() {
        let mut cursor = Cursor::new(vec![0u8; 8]);
        let err = VdifFrame::from_reader(&mut cursor).unwrap_err();
        assert!(matches!(err, VdifError::EndOfStream));
    }

    #[test]
    fn from_mark5b_preserves_time_and_payload() {
        use crate::mark5b::{Mark5bHeader, Mark5bPayload};

        let mut m5b_values = std::collections::HashMap::new();
        for (name, value) in [("user", 3757u64), ("year", 11), ("bcd_jday", 0x821), ("bcd_seconds", 0x19801), ("bcd_fraction", 0x0)] {
            m5b_values.insert(name, value);
        }
        let m5b_header = Mark5bHeader::from_keys(&m5b_values).unwrap();
        let payload_bytes: Vec<u8> = (0..10_000).map(|i| (i % 251) as u8).collect();
        let m5b_payload = Mark5bPayload::from_bytes(payload_bytes).unwrap();
        let m5b_frame = crate::mark5b::Mark5bFrame { header: m5b_header, payload: m5b_payload };

        let ref_mjd = 56809.0;
        let vdif_frame = VdifFrame::from_mark5b(&m5b_frame, ref_mjd).unwrap();

        let m5b_time = m5b_frame.header.time(ref_mjd).unwrap();
        let vdif_time = vdif_frame.header.mark5b_time(ref_mjd).unwrap();
        assert_eq!(m5b_time, vdif_time);
        assert_eq!(vdif_frame.payload.as_bytes(), m5b_frame.payload.as_bytes());
    }
}
