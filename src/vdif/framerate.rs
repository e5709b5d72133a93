//! Frame-rate inference: scan a stream to count frames per second for a thread.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Result, VdifError};
use crate::vdif::frame::skip_payload;
use crate::vdif::header::VdifHeader;

/// Infer the number of VDIF frames per second by scanning from the start of `reader`.
///
/// Implements spec.md section 4.8: the stream must start at `frame_nr == 0`; this then
/// skips payloads (decoding none of them) while tracking the largest `frame_nr` seen for
/// `thread_id` (or every thread, if `None`) until `frame_nr` wraps back to 0, at which point
/// the `seconds` field is expected to have advanced by exactly one — a disagreement is a
/// soft [`VdifError`]-free warning (logged, not raised), matching the spec's
/// [`VdifError`]-less `ClockSkew` kind.
pub fn frame_rate<R: Read + Seek>(reader: &mut R, thread_id: Option<u16>) -> Result<u32> {
    reader.seek(SeekFrom::Start(0)).map_err(VdifError::Io)?;
    let mut header = VdifHeader::from_reader(reader)?;
    if header.get_u64("frame_nr")? != 0 {
        return Err(VdifError::ShapeMismatch { reason: "stream must start at frame_nr 0 to infer frame rate".into() });
    }
    let start_seconds = header.get_u64("seconds")?;

    let matches_thread = |h: &VdifHeader| -> Result<bool> {
        match thread_id {
            None => Ok(true),
            Some(t) => Ok(h.get_u64("thread_id")? as u16 == t),
        }
    };

    skip_payload(reader, header.payloadsize()?)?;
    let mut max_frame: u64 = 0;
    loop {
        header = VdifHeader::from_reader(reader)?;
        let payloadsize = header.payloadsize()?;
        if matches_thread(&header)? {
            let frame_nr = header.get_u64("frame_nr")?;
            if frame_nr == 0 {
                let seconds = header.get_u64("seconds")?;
                if seconds != start_seconds + 1 {
                    tracing::warn!(expected = start_seconds + 1, got = seconds, "frame_rate: seconds field did not advance by exactly 1 between frame_nr wraps");
                }
                break;
            }
            max_frame = max_frame.max(frame_nr);
        }
        skip_payload(reader, payloadsize)?;
    }
    Ok((max_frame + 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdif::header::VdifVariant;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn frame_bytes(frame_nr: u64, seconds: u64) -> Vec<u8> {
        let mut values = HashMap::new();
        for (name, value) in [
            ("ref_epoch", 28u64),
            ("seconds", seconds),
            ("frame_nr", frame_nr),
            ("vdif_version", 0),
            ("lg2_nchan", 0),
            ("frame_length", 5),
            ("complex_data", 0),
            ("bits_per_sample", 1),
            ("thread_id", 0),
            ("station_id", 0),
        ] {
            values.insert(name, value);
        }
        let header = VdifHeader::from_keys(VdifVariant::Base, &values).unwrap();
        let mut bytes = header.to_bytes();
        bytes.extend(vec![0u8; header.payloadsize().unwrap()]);
        bytes
    }

    #[test]
    fn infers_rate_from_a_clean_wrap() {
        let mut bytes = Vec::new();
        for fnr in 0..4u64 {
            bytes.extend(frame_bytes(fnr, 100));
        }
        bytes.extend(frame_bytes(0, 101));
        let mut cursor = Cursor::new(bytes);
        assert_eq!(frame_rate(&mut cursor, None).unwrap(), 4);
    }

    #[test]
    fn requires_stream_to_start_at_frame_nr_zero() {
        let bytes = frame_bytes(1, 100);
        let mut cursor = Cursor::new(bytes);
        let err = frame_rate(&mut cursor, None).unwrap_err();
        assert!(matches!(err, VdifError::ShapeMismatch { .. }));
    }
}
