//! Gathering VDIF frames that share a `frame_nr` across threads into a [`VdifFrameSet`].

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Result, VdifError};
use crate::vdif::frame::{skip_payload, VdifFrame};
use crate::vdif::header::VdifHeader;
use crate::vdif::payload::VdifPayload;

/// All VDIF frames sharing a single `frame_nr`, typically one per thread.
///
/// Carries `header0`, the first frame's header, as the canonical stream descriptor (per
/// spec.md section 3.1) — `VdifFrameSet::contains` is checked against it, resolving the
/// `self.header[0]` vs `self.header0` bug spec.md's Open Questions flags in the Python
/// original's `__contains__`.
#[derive(Debug, Clone, PartialEq)]
pub struct VdifFrameSet {
    header0: VdifHeader,
    frames: Vec<VdifFrame>,
}

impl VdifFrameSet {
    /// The first frame's header: the canonical descriptor for this frame set's stream.
    pub fn header0(&self) -> &VdifHeader {
        &self.header0
    }

    /// The frames collected into this set, in whatever order `from_reader` left them.
    pub fn frames(&self) -> &[VdifFrame] {
        &self.frames
    }

    /// Whether `header0` defines the named raw field.
    pub fn contains(&self, name: &str) -> bool {
        self.header0.contains(name)
    }

    /// Gather one `frame_nr`'s worth of frames from a seekable reader.
    ///
    /// `thread_ids`: if non-empty, only frames whose `thread_id` is listed are kept (others
    /// have their payload skipped unread); if empty, every thread is kept. `sort`: if true,
    /// the collected frames are ordered by `thread_id` ascending.
    ///
    /// Implements the scan in spec.md section 4.7: read a first header and remember its
    /// `frame_nr`; keep reading header+payload pairs until either the next header's
    /// `frame_nr` differs (in which case the reader is rewound by that header's size, so the
    /// next call starts exactly at it) or the stream ends. If fewer frames were collected
    /// than `thread_ids` requested and that shortfall was caused by running out of threads
    /// rather than hitting EOF, [`VdifError::IncompleteFrameSet`] is raised instead.
    pub fn from_reader<R: Read + Seek>(reader: &mut R, thread_ids: &[u16], sort: bool) -> Result<Self> {
        let header0 = VdifHeader::from_reader(reader)?;
        let frame_nr0 = header0.get_u64("frame_nr")?;
        let mut frames = Vec::new();
        let mut current = Some(header0.clone());
        let mut hit_eof = false;

        loop {
            let header = match current.take() {
                Some(h) => h,
                None => break,
            };
            let thread_id = header.get_u64("thread_id")? as u16;
            let keep = thread_ids.is_empty() || thread_ids.contains(&thread_id);
            let payloadsize = header.payloadsize()?;
            if keep {
                let payload = VdifPayload::from_reader(reader, payloadsize)?;
                let frame = VdifFrame { header, payload };
                frame.verify()?;
                frames.push(frame);
            } else {
                skip_payload(reader, payloadsize)?;
            }

            match VdifHeader::from_reader(reader) {
                Ok(next) => {
                    if next.get_u64("frame_nr")? != frame_nr0 {
                        let rewind = next.variant().header_size() as i64;
                        reader.seek(SeekFrom::Current(-rewind)).map_err(VdifError::Io)?;
                        break;
                    }
                    current = Some(next);
                }
                Err(VdifError::EndOfStream) | Err(VdifError::ShortRead { .. }) => {
                    reader.seek(SeekFrom::End(0)).map_err(VdifError::Io)?;
                    hit_eof = true;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        if sort {
            frames.sort_by_key(|f| f.header.get_u64("thread_id").unwrap_or(0));
        }

        if !thread_ids.is_empty() && frames.len() < thread_ids.len() {
            if hit_eof {
                return Err(VdifError::EndOfStream);
            }
            return Err(VdifError::IncompleteFrameSet { got: frames.len(), expected: thread_ids.len() });
        }

        Ok(Self { header0, frames })
    }

    /// Decode every frame's payload: `threads x samples x channels`.
    pub fn data(&self) -> Result<Vec<Vec<Vec<f32>>>> {
        self.frames.iter().map(|f| f.data()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdif::header::VdifVariant;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn values_for(thread_id: u64, frame_nr: u64) -> HashMap<&'static str, u64> {
        let mut values = HashMap::new();
        for (name, value) in [
            ("ref_epoch", 28u64),
            ("seconds", 0),
            ("frame_nr", frame_nr),
            ("vdif_version", 0),
            ("lg2_nchan", 0),
            ("frame_length", 5),
            ("complex_data", 0),
            ("bits_per_sample", 1),
            ("thread_id", thread_id),
            ("station_id", 0),
        ] {
            values.insert(name, value);
        }
        values
    }

    fn frame_bytes(thread_id: u64, frame_nr: u64) -> Vec<u8> {
        let header = VdifHeader::from_keys(VdifVariant::Base, &values_for(thread_id, frame_nr)).unwrap();
        let mut bytes = header.to_bytes();
        bytes.extend(vec![thread_id as u8; header.payloadsize().unwrap()]);
        bytes
    }

    #[test]
    fn gathers_all_threads_sharing_a_frame_nr() {
        let mut bytes = Vec::new();
        for t in [2u64, 0, 1] {
            bytes.extend(frame_bytes(t, 0));
        }
        bytes.extend(frame_bytes(0, 1)); // next frame_nr, should stop the scan
        let mut cursor = Cursor::new(bytes);
        let set = VdifFrameSet::from_reader(&mut cursor, &[], true).unwrap();
        assert_eq!(set.frames().len(), 3);
        let ids: Vec<u64> = set.frames().iter().map(|f| f.header.get_u64("thread_id").unwrap()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(cursor.position(), (frame_bytes(0, 0).len() * 3) as u64);
    }

    #[test]
    fn thread_id_filter_skips_other_threads() {
        let mut bytes = Vec::new();
        for t in [0u64, 1, 2] {
            bytes.extend(frame_bytes(t, 0));
        }
        let mut cursor = Cursor::new(bytes);
        let set = VdifFrameSet::from_reader(&mut cursor, &[0, 2], false).unwrap();
        assert_eq!(set.frames().len(), 2);
        let ids: Vec<u64> = set.frames().iter().map(|f| f.header.get_u64("thread_id").unwrap()).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn fewer_threads_than_requested_without_eof_is_incomplete() {
        let mut bytes = Vec::new();
        bytes.extend(frame_bytes(0, 0));
        bytes.extend(frame_bytes(1, 1)); // different frame_nr ends the scan before thread 2 arrives
        let mut cursor = Cursor::new(bytes);
        let err = VdifFrameSet::from_reader(&mut cursor, &[0, 1, 2], false).unwrap_err();
        assert!(matches!(err, VdifError::IncompleteFrameSet { got: 1, expected: 3 }));
    }

    #[test]
    fn eof_before_enough_threads_propagates_end_of_stream() {
        let bytes = frame_bytes(0, 0);
        let mut cursor = Cursor::new(bytes);
        let err = VdifFrameSet::from_reader(&mut cursor, &[0, 1], false).unwrap_err();
        assert!(matches!(err, VdifError::EndOfStream));
    }

    #[test]
    fn contains_checks_header0() {
        let bytes = frame_bytes(0, 0);
        let mut cursor = Cursor::new(bytes);
        let set = VdifFrameSet::from_reader(&mut cursor, &[], false).unwrap();
        assert!(set.contains("thread_id"));
        assert!(!set.contains("das_id_lo"));
    }
}
