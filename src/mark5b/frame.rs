//! A Mark 5B frame: one header immediately followed by its payload.

use std::io::{Read, Write};

use crate::error::{Result, VdifError};
use crate::mark5b::header::Mark5bHeader;
use crate::mark5b::payload::Mark5bPayload;

/// An owned Mark 5B header + payload pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark5bFrame {
    /// This frame's header.
    pub header: Mark5bHeader,
    /// This frame's payload.
    pub payload: Mark5bPayload,
}

impl Mark5bFrame {
    /// Read a header then its payload from a blocking reader.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let header = Mark5bHeader::from_reader(reader)?;
        let payload = Mark5bPayload::from_reader(reader)?;
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
        if self.payload.as_bytes().len() != self.header.payloadsize() {
            return Err(VdifError::ShapeMismatch {
                reason: format!("header payloadsize is {} but payload is {} bytes", self.header.payloadsize(), self.payload.as_bytes().len()),
            });
        }
        Ok(())
    }

    /// Decode this frame's payload into samples, via the header's fixed layout.
    pub fn data(&self) -> Result<Vec<[f32; 8]>> {
        self.payload.decode()
    }
}
