//! The error type shared by every reader, writer, header, and codec in this crate.

use thiserror::Error;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, VdifError>;

/// Everything that can go wrong when parsing, verifying, or encoding VLBI baseband data.
#[derive(Debug, Error)]
pub enum VdifError {
    /// The underlying reader/writer returned fewer bytes than requested, or failed outright.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read came up short of a full header or payload, distinct from a clean EOF at a frame boundary.
    #[error("short read: expected {expected} bytes, got {got}")]
    ShortRead {
        /// Number of bytes the caller asked for.
        expected: usize,
        /// Number of bytes actually available.
        got: usize,
    },

    /// The stream ended exactly at a frame boundary; there was nothing left to read.
    #[error("end of stream")]
    EndOfStream,

    /// A header's sync pattern did not match the constant its variant requires.
    #[error("bad sync pattern: expected {expected:#x}, got {got:#x}")]
    BadSync {
        /// The sync pattern the variant requires.
        expected: u64,
        /// The sync pattern actually present in the header.
        got: u64,
    },

    /// A value written into a bit field did not fit in the field's width.
    #[error("value {value:#x} does not fit in a {width}-bit field {field:?}")]
    FieldOverflow {
        /// Name of the offending field.
        field: &'static str,
        /// Width of the field, in bits.
        width: u32,
        /// Value the caller tried to write.
        value: u64,
    },

    /// `from_keys` was given an incomplete set of fields, or a field had no default to fall back on.
    #[error("missing value for field {0:?}")]
    MissingValue(&'static str),

    /// A header has no sample rate to derive a frame rate from, but one was needed for a time conversion.
    #[error("cannot derive frame rate for this header; pass one explicitly")]
    MissingFrameRate,

    /// A BCD nibble held a digit greater than 9.
    #[error("invalid BCD digit in nibble {nibble} of value {value:#x}")]
    BadBcd {
        /// The raw value being decoded.
        value: u64,
        /// Index (from the least significant nibble) of the bad digit.
        nibble: u32,
    },

    /// No codec is registered for the requested `(channels, bits_per_sample, fanout)` combination.
    #[error("no codec registered for nchan={nchan}, bps={bps}, fanout={fanout}")]
    UnsupportedLayout {
        /// Channel count requested.
        nchan: u32,
        /// Bits per sample requested.
        bps: u32,
        /// Fan-out factor requested.
        fanout: u32,
    },

    /// A data array's shape disagreed with what the header describes.
    #[error("shape mismatch: {reason}")]
    ShapeMismatch {
        /// Human readable explanation of which dimension disagreed.
        reason: String,
    },

    /// Fewer threads were collected into a `FrameSet` than were requested, without hitting EOF.
    #[error("incomplete frame set: got {got} of {expected} requested threads")]
    IncompleteFrameSet {
        /// Number of threads actually collected.
        got: usize,
        /// Number of threads requested.
        expected: usize,
    },
}

impl VdifError {
    pub(crate) fn short_read(expected: usize, got: usize) -> Self {
        if got == 0 {
            VdifError::EndOfStream
        } else {
            VdifError::ShortRead { expected, got }
        }
    }
}
