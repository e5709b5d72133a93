#![warn(missing_docs)]

//! A Rust library for reading, writing, and decoding Very Long Baseline Interferometry
//! (VLBI) baseband data recorded in two related wire formats: **Mark 5B** and **VDIF**
//! (the VLBI Data Interchange Format), including VDIF's Extended Data Versions and the
//! "Mark 5B-over-VDIF" encapsulation (EDV `0xAB`).
//!
//! The crate is a pure, synchronous codec: give it a byte stream (typically a file) and
//! get back typed frames with the correct sample geometry and an absolute timestamp; give
//! it frames and get back bytes. It does not open files, run an event loop, or talk to a
//! socket — see [`mark5b`] and [`vdif`] for the two wire formats, and [`codec`] for the
//! payload bit-level codec they share.
//!
//! Three pieces underpin both formats:
//!
//! - [`fields`]: a declarative, mergeable table of named bit fields over a fixed-size
//!   `u32` word vector, used to build every header variant.
//! - [`time`]: VDIF reference-epoch timekeeping and Mark 5B BCD timestamp conversion.
//! - [`codec`]: lookup-table sample expansion and bitwise track reordering for 1- and
//!   2-bit tracked baseband payloads.
//!
//! Correlation, dedispersion, folding, RFI detection, and network transport are outside
//! this crate's scope; it only reads and writes the wire formats themselves.

pub mod bcd;
pub mod codec;
pub mod error;
pub mod fields;
pub mod mark5b;
pub mod time;
pub mod vdif;
pub mod words;

pub use error::{Result, VdifError};
