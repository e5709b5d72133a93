//! The VDIF wire format: legacy/base headers, the registered Extended Data Versions, and
//! the Mark 5B-over-VDIF encapsulation, plus multi-thread frame sets and frame-rate scans.

mod frame;
mod framerate;
mod frameset;
mod header;
mod payload;

pub use frame::VdifFrame;
pub use framerate::frame_rate;
pub use frameset::VdifFrameSet;
pub use header::{Station, VdifHeader, VdifVariant};
pub use payload::VdifPayload;
