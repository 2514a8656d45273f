//! Read, validate and decode smart meter HAN port telegrams.
//!
//! hanlink turns the byte stream of a meter's HAN port into structured
//! readings, checking every frame's CRC-16 and reconnecting when the meter
//! goes silent.
//!
//! # Crate Structure
//!
//! - [`source`]: byte sources (TCP bridges, Unix sockets, devices, simulator)
//! - [`frame`]: frame assembly, checksum validation and field decoding
//! - [`pipeline`]: watchdog-supervised pipeline and its async runner

/// Re-export source types.
pub mod source {
    pub use hanlink_source::*;
}

/// Re-export frame types.
pub mod frame {
    pub use hanlink_frame::*;
}

/// Re-export pipeline types.
pub mod pipeline {
    pub use hanlink_pipeline::*;
}
