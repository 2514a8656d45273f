//! Byte sources for meter HAN ports.
//!
//! Provides one async interface over the places meter bytes come from:
//! - TCP serial bridges (ser2net and friends)
//! - Unix domain sockets
//! - Serial ports, with line settings applied on open
//! - Character devices, FIFOs and capture files
//! - A simulator replaying a canned frame on a timer
//!
//! This is the lowest layer of hanlink. The pipeline only ever talks to the
//! [`ByteSource`] trait defined here.

pub mod error;
pub mod simulated;
pub mod stream;
pub mod traits;

pub use error::{Result, SourceError};
pub use simulated::{SimulatedSource, DEFAULT_SIM_INTERVAL};
pub use stream::{SourceTarget, StreamSource, DEFAULT_BAUD_RATE};
pub use traits::ByteSource;
