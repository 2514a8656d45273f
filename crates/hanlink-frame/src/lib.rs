//! Frame assembly, validation and decoding for meter HAN telegrams.
//!
//! This is the core of hanlink. A device profile describes one meter's
//! frame format:
//! - A header marker and identifier line for stream synchronization
//! - A fixed total frame length
//! - A trailer marker followed by a 4-digit CRC-16 in hex
//! - A tag table mapping each reading field to its tag and value width
//!
//! Everything here is sans-IO: chunks and the current time go in, frames,
//! readings and errors come out.

pub mod assembler;
pub mod checksum;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod profile;
pub mod reading;
pub mod sample;
pub mod tag;

pub use assembler::{FrameAssembler, DEFAULT_ASSEMBLY_TIMEOUT};
pub use checksum::{crc16, render_checksum, validate, CHECKSUM_DIGITS};
pub use codec::{encode_frame, locate_frame, Frame};
pub use decoder::decode;
pub use error::{FrameError, ProfileError, Result};
pub use profile::{DeviceProfile, DEFAULT_FRAME_LENGTH, DEFAULT_IDENTIFIER};
pub use reading::Reading;
pub use sample::SAMPLE_FRAME;
pub use tag::{DecodeKind, Field, TagSpec, TagTable, TIMESTAMP_WIDTH};
