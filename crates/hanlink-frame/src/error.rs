use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;

use crate::tag::Field;

/// Errors that can occur while assembling, validating or decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The header marker is not present in the frame.
    #[error("header marker not found")]
    MissingHeader,

    /// No trailer marker (or fewer than four checksum digits) after the header.
    #[error("trailer marker or checksum digits not found")]
    MissingTrailer,

    /// The transmitted checksum differs from the one computed over the frame.
    #[error("checksum mismatch (transmitted {transmitted}, computed {computed})")]
    ChecksumMismatch {
        transmitted: String,
        computed: String,
    },

    /// A tag required by the tag table does not occur in the frame.
    #[error("tag '{tag}' not found")]
    MissingTag { tag: String },

    /// The value window for a tag runs past the end of the frame.
    #[error("value for tag '{tag}' is truncated")]
    TruncatedValue { tag: String },

    /// The value window for a tag is not a decimal number.
    #[error("invalid number '{window}' for tag '{tag}'")]
    InvalidNumber { tag: String, window: String },

    /// The timestamp window is not a valid meter time.
    #[error("invalid timestamp '{window}': {reason}")]
    InvalidTimestamp { window: String, reason: String },

    /// The tag table has no entry for a reading field.
    #[error("no value decoded for field '{}'", .0.name())]
    MissingField(Field),

    /// A partial frame was discarded because it did not complete in time.
    #[error("partial frame discarded after {timeout:?} ({} bytes)", .discarded.len())]
    Timeout { timeout: Duration, discarded: Bytes },
}

impl FrameError {
    /// Whether this error comes from checksum validation.
    pub fn is_checksum(&self) -> bool {
        matches!(
            self,
            FrameError::MissingHeader
                | FrameError::MissingTrailer
                | FrameError::ChecksumMismatch { .. }
        )
    }

    /// Whether this error comes from field decoding.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            FrameError::MissingTag { .. }
                | FrameError::TruncatedValue { .. }
                | FrameError::InvalidNumber { .. }
                | FrameError::InvalidTimestamp { .. }
                | FrameError::MissingField(_)
        )
    }
}

/// Errors that can occur while loading or checking a device profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The profile file could not be read.
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The profile is not valid JSON for this schema.
    #[error("invalid profile json: {0}")]
    Json(#[from] serde_json::Error),

    /// The profile parsed but is not usable.
    #[error("invalid profile: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, FrameError>;
