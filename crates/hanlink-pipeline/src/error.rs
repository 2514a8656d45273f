use std::fmt;
use std::time::Duration;

use hanlink_frame::FrameError;
use hanlink_source::SourceError;
use serde::Serialize;

const PREVIEW_LIMIT: usize = 64;

/// Tag of an error reported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The byte source could not be opened.
    OpenFailure,
    /// A partial frame was discarded after the assembly timeout.
    FrameTimeout,
    /// A frame failed checksum validation.
    ChecksumMismatch,
    /// A validated frame could not be decoded.
    DecodeFailure,
    /// The byte source reported a fault.
    SourceFault,
    /// Nothing arrived within the watchdog timeout.
    WatchdogTimeout,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OpenFailure => "open_failure",
            ErrorKind::FrameTimeout => "frame_timeout",
            ErrorKind::ChecksumMismatch => "checksum_mismatch",
            ErrorKind::DecodeFailure => "decode_failure",
            ErrorKind::SourceFault => "source_fault",
            ErrorKind::WatchdogTimeout => "watchdog_timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error event: a tag plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub message: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn open_failure(err: &SourceError) -> Self {
        Self::new(ErrorKind::OpenFailure, err.to_string())
    }

    pub fn source_fault(err: &SourceError) -> Self {
        Self::new(ErrorKind::SourceFault, err.to_string())
    }

    pub fn watchdog_timeout(timeout: Duration) -> Self {
        Self::new(
            ErrorKind::WatchdogTimeout,
            format!("no data received for {timeout:?}, reconnecting"),
        )
    }
}

impl From<FrameError> for PipelineError {
    fn from(err: FrameError) -> Self {
        let kind = if err.is_checksum() {
            ErrorKind::ChecksumMismatch
        } else if err.is_decode() {
            ErrorKind::DecodeFailure
        } else {
            ErrorKind::FrameTimeout
        };

        let message = match &err {
            FrameError::Timeout { discarded, .. } => {
                format!("{err}: {:?}", preview(discarded))
            }
            _ => err.to_string(),
        };
        Self::new(kind, message)
    }
}

/// Lossy text preview of discarded bytes for diagnostics.
fn preview(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(PREVIEW_LIMIT)];
    let mut text = String::from_utf8_lossy(shown).into_owned();
    if bytes.len() > PREVIEW_LIMIT {
        text.push_str("...");
    }
    text
}

pub type Result<T> = std::result::Result<T, PipelineError>;
