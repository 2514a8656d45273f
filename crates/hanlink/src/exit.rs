use std::fmt;
use std::io;

use hanlink_frame::{FrameError, ProfileError};
use hanlink_pipeline::{ConfigError, ErrorKind, PipelineError};
use hanlink_source::SourceError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::NotConnected => TRANSPORT_ERROR,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn source_error(context: &str, err: SourceError) -> CliError {
    match err {
        SourceError::InvalidTarget(_) => CliError::new(USAGE, format!("{context}: {err}")),
        SourceError::Open { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = if err.is_checksum() || err.is_decode() {
        DATA_INVALID
    } else if matches!(err, FrameError::Timeout { .. }) {
        TIMEOUT
    } else {
        INTERNAL
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn profile_error(context: &str, err: ProfileError) -> CliError {
    match err {
        ProfileError::Io { source, path } => {
            io_error(&format!("{context} ({})", path.display()), source)
        }
        other => CliError::new(USAGE, format!("{context}: {other}")),
    }
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    match err {
        ConfigError::Profile(err) => profile_error(context, err),
        other => CliError::new(USAGE, format!("{context}: {other}")),
    }
}

pub fn pipeline_error(context: &str, err: PipelineError) -> CliError {
    let code = match err.kind {
        ErrorKind::OpenFailure | ErrorKind::SourceFault => TRANSPORT_ERROR,
        ErrorKind::ChecksumMismatch | ErrorKind::DecodeFailure => DATA_INVALID,
        ErrorKind::FrameTimeout | ErrorKind::WatchdogTimeout => TIMEOUT,
    };
    CliError::new(code, format!("{context}: {}", err.message))
}
