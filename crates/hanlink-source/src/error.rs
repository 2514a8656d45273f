use std::io::ErrorKind;

/// Errors that can occur while opening or reading a byte source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Failed to open the configured target.
    #[error("failed to open {target}: {source}")]
    Open {
        target: String,
        source: std::io::Error,
    },

    /// The target string could not be understood.
    #[error("invalid source target '{0}'")]
    InvalidTarget(String),

    /// A read was attempted before `open` succeeded (or after `close`).
    #[error("source is not open")]
    NotOpen,

    /// An I/O error occurred while reading from an open source.
    #[error("source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote end closed the stream.
    #[error("source closed (end of stream)")]
    Closed,

    /// A capture file has been read to the end.
    #[error("end of capture reached")]
    Exhausted,
}

impl SourceError {
    /// Whether this fault means the underlying link is gone and must be reopened.
    pub fn is_link_lost(&self) -> bool {
        match self {
            SourceError::Closed | SourceError::NotOpen => true,
            SourceError::Io(err) => matches!(
                err.kind(),
                ErrorKind::BrokenPipe
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotConnected
                    | ErrorKind::UnexpectedEof
            ),
            SourceError::Open { .. } | SourceError::InvalidTarget(_) | SourceError::Exhausted => {
                false
            }
        }
    }

    /// Whether the source has no further input and reading should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SourceError::Exhausted)
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_stream_is_link_loss() {
        assert!(SourceError::Closed.is_link_lost());
        assert!(SourceError::Io(std::io::Error::from(ErrorKind::ConnectionReset)).is_link_lost());
    }

    #[test]
    fn exhausted_capture_is_terminal_not_link_loss() {
        assert!(SourceError::Exhausted.is_terminal());
        assert!(!SourceError::Exhausted.is_link_lost());
        assert!(!SourceError::Closed.is_terminal());
    }

    #[test]
    fn transient_io_is_not_link_loss() {
        assert!(!SourceError::Io(std::io::Error::from(ErrorKind::Interrupted)).is_link_lost());
        assert!(!SourceError::InvalidTarget("x".into()).is_link_lost());
    }
}
