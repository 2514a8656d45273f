use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// Anything that can feed raw meter bytes into a pipeline.
///
/// A source is opened once, read until it faults or the caller closes it,
/// and may be reopened afterwards. `read_chunk` must be cancel safe: the
/// pipeline races it against its timers and drops the future when a timer
/// wins, so no bytes may be lost when that happens.
pub trait ByteSource: Send {
    /// Open (or reopen) the underlying link.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the link. Calling this on a closed source is a no-op.
    ///
    /// The underlying handle must be released before the returned future
    /// completes, so a following `open` never runs alongside it.
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Wait for the next chunk of bytes.
    ///
    /// End of stream is reported as [`SourceError::Closed`](crate::SourceError::Closed),
    /// the end of a finite capture as [`SourceError::Exhausted`](crate::SourceError::Exhausted).
    fn read_chunk(&mut self) -> impl Future<Output = Result<Bytes>> + Send;

    /// Human-readable description of the link for logs.
    fn describe(&self) -> String;
}
