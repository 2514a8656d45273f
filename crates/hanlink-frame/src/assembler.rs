use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::codec::{locate_frame, Frame};
use crate::error::FrameError;
use crate::profile::DeviceProfile;

/// Default time a partial frame may take to complete: 2 s.
pub const DEFAULT_ASSEMBLY_TIMEOUT: Duration = Duration::from_millis(2000);

const INITIAL_BUFFER_CAPACITY: usize = 2 * 1024;

/// Accumulates chunks until a complete frame of the profile is present.
///
/// The assembler does no I/O and reads no clock: callers pass `now` in and
/// ask for [`deadline`](Self::deadline) to know when to call
/// [`poll_timeout`](Self::poll_timeout) next.
#[derive(Debug)]
pub struct FrameAssembler {
    profile: Arc<DeviceProfile>,
    timeout: Duration,
    buf: BytesMut,
    deadline: Option<Instant>,
}

impl FrameAssembler {
    /// Create an assembler with the default assembly timeout.
    pub fn new(profile: Arc<DeviceProfile>) -> Self {
        Self::with_timeout(profile, DEFAULT_ASSEMBLY_TIMEOUT)
    }

    /// Create an assembler with an explicit assembly timeout.
    pub fn with_timeout(profile: Arc<DeviceProfile>, timeout: Duration) -> Self {
        Self {
            profile,
            timeout,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            deadline: None,
        }
    }

    /// Append a chunk and extract a frame if one is now complete.
    ///
    /// The assembly timer is armed by the first append after the buffer was
    /// cleared. Call [`next_frame`](Self::next_frame) afterwards until it
    /// returns `None` to drain further frames delivered in the same chunk.
    pub fn ingest(&mut self, chunk: &[u8], now: Instant) -> Option<Frame> {
        if !chunk.is_empty() {
            if self.buf.is_empty() {
                self.deadline = Some(now + self.timeout);
                debug!(timeout = ?self.timeout, "assembly timer armed");
            }
            self.buf.extend_from_slice(chunk);
        }
        self.next_frame(now)
    }

    /// Extract the next complete frame from bytes already buffered.
    ///
    /// Bytes before the frame are dropped with it; bytes after it start a
    /// new buffer with a freshly armed timer.
    pub fn next_frame(&mut self, now: Instant) -> Option<Frame> {
        let start = locate_frame(&self.buf, &self.profile)?;
        if start > 0 {
            debug!(skipped = start, "dropping bytes before frame header");
        }
        self.buf.advance(start);
        let frame = self.buf.split_to(self.profile.frame_length).freeze();

        if self.buf.is_empty() {
            self.deadline = None;
        } else {
            self.deadline = Some(now + self.timeout);
            debug!(retained = self.buf.len(), "bytes after frame kept for next assembly");
        }
        Some(Frame::new(frame))
    }

    /// Discard the buffer if the assembly deadline has passed.
    ///
    /// Returns [`FrameError::Timeout`] carrying the discarded bytes.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<FrameError> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                let discarded = self.buf.split().freeze();
                debug!(size = discarded.len(), "assembly timeout, buffer cleared");
                Some(FrameError::Timeout {
                    timeout: self.timeout,
                    discarded,
                })
            }
            _ => None,
        }
    }

    /// When the current partial frame expires, if one is being assembled.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame without reporting it. Returns the discarded size.
    pub fn reset(&mut self) -> usize {
        let size = self.buf.len();
        self.buf.clear();
        self.deadline = None;
        size
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SAMPLE_FRAME;

    fn assembler() -> FrameAssembler {
        FrameAssembler::new(Arc::new(DeviceProfile::default()))
    }

    #[test]
    fn whole_frame_in_one_chunk() {
        let mut asm = assembler();
        let now = Instant::now();

        let frame = asm.ingest(SAMPLE_FRAME, now).unwrap();
        assert_eq!(frame.as_bytes(), SAMPLE_FRAME);
        assert_eq!(asm.buffered(), 0);
        assert!(asm.deadline().is_none());
    }

    #[test]
    fn frame_split_across_chunks() {
        let mut asm = assembler();
        let now = Instant::now();

        for chunk in SAMPLE_FRAME[..700].chunks(64) {
            assert!(asm.ingest(chunk, now).is_none());
        }
        assert_eq!(asm.deadline(), Some(now + DEFAULT_ASSEMBLY_TIMEOUT));

        let frame = asm.ingest(&SAMPLE_FRAME[700..], now).unwrap();
        assert_eq!(frame.len(), SAMPLE_FRAME.len());
        assert!(asm.deadline().is_none());
    }

    #[test]
    fn timer_armed_by_first_append_only() {
        let mut asm = assembler();
        let start = Instant::now();

        asm.ingest(&SAMPLE_FRAME[..10], start);
        asm.ingest(&SAMPLE_FRAME[10..20], start + Duration::from_millis(1500));
        assert_eq!(asm.deadline(), Some(start + DEFAULT_ASSEMBLY_TIMEOUT));
    }

    #[test]
    fn empty_chunk_does_not_arm_timer() {
        let mut asm = assembler();
        assert!(asm.ingest(&[], Instant::now()).is_none());
        assert!(asm.deadline().is_none());
    }

    #[test]
    fn timeout_discards_partial_frame() {
        let mut asm = assembler();
        let start = Instant::now();
        asm.ingest(&SAMPLE_FRAME[..300], start);

        assert!(asm
            .poll_timeout(start + Duration::from_millis(1999))
            .is_none());
        let err = asm.poll_timeout(start + DEFAULT_ASSEMBLY_TIMEOUT).unwrap();
        match err {
            FrameError::Timeout { discarded, .. } => {
                assert_eq!(discarded.as_ref(), &SAMPLE_FRAME[..300]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(asm.buffered(), 0);
        assert!(asm.poll_timeout(start + Duration::from_secs(10)).is_none());

        let later = start + Duration::from_secs(3);
        assert!(asm.ingest(SAMPLE_FRAME, later).is_some());
    }

    #[test]
    fn garbage_prefix_is_retained_until_timeout() {
        let mut asm = assembler();
        let now = Instant::now();
        asm.ingest(b"\r\n\x00garbage without header", now);
        assert_eq!(asm.buffered(), 25);
        assert!(asm.deadline().is_some());
    }

    #[test]
    fn garbage_prefix_dropped_with_frame() {
        let mut asm = assembler();
        let now = Instant::now();
        asm.ingest(b"1.7*A)\r\n!ABCD\r\n", now);
        let frame = asm.ingest(SAMPLE_FRAME, now).unwrap();
        assert_eq!(frame.as_bytes(), SAMPLE_FRAME);
        assert_eq!(asm.buffered(), 0);
    }

    #[test]
    fn unknown_identifier_waits_for_timeout() {
        let mut asm = assembler();
        let now = Instant::now();
        let mut foreign = SAMPLE_FRAME.to_vec();
        foreign[1..4].copy_from_slice(b"KFM");

        assert!(asm.ingest(&foreign, now).is_none());
        assert_eq!(asm.buffered(), foreign.len());
        assert!(asm.poll_timeout(now + DEFAULT_ASSEMBLY_TIMEOUT).is_some());
    }

    #[test]
    fn two_frames_in_one_chunk() {
        let mut asm = assembler();
        let now = Instant::now();
        let mut wire = SAMPLE_FRAME.to_vec();
        wire.extend_from_slice(SAMPLE_FRAME);

        let first = asm.ingest(&wire, now).unwrap();
        let second = asm.next_frame(now).unwrap();
        assert_eq!(first, second);
        assert!(asm.next_frame(now).is_none());
        assert_eq!(asm.buffered(), 0);
    }

    #[test]
    fn remainder_starts_new_assembly() {
        let mut asm = assembler();
        let now = Instant::now();
        let later = now + Duration::from_millis(500);
        let mut wire = SAMPLE_FRAME.to_vec();
        wire.extend_from_slice(&SAMPLE_FRAME[..100]);

        asm.ingest(&wire, later).unwrap();
        assert_eq!(asm.buffered(), 100);
        assert_eq!(asm.deadline(), Some(later + DEFAULT_ASSEMBLY_TIMEOUT));
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut asm = assembler();
        asm.ingest(&SAMPLE_FRAME[..50], Instant::now());
        assert_eq!(asm.reset(), 50);
        assert_eq!(asm.buffered(), 0);
        assert!(asm.deadline().is_none());
    }
}
