use std::sync::Arc;
use std::time::Instant;

use hanlink_frame::{decode, validate, DeviceProfile, Frame, FrameAssembler, FrameError};
use hanlink_source::SourceError;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::sink::{PipelineEvent, ReadingSink};
use crate::watchdog::{LinkState, Watchdog};

/// What the driver must do after feeding an input to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    /// Close the source, then reopen it.
    Reconnect,
    /// The source has no further input. Close it and stop.
    Stop,
}

/// Counters kept over the life of a pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub chunks: u64,
    pub bytes: u64,
    pub frames: u64,
    pub readings: u64,
    pub checksum_mismatches: u64,
    pub decode_failures: u64,
    pub frame_timeouts: u64,
    pub source_faults: u64,
    pub reconnects: u64,
}

/// Frame assembly, validation, decoding and watchdog supervision in one
/// state machine.
///
/// The pipeline performs no I/O and reads no clock. A driver such as
/// [`run`](crate::run) feeds it chunks, faults and timer expiries together
/// with the current instant and acts on the returned [`Directive`]. All
/// inputs go through `&mut self`, so a timer expiry and a chunk can never be
/// handled concurrently.
#[derive(Debug)]
pub struct Pipeline<K> {
    profile: Arc<DeviceProfile>,
    assembler: FrameAssembler,
    watchdog: Watchdog,
    sink: K,
    stats: PipelineStats,
}

impl<K: ReadingSink> Pipeline<K> {
    pub fn new(config: PipelineConfig, sink: K) -> Self {
        let assembler =
            FrameAssembler::with_timeout(config.profile.clone(), config.assembly_timeout);
        Self {
            profile: config.profile,
            assembler,
            watchdog: Watchdog::new(config.watchdog_timeout),
            sink,
            stats: PipelineStats::default(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.watchdog.state()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Bytes of the partial frame currently held.
    pub fn buffered(&self) -> usize {
        self.assembler.buffered()
    }

    /// The earliest instant at which [`poll_timers`](Self::poll_timers) has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.assembler.deadline(), self.watchdog.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Start an open. Returns `false` if the pipeline is not idle.
    pub fn begin_open(&mut self) -> bool {
        self.watchdog.begin_open()
    }

    pub fn open_succeeded(&mut self, now: Instant) {
        self.watchdog.opened(now);
        info!("source open, waiting for frames");
    }

    /// Report a failed open and return the emitted error.
    pub fn open_failed(&mut self, err: &SourceError) -> PipelineError {
        self.watchdog.open_failed();
        let event = PipelineError::open_failure(err);
        warn!(error = %err, "failed to open source");
        self.sink.emit(PipelineEvent::Error(event.clone()));
        event
    }

    /// Feed one chunk read from the source.
    ///
    /// Every frame completed by the chunk is validated and decoded in order;
    /// each produces exactly one event.
    pub fn handle_chunk(&mut self, chunk: &[u8], now: Instant) {
        self.stats.chunks += 1;
        self.stats.bytes += chunk.len() as u64;
        self.watchdog.activity(now);

        if let Some(err) = self.assembler.poll_timeout(now) {
            self.report_frame_error(err);
        }

        let mut next = self.assembler.ingest(chunk, now);
        while let Some(frame) = next {
            self.process_frame(&frame, now);
            next = self.assembler.next_frame(now);
        }
    }

    /// Report a source fault. A lost link starts a reconnect; an exhausted
    /// capture stops the pipeline without an error event.
    pub fn handle_fault(&mut self, err: &SourceError) -> Directive {
        if err.is_terminal() {
            let dropped = self.assembler.reset();
            info!(dropped, "end of input");
            return Directive::Stop;
        }

        self.stats.source_faults += 1;
        warn!(error = %err, "source fault");
        self.sink
            .emit(PipelineEvent::Error(PipelineError::source_fault(err)));

        if err.is_link_lost() && self.watchdog.link_lost() {
            self.begin_reconnect();
            return Directive::Reconnect;
        }
        Directive::Continue
    }

    /// Fire whichever timers have expired at `now`.
    pub fn poll_timers(&mut self, now: Instant) -> Directive {
        if let Some(err) = self.assembler.poll_timeout(now) {
            self.report_frame_error(err);
        }

        if self.watchdog.poll(now) {
            self.sink.emit(PipelineEvent::Error(PipelineError::watchdog_timeout(
                self.watchdog.timeout(),
            )));
            self.begin_reconnect();
            return Directive::Reconnect;
        }
        Directive::Continue
    }

    /// The source finished closing after a [`Directive::Reconnect`].
    pub fn close_completed(&mut self) {
        self.watchdog.close_completed();
    }

    pub fn shutdown(&mut self) {
        self.watchdog.shutdown();
        self.assembler.reset();
        info!(
            frames = self.stats.frames,
            readings = self.stats.readings,
            reconnects = self.stats.reconnects,
            "pipeline stopped"
        );
    }

    fn process_frame(&mut self, frame: &Frame, now: Instant) {
        self.stats.frames += 1;
        let bytes = frame.as_bytes();
        let result = validate(bytes, &self.profile).and_then(|()| decode(bytes, &self.profile));

        match result {
            Ok(reading) => {
                self.watchdog.activity(now);
                self.stats.readings += 1;
                debug!(timestamp = %reading.timestamp, "reading decoded");
                self.sink.emit(PipelineEvent::Reading(reading));
            }
            Err(err) => self.report_frame_error(err),
        }
    }

    fn report_frame_error(&mut self, err: FrameError) {
        if err.is_checksum() {
            self.stats.checksum_mismatches += 1;
        } else if err.is_decode() {
            self.stats.decode_failures += 1;
        } else {
            self.stats.frame_timeouts += 1;
        }
        warn!(error = %err, "frame rejected");
        self.sink.emit(PipelineEvent::Error(err.into()));
    }

    fn begin_reconnect(&mut self) {
        self.stats.reconnects = self.watchdog.reconnects();
        let dropped = self.assembler.reset();
        if dropped > 0 {
            debug!(dropped, "partial frame dropped for reconnect");
        }
    }
}
