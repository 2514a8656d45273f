use std::time::Instant;

use hanlink_source::ByteSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Result;
use crate::pipeline::{Directive, Pipeline};
use crate::sink::ReadingSink;

/// Drive `pipeline` from `source` until `shutdown` is cancelled or the
/// source runs out of input.
///
/// Reads, timer expiries and shutdown are raced in one task, so the
/// pipeline sees them one at a time. A reconnect closes the source and
/// only then reopens it. If an open fails, the error is emitted to the sink
/// and returned; the pipeline is left idle so the caller may call `run`
/// again.
pub async fn run<S, K>(
    source: &mut S,
    pipeline: &mut Pipeline<K>,
    shutdown: &CancellationToken,
) -> Result<()>
where
    S: ByteSource,
    K: ReadingSink,
{
    info!(source = %source.describe(), "starting pipeline");
    if !open_source(source, pipeline, shutdown).await? {
        pipeline.shutdown();
        return Ok(());
    }

    loop {
        let deadline = pipeline.next_deadline();
        let directive = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            read = source.read_chunk() => match read {
                Ok(chunk) => {
                    pipeline.handle_chunk(&chunk, now());
                    Directive::Continue
                }
                Err(err) => pipeline.handle_fault(&err),
            },
            _ = sleep_until(deadline) => pipeline.poll_timers(now()),
        };

        match directive {
            Directive::Continue => {}
            Directive::Stop => break,
            Directive::Reconnect => {
                debug!("closing source for reconnect");
                source.close().await;
                pipeline.close_completed();
                if !open_source(source, pipeline, shutdown).await? {
                    break;
                }
            }
        }
    }

    source.close().await;
    pipeline.shutdown();
    Ok(())
}

/// Open the source unless shutdown wins first. Returns `false` on shutdown.
async fn open_source<S, K>(
    source: &mut S,
    pipeline: &mut Pipeline<K>,
    shutdown: &CancellationToken,
) -> Result<bool>
where
    S: ByteSource,
    K: ReadingSink,
{
    if !pipeline.begin_open() {
        return Ok(false);
    }

    tokio::select! {
        biased;
        _ = shutdown.cancelled() => Ok(false),
        opened = source.open() => match opened {
            Ok(()) => {
                pipeline.open_succeeded(now());
                Ok(true)
            }
            Err(err) => Err(pipeline.open_failed(&err)),
        },
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use bytes::Bytes;
    use hanlink_frame::SAMPLE_FRAME;
    use hanlink_source::{SimulatedSource, SourceError};
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use crate::config::PipelineConfig;
    use crate::error::ErrorKind;
    use crate::sink::PipelineEvent;
    use crate::watchdog::LinkState;

    enum Step {
        Chunk(&'static [u8]),
        Eof,
        End,
    }

    /// Source replaying steps at fixed offsets from its creation, then going silent.
    struct ScriptedSource {
        start: tokio::time::Instant,
        script: VecDeque<(Duration, Step)>,
        fail_open: bool,
        is_open: bool,
        opens: usize,
        closes: usize,
    }

    impl ScriptedSource {
        fn new(script: Vec<(u64, Step)>) -> Self {
            Self {
                start: tokio::time::Instant::now(),
                script: script
                    .into_iter()
                    .map(|(secs, step)| (Duration::from_secs(secs), step))
                    .collect(),
                fail_open: false,
                is_open: false,
                opens: 0,
                closes: 0,
            }
        }
    }

    impl ByteSource for ScriptedSource {
        async fn open(&mut self) -> hanlink_source::Result<()> {
            self.opens += 1;
            if self.fail_open {
                return Err(SourceError::InvalidTarget("scripted".into()));
            }
            self.is_open = true;
            Ok(())
        }

        async fn close(&mut self) {
            self.closes += 1;
            self.is_open = false;
        }

        async fn read_chunk(&mut self) -> hanlink_source::Result<Bytes> {
            if !self.is_open {
                return Err(SourceError::NotOpen);
            }
            let Some((offset, _)) = self.script.front() else {
                return std::future::pending().await;
            };
            tokio::time::sleep_until(self.start + *offset).await;
            match self.script.pop_front() {
                Some((_, Step::Chunk(bytes))) => Ok(Bytes::from_static(bytes)),
                Some((_, Step::End)) => Err(SourceError::Exhausted),
                Some((_, Step::Eof)) | None => Err(SourceError::Closed),
            }
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn error_kinds(events: &[PipelineEvent]) -> Vec<ErrorKind> {
        events
            .iter()
            .filter_map(|event| event.as_error().map(|err| err.kind))
            .collect()
    }

    fn readings(events: &[PipelineEvent]) -> usize {
        events.iter().filter(|event| event.as_reading().is_some()).count()
    }

    /// Run `source` until `stop_after`, then cancel and hand everything back.
    async fn run_for(
        mut source: ScriptedSource,
        stop_after: Duration,
    ) -> (Result<()>, ScriptedSource, Pipeline<Vec<PipelineEvent>>) {
        let mut pipeline = Pipeline::new(PipelineConfig::default(), Vec::new());
        let token = CancellationToken::new();
        let stopper = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(stop_after).await;
            stopper.cancel();
        });
        let result = run(&mut source, &mut pipeline, &token).await;
        (result, source, pipeline)
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_source_end_to_end() {
        let mut source = SimulatedSource::new(SAMPLE_FRAME);
        let (tx, mut rx) = unbounded_channel();
        let mut pipeline = Pipeline::new(PipelineConfig::default(), tx);
        let token = CancellationToken::new();

        let stopper = token.clone();
        let task = tokio::spawn(async move {
            let result = run(&mut source, &mut pipeline, &stopper).await;
            (result, pipeline)
        });

        for _ in 0..3 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.as_reading().unwrap().voltage_l1, 236.3);
        }
        token.cancel();

        let (result, pipeline) = task.await.unwrap();
        result.unwrap();
        assert_eq!(pipeline.state(), LinkState::Stopped);
        assert_eq!(pipeline.stats().reconnects, 0);
        assert_eq!(pipeline.stats().readings, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_triggers_exactly_one_reconnect() {
        let source = ScriptedSource::new(vec![(1, Step::Chunk(SAMPLE_FRAME))]);
        let (result, source, pipeline) = run_for(source, Duration::from_secs(15)).await;

        result.unwrap();
        let events = pipeline.sink();
        assert_eq!(readings(events), 1);
        assert_eq!(error_kinds(events), vec![ErrorKind::WatchdogTimeout]);
        assert_eq!(source.opens, 2);
        assert_eq!(source.closes, 2);
        assert_eq!(pipeline.stats().reconnects, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn steady_frames_keep_link_up() {
        let script = (1..=6)
            .map(|i| (i * 5, Step::Chunk(SAMPLE_FRAME)))
            .collect();
        let source = ScriptedSource::new(script);
        let (result, source, pipeline) = run_for(source, Duration::from_secs(32)).await;

        result.unwrap();
        assert_eq!(readings(pipeline.sink()), 6);
        assert!(error_kinds(pipeline.sink()).is_empty());
        assert_eq!(source.opens, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_stream_reconnects_immediately() {
        let source = ScriptedSource::new(vec![
            (1, Step::Chunk(SAMPLE_FRAME)),
            (2, Step::Eof),
            (3, Step::Chunk(SAMPLE_FRAME)),
        ]);
        let (result, source, pipeline) = run_for(source, Duration::from_secs(5)).await;

        result.unwrap();
        let events = pipeline.sink();
        assert_eq!(readings(events), 2);
        assert_eq!(error_kinds(events), vec![ErrorKind::SourceFault]);
        assert_eq!(source.opens, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_source_stops_without_reopening() {
        let mut source = ScriptedSource::new(vec![
            (1, Step::Chunk(SAMPLE_FRAME)),
            (2, Step::End),
        ]);
        let mut pipeline = Pipeline::new(PipelineConfig::default(), Vec::<PipelineEvent>::new());
        let token = CancellationToken::new();

        run(&mut source, &mut pipeline, &token).await.unwrap();

        assert_eq!(readings(pipeline.sink()), 1);
        assert!(error_kinds(pipeline.sink()).is_empty());
        assert_eq!(pipeline.state(), LinkState::Stopped);
        assert_eq!(source.opens, 1);
        assert_eq!(source.closes, 1);
        assert!(!token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn partial_frame_times_out_then_recovers() {
        let source = ScriptedSource::new(vec![
            (1, Step::Chunk(&SAMPLE_FRAME[..300])),
            (5, Step::Chunk(SAMPLE_FRAME)),
        ]);
        let (result, _source, pipeline) = run_for(source, Duration::from_secs(6)).await;

        result.unwrap();
        let events = pipeline.sink();
        assert_eq!(error_kinds(events), vec![ErrorKind::FrameTimeout]);
        assert!(events[1].as_reading().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn open_failure_is_returned() {
        let mut source = ScriptedSource::new(Vec::new());
        source.fail_open = true;
        let (result, source, pipeline) = run_for(source, Duration::from_secs(1)).await;

        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::OpenFailure);
        assert_eq!(error_kinds(pipeline.sink()), vec![ErrorKind::OpenFailure]);
        assert_eq!(pipeline.state(), LinkState::Idle);
        assert_eq!(source.opens, 1);
    }
}
