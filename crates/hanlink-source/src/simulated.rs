use std::time::Duration;

use bytes::Bytes;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{Result, SourceError};
use crate::traits::ByteSource;

/// Default emission interval for the simulator: 10 s.
pub const DEFAULT_SIM_INTERVAL: Duration = Duration::from_secs(10);

/// Source that replays one canned frame at a fixed interval.
///
/// Each frame arrives as a single chunk, one interval after `open` and then
/// once per interval, exactly as a meter pushing the same bytes would.
#[derive(Debug)]
pub struct SimulatedSource {
    frame: Bytes,
    interval: Duration,
    ticker: Option<Interval>,
}

impl SimulatedSource {
    /// Create a simulator emitting `frame` every [`DEFAULT_SIM_INTERVAL`].
    pub fn new(frame: impl Into<Bytes>) -> Self {
        Self::with_interval(frame, DEFAULT_SIM_INTERVAL)
    }

    /// Create a simulator with an explicit interval.
    pub fn with_interval(frame: impl Into<Bytes>, interval: Duration) -> Self {
        Self {
            frame: frame.into(),
            interval,
            ticker: None,
        }
    }

    /// Emission interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl ByteSource for SimulatedSource {
    async fn open(&mut self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(SourceError::Open {
                target: self.describe(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "simulation interval must be greater than zero",
                ),
            });
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        info!(interval = ?self.interval, "simulation source opened");
        Ok(())
    }

    async fn close(&mut self) {
        if self.ticker.take().is_some() {
            info!("simulation source closed");
        }
    }

    async fn read_chunk(&mut self) -> Result<Bytes> {
        let ticker = self.ticker.as_mut().ok_or(SourceError::NotOpen)?;
        ticker.tick().await;
        debug!(size = self.frame.len(), "emitting simulated frame");
        Ok(self.frame.clone())
    }

    fn describe(&self) -> String {
        format!("simulator (every {:?})", self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_frame_once_per_interval() {
        let mut source = SimulatedSource::with_interval(&b"frame"[..], Duration::from_millis(500));
        source.open().await.unwrap();

        let start = Instant::now();
        let first = source.read_chunk().await.unwrap();
        assert_eq!(first.as_ref(), b"frame");
        assert_eq!(start.elapsed(), Duration::from_millis(500));

        let _second = source.read_chunk().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn read_after_close_is_not_open() {
        let mut source = SimulatedSource::new(&b"frame"[..]);
        source.open().await.unwrap();
        source.close().await;
        source.close().await;

        let err = source.read_chunk().await.unwrap_err();
        assert!(matches!(err, SourceError::NotOpen));
    }

    #[tokio::test]
    async fn zero_interval_fails_to_open() {
        let mut source = SimulatedSource::with_interval(&b"frame"[..], Duration::ZERO);
        let err = source.open().await.unwrap_err();
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
