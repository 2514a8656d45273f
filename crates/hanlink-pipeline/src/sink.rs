use hanlink_frame::Reading;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::error::PipelineError;

/// Everything the pipeline reports to its consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// One decoded frame.
    Reading(Reading),
    /// One error, tagged by kind.
    Error(PipelineError),
}

impl PipelineEvent {
    pub fn as_reading(&self) -> Option<&Reading> {
        match self {
            PipelineEvent::Reading(reading) => Some(reading),
            PipelineEvent::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&PipelineError> {
        match self {
            PipelineEvent::Error(err) => Some(err),
            PipelineEvent::Reading(_) => None,
        }
    }
}

/// Receiver of pipeline events (a broker publisher, a printer, a test).
pub trait ReadingSink {
    fn emit(&mut self, event: PipelineEvent);
}

/// Collects events in memory.
impl ReadingSink for Vec<PipelineEvent> {
    fn emit(&mut self, event: PipelineEvent) {
        self.push(event);
    }
}

/// Forwards events to another task. Events are dropped once the receiver is gone.
impl ReadingSink for UnboundedSender<PipelineEvent> {
    fn emit(&mut self, event: PipelineEvent) {
        if self.send(event).is_err() {
            debug!("event receiver dropped, discarding event");
        }
    }
}

impl<T: ReadingSink + ?Sized> ReadingSink for &mut T {
    fn emit(&mut self, event: PipelineEvent) {
        (**self).emit(event);
    }
}

#[cfg(test)]
mod tests {
    use hanlink_frame::{decode, DeviceProfile, SAMPLE_FRAME};

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn reading_event_json_is_flat() {
        let reading = decode(SAMPLE_FRAME, &DeviceProfile::default()).unwrap();
        let json = serde_json::to_value(PipelineEvent::Reading(reading)).unwrap();
        assert_eq!(json["event"], "reading");
        assert_eq!(json["active_import_total"], 5996.149);
    }

    #[test]
    fn error_event_json_has_kind_and_message() {
        let event = PipelineEvent::Error(PipelineError::new(ErrorKind::DecodeFailure, "boom"));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "error");
        assert_eq!(json["kind"], "decode_failure");
        assert_eq!(json["message"], "boom");
    }

    #[tokio::test]
    async fn channel_sink_forwards_events() {
        let (mut tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.emit(PipelineEvent::Error(PipelineError::new(
            ErrorKind::SourceFault,
            "x",
        )));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.as_error().unwrap().kind, ErrorKind::SourceFault);

        drop(rx);
        tx.emit(PipelineEvent::Error(PipelineError::new(
            ErrorKind::SourceFault,
            "dropped",
        )));
    }
}
