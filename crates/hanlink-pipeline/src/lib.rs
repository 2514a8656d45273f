//! Watchdog-supervised pipeline from a meter byte source to decoded readings.
//!
//! [`Pipeline`] is a sans-IO state machine: it assembles frames, validates
//! and decodes them, and tracks the link with a [`Watchdog`]. [`run`] drives
//! it from any [`ByteSource`](hanlink_source::ByteSource) on a tokio runtime,
//! reconnecting when the meter goes silent or the link drops.
//!
//! Every chunk of input ends in events delivered to a [`ReadingSink`]: one
//! [`Reading`](hanlink_frame::Reading) per good frame, one tagged
//! [`PipelineError`] per failure.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod sink;
pub mod watchdog;

pub use config::{ConfigError, PipelineConfig};
pub use error::{ErrorKind, PipelineError, Result};
pub use pipeline::{Directive, Pipeline, PipelineStats};
pub use runner::run;
pub use sink::{PipelineEvent, ReadingSink};
pub use watchdog::{LinkState, Watchdog, DEFAULT_WATCHDOG_TIMEOUT};
