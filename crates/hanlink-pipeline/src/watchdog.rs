use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

/// Default silence tolerated before reconnecting: 11 s.
pub const DEFAULT_WATCHDOG_TIMEOUT: Duration = Duration::from_millis(11_000);

/// Connection state of the byte source as seen by the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// Not open and not trying to open.
    Idle,
    /// An open is in progress.
    Opening,
    /// Open and waiting for data; the watchdog is armed.
    Waiting,
    /// A close is in progress before reopening.
    Reconnecting,
    /// Shut down for good.
    Stopped,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkState::Idle => "idle",
            LinkState::Opening => "opening",
            LinkState::Waiting => "waiting",
            LinkState::Reconnecting => "reconnecting",
            LinkState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Reconnect state machine driven by explicit instants.
///
/// At most one reconnect is in flight: once a timeout or link loss moves
/// the machine to [`LinkState::Reconnecting`], further timeouts and faults
/// are ignored until the close completes and the source is open again.
#[derive(Debug)]
pub struct Watchdog {
    timeout: Duration,
    state: LinkState,
    deadline: Option<Instant>,
    reconnects: u64,
}

impl Watchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: LinkState::Idle,
            deadline: None,
            reconnects: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// When the watchdog fires next, if it is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of reconnects started so far.
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Start opening the source. Returns `false` if the machine is not idle.
    pub fn begin_open(&mut self) -> bool {
        if self.state != LinkState::Idle {
            debug!(state = %self.state, "open requested outside idle state");
            return false;
        }
        self.state = LinkState::Opening;
        true
    }

    /// The source is open: arm the watchdog.
    pub fn opened(&mut self, now: Instant) {
        if self.state != LinkState::Opening {
            return;
        }
        self.state = LinkState::Waiting;
        self.deadline = Some(now + self.timeout);
        debug!(timeout = ?self.timeout, "watchdog armed");
    }

    pub fn open_failed(&mut self) {
        if self.state == LinkState::Opening {
            self.state = LinkState::Idle;
        }
    }

    /// Data arrived: push the deadline out by a full timeout.
    pub fn activity(&mut self, now: Instant) {
        if self.state == LinkState::Waiting {
            self.deadline = Some(now + self.timeout);
        }
    }

    /// Check the deadline. Returns `true` when a reconnect must start now.
    pub fn poll(&mut self, now: Instant) -> bool {
        match (self.state, self.deadline) {
            (LinkState::Waiting, Some(deadline)) if now >= deadline => {
                warn!(timeout = ?self.timeout, "no data received, reconnecting");
                self.start_reconnect();
                true
            }
            _ => false,
        }
    }

    /// The source reported a lost link. Returns `true` when a reconnect must start now.
    pub fn link_lost(&mut self) -> bool {
        if self.state != LinkState::Waiting {
            return false;
        }
        self.start_reconnect();
        true
    }

    /// The source finished closing; it may be opened again.
    pub fn close_completed(&mut self) {
        if self.state == LinkState::Reconnecting {
            self.state = LinkState::Idle;
        }
    }

    pub fn shutdown(&mut self) {
        self.state = LinkState::Stopped;
        self.deadline = None;
    }

    fn start_reconnect(&mut self) {
        self.state = LinkState::Reconnecting;
        self.deadline = None;
        self.reconnects += 1;
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_WATCHDOG_TIMEOUT)
    }
}
