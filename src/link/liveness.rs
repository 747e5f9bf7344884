//! # Liveness Monitor
//!
//! Watchdog that declares the link lost after a bounded silence.
//!
//! The monitor never reads the clock itself; every call takes `now` so the
//! session loop and tests decide what time it is.

use std::time::{Duration, Instant};
use tracing::warn;

/// Default silence allowed before the link is declared lost
pub const DEFAULT_LINK_TIMEOUT: Duration = Duration::from_secs(2);

/// Link state as seen by the watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing sent yet
    Idle,
    /// Frames are arriving within the timeout
    Connected,
    /// Silence exceeded the timeout; terminal for the session
    Lost,
}

/// Tracks the time of the last accepted frame.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    timeout: Duration,
    last_seen: Option<Instant>,
    state: LinkState,
}

impl LivenessMonitor {
    /// Create a monitor in the `Idle` state.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: None,
            state: LinkState::Idle,
        }
    }

    /// Enter `Connected` after the first successful send.
    pub fn start(&mut self, now: Instant) {
        if self.state == LinkState::Idle {
            self.state = LinkState::Connected;
            self.last_seen = Some(now);
        }
    }

    /// Note an accepted inbound frame. Has no effect once the link is lost.
    pub fn record_frame(&mut self, now: Instant) {
        if self.state == LinkState::Connected {
            self.last_seen = Some(now);
        }
    }

    /// Re-evaluate the link at `now`.
    ///
    /// Moves `Connected` to `Lost` once `now - last_seen` exceeds the timeout.
    pub fn check(&mut self, now: Instant) -> LinkState {
        if self.state != LinkState::Connected {
            return self.state;
        }

        if let Some(last) = self.last_seen {
            let silence = now.saturating_duration_since(last);
            if silence > self.timeout {
                warn!("Link silent for {:?} (limit {:?}), declaring it lost", silence, self.timeout);
                self.state = LinkState::Lost;
            }
        }
        self.state
    }

    /// Current state without re-evaluating
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forget the session (for a fresh connection)
    pub fn reset(&mut self) {
        self.last_seen = None;
        self.state = LinkState::Idle;
    }
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TIMEOUT)
    }
}
