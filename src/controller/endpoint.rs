//! # Controller Endpoint
//!
//! Host side of the exchange. Every sensor frame that arrives is answered
//! with exactly one command frame; the controller never free-runs a send
//! timer. A separate periodic tick samples input and checks liveness.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::intent::{ControlIntent, Decide, Flow};
use crate::error::Result;
use crate::link::{LinkState, LinkStats, LivenessMonitor, SessionEnd, SessionReport};
use crate::wire::decoder::decode_sensor_frame;
use crate::wire::encoder::encode_command_frame;
use crate::wire::protocol::{CommandFrame, SensorFrame};

/// Per-session controller state
pub struct ControllerEndpoint<D> {
    decider: D,
    sensors: SensorFrame,
    last_command: CommandFrame,
    stats: LinkStats,
    liveness: LivenessMonitor,
    rejected: u64,
    started_at: DateTime<Utc>,
}

impl<D: Decide> ControllerEndpoint<D> {
    pub fn new(decider: D, timeout: Duration) -> Self {
        Self {
            decider,
            sensors: SensorFrame::default(),
            last_command: CommandFrame::neutral(),
            stats: LinkStats::new(),
            liveness: LivenessMonitor::new(timeout),
            rejected: 0,
            started_at: Utc::now(),
        }
    }

    /// All-neutral command frame that prompts the robot's first reply
    pub fn initial_prompt(&self) -> String {
        encode_command_frame(&CommandFrame::neutral())
    }

    /// Mark the prompt as sent; the liveness clock starts here.
    pub fn start(&mut self, now: Instant) {
        self.started_at = Utc::now();
        self.liveness.start(now);
        info!("Link session started");
    }

    /// Handle one inbound sensor line and produce the reply command line.
    ///
    /// A malformed frame keeps the previous sensor state and does not count
    /// as proof of life, but is still answered so the exchange keeps going.
    ///
    /// # Errors
    ///
    /// Returns the decision function's error; the session should end.
    pub fn on_frame_received(&mut self, line: &str, now: Instant) -> Result<String> {
        self.stats.record(now);

        match decode_sensor_frame(line) {
            Ok(frame) => {
                self.sensors = frame;
                self.liveness.record_frame(now);
            }
            Err(e) => {
                self.rejected += 1;
                debug!("Rejected sensor frame {:?}: {}", line, e);
            }
        }

        let intent: ControlIntent = self.decider.decide(&self.sensors)?;
        self.last_command = intent;
        let reply = encode_command_frame(&intent);

        debug!(
            "#{} comp {:3} tilt {:3} roll {:3} dist {:3} line {:04b} bat {:4.2} -> {}",
            self.stats.packets(),
            self.sensors.compass,
            self.sensors.tilt,
            self.sensors.roll,
            self.sensors.distance,
            self.sensors.line,
            self.sensors.battery,
            reply
        );
        Ok(reply)
    }

    /// Account for a sensor frame that arrives after the session ended.
    ///
    /// Updates statistics and sensor state only; no reply is produced.
    pub fn on_late_frame(&mut self, line: &str, now: Instant) {
        self.stats.record(now);
        match decode_sensor_frame(line) {
            Ok(frame) => self.sensors = frame,
            Err(_) => self.rejected += 1,
        }
    }

    /// Periodic check: sample input, then test liveness.
    ///
    /// Returns why the session should end, if it should.
    pub fn tick(&mut self, now: Instant) -> Option<SessionEnd> {
        if self.decider.sample() == Flow::Stop {
            info!("Stop requested");
            return Some(SessionEnd::StopRequested);
        }

        if self.liveness.check(now) == LinkState::Lost {
            info!("Connection lost");
            return Some(SessionEnd::LinkLost);
        }
        None
    }

    /// Statistics report for the session so far
    pub fn report(&self, end: SessionEnd) -> SessionReport {
        SessionReport::new(self.started_at, end, &self.stats, self.rejected)
    }

    /// Latest accepted sensor frame
    pub fn sensors(&self) -> &SensorFrame {
        &self.sensors
    }

    /// Intentions behind the last reply
    pub fn last_command(&self) -> &CommandFrame {
        &self.last_command
    }

    /// Watchdog state
    pub fn link_state(&self) -> LinkState {
        self.liveness.state()
    }

    /// Packets received and rejected so far
    pub fn counts(&self) -> (u64, u64) {
        (self.stats.packets(), self.rejected)
    }

    /// Return to neutral values for a new connection
    pub fn reset(&mut self) {
        self.sensors = SensorFrame::default();
        self.last_command = CommandFrame::neutral();
        self.stats.reset();
        self.liveness.reset();
        self.rejected = 0;
    }

    /// Access the decision source
    pub fn decider_mut(&mut self) -> &mut D {
        &mut self.decider
    }
}
