//! Battery voltage smoothing and low battery alert.

use tracing::{debug, warn};

use crate::config::BatteryConfig;

/// Alert tone request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tone {
    pub freq_hz: u32,
    pub duration_ms: u32,
}

/// Samples the battery once every `sample_every + 1` ticks and keeps a
/// smoothed voltage for the sensor frame.
#[derive(Debug, Clone)]
pub struct BatteryMonitor {
    config: BatteryConfig,
    ticks: u32,
    smoothed: f32,
    alerting: bool,
}

impl BatteryMonitor {
    pub fn new(config: BatteryConfig) -> Self {
        Self {
            smoothed: config.initial_volts,
            config,
            ticks: 0,
            alerting: false,
        }
    }

    /// Smoothed voltage
    pub fn volts(&self) -> f32 {
        self.smoothed
    }

    pub fn is_alerting(&self) -> bool {
        self.alerting
    }

    /// Advance one tick. `read` is only called on sampling ticks.
    ///
    /// Returns a tone to play while the alert is active.
    pub fn step<F>(&mut self, read: F) -> Option<Tone>
    where
        F: FnOnce() -> f32,
    {
        if self.ticks < self.config.sample_every {
            self.ticks += 1;
            return None;
        }
        self.ticks = 0;

        let raw = read();
        if raw > self.config.plausible_min && raw < self.config.plausible_max {
            self.smoothed += self.config.smoothing * (raw - self.smoothed);
        } else {
            debug!("Ignoring battery sample {:.2} V", raw);
        }

        if raw > self.config.low_exit {
            self.alerting = false;
            None
        } else if self.alerting || self.smoothed < self.config.low_enter {
            if !self.alerting {
                warn!("Battery low: {:.2} V", self.smoothed);
            }
            self.alerting = true;
            Some(Tone {
                freq_hz: self.config.tone_hz,
                duration_ms: self.config.tone_ms,
            })
        } else {
            None
        }
    }
}
