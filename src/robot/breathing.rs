//! Breathing status light.
//!
//! The light bar ramps between a dim trough and a bright peak, one level per
//! tick, so a 33 step ramp at the link's 30-60 ms pacing gives roughly a
//! four second cycle. Levels are squared before they reach the hardware:
//!
//! ```text
//! trough = ramp / (sqrt(peak_out / trough_out) - 1)    = 5
//! peak   = trough + ramp                               = 38
//! norm   = peak^2 / peak_out                           = 18.05
//! ```
//!
//! with `ramp = 33`, `trough_out = 2`, `peak_out = 80`.

use crate::wire::protocol::{HUE_GREEN, HUE_OFF, HUE_WHITE};

pub const LEVEL_TROUGH: i32 = 5;
pub const LEVEL_PEAK: i32 = 38;

/// Level held while green is shown
pub const LEVEL_STEADY: i32 = 37;

const NORMALIZER: f32 = 18.05;

/// Output of one animation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathStep {
    pub brightness: u8,
    /// Hue to latch into both pixels
    pub hue: u8,
}

#[derive(Debug, Clone, Default)]
pub struct Breathing {
    level: i32,
    step: i32,
    /// Commanded hue
    hue: u8,
    /// Hue on display
    shown: u8,
}

impl Breathing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hue the next trough should switch to
    pub fn set_hue(&mut self, hue: u8) {
        self.hue = hue;
    }

    /// Show green until the next trough, whatever the commanded hue.
    pub fn attention(&mut self) {
        self.shown = HUE_GREEN;
    }

    pub fn shown_hue(&self) -> u8 {
        self.shown
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Advance one tick
    pub fn step(&mut self) -> BreathStep {
        if self.hue == HUE_GREEN {
            self.level = LEVEL_STEADY;
            self.step = 0;
        } else if self.step == 0 {
            self.level = LEVEL_TROUGH;
        }

        self.level += self.step;
        if self.level >= LEVEL_PEAK {
            self.level = LEVEL_PEAK;
            self.step = -1;
        } else if self.level <= LEVEL_TROUGH {
            self.level = LEVEL_TROUGH;
            self.step = 1;
            self.shown = self.hue;
        }

        if self.shown == HUE_OFF
            || self.hue == HUE_OFF
            || self.hue == HUE_GREEN
            || self.hue >= HUE_WHITE
        {
            self.shown = self.hue;
        }

        BreathStep {
            brightness: brightness(self.level),
            hue: self.shown,
        }
    }
}

/// Perceptual brightness for a ramp level
pub fn brightness(level: i32) -> u8 {
    ((level * level) as f32 / NORMALIZER).round().clamp(0.0, 255.0) as u8
}
