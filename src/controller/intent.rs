//! # Decision Seam
//!
//! The controller asks a [`Decide`] implementation what to do next each time
//! a sensor frame arrives. Implementations may be a human at a keyboard, an
//! algorithm, or a bridge to another process.

use crate::error::Result;
use crate::wire::protocol::{CommandFrame, SensorFrame};

/// Raw control intentions, before deadband and joint clamping are applied
/// by the encoder.
pub type ControlIntent = CommandFrame;

/// Outcome of a periodic input sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Source of control intentions for the controller endpoint
pub trait Decide {
    /// Produce the next intentions from the latest sensor frame.
    ///
    /// An error ends the session; it is not retried.
    fn decide(&mut self, sensors: &SensorFrame) -> Result<ControlIntent>;

    /// Periodic input sampling, called from the watchdog tick.
    fn sample(&mut self) -> Flow {
        Flow::Continue
    }
}

impl<F> Decide for F
where
    F: FnMut(&SensorFrame) -> Result<ControlIntent>,
{
    fn decide(&mut self, sensors: &SensorFrame) -> Result<ControlIntent> {
        self(sensors)
    }
}
