//! # Wire Protocol Constants and Types
//!
//! Core frame definitions for the Qtruck packet exchange.
//!
//! ```text
//! sensor  (hex)     = CC TT RR DD LV          10 chars
//! command (decimal) = LL RR BBB FF GG C M     13 chars
//! ```
//!
//! Both frames travel newline-terminated. Neither carries a sequence number;
//! every frame holds the complete state so a lost frame is repaired by the next.

/// Line terminator appended to every frame on the wire
pub const FRAME_TERMINATOR: char = '\n';

/// Sensor frame length in characters (5 bytes as hex pairs)
pub const SENSOR_FRAME_LEN: usize = 10;

/// Command frame length in characters
pub const COMMAND_FRAME_LEN: usize = 13;

/// Compass heading range (degrees, wraps at 360)
pub const COMPASS_MODULUS: i32 = 360;

/// Signed 7-bit range shared by tilt and roll
pub const ANGLE_MIN: i32 = -64;
pub const ANGLE_MAX: i32 = 63;

/// Ultrasonic distance range (9 bits, centimeters)
pub const DISTANCE_MAX: i32 = 511;

/// Track speed intention range
pub const SPEED_MIN: i32 = -100;
pub const SPEED_MAX: i32 = 100;

/// Arm base servo range (degrees, no wire offset)
pub const BASE_MIN: i32 = 0;
pub const BASE_MAX: i32 = 180;

/// Arm lift servo range (degrees, wire = physical - 25)
pub const LIFT_MIN: i32 = 30;
pub const LIFT_MAX: i32 = 120;
pub const LIFT_WIRE_OFFSET: i32 = 25;

/// Gripper servo range (degrees, wire = physical - 65)
pub const GRIP_MIN: i32 = 80;
pub const GRIP_MAX: i32 = 145;
pub const GRIP_WIRE_OFFSET: i32 = 65;

/// Arm rest pose used when a link comes up
pub const BASE_HOME: i32 = 90;
pub const LIFT_HOME: i32 = 100;
pub const GRIP_HOME: i32 = 120;

/// Indicator hue codes
pub const HUE_OFF: u8 = 0;
pub const HUE_GREEN: u8 = 4;
pub const HUE_WHITE: u8 = 9;
pub const HUE_MAX: u8 = 9;

/// Battery voltage represented by a zero battery nibble
pub const BATTERY_BASE_VOLTS: f32 = 3.25;

/// Volts per battery nibble step
pub const BATTERY_VOLTS_PER_STEP: f32 = 0.05;

/// Mouth (LED matrix) flash state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mouth {
    /// Matrix dark
    #[default]
    Off,
    /// Matrix faintly lit
    Dim,
    /// Matrix fully lit
    Bright,
}

impl Mouth {
    /// Wire digit for this state
    pub fn digit(self) -> u8 {
        match self {
            Mouth::Off => 0,
            Mouth::Dim => 1,
            Mouth::Bright => 2,
        }
    }

    /// State for a wire digit. Anything above 1 reads as bright.
    pub fn from_digit(digit: u8) -> Self {
        match digit {
            0 => Mouth::Off,
            1 => Mouth::Dim,
            _ => Mouth::Bright,
        }
    }
}

/// Robot sensor state carried by one sensor frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    /// Compass heading, counter-clockwise degrees (0-359)
    pub compass: u16,

    /// Pitch in degrees, positive when the front is lifted (-64..=63)
    pub tilt: i16,

    /// Roll in degrees (-64..=63)
    pub roll: i16,

    /// Ultrasonic range in centimeters (0-511)
    pub distance: u16,

    /// Line follower sensors packed S1..S4 from the high bit down
    pub line: u8,

    /// Battery voltage, quantized to 50 mV steps above 3.25 V
    pub battery: f32,
}

impl Default for SensorFrame {
    /// Readings assumed before the first frame arrives: level, nothing in
    /// range, all line sensors on white, healthy battery.
    fn default() -> Self {
        Self {
            compass: 0,
            tilt: 0,
            roll: 0,
            distance: 0,
            line: 0x0F,
            battery: 4.0,
        }
    }
}

impl SensorFrame {
    /// Whether line follower `index` (0 = S1 .. 3 = S4) sees white
    pub fn line_sensor(&self, index: usize) -> bool {
        index < 4 && (self.line >> (3 - index)) & 1 == 1
    }
}

/// Actuator commands carried by one command frame, in physical units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    /// Left track speed (-100..=100)
    pub left: i32,

    /// Right track speed (-100..=100)
    pub right: i32,

    /// Arm base servo angle
    pub base: i32,

    /// Arm lift servo angle
    pub lift: i32,

    /// Gripper servo angle
    pub grip: i32,

    /// Indicator hue code (0-9)
    pub color: u8,

    /// Mouth flash state
    pub mouth: Mouth,
}

impl CommandFrame {
    /// Tracks stopped, arm at rest, lights off.
    pub fn neutral() -> Self {
        Self {
            left: 0,
            right: 0,
            base: BASE_HOME,
            lift: LIFT_HOME,
            grip: GRIP_HOME,
            color: HUE_OFF,
            mouth: Mouth::Off,
        }
    }
}

impl Default for CommandFrame {
    fn default() -> Self {
        Self::neutral()
    }
}
