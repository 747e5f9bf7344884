//! Hardware seams of the robot endpoint.
//!
//! The endpoint only ever calls these with values that are already clamped
//! into the actuator's range.

/// Arm servo channels on the robot's PWM header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoChannel {
    Base = 1,
    Lift = 2,
    Grip = 3,
}

/// RGB pixel positions on the robot's light bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pixel {
    Left = 1,
    Right = 2,
}

/// Icons shown on the LED matrix to mirror link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    /// Host link established
    Target,
    /// No host link
    No,
}

/// One reading of the robot's raw sensors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReadings {
    /// Compass heading, clockwise degrees (0-359)
    pub heading: i32,

    /// Pitch in degrees, positive when the nose dips
    pub pitch: i32,

    /// Roll in degrees
    pub roll: i32,

    /// Ultrasonic range in centimeters
    pub distance_cm: i32,

    /// Line followers S1..S4, true on white
    pub line: [bool; 4],
}

#[cfg_attr(test, mockall::automock)]
pub trait MotorDriver: Send {
    /// Track speeds, -100..=100 each
    fn set_speed(&mut self, left: i32, right: i32);
}

#[cfg_attr(test, mockall::automock)]
pub trait ServoDriver: Send {
    /// Move a servo to `angle` degrees over `transition_ms`
    fn set_servo(&mut self, channel: ServoChannel, angle: i32, transition_ms: u32);
}

#[cfg_attr(test, mockall::automock)]
pub trait LightDriver: Send {
    /// Latch a hue code into one pixel (shown on the next `show`)
    fn set_pixel(&mut self, pixel: Pixel, hue: u8);

    /// Light bar brightness
    fn set_brightness(&mut self, level: u8);

    /// Push latched pixel values to the light bar
    fn show(&mut self);

    /// LED matrix brightness
    fn set_mouth(&mut self, level: u8);

    fn show_icon(&mut self, icon: Icon);

    /// Start a tone in the background
    fn play_tone(&mut self, freq_hz: u32, duration_ms: u32);
}

#[cfg_attr(test, mockall::automock)]
pub trait SensorSource: Send {
    fn read(&mut self) -> SensorReadings;

    /// Raw battery voltage
    fn battery_volts(&mut self) -> f32;
}
