//! Bench stand-ins for the robot hardware.
//!
//! Actuator calls are logged; sensors report a robot turning slowly in place
//! in front of a wall, with a battery that drains one millivolt per sample.

use tracing::{debug, info};

use super::hardware::{
    Icon, LightDriver, MotorDriver, Pixel, SensorReadings, SensorSource, ServoChannel, ServoDriver,
};

#[derive(Debug, Default)]
pub struct SimMotors {
    pub left: i32,
    pub right: i32,
}

impl MotorDriver for SimMotors {
    fn set_speed(&mut self, left: i32, right: i32) {
        if (left, right) != (self.left, self.right) {
            info!("motors {:4} {:4}", left, right);
        }
        self.left = left;
        self.right = right;
    }
}

#[derive(Debug, Default)]
pub struct SimServos;

impl ServoDriver for SimServos {
    fn set_servo(&mut self, channel: ServoChannel, angle: i32, transition_ms: u32) {
        info!("servo {:?} -> {} over {} ms", channel, angle, transition_ms);
    }
}

#[derive(Debug, Default)]
pub struct SimLights {
    pixels: [u8; 2],
    shown: [u8; 2],
}

impl LightDriver for SimLights {
    fn set_pixel(&mut self, pixel: Pixel, hue: u8) {
        match pixel {
            Pixel::Left => self.pixels[0] = hue,
            Pixel::Right => self.pixels[1] = hue,
        }
    }

    fn set_brightness(&mut self, level: u8) {
        debug!("light bar brightness {}", level);
    }

    fn show(&mut self) {
        if self.pixels != self.shown {
            info!("light bar hues {:?}", self.pixels);
            self.shown = self.pixels;
        }
    }

    fn set_mouth(&mut self, level: u8) {
        info!("mouth brightness {}", level);
    }

    fn show_icon(&mut self, icon: Icon) {
        info!("matrix icon {:?}", icon);
    }

    fn play_tone(&mut self, freq_hz: u32, duration_ms: u32) {
        info!("tone {} Hz for {} ms", freq_hz, duration_ms);
    }
}

/// Simulated sensors
#[derive(Debug)]
pub struct SimSensors {
    heading: i32,
    volts: f32,
}

impl SimSensors {
    pub fn new(volts: f32) -> Self {
        Self { heading: 0, volts }
    }
}

impl Default for SimSensors {
    fn default() -> Self {
        Self::new(3.9)
    }
}

impl SensorSource for SimSensors {
    fn read(&mut self) -> SensorReadings {
        self.heading = (self.heading + 1) % 360;
        // Wall 40 cm away, seen straight on at heading 0
        let off_axis = (self.heading as f32).to_radians().cos().abs().max(0.1);
        SensorReadings {
            heading: self.heading,
            pitch: 0,
            roll: 0,
            distance_cm: (40.0 / off_axis).round() as i32,
            line: [true, true, true, true],
        }
    }

    fn battery_volts(&mut self) -> f32 {
        self.volts = (self.volts - 0.001).max(0.0);
        self.volts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_sensors_turn_and_range() {
        let mut sensors = SimSensors::default();
        let first = sensors.read();
        assert_eq!(first.heading, 1);
        assert_eq!(first.distance_cm, 40);

        for _ in 0..89 {
            sensors.read();
        }
        // Perpendicular to the wall: range saturates
        assert_eq!(sensors.read().distance_cm, 400);
    }

    #[test]
    fn test_sim_battery_drains() {
        let mut sensors = SimSensors::new(3.5);
        let a = sensors.battery_volts();
        let b = sensors.battery_volts();
        assert!(b < a);
    }

    #[test]
    fn test_sim_lights_latch_on_show() {
        let mut lights = SimLights::default();
        lights.set_pixel(Pixel::Left, 3);
        lights.set_pixel(Pixel::Right, 3);
        assert_eq!(lights.shown, [0, 0]);
        lights.show();
        assert_eq!(lights.shown, [3, 3]);
    }
}
