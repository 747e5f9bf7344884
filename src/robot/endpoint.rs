//! # Robot Endpoint
//!
//! Robot side of the exchange. Each command frame that arrives is the only
//! clock tick: apply it, advance the status light and battery monitor, then
//! answer with a fresh sensor frame.

use tracing::{debug, info};

use super::arm::{plan_arm_updates, ArmShadow, ARM_TRANSITION_MS, HOME_TRANSITION_MS};
use super::battery::BatteryMonitor;
use super::breathing::Breathing;
use super::hardware::{
    Icon, LightDriver, MotorDriver, Pixel, SensorReadings, SensorSource, ServoChannel, ServoDriver,
};
use crate::config::BatteryConfig;
use crate::wire::decoder::decode_command_frame;
use crate::wire::encoder::encode_sensor_frame;
use crate::wire::protocol::*;

/// Matrix brightness for a mouth state
pub fn mouth_level(mouth: Mouth) -> u8 {
    match mouth {
        Mouth::Off => 0,
        Mouth::Dim => 5,
        Mouth::Bright => 255,
    }
}

/// Build a sensor frame from raw readings and the smoothed battery voltage.
///
/// Compass is reported counter-clockwise and tilt is positive nose-up.
pub fn sensor_frame(readings: &SensorReadings, battery: f32) -> SensorFrame {
    let line = readings
        .line
        .iter()
        .fold(0u8, |acc, &white| (acc << 1) | u8::from(white));

    SensorFrame {
        compass: (COMPASS_MODULUS - readings.heading).rem_euclid(COMPASS_MODULUS) as u16,
        tilt: (-readings.pitch).clamp(ANGLE_MIN, ANGLE_MAX) as i16,
        roll: readings.roll.clamp(ANGLE_MIN, ANGLE_MAX) as i16,
        distance: readings.distance_cm.clamp(0, DISTANCE_MAX) as u16,
        line,
        battery,
    }
}

/// Per-session robot state wired to its hardware
pub struct RobotEndpoint<M, V, L, S> {
    motors: M,
    servos: V,
    lights: L,
    sensors: S,
    arm: ArmShadow,
    mouth: Mouth,
    breathing: Breathing,
    battery: BatteryMonitor,
    frames: u64,
    rejected: u64,
}

impl<M, V, L, S> RobotEndpoint<M, V, L, S>
where
    M: MotorDriver,
    V: ServoDriver,
    L: LightDriver,
    S: SensorSource,
{
    pub fn new(motors: M, servos: V, lights: L, sensors: S, battery: BatteryConfig) -> Self {
        Self {
            motors,
            servos,
            lights,
            sensors,
            arm: ArmShadow::home(),
            mouth: Mouth::Off,
            breathing: Breathing::new(),
            battery: BatteryMonitor::new(battery),
            frames: 0,
            rejected: 0,
        }
    }

    /// Stop the tracks and move the arm to its rest pose.
    pub fn power_up(&mut self) {
        self.motors.set_speed(0, 0);
        self.home_arm();
        self.lights.show_icon(Icon::No);
    }

    /// Host link came up.
    ///
    /// The arm is left where it is; the shadow still holds the angles last
    /// sent, so the first frames move it at most two servos at a time.
    pub fn on_connected(&mut self) {
        info!("Host connected");
        self.frames = 0;
        self.rejected = 0;
        self.mouth = Mouth::Off;
        self.lights.set_mouth(mouth_level(Mouth::Off));
        self.lights.show_icon(Icon::Target);
        self.breathing.attention();
    }

    /// Handle one command line and produce the reply sensor line.
    ///
    /// A malformed command leaves every actuator as it was, but the light,
    /// battery and reply still run so the exchange keeps its pace.
    pub fn on_frame_received(&mut self, line: &str) -> String {
        self.frames += 1;

        match decode_command_frame(line) {
            Ok(cmd) => self.apply(&cmd),
            Err(e) => {
                self.rejected += 1;
                debug!("Rejected command frame {:?}: {}", line, e);
            }
        }

        let step = self.breathing.step();
        self.lights.set_brightness(step.brightness);
        self.set_pixels(step.hue);

        let sensors = &mut self.sensors;
        if let Some(tone) = self.battery.step(|| sensors.battery_volts()) {
            self.lights.play_tone(tone.freq_hz, tone.duration_ms);
        }

        let frame = sensor_frame(&self.sensors.read(), self.battery.volts());
        encode_sensor_frame(&frame)
    }

    /// Host link dropped: stop and go dark.
    pub fn on_disconnected(&mut self) {
        info!("Host disconnected after {} frames", self.frames);
        self.motors.set_speed(0, 0);
        self.breathing.set_hue(HUE_OFF);
        self.set_pixels(HUE_OFF);
        self.mouth = Mouth::Off;
        self.lights.show_icon(Icon::No);
        self.lights.set_mouth(mouth_level(Mouth::Bright));
    }

    /// Frames handled and rejected this session
    pub fn counts(&self) -> (u64, u64) {
        (self.frames, self.rejected)
    }

    pub fn arm(&self) -> &ArmShadow {
        &self.arm
    }

    pub fn battery_volts(&self) -> f32 {
        self.battery.volts()
    }

    fn apply(&mut self, cmd: &CommandFrame) {
        self.motors.set_speed(cmd.left, cmd.right);

        let target = ArmShadow {
            base: cmd.base,
            lift: cmd.lift,
            grip: cmd.grip,
        };
        let plan = plan_arm_updates(&self.arm, &target);
        for update in plan.iter() {
            self.servos.set_servo(update.channel, update.angle, ARM_TRANSITION_MS);
        }
        self.arm.apply(&plan);

        self.breathing.set_hue(cmd.color);

        if cmd.mouth != self.mouth {
            self.lights.set_mouth(mouth_level(cmd.mouth));
            self.mouth = cmd.mouth;
        }
    }

    fn home_arm(&mut self) {
        self.arm = ArmShadow::home();
        self.servos.set_servo(ServoChannel::Base, self.arm.base, HOME_TRANSITION_MS);
        self.servos.set_servo(ServoChannel::Lift, self.arm.lift, HOME_TRANSITION_MS);
        self.servos.set_servo(ServoChannel::Grip, self.arm.grip, HOME_TRANSITION_MS);
    }

    fn set_pixels(&mut self, hue: u8) {
        self.lights.set_pixel(Pixel::Left, hue);
        self.lights.set_pixel(Pixel::Right, hue);
        self.lights.show();
    }
}
