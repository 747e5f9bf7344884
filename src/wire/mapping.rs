//! # Value Mapping
//!
//! Conversions between physical quantities and the compact numbers carried
//! in each wire field. Everything is clamped into range before encoding;
//! nothing here rejects a value.
//!
//! ## Track Speed Deadband
//!
//! ```text
//! intention   -100 ..= -52   -51 ..= 50   51 ..= 100
//! wire code      0 ..= 48        49        50 ..= 99
//! ```
//!
//! The neutral band is deliberately wide and asymmetric: the motors stall
//! below roughly half power, so small intentions are sent as a full stop.

use super::protocol::*;

/// Wire code for a stopped track
pub const SPEED_NEUTRAL_CODE: i32 = 49;

/// Map a signed track speed intention to its two-digit wire code.
///
/// # Examples
///
/// ```
/// use qtruck_link::wire::mapping::speed_to_wire;
///
/// assert_eq!(speed_to_wire(100), 99);
/// assert_eq!(speed_to_wire(30), 49);
/// assert_eq!(speed_to_wire(-100), 0);
/// ```
pub fn speed_to_wire(speed: i32) -> i32 {
    let speed = speed.clamp(SPEED_MIN, SPEED_MAX);
    if speed >= 51 {
        speed - 1
    } else if speed <= -52 {
        speed + 100
    } else {
        SPEED_NEUTRAL_CODE
    }
}

/// Map a two-digit wire code back to a signed track speed.
///
/// Codes 0-48 give -100..=-52, 49 gives 0, 50-99 give 51..=100.
pub fn speed_from_wire(code: i32) -> i32 {
    let shifted = code + 1;
    if shifted == 50 {
        0
    } else if shifted < 50 {
        shifted - 101
    } else {
        shifted
    }
}

/// Clamp an arm base angle; the wire carries it without offset.
pub fn base_to_wire(base: i32) -> i32 {
    base.clamp(BASE_MIN, BASE_MAX)
}

/// Clamp a lift angle and remove its wire offset.
pub fn lift_to_wire(lift: i32) -> i32 {
    lift.clamp(LIFT_MIN, LIFT_MAX) - LIFT_WIRE_OFFSET
}

/// Restore a lift angle from its wire value, clamped to the joint range.
pub fn lift_from_wire(code: i32) -> i32 {
    (code + LIFT_WIRE_OFFSET).clamp(LIFT_MIN, LIFT_MAX)
}

/// Clamp a gripper angle and remove its wire offset.
pub fn grip_to_wire(grip: i32) -> i32 {
    grip.clamp(GRIP_MIN, GRIP_MAX) - GRIP_WIRE_OFFSET
}

/// Restore a gripper angle from its wire value, clamped to the joint range.
pub fn grip_from_wire(code: i32) -> i32 {
    (code + GRIP_WIRE_OFFSET).clamp(GRIP_MIN, GRIP_MAX)
}

/// Fold a signed tilt or roll angle into 7 bits (0-127).
pub fn angle_to_field(angle: i32) -> u8 {
    (angle.clamp(ANGLE_MIN, ANGLE_MAX) + 64) as u8
}

/// Recover a signed angle from the low 7 bits of a field byte.
pub fn angle_from_field(byte: u8) -> i16 {
    (byte & 0x7F) as i16 - 64
}

/// Quantize a battery voltage to its 4-bit step (50 mV above 3.25 V).
pub fn battery_to_nibble(volts: f32) -> u8 {
    let steps = 20.0 * (volts - BATTERY_BASE_VOLTS);
    steps.clamp(0.0, 15.0).round() as u8
}

/// Battery voltage represented by a 4-bit step.
pub fn battery_from_nibble(nibble: u8) -> f32 {
    BATTERY_BASE_VOLTS + BATTERY_VOLTS_PER_STEP * (nibble & 0x0F) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_deadband_is_neutral() {
        for sp in -51..=50 {
            assert_eq!(speed_to_wire(sp), 49, "speed {} should be neutral", sp);
        }
    }

    #[test]
    fn test_speed_deadband_thresholds_are_asymmetric() {
        assert_eq!(speed_to_wire(51), 50);
        assert_eq!(speed_to_wire(50), 49);
        assert_eq!(speed_to_wire(-51), 49);
        assert_eq!(speed_to_wire(-52), 48);
    }

    #[test]
    fn test_speed_extremes() {
        assert_eq!(speed_to_wire(100), 99);
        assert_eq!(speed_to_wire(-100), 0);
        assert_eq!(speed_to_wire(250), 99);
        assert_eq!(speed_to_wire(-250), 0);
    }

    #[test]
    fn test_speed_decode_codes() {
        assert_eq!(speed_from_wire(49), 0);
        assert_eq!(speed_from_wire(0), -100);
        assert_eq!(speed_from_wire(48), -52);
        assert_eq!(speed_from_wire(50), 51);
        assert_eq!(speed_from_wire(99), 100);
    }

    #[test]
    fn test_speed_round_trip_outside_deadband() {
        for sp in -100..=100 {
            let decoded = speed_from_wire(speed_to_wire(sp));
            if (-51..=50).contains(&sp) {
                assert_eq!(decoded, 0);
            } else {
                assert_eq!(decoded, sp);
            }
        }
    }

    #[test]
    fn test_arm_offsets() {
        assert_eq!(lift_to_wire(100), 75);
        assert_eq!(lift_to_wire(10), 5);
        assert_eq!(lift_to_wire(200), 95);
        assert_eq!(lift_from_wire(75), 100);
        assert_eq!(grip_to_wire(120), 55);
        assert_eq!(grip_to_wire(0), 15);
        assert_eq!(grip_from_wire(55), 120);
        assert_eq!(base_to_wire(-5), 0);
        assert_eq!(base_to_wire(181), 180);
    }

    #[test]
    fn test_arm_decode_stays_within_joint_range() {
        assert_eq!(lift_from_wire(0), LIFT_MIN);
        assert_eq!(lift_from_wire(99), LIFT_MAX);
        assert_eq!(grip_from_wire(0), GRIP_MIN);
        assert_eq!(grip_from_wire(99), GRIP_MAX);
    }

    #[test]
    fn test_angle_fields() {
        assert_eq!(angle_to_field(0), 64);
        assert_eq!(angle_to_field(-100), 0);
        assert_eq!(angle_to_field(100), 127);
        assert_eq!(angle_from_field(0x80 | 64), 0);
        assert_eq!(angle_from_field(127), 63);
    }

    #[test]
    fn test_battery_quantization() {
        assert_eq!(battery_to_nibble(3.0), 0);
        assert_eq!(battery_to_nibble(3.65), 8);
        assert_eq!(battery_to_nibble(5.0), 15);
        assert!((battery_from_nibble(8) - 3.65).abs() < 1e-5);
        assert!((battery_from_nibble(15) - 4.0).abs() < 1e-5);
    }
}
