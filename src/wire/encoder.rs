//! # Frame Encoder
//!
//! Builds sensor (hex) and command (decimal) frames from typed values.

use super::mapping::*;
use super::protocol::*;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode a 4-bit value as one uppercase hex digit.
///
/// Values above 15 clamp to `'F'`.
pub fn encode_nibble(n: u8) -> char {
    HEX_DIGITS[n.min(15) as usize] as char
}

/// Encode a byte as two hex digits, high nibble first.
pub fn encode_byte(n: u8) -> [char; 2] {
    [encode_nibble(n >> 4), encode_nibble(n & 0x0F)]
}

/// Pack a sensor frame into its five wire bytes.
///
/// The 9th bit of the compass rides in the top bit of the tilt byte and the
/// 9th bit of the distance rides in the top bit of the roll byte.
pub fn pack_sensor_bytes(frame: &SensorFrame) -> [u8; 5] {
    let compass = (frame.compass as i32).rem_euclid(COMPASS_MODULUS) as u16;
    let distance = (frame.distance as i32).min(DISTANCE_MAX) as u16;

    let mut tilt = angle_to_field(frame.tilt as i32);
    if compass >= 256 {
        tilt |= 0x80;
    }

    let mut roll = angle_to_field(frame.roll as i32);
    if distance >= 256 {
        roll |= 0x80;
    }

    let linebat = ((frame.line & 0x0F) << 4) | battery_to_nibble(frame.battery);

    [
        (compass & 0xFF) as u8,
        tilt,
        roll,
        (distance & 0xFF) as u8,
        linebat,
    ]
}

/// Encode a sensor frame as 10 hex characters (no terminator).
///
/// # Examples
///
/// ```
/// use qtruck_link::wire::encoder::encode_sensor_frame;
/// use qtruck_link::wire::protocol::SensorFrame;
///
/// let frame = SensorFrame { compass: 60, tilt: 0, roll: 16, distance: 255, line: 2, battery: 3.65 };
/// assert_eq!(encode_sensor_frame(&frame), "3C4050FF28");
/// ```
pub fn encode_sensor_frame(frame: &SensorFrame) -> String {
    let mut out = String::with_capacity(SENSOR_FRAME_LEN);
    for byte in pack_sensor_bytes(frame) {
        out.extend(encode_byte(byte));
    }
    out
}

/// Encode a command frame as 13 decimal characters (no terminator).
///
/// Every field is clamped into its wire range first, so the result always
/// has exactly [`COMMAND_FRAME_LEN`] characters.
///
/// # Examples
///
/// ```
/// use qtruck_link::wire::encoder::encode_command_frame;
/// use qtruck_link::wire::protocol::{CommandFrame, Mouth};
///
/// let cmd = CommandFrame { left: 75, right: -80, base: 90, lift: 100, grip: 120, color: 2, mouth: Mouth::Off };
/// assert_eq!(encode_command_frame(&cmd), "7420090755520");
/// ```
pub fn encode_command_frame(cmd: &CommandFrame) -> String {
    format!(
        "{:02}{:02}{:03}{:02}{:02}{}{}",
        speed_to_wire(cmd.left),
        speed_to_wire(cmd.right),
        base_to_wire(cmd.base),
        lift_to_wire(cmd.lift),
        grip_to_wire(cmd.grip),
        cmd.color.min(HUE_MAX),
        cmd.mouth.digit(),
    )
}
