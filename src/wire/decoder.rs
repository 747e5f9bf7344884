//! # Frame Decoder
//!
//! Parses sensor and command frames received from the peer.
//!
//! Fields are extracted by fixed offset, never by delimiter. A frame that is
//! too short or holds a bad digit is rejected as a whole with a
//! [`FrameError`]; decoding never panics.

use super::mapping::*;
use super::protocol::*;
use crate::error::FrameError;

/// Strip the line terminator (and any carriage return) from a received frame
fn trim_frame(frame: &str) -> &str {
    frame.trim_end_matches(&['\n', '\r'][..])
}

/// Check a frame for its minimum length before any field is touched
fn check_length(frame: &str, expected: usize) -> Result<(), FrameError> {
    let actual = frame.chars().count();
    if actual < expected {
        return Err(FrameError::TooShort { expected, actual });
    }
    Ok(())
}

/// Parse the hex pair starting at `pos`
fn hex_byte(bytes: &[u8], pos: usize) -> Result<u8, FrameError> {
    let digit = |i: usize| -> Result<u8, FrameError> {
        (bytes[i] as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or(FrameError::InvalidDigit { position: i, found: bytes[i] as char })
    };
    Ok((digit(pos)? << 4) | digit(pos + 1)?)
}

/// Parse the fixed-width decimal field `[pos, pos + width)`
fn decimal_field(bytes: &[u8], pos: usize, width: usize) -> Result<i32, FrameError> {
    let mut value = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(pos).take(width) {
        let d = (b as char)
            .to_digit(10)
            .ok_or(FrameError::InvalidDigit { position: i, found: b as char })?;
        value = value * 10 + d as i32;
    }
    Ok(value)
}

/// Decode the five raw bytes of a sensor frame.
///
/// # Errors
///
/// Returns error if:
/// - Frame has fewer than 10 characters
/// - Any of the first 10 characters is not a hex digit
pub fn decode_sensor_bytes(frame: &str) -> Result<[u8; 5], FrameError> {
    let frame = trim_frame(frame);
    check_length(frame, SENSOR_FRAME_LEN)?;
    if !frame.is_ascii() {
        let (position, found) = frame
            .char_indices()
            .find(|(_, c)| !c.is_ascii())
            .unwrap_or((0, '?'));
        return Err(FrameError::InvalidDigit { position, found });
    }

    let bytes = frame.as_bytes();
    let mut out = [0u8; 5];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = hex_byte(bytes, 2 * i)?;
    }
    Ok(out)
}

/// Decode a sensor frame (`CC TT RR DD LV`, hex).
///
/// # Examples
///
/// ```
/// use qtruck_link::wire::decoder::decode_sensor_frame;
///
/// let frame = decode_sensor_frame("3C4050FF28\n").unwrap();
/// assert_eq!(frame.compass, 60);
/// assert_eq!(frame.roll, 16);
/// assert_eq!(frame.distance, 255);
/// ```
pub fn decode_sensor_frame(frame: &str) -> Result<SensorFrame, FrameError> {
    let [comp, tilt, roll, dist, linebat] = decode_sensor_bytes(frame)?;

    Ok(SensorFrame {
        compass: (((tilt & 0x80) as u16) << 1) | comp as u16,
        tilt: angle_from_field(tilt),
        roll: angle_from_field(roll),
        distance: (((roll & 0x80) as u16) << 1) | dist as u16,
        line: linebat >> 4,
        battery: battery_from_nibble(linebat & 0x0F),
    })
}

/// Decode a command frame (`LL RR BBB FF GG C M`, decimal).
///
/// The length check runs before any field is extracted, so a short frame
/// never yields partial values.
///
/// # Examples
///
/// ```
/// use qtruck_link::wire::decoder::decode_command_frame;
///
/// let cmd = decode_command_frame("7420090755520").unwrap();
/// assert_eq!(cmd.left, 75);
/// assert_eq!(cmd.right, -80);
/// assert_eq!(cmd.lift, 100);
/// ```
pub fn decode_command_frame(frame: &str) -> Result<CommandFrame, FrameError> {
    let frame = trim_frame(frame);
    check_length(frame, COMMAND_FRAME_LEN)?;
    if let Some((position, found)) = frame
        .char_indices()
        .take(COMMAND_FRAME_LEN)
        .find(|(_, c)| !c.is_ascii_digit())
    {
        return Err(FrameError::InvalidDigit { position, found });
    }

    let bytes = frame.as_bytes();
    Ok(CommandFrame {
        left: speed_from_wire(decimal_field(bytes, 0, 2)?),
        right: speed_from_wire(decimal_field(bytes, 2, 2)?),
        base: base_to_wire(decimal_field(bytes, 4, 3)?),
        lift: lift_from_wire(decimal_field(bytes, 7, 2)?),
        grip: grip_from_wire(decimal_field(bytes, 9, 2)?),
        color: decimal_field(bytes, 11, 1)? as u8,
        mouth: Mouth::from_digit(decimal_field(bytes, 12, 1)? as u8),
    })
}
