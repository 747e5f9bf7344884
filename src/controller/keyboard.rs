//! # Keyboard Driver Module
//!
//! Drives the robot from the host keyboard using the Linux evdev interface.
//!
//! ## Key Map
//!
//! | Keys | Function |
//! |------|----------|
//! | 8 / 2 | Both tracks forward / back |
//! | 4 / 6 | Spin left / right |
//! | 7 9 / 1 3 | Pivot forward / back on one track |
//! | U / D | Lift arm up / down |
//! | L / R | Swing base left / right |
//! | O / C | Open / close gripper |
//! | \` Tab Q W A S Z X | Indicator color 0 9 1 2 3 4 5 8 |
//! | Space / Backspace | Mouth bright / dim (while held) |
//! | Esc | End the session |
//!
//! Number keys work from either the keypad or the top row. Arm keys move
//! their joint 2 degrees per sample for as long as they are held.

use evdev::{Device, InputEvent, InputEventKind, Key};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::intent::{ControlIntent, Decide, Flow};
use crate::error::{LinkError, Result};
use crate::wire::protocol::*;

/// Arm joint change per input sample (degrees)
pub const ARM_STEP: i32 = 2;

/// Indicator color shown until a color key is pressed
pub const DEFAULT_COLOR: u8 = 8;

/// Keyboard-driven source of control intentions
pub struct KeyboardDecider {
    pressed: HashSet<u16>,
    intent: ControlIntent,
    events: Option<mpsc::UnboundedReceiver<InputEvent>>,
}

impl Default for KeyboardDecider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardDecider {
    /// Decider with no attached device; feed it with [`process_event`](Self::process_event).
    pub fn new() -> Self {
        let mut intent = ControlIntent::neutral();
        intent.color = DEFAULT_COLOR;
        Self {
            pressed: HashSet::new(),
            intent,
            events: None,
        }
    }

    /// Decider fed from a keyboard reader channel
    pub fn with_events(events: mpsc::UnboundedReceiver<InputEvent>) -> Self {
        Self {
            events: Some(events),
            ..Self::new()
        }
    }

    /// Track key press and release events; everything else is ignored.
    pub fn process_event(&mut self, event: &InputEvent) {
        if let InputEventKind::Key(key) = event.kind() {
            // 0 = release, 1 = press, 2 = autorepeat
            if event.value() == 0 {
                self.pressed.remove(&key.code());
            } else {
                self.pressed.insert(key.code());
            }
        }
    }

    /// Current intentions
    pub fn intent(&self) -> &ControlIntent {
        &self.intent
    }

    fn is_down(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.pressed.contains(&k.code()))
    }

    fn update_tracks(&mut self) {
        let (left, right) = if self.is_down(&[Key::KEY_KP8, Key::KEY_8]) {
            (100, 100)
        } else if self.is_down(&[Key::KEY_KP2, Key::KEY_2]) {
            (-100, -100)
        } else if self.is_down(&[Key::KEY_KP4, Key::KEY_4]) {
            (-100, 100)
        } else if self.is_down(&[Key::KEY_KP6, Key::KEY_6]) {
            (100, -100)
        } else if self.is_down(&[Key::KEY_KP7, Key::KEY_7]) {
            (0, 100)
        } else if self.is_down(&[Key::KEY_KP9, Key::KEY_9]) {
            (100, 0)
        } else if self.is_down(&[Key::KEY_KP1, Key::KEY_1]) {
            (0, -100)
        } else if self.is_down(&[Key::KEY_KP3, Key::KEY_3]) {
            (-100, 0)
        } else {
            (0, 0)
        };
        self.intent.left = left;
        self.intent.right = right;
    }

    fn update_arm(&mut self) {
        if self.is_down(&[Key::KEY_U]) {
            self.intent.lift += ARM_STEP;
        } else if self.is_down(&[Key::KEY_D]) {
            self.intent.lift -= ARM_STEP;
        }
        if self.is_down(&[Key::KEY_L]) {
            self.intent.base += ARM_STEP;
        } else if self.is_down(&[Key::KEY_R]) {
            self.intent.base -= ARM_STEP;
        }
        if self.is_down(&[Key::KEY_O]) {
            self.intent.grip += ARM_STEP;
        } else if self.is_down(&[Key::KEY_C]) {
            self.intent.grip -= ARM_STEP;
        }

        self.intent.base = self.intent.base.clamp(BASE_MIN, BASE_MAX);
        self.intent.lift = self.intent.lift.clamp(LIFT_MIN, LIFT_MAX);
        self.intent.grip = self.intent.grip.clamp(GRIP_MIN, GRIP_MAX);
    }

    fn update_color(&mut self) {
        const COLOR_KEYS: [(Key, u8); 8] = [
            (Key::KEY_GRAVE, HUE_OFF),
            (Key::KEY_TAB, HUE_WHITE),
            (Key::KEY_Q, 1),
            (Key::KEY_W, 2),
            (Key::KEY_A, 3),
            (Key::KEY_S, HUE_GREEN),
            (Key::KEY_Z, 5),
            (Key::KEY_X, 8),
        ];
        if let Some(&(_, color)) = COLOR_KEYS.iter().find(|(k, _)| self.is_down(&[*k])) {
            self.intent.color = color;
        }
    }

    fn update_mouth(&mut self) {
        self.intent.mouth = if self.is_down(&[Key::KEY_SPACE]) {
            Mouth::Bright
        } else if self.is_down(&[Key::KEY_BACKSPACE]) {
            Mouth::Dim
        } else {
            Mouth::Off
        };
    }
}

impl Decide for KeyboardDecider {
    fn decide(&mut self, _sensors: &SensorFrame) -> Result<ControlIntent> {
        Ok(self.intent)
    }

    fn sample(&mut self) -> Flow {
        if let Some(mut events) = self.events.take() {
            loop {
                match events.try_recv() {
                    Ok(event) => self.process_event(&event),
                    Err(mpsc::error::TryRecvError::Empty) => {
                        self.events = Some(events);
                        break;
                    }
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        warn!("Keyboard reader stopped");
                        return Flow::Stop;
                    }
                }
            }
        }

        if self.is_down(&[Key::KEY_ESC]) {
            return Flow::Stop;
        }

        self.update_tracks();
        self.update_arm();
        self.update_color();
        self.update_mouth();
        Flow::Continue
    }
}

/// Keyboard device handle
pub struct KeyboardDevice {
    device: Device,
    device_path: String,
}

impl KeyboardDevice {
    /// Open the first keyboard under `/dev/input` that has a numeric keypad
    ///
    /// # Errors
    ///
    /// - `KeyboardNotFound`: no suitable keyboard found
    /// - `Input`: `/dev/input` unreadable
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(LinkError::Input("/dev/input directory not found".to_string()));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| LinkError::Input(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LinkError::Input(format!("Failed to read directory entry: {}", e)))?;

        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    let has_keypad = device
                        .supported_keys()
                        .map(|keys| keys.contains(Key::KEY_KP8) && keys.contains(Key::KEY_ESC))
                        .unwrap_or(false);
                    debug!("Found input device: {} (keypad: {})", path.display(), has_keypad);

                    if has_keypad {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Using keyboard {} at {}",
                            device.name().unwrap_or("(unnamed)"),
                            device_path
                        );
                        return Ok(Self { device, device_path });
                    }
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(LinkError::KeyboardNotFound)
    }

    /// Path of the opened device
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Move the device onto a blocking reader thread and return its event channel.
    ///
    /// The thread ends when the receiver is dropped or the device fails.
    pub fn spawn_reader(self) -> mpsc::UnboundedReceiver<InputEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut device = self.device;
        let path = self.device_path;

        std::thread::spawn(move || loop {
            match device.fetch_events() {
                Ok(events) => {
                    for event in events {
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("Keyboard {} failed: {}", path, e);
                    return;
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::EventType;

    fn key_event(key: Key, pressed: bool) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), if pressed { 1 } else { 0 })
    }

    fn hold(decider: &mut KeyboardDecider, key: Key) {
        decider.process_event(&key_event(key, true));
    }

    fn release(decider: &mut KeyboardDecider, key: Key) {
        decider.process_event(&key_event(key, false));
    }

    #[test]
    fn test_defaults() {
        let mut decider = KeyboardDecider::new();
        assert_eq!(decider.sample(), Flow::Continue);
        let intent = decider.decide(&SensorFrame::default()).unwrap();
        assert_eq!((intent.left, intent.right), (0, 0));
        assert_eq!((intent.base, intent.lift, intent.grip), (90, 100, 120));
        assert_eq!(intent.color, DEFAULT_COLOR);
        assert_eq!(intent.mouth, Mouth::Off);
    }

    #[test]
    fn test_track_keys() {
        let cases = [
            (Key::KEY_KP8, (100, 100)),
            (Key::KEY_KP2, (-100, -100)),
            (Key::KEY_KP4, (-100, 100)),
            (Key::KEY_KP6, (100, -100)),
            (Key::KEY_KP7, (0, 100)),
            (Key::KEY_KP9, (100, 0)),
            (Key::KEY_KP1, (0, -100)),
            (Key::KEY_3, (-100, 0)),
        ];
        for (key, expected) in cases {
            let mut decider = KeyboardDecider::new();
            hold(&mut decider, key);
            decider.sample();
            assert_eq!((decider.intent().left, decider.intent().right), expected, "{:?}", key);
        }
    }

    #[test]
    fn test_release_stops_tracks() {
        let mut decider = KeyboardDecider::new();
        hold(&mut decider, Key::KEY_KP8);
        decider.sample();
        release(&mut decider, Key::KEY_KP8);
        decider.sample();
        assert_eq!((decider.intent().left, decider.intent().right), (0, 0));
    }

    #[test]
    fn test_arm_steps_and_limits() {
        let mut decider = KeyboardDecider::new();
        hold(&mut decider, Key::KEY_U);
        hold(&mut decider, Key::KEY_L);
        hold(&mut decider, Key::KEY_C);
        decider.sample();
        assert_eq!(decider.intent().lift, 102);
        assert_eq!(decider.intent().base, 92);
        assert_eq!(decider.intent().grip, 118);

        for _ in 0..100 {
            decider.sample();
        }
        assert_eq!(decider.intent().lift, LIFT_MAX);
        assert_eq!(decider.intent().base, BASE_MAX);
        assert_eq!(decider.intent().grip, GRIP_MIN);
    }

    #[test]
    fn test_color_persists_after_release() {
        let mut decider = KeyboardDecider::new();
        hold(&mut decider, Key::KEY_S);
        decider.sample();
        release(&mut decider, Key::KEY_S);
        decider.sample();
        assert_eq!(decider.intent().color, HUE_GREEN);

        hold(&mut decider, Key::KEY_TAB);
        decider.sample();
        assert_eq!(decider.intent().color, HUE_WHITE);
    }

    #[test]
    fn test_mouth_only_while_held() {
        let mut decider = KeyboardDecider::new();
        hold(&mut decider, Key::KEY_SPACE);
        decider.sample();
        assert_eq!(decider.intent().mouth, Mouth::Bright);
        release(&mut decider, Key::KEY_SPACE);
        hold(&mut decider, Key::KEY_BACKSPACE);
        decider.sample();
        assert_eq!(decider.intent().mouth, Mouth::Dim);
        release(&mut decider, Key::KEY_BACKSPACE);
        decider.sample();
        assert_eq!(decider.intent().mouth, Mouth::Off);
    }

    #[test]
    fn test_escape_requests_stop() {
        let mut decider = KeyboardDecider::new();
        hold(&mut decider, Key::KEY_ESC);
        assert_eq!(decider.sample(), Flow::Stop);
    }

    #[test]
    fn test_non_key_events_ignored() {
        let mut decider = KeyboardDecider::new();
        decider.process_event(&InputEvent::new(EventType::SYNCHRONIZATION, 0, 0));
        assert_eq!(decider.sample(), Flow::Continue);
        assert_eq!(decider.intent().left, 0);
    }

    #[test]
    fn test_events_from_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut decider = KeyboardDecider::with_events(rx);
        tx.send(key_event(Key::KEY_KP8, true)).unwrap();
        assert_eq!(decider.sample(), Flow::Continue);
        assert_eq!(decider.intent().left, 100);

        drop(tx);
        assert_eq!(decider.sample(), Flow::Stop);
    }

    // Integration test - only runs with a real keyboard and /dev/input access
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let keyboard = KeyboardDevice::open();
        assert!(keyboard.is_ok(), "Should detect a keyboard with a keypad");
        assert!(keyboard.unwrap().device_path().starts_with("/dev/input/event"));
    }
}
