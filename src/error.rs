//! # Error Types
//!
//! Custom error types for Qtruck Link using `thiserror`.

use thiserror::Error;

/// Reasons a received frame is rejected by the codec.
///
/// A rejected frame never causes a partial update: the caller keeps whatever
/// state it had before the frame arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame shorter than the fixed width of all required fields
    #[error("frame too short: expected at least {expected} chars, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Character that is not valid for the field's digit alphabet
    #[error("invalid digit {found:?} at position {position}")]
    InvalidDigit { position: usize, found: char },
}

/// Main error type for Qtruck Link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Wire frame errors
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// No usable keyboard found under /dev/input
    #[error("No keyboard with a numeric keypad found")]
    KeyboardNotFound,

    /// Keyboard input errors
    #[error("Input error: {0}")]
    Input(String),

    /// The decision function failed or asked to end the session
    #[error("Decision function failed: {0}")]
    Decision(String),
}

/// Result type alias for Qtruck Link
pub type Result<T> = std::result::Result<T, LinkError>;
