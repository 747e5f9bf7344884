//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{LinkError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub link: LinkConfig,

    #[serde(default)]
    pub battery: BatteryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration (Bluetooth RFCOMM or USB serial)
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Packet exchange configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    /// Silence before the link is declared lost
    #[serde(default = "default_link_timeout_ms")]
    pub timeout_ms: u64,

    /// Watchdog and input sampling rate on the controller side
    #[serde(default = "default_watchdog_hz")]
    pub watchdog_hz: u32,
}

/// Robot battery monitor configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BatteryConfig {
    /// Ticks skipped between voltage samples (33 samples every 34th tick)
    #[serde(default = "default_sample_every")]
    pub sample_every: u32,

    /// Exponential smoothing gain
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,

    /// Raw samples at or below this are discarded
    #[serde(default = "default_plausible_min")]
    pub plausible_min: f32,

    /// Raw samples at or above this are discarded
    #[serde(default = "default_plausible_max")]
    pub plausible_max: f32,

    /// Smoothed voltage that starts the low battery alert
    #[serde(default = "default_low_enter")]
    pub low_enter: f32,

    /// Raw voltage that clears the low battery alert
    #[serde(default = "default_low_exit")]
    pub low_exit: f32,

    /// Smoothed voltage assumed at power-up
    #[serde(default = "default_initial_volts")]
    pub initial_volts: f32,

    #[serde(default = "default_tone_hz")]
    pub tone_hz: u32,

    #[serde(default = "default_tone_ms")]
    pub tone_ms: u32,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files; console only when unset
    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/rfcomm0".to_string() }
fn default_baud_rate() -> u32 { 115200 }

fn default_link_timeout_ms() -> u64 { 2000 }
fn default_watchdog_hz() -> u32 { 10 }

fn default_sample_every() -> u32 { 33 }
fn default_smoothing() -> f32 { 0.2 }
fn default_plausible_min() -> f32 { 2.0 }
fn default_plausible_max() -> f32 { 4.5 }
fn default_low_enter() -> f32 { 3.4 }
fn default_low_exit() -> f32 { 3.6 }
fn default_initial_volts() -> f32 { 4.0 }
fn default_tone_hz() -> u32 { 988 }
fn default_tone_ms() -> u32 { 500 }

fn default_file_prefix() -> String { "qtruck-link.log".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_link_timeout_ms(),
            watchdog_hz: default_watchdog_hz(),
        }
    }
}

impl LinkConfig {
    /// Liveness timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Watchdog tick period as a `Duration`
    pub fn watchdog_period(&self) -> Duration {
        Duration::from_millis(1000 / self.watchdog_hz.max(1) as u64)
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            sample_every: default_sample_every(),
            smoothing: default_smoothing(),
            plausible_min: default_plausible_min(),
            plausible_max: default_plausible_max(),
            low_enter: default_low_enter(),
            low_exit: default_low_exit(),
            initial_volts: default_initial_volts(),
            tone_hz: default_tone_hz(),
            tone_ms: default_tone_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            file_prefix: default_file_prefix(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> LinkError {
    LinkError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use qtruck_link::config::Config;
    ///
    /// let config = Config::load("config/qtruck.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.link.timeout_ms < 100 || self.link.timeout_ms > 60000 {
            return Err(invalid("link timeout_ms must be between 100 and 60000"));
        }

        if self.link.watchdog_hz == 0 || self.link.watchdog_hz > 100 {
            return Err(invalid("watchdog_hz must be between 1 and 100"));
        }

        // The watchdog must poll several times per timeout to catch a loss promptly
        if self.link.watchdog_period() * 2 > self.link.timeout() {
            return Err(invalid("watchdog period must be at most half of the link timeout"));
        }

        let b = &self.battery;
        if b.sample_every == 0 {
            return Err(invalid("battery sample_every must be greater than 0"));
        }

        if b.smoothing <= 0.0 || b.smoothing > 1.0 {
            return Err(invalid("battery smoothing must be in (0.0, 1.0]"));
        }

        if b.plausible_min >= b.plausible_max {
            return Err(invalid("plausible_min must be less than plausible_max"));
        }

        if b.low_enter >= b.low_exit {
            return Err(invalid("low_enter must be below low_exit (hysteresis band)"));
        }

        if b.tone_hz == 0 || b.tone_ms == 0 {
            return Err(invalid("tone_hz and tone_ms must be greater than 0"));
        }

        if let Some(dir) = &self.logging.dir {
            if dir.is_empty() {
                return Err(invalid("logging dir cannot be empty when set"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.link.timeout(), Duration::from_secs(2));
        assert_eq!(config.link.watchdog_period(), Duration::from_millis(100));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyUSB0"

[link]
timeout_ms = 3000

[battery]
low_enter = 3.3
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.link.timeout_ms, 3000);
        assert_eq!(config.link.watchdog_hz, 10);
        assert_eq!(config.battery.low_enter, 3.3);
        assert_eq!(config.battery.low_exit, 3.6);
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/qtruck.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.serial.port, "/dev/rfcomm0");
        assert_eq!(config.battery.sample_every, 33);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        use tempfile::NamedTempFile;

        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/rfcomm0");
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[link\ntimeout_ms = ").unwrap();
        temp_file.flush().unwrap();

        assert!(matches!(Config::load(temp_file.path()), Err(LinkError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/qtruck.toml"),
            Err(LinkError::Io(_))
        ));
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_link_timeout_bounds() {
        let mut config = Config::default();
        config.link.timeout_ms = 50;
        assert!(config.validate().is_err());
        config.link.timeout_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_watchdog_too_slow_for_timeout() {
        let mut config = Config::default();
        config.link.watchdog_hz = 1;
        config.link.timeout_ms = 1500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_watchdog_zero() {
        let mut config = Config::default();
        config.link.watchdog_hz = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hysteresis_band_required() {
        let mut config = Config::default();
        config.battery.low_enter = 3.6;
        config.battery.low_exit = 3.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_plausible_band_ordering() {
        let mut config = Config::default();
        config.battery.plausible_min = 4.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_smoothing_bounds() {
        let mut config = Config::default();
        config.battery.smoothing = 0.0;
        assert!(config.validate().is_err());
        config.battery.smoothing = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_logging_dir() {
        let mut config = Config::default();
        config.logging.dir = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_serial_port(), "/dev/rfcomm0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_link_timeout_ms(), 2000);
        assert_eq!(default_watchdog_hz(), 10);
        assert_eq!(default_sample_every(), 33);
        assert_eq!(default_smoothing(), 0.2);
        assert_eq!(default_plausible_min(), 2.0);
        assert_eq!(default_plausible_max(), 4.5);
        assert_eq!(default_low_enter(), 3.4);
        assert_eq!(default_low_exit(), 3.6);
        assert_eq!(default_initial_volts(), 4.0);
        assert_eq!(default_tone_hz(), 988);
        assert_eq!(default_tone_ms(), 500);
    }
}
