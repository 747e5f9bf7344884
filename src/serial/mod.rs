//! # Serial Communication Module
//!
//! Handles the byte channel to the robot.
//!
//! This module handles:
//! - Opening the Bluetooth RFCOMM (or USB serial) device
//! - Newline framing of packets
//! - Reporting peer disconnect as end of stream

pub mod port_trait;

pub use port_trait::{LineStream, LineTransport};

use crate::error::{LinkError, Result};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Default device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/rfcomm0", // Bluetooth serial binding
    "/dev/ttyACM0", // micro:bit USB CDC
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Serial link to the robot
pub struct LinkSerial {
    /// Framed serial port
    transport: LineStream<tokio_serial::SerialStream>,
    /// Device path (e.g., /dev/rfcomm0)
    device_path: String,
}

impl std::fmt::Debug for LinkSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl LinkSerial {
    /// Open the configured device, falling back to the default paths
    ///
    /// # Errors
    ///
    /// Returns error if no device could be opened
    pub fn open(preferred: &str, baud_rate: u32) -> Result<Self> {
        let mut paths = vec![preferred];
        paths.extend(DEFAULT_DEVICE_PATHS.iter().copied().filter(|p| *p != preferred));
        Self::open_with_paths(&paths, baud_rate)
    }

    /// Open the first device in `paths` that accepts the settings
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/rfcomm0"])
    /// * `baud_rate` - Line speed
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened robot link at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        transport: LineStream::new(port),
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(LinkError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port, 8N1 without flow control
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| LinkError::Serial(format!("Failed to open {}: {}", path, e)))
    }

    /// Path of the opened device
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Framed transport for the session loops
    pub fn transport(&mut self) -> &mut LineStream<tokio_serial::SerialStream> {
        &mut self.transport
    }
}
