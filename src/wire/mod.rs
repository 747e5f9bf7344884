//! # Wire Protocol Module
//!
//! Fixed-width text packets exchanged between the host and the robot.
//!
//! This module handles:
//! - Sensor frames (10 hex chars, robot to host)
//! - Command frames (13 decimal chars, host to robot)
//! - Range mapping with deadbands and servo offsets
//! - Frame length and digit validation

pub mod protocol;
pub mod mapping;
pub mod encoder;
pub mod decoder;
