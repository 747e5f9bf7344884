//! # Robot Module
//!
//! Robot side of the link: applies command frames to the actuators and
//! answers with sensor frames.
//!
//! This module handles:
//! - Hardware seams for motors, servos, lights and sensors
//! - Arm update throttling (never all three servos in one tick)
//! - The breathing status light and low battery alert
//! - Simulated hardware for bench runs

pub mod arm;
pub mod battery;
pub mod breathing;
pub mod endpoint;
pub mod hardware;
pub mod sim;

pub use endpoint::RobotEndpoint;
