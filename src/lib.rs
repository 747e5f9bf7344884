//! # Qtruck Link Library
//!
//! Drive a Qtruck robot from a host over a Bluetooth serial link.
//!
//! The robot reports its sensors as a 10 character hex frame and the host
//! answers each one with a 13 character decimal command frame. This library
//! provides both ends of that exchange plus the liveness watchdog that decides
//! when the link is gone.

pub mod config;
pub mod error;
pub mod wire;
pub mod link;
pub mod controller;
pub mod robot;
pub mod serial;
pub mod session;
