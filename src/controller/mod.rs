//! # Controller Module
//!
//! Host side of the link: turns sensor frames into command frames.
//!
//! This module handles:
//! - The decision seam (`Decide`) and its intentions
//! - Per-session endpoint state, statistics and liveness
//! - Keyboard driving via evdev

pub mod intent;
pub mod endpoint;
pub mod keyboard;

pub use endpoint::ControllerEndpoint;
pub use intent::{ControlIntent, Decide, Flow};
