//! # Link Module
//!
//! Liveness watchdog and throughput statistics shared by both endpoints.

pub mod liveness;
pub mod stats;

pub use liveness::{LinkState, LivenessMonitor};
pub use stats::{LinkStats, SessionEnd, SessionReport};
