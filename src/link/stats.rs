//! # Link Statistics
//!
//! Packet counting and the report logged when a session ends.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Arrival bookkeeping for one connection
#[derive(Debug, Clone, Default)]
pub struct LinkStats {
    first: Option<Instant>,
    last: Option<Instant>,
    packets: u64,
}

impl LinkStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a packet arriving at `now`
    pub fn record(&mut self, now: Instant) {
        if self.first.is_none() {
            self.first = Some(now);
        }
        self.last = Some(now);
        self.packets += 1;
    }

    /// Packets received so far
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Arrival time of the most recent packet
    pub fn last_arrival(&self) -> Option<Instant> {
        self.last
    }

    /// Mean gap between packets. Needs at least two packets.
    pub fn average_interval(&self) -> Option<Duration> {
        let (first, last) = (self.first?, self.last?);
        if self.packets < 2 {
            return None;
        }
        let span = last.saturating_duration_since(first).as_nanos();
        let nanos = span / u128::from(self.packets - 1);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    /// Packets per second over the session. Needs at least two packets
    /// spread over a non-zero span.
    pub fn rate_hz(&self) -> Option<f64> {
        let avg = self.average_interval()?;
        if avg.is_zero() {
            return None;
        }
        Some(1.0 / avg.as_secs_f64())
    }

    /// Clear everything for a new connection
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// Local stop request (keyboard, Ctrl+C, decision function)
    StopRequested,
    /// Liveness timeout expired
    LinkLost,
    /// Transport reported end of stream or an I/O failure
    Disconnected,
    /// The decision function returned an error
    DecisionFailed,
}

/// Summary written to the log when a session ends
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub end: SessionEnd,
    pub packets: u64,
    pub rejected: u64,
    pub avg_interval_ms: Option<f64>,
    pub rate_hz: Option<f64>,
}

impl SessionReport {
    /// Build a report from the session's statistics
    pub fn new(started_at: DateTime<Utc>, end: SessionEnd, stats: &LinkStats, rejected: u64) -> Self {
        Self {
            started_at,
            ended_at: Utc::now(),
            end,
            packets: stats.packets(),
            rejected,
            avg_interval_ms: stats.average_interval().map(|d| d.as_secs_f64() * 1000.0),
            rate_hz: stats.rate_hz(),
        }
    }

    /// One-line JSON rendering for the log
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = LinkStats::new();
        assert_eq!(stats.packets(), 0);
        assert!(stats.average_interval().is_none());
        assert!(stats.rate_hz().is_none());
    }

    #[test]
    fn test_single_packet_has_no_rate() {
        let mut stats = LinkStats::new();
        stats.record(Instant::now());
        assert_eq!(stats.packets(), 1);
        assert!(stats.average_interval().is_none());
    }

    #[test]
    fn test_average_interval_and_rate() {
        let t0 = Instant::now();
        let mut stats = LinkStats::new();
        for i in 0..5u64 {
            stats.record(t0 + Duration::from_millis(i * 50));
        }
        assert_eq!(stats.packets(), 5);
        assert_eq!(stats.average_interval(), Some(Duration::from_millis(50)));
        let rate = stats.rate_hz().unwrap();
        assert!((rate - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut stats = LinkStats::new();
        stats.record(Instant::now());
        stats.reset();
        assert_eq!(stats.packets(), 0);
        assert!(stats.last_arrival().is_none());
    }

    #[test]
    fn test_average_interval_with_huge_packet_count() {
        let t0 = Instant::now();
        let stats = LinkStats {
            first: Some(t0),
            last: Some(t0 + Duration::from_secs(1 << 20)),
            packets: (1u64 << 32) + 1,
        };
        // 2^32 gaps over 2^20 seconds
        assert_eq!(stats.average_interval(), Some(Duration::from_nanos(244_140)));
        assert!(stats.rate_hz().is_some());
    }

    #[test]
    fn test_report_json() {
        let t0 = Instant::now();
        let mut stats = LinkStats::new();
        stats.record(t0);
        stats.record(t0 + Duration::from_millis(40));

        let report = SessionReport::new(Utc::now(), SessionEnd::LinkLost, &stats, 1);
        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["end"], "link_lost");
        assert_eq!(json["packets"], 2);
        assert_eq!(json["rejected"], 1);
        assert!((json["rate_hz"].as_f64().unwrap() - 25.0).abs() < 1e-6);
    }
}
