//! telemetry/snapshot.rs
//! Immutable, serializable view of a session's counters and timers.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::StreamCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub counters: StreamCounters,
    /// Encoded bytes per decoded byte; 0 for an empty stream.
    pub compression_ratio: f64,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &StreamCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();
        let compression_ratio = if counters.bytes_uncompressed > 0 {
            counters.bytes_encoded() as f64 / counters.bytes_uncompressed as f64
        } else {
            0.0
        };
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_uncompressed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        Self {
            counters: counters.clone(),
            compression_ratio,
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    pub fn bytes_in(&self) -> u64 {
        self.counters.bytes_uncompressed
    }

    pub fn bytes_out(&self) -> u64 {
        self.counters.bytes_encoded()
    }
}
