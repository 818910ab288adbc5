//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for writers and readers.
//!
//! Counters are owned by the session that updates them; `telemetry()` on a writer or reader
//! freezes them into a `TelemetrySnapshot`.

pub mod counters;
pub mod snapshot;
pub mod timers;

pub use counters::*;
pub use snapshot::*;
pub use timers::*;
