//! Structured measurement rows emitted by the sender loop.
//!
//! The loop only knows the sink trait; the driver decides whether rows end
//! up in CSV files, a JSON report, or nowhere.

use serde::Serialize;

/// Periodic progress row: how many units the window has slid past, and at
/// what rate.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Checkpoint {
    pub units: usize,
    pub elapsed_secs: f64,
    /// Units per second since the start of the run.
    pub throughput: f64,
}

/// Per-acknowledgment latency row.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatencySample {
    pub seq: u32,
    pub latency_secs: f64,
}

pub trait StatsSink {
    fn checkpoint(&mut self, row: Checkpoint);
    fn latency(&mut self, row: LatencySample);
}

/// Discards everything.
pub struct NullSink;

impl StatsSink for NullSink {
    fn checkpoint(&mut self, _row: Checkpoint) {}
    fn latency(&mut self, _row: LatencySample) {}
}

/// Collects rows in memory, for tests and for JSON report export.
#[derive(Debug, Default, Serialize)]
pub struct MemorySink {
    pub checkpoints: Vec<Checkpoint>,
    pub latencies: Vec<LatencySample>,
}

impl StatsSink for MemorySink {
    fn checkpoint(&mut self, row: Checkpoint) {
        self.checkpoints.push(row);
    }

    fn latency(&mut self, row: LatencySample) {
        self.latencies.push(row);
    }
}
