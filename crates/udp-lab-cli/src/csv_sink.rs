//! CSV scaffolding around the library's stats sink.
//!
//! Row layouts match the historical measurement files:
//! `num_packets,time_elapsed,throughput` and `seq_num,latency`.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

use udp_lab_node::{Checkpoint, LatencySample, MemorySink, StatsSink};

pub struct CsvStats {
    checkpoint_writer: Option<BufWriter<File>>,
    latency_writer: Option<BufWriter<File>>,
    memory: MemorySink,
}

impl CsvStats {
    pub fn create(checkpoint_path: Option<&Path>, latency_path: Option<&Path>) -> Result<Self> {
        let checkpoint_writer = checkpoint_path
            .map(|path| open_with_header(path, "num_packets,time_elapsed,throughput"))
            .transpose()?;
        let latency_writer = latency_path
            .map(|path| open_with_header(path, "seq_num,latency"))
            .transpose()?;
        Ok(Self {
            checkpoint_writer,
            latency_writer,
            memory: MemorySink::default(),
        })
    }

    /// Everything recorded so far, for the JSON report.
    pub fn collected(&self) -> &MemorySink {
        &self.memory
    }
}

fn open_with_header(path: &Path, header: &str) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{header}").with_context(|| format!("writing {}", path.display()))?;
    Ok(writer)
}

impl StatsSink for CsvStats {
    fn checkpoint(&mut self, row: Checkpoint) {
        if let Some(writer) = &mut self.checkpoint_writer
            && let Err(err) = writeln!(
                writer,
                "{},{},{}",
                row.units, row.elapsed_secs, row.throughput
            )
        {
            warn!(%err, "checkpoint CSV write failed");
        }
        self.memory.checkpoint(row);
    }

    fn latency(&mut self, row: LatencySample) {
        if let Some(writer) = &mut self.latency_writer
            && let Err(err) = writeln!(writer, "{},{}", row.seq, row.latency_secs)
        {
            warn!(%err, "latency CSV write failed");
        }
        self.memory.latency(row);
    }
}
