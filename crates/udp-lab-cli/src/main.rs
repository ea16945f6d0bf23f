use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use udp_lab_core::{LossModel, SeededLoss};
use udp_lab_node::{MemorySink, Receiver, Sender, SenderSummary, TransportError, UdpTransport};
use udp_lab_proto::{AckMode, ReceiverConfig, RunOverride, SenderConfig};

mod csv_sink;

use csv_sink::CsvStats;

#[derive(Parser, Debug)]
#[command(author, version, about = "Reliable delivery over UDP with AIMD congestion control")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the sending side against a fixed peer.
    Send {
        /// Receiver address, e.g. 127.0.0.1:12345.
        #[arg(long)]
        peer: String,

        /// Local bind address.
        #[arg(long, default_value = "0.0.0.0:0")]
        bind: String,

        /// Number of units to send; payloads are "Message {i}".
        #[arg(long, default_value_t = 1000)]
        count: usize,

        /// Probability of suppressing an outgoing data frame.
        #[arg(long, default_value_t = 0.0)]
        loss: f64,

        /// Seed for the loss simulator; omitted means OS entropy.
        #[arg(long)]
        seed: Option<u64>,

        /// Single-ack wait timeout in milliseconds.
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,

        /// Checkpoint unit counts; the run stops after the last one.
        #[arg(long, value_delimiter = ',', default_values_t = [100usize, 200, 500, 1000])]
        checkpoints: Vec<usize>,

        /// Write throughput checkpoint rows to this CSV file.
        #[arg(long)]
        checkpoint_csv: Option<PathBuf>,

        /// Write per-ack latency rows to this CSV file.
        #[arg(long)]
        latency_csv: Option<PathBuf>,

        /// Write a JSON report of the finished run.
        #[arg(long)]
        report_out: Option<PathBuf>,

        /// TOML file with optional overrides for the knobs above.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run the receiving side.
    Recv {
        /// Local bind address, e.g. 0.0.0.0:12345.
        #[arg(long)]
        bind: String,

        /// Probability of discarding an inbound datagram unread.
        #[arg(long, default_value_t = 0.0)]
        loss: f64,

        /// Seed for the loss simulator; omitted means OS entropy.
        #[arg(long)]
        seed: Option<u64>,

        /// per-frame (historical default) or cumulative.
        #[arg(long, default_value = "per-frame")]
        ack_mode: String,

        /// TOML file with optional overrides for the knobs above.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct RunReport<'a> {
    summary: &'a SenderSummary,
    stats: &'a MemorySink,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    match args.command {
        Command::Send {
            peer,
            bind,
            count,
            loss,
            seed,
            timeout_ms,
            checkpoints,
            checkpoint_csv,
            latency_csv,
            report_out,
            config,
        } => {
            let mut sender_config = SenderConfig {
                loss_probability: loss,
                seed,
                ack_timeout_ms: timeout_ms,
                checkpoints,
            };
            if let Some(path) = &config {
                load_override(path)?.apply_to_sender(&mut sender_config);
            }

            let units: Vec<String> = (1..=count).map(|i| format!("Message {i}")).collect();
            let transport = UdpTransport::connect(&bind, &peer)
                .with_context(|| format!("binding {bind} towards {peer}"))?;
            let loss_model = build_loss_model(sender_config.seed);

            info!(%peer, count, "sender starting");
            let mut stats = CsvStats::create(checkpoint_csv.as_deref(), latency_csv.as_deref())?;
            let mut sender = Sender::new(transport, sender_config, loss_model);
            let summary = sender.run(&units, &mut stats)?;
            info!(base = summary.base, "sender finished");

            if let Some(path) = &report_out {
                write_report(path, &summary, stats.collected())?;
            }
            Ok(())
        }
        Command::Recv {
            bind,
            loss,
            seed,
            ack_mode,
            config,
        } => {
            let mut receiver_config = ReceiverConfig {
                loss_probability: loss,
                seed,
                ack_mode: parse_ack_mode(&ack_mode)?,
            };
            if let Some(path) = &config {
                load_override(path)?.apply_to_receiver(&mut receiver_config);
            }

            let transport =
                UdpTransport::bind(&bind).with_context(|| format!("binding {bind}"))?;
            let loss_model = build_loss_model(receiver_config.seed);

            info!(%bind, "receiver listening");
            let mut receiver = Receiver::new(transport, receiver_config, loss_model);
            match receiver.run() {
                Err(TransportError::Closed) => {
                    info!("transport closed; receiver stopping");
                    Ok(())
                }
                Err(err) => Err(err.into()),
                Ok(()) => Ok(()),
            }
        }
    }
}

fn build_loss_model(seed: Option<u64>) -> Box<dyn LossModel> {
    match seed {
        Some(seed) => Box::new(SeededLoss::from_seed(seed)),
        None => Box::new(SeededLoss::from_entropy()),
    }
}

fn parse_ack_mode(raw: &str) -> Result<AckMode> {
    match raw {
        "per-frame" | "per_frame" => Ok(AckMode::PerFrame),
        "cumulative" => Ok(AckMode::Cumulative),
        other => anyhow::bail!("unknown ack mode {other:?} (per-frame | cumulative)"),
    }
}

fn load_override(path: &Path) -> Result<RunOverride> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn write_report(path: &Path, summary: &SenderSummary, stats: &MemorySink) -> Result<()> {
    let report = RunReport { summary, stats };
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}
