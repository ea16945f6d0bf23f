//! Sender loop: windowed rounds of data frames, one ack wait per round.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use udp_lab_core::{CongestionController, LossModel};
use udp_lab_proto::codec;
use udp_lab_proto::{Frame, FrameBody, SenderConfig};

use crate::stats::{Checkpoint, LatencySample, StatsSink};
use crate::transport::{Datagram, TransportError};

#[derive(Debug, Error)]
pub enum SenderError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Final state of a completed run, serializable for report export.
#[derive(Debug, Clone, Serialize)]
pub struct SenderSummary {
    /// First unit index not yet covered by an acknowledgment when the run
    /// stopped. Acknowledgment numbers live in sequence space, which counts
    /// every attempt, so this can overshoot the unit count.
    pub base: usize,
    pub frames_sent: u64,
    pub frames_suppressed: u64,
    pub elapsed_secs: f64,
    pub final_cwnd: f64,
    pub final_ssthresh: u32,
}

/// One protocol run's sending side.
///
/// Owns its transport, congestion controller, loss model, and the send-time
/// map exclusively; nothing here is shared across threads.
pub struct Sender<T: Datagram> {
    transport: T,
    config: SenderConfig,
    controller: CongestionController,
    loss: Box<dyn LossModel>,
    next_seq: u32,
    sent_at: HashMap<u32, Instant>,
}

impl<T: Datagram> Sender<T> {
    pub fn new(transport: T, config: SenderConfig, loss: Box<dyn LossModel>) -> Self {
        Self {
            transport,
            config,
            controller: CongestionController::default(),
            loss,
            next_seq: 0,
            sent_at: HashMap::new(),
        }
    }

    pub fn controller(&self) -> &CongestionController {
        &self.controller
    }

    /// Push every unit through the window until the ack base covers the
    /// whole list (or the final configured checkpoint has been reached).
    ///
    /// A sequence number is consumed per unit *attempt*: frames suppressed
    /// by the loss model still advance the counter and are never resent, so
    /// the receiver may observe gaps that never fill. Each round transmits
    /// up to `floor(cwnd)` frames, then blocks for exactly one
    /// acknowledgment; a timeout there is fed to the congestion controller
    /// and the round is retried from the same base.
    pub fn run(
        &mut self,
        units: &[String],
        stats: &mut dyn StatsSink,
    ) -> Result<SenderSummary, SenderError> {
        let started = Instant::now();
        let timeout = Duration::from_millis(self.config.ack_timeout_ms);
        let mut checkpoints = self.config.checkpoints.iter().copied().peekable();

        let mut base: usize = 0;
        let mut frames_sent = 0u64;
        let mut frames_suppressed = 0u64;

        while base < units.len() {
            let window_end = units.len().min(base + self.controller.window() as usize);
            for unit in &units[base..window_end] {
                let seq = self.next_seq;
                self.next_seq += 1;
                if self.loss.should_drop(self.config.loss_probability) {
                    debug!(seq, "data frame suppressed by loss model");
                    frames_suppressed += 1;
                    continue;
                }
                let frame = Frame::data(seq, unit.clone());
                self.transport.send(&codec::encode(&frame))?;
                self.sent_at.insert(seq, Instant::now());
                frames_sent += 1;
                debug!(seq, "data frame sent");
            }

            match self.transport.recv(Some(timeout))? {
                Some(datagram) => match codec::decode(&datagram) {
                    Ok(Frame {
                        body: FrameBody::Ack(ack_num),
                        ..
                    }) => {
                        debug!(ack_num, "ack received");
                        self.controller.on_ack(ack_num);
                        base = ack_num as usize + 1;
                        let latency = self
                            .sent_at
                            .remove(&ack_num)
                            .map(|at| at.elapsed())
                            .unwrap_or_else(|| started.elapsed());
                        stats.latency(LatencySample {
                            seq: ack_num,
                            latency_secs: latency.as_secs_f64(),
                        });
                    }
                    Ok(frame) => {
                        warn!(seq = frame.seq, "unexpected data frame during ack wait");
                        self.controller.on_timeout();
                    }
                    Err(err) => {
                        warn!(%err, "undecodable datagram during ack wait");
                        self.controller.on_timeout();
                    }
                },
                None => {
                    debug!(base, "timeout waiting for ack");
                    self.controller.on_timeout();
                }
            }

            if let Some(&next) = checkpoints.peek()
                && base >= next
            {
                let elapsed = started.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    let row = Checkpoint {
                        units: base,
                        elapsed_secs: elapsed,
                        throughput: base as f64 / elapsed,
                    };
                    info!(
                        units = row.units,
                        elapsed_secs = row.elapsed_secs,
                        throughput = row.throughput,
                        "checkpoint"
                    );
                    stats.checkpoint(row);
                }
                checkpoints.next();
                if checkpoints.peek().is_none() {
                    break;
                }
            }
        }

        let summary = SenderSummary {
            base,
            frames_sent,
            frames_suppressed,
            elapsed_secs: started.elapsed().as_secs_f64(),
            final_cwnd: self.controller.cwnd(),
            final_ssthresh: self.controller.ssthresh(),
        };
        info!(
            base = summary.base,
            frames_sent = summary.frames_sent,
            frames_suppressed = summary.frames_suppressed,
            "run complete"
        );
        Ok(summary)
    }
}
