use serde::{Deserialize, Serialize};

/// How the receiver chooses the acknowledgment number for an accepted data
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckMode {
    /// Acknowledge the received frame's own sequence number. This is the
    /// historical behavior: one ack per accepted frame, not cumulative.
    #[default]
    PerFrame,
    /// Acknowledge the highest contiguous sequence number released to the
    /// application so far. Until the first in-order frame arrives there is
    /// nothing to acknowledge and the receiver stays silent.
    Cumulative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Probability in [0, 1) that an outgoing data frame is suppressed.
    pub loss_probability: f64,
    /// Seed for the sender-side loss simulator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// How long to wait for the round's single acknowledgment, in ms.
    pub ack_timeout_ms: u64,
    /// Ascending unit counts at which a throughput checkpoint row is emitted.
    /// The run stops once the last checkpoint has been reached. Empty
    /// disables checkpointing entirely.
    pub checkpoints: Vec<usize>,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            loss_probability: 0.0,
            seed: None,
            ack_timeout_ms: 1000,
            checkpoints: vec![100, 200, 500, 1000],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Probability in [0, 1) that an inbound datagram is discarded unread.
    pub loss_probability: f64,
    /// Seed for the receiver-side loss simulator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub ack_mode: AckMode,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            loss_probability: 0.0,
            seed: None,
            ack_mode: AckMode::PerFrame,
        }
    }
}

/// Partial configuration loaded from a TOML run file; every field is
/// optional and only present fields override the base config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunOverride {
    pub loss_probability: Option<f64>,
    pub seed: Option<u64>,
    pub ack_timeout_ms: Option<u64>,
    pub checkpoints: Option<Vec<usize>>,
    pub ack_mode: Option<AckMode>,
}

impl RunOverride {
    pub fn apply_to_sender(&self, config: &mut SenderConfig) {
        if let Some(v) = self.loss_probability {
            config.loss_probability = v;
        }
        if let Some(v) = self.seed {
            config.seed = Some(v);
        }
        if let Some(v) = self.ack_timeout_ms {
            config.ack_timeout_ms = v;
        }
        if let Some(v) = &self.checkpoints {
            config.checkpoints = v.clone();
        }
    }

    pub fn apply_to_receiver(&self, config: &mut ReceiverConfig) {
        if let Some(v) = self.loss_probability {
            config.loss_probability = v;
        }
        if let Some(v) = self.seed {
            config.seed = Some(v);
        }
        if let Some(v) = self.ack_mode {
            config.ack_mode = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_only_touches_present_fields() {
        let over = RunOverride {
            loss_probability: Some(0.3),
            seed: None,
            ack_timeout_ms: None,
            checkpoints: None,
            ack_mode: None,
        };
        let mut sender = SenderConfig::default();
        over.apply_to_sender(&mut sender);
        assert_eq!(sender.loss_probability, 0.3);
        assert_eq!(sender.ack_timeout_ms, 1000);
        assert_eq!(sender.checkpoints, vec![100, 200, 500, 1000]);

        let mut receiver = ReceiverConfig::default();
        over.apply_to_receiver(&mut receiver);
        assert_eq!(receiver.loss_probability, 0.3);
        assert_eq!(receiver.ack_mode, AckMode::PerFrame);
    }
}
