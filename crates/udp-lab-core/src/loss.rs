//! Pluggable loss simulation.
//!
//! Both loops consult a [`LossModel`] before acting on a unit: the sender
//! before transmitting a data frame, the receiver before decoding any
//! inbound datagram. Each loop owns its own model instance so the two
//! streams of drop decisions are independently seedable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// A Bernoulli gate: each call is an independent trial.
pub trait LossModel: Send {
    /// `true` means the unit should be dropped.
    fn should_drop(&mut self, probability: f64) -> bool;
}

/// Uniform randomness from a seedable generator.
pub struct SeededLoss {
    rng: StdRng,
}

impl SeededLoss {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy; runs are not reproducible.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl LossModel for SeededLoss {
    fn should_drop(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }
}

/// Never drops anything, whatever the probability.
pub struct NoLoss;

impl LossModel for NoLoss {
    fn should_drop(&mut self, _probability: f64) -> bool {
        false
    }
}

/// Replays a fixed script of decisions, then passes everything through.
/// Useful for deterministic fault tests (drop exactly the first N frames,
/// drop one specific ack, and so on).
pub struct ScriptedLoss {
    decisions: VecDeque<bool>,
}

impl ScriptedLoss {
    pub fn new(decisions: impl IntoIterator<Item = bool>) -> Self {
        Self {
            decisions: decisions.into_iter().collect(),
        }
    }
}

impl LossModel for ScriptedLoss {
    fn should_drop(&mut self, _probability: f64) -> bool {
        self.decisions.pop_front().unwrap_or(false)
    }
}
