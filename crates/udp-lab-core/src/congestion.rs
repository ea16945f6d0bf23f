//! Slow-start / AIMD congestion window, TCP-Reno style without selective
//! acknowledgment: one feedback signal per round governs the whole window.

use tracing::debug;

/// What the controller made of an acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The ack number was higher than anything seen before.
    Progress,
    /// Stale or duplicate; handled like a timeout.
    Stale,
}

/// Sender-side window state machine.
///
/// Below the threshold the window grows by one whole frame per progressing
/// ack (slow start); at or above it, by `1 / cwnd` (additive increase). Any
/// stale ack or timeout halves the threshold and collapses the window to 1.
#[derive(Debug)]
pub struct CongestionController {
    cwnd: f64,
    ssthresh: u32,
    last_ack: u32,
}

impl Default for CongestionController {
    fn default() -> Self {
        Self::new(64)
    }
}

impl CongestionController {
    pub fn new(initial_ssthresh: u32) -> Self {
        Self {
            cwnd: 1.0,
            ssthresh: initial_ssthresh.max(1),
            last_ack: 0,
        }
    }

    /// Consume one acknowledgment number.
    pub fn on_ack(&mut self, ack_num: u32) -> AckOutcome {
        if ack_num > self.last_ack {
            self.last_ack = ack_num;
            if self.cwnd < f64::from(self.ssthresh) {
                self.cwnd += 1.0;
            } else {
                self.cwnd += 1.0 / self.cwnd;
            }
            debug!(ack_num, cwnd = self.cwnd, "window grown");
            AckOutcome::Progress
        } else {
            debug!(ack_num, last_ack = self.last_ack, "stale ack");
            self.enter_loss_state();
            AckOutcome::Stale
        }
    }

    /// The round's ack wait expired; collapse the window.
    pub fn on_timeout(&mut self) {
        debug!(cwnd = self.cwnd, "ack timeout");
        self.enter_loss_state();
    }

    fn enter_loss_state(&mut self) {
        self.ssthresh = ((self.cwnd / 2.0).floor() as u32).max(1);
        self.cwnd = 1.0;
    }

    /// Number of whole frames transmittable before waiting for feedback.
    /// Always at least 1.
    pub fn window(&self) -> u32 {
        self.cwnd as u32
    }

    pub fn cwnd(&self) -> f64 {
        self.cwnd
    }

    pub fn ssthresh(&self) -> u32 {
        self.ssthresh
    }

    /// Highest acknowledgment number acted upon so far.
    pub fn last_ack(&self) -> u32 {
        self.last_ack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_start_grows_by_one_per_ack() {
        let mut cc = CongestionController::new(64);
        for ack in 1..=10 {
            assert_eq!(cc.on_ack(ack), AckOutcome::Progress);
        }
        assert_eq!(cc.cwnd(), 11.0);
        assert_eq!(cc.window(), 11);
    }

    #[test]
    fn additive_increase_above_threshold() {
        let mut cc = CongestionController::new(2);
        cc.on_ack(1); // slow start: 1 -> 2
        assert_eq!(cc.cwnd(), 2.0);
        cc.on_ack(2); // at threshold: 2 + 1/2
        assert_eq!(cc.cwnd(), 2.5);
        cc.on_ack(3); // 2.5 + 1/2.5
        assert!((cc.cwnd() - 2.9).abs() < 1e-12);
        assert_eq!(cc.window(), 2);
    }

    #[test]
    fn timeout_halves_threshold_and_resets_window() {
        let mut cc = CongestionController::new(64);
        for ack in 1..=7 {
            cc.on_ack(ack);
        }
        assert_eq!(cc.cwnd(), 8.0);
        cc.on_timeout();
        assert_eq!(cc.ssthresh(), 4);
        assert_eq!(cc.cwnd(), 1.0);
    }

    #[test]
    fn stale_ack_behaves_like_timeout() {
        let mut cc = CongestionController::new(64);
        for ack in 1..=7 {
            cc.on_ack(ack);
        }
        assert_eq!(cc.on_ack(3), AckOutcome::Stale);
        assert_eq!(cc.ssthresh(), 4);
        assert_eq!(cc.cwnd(), 1.0);
        assert_eq!(cc.last_ack(), 7);
    }

    #[test]
    fn threshold_never_drops_below_one() {
        let mut cc = CongestionController::new(64);
        cc.on_timeout(); // cwnd was 1.0, floor(0.5) = 0 clamps to 1
        assert_eq!(cc.ssthresh(), 1);
        assert_eq!(cc.cwnd(), 1.0);
        assert_eq!(cc.window(), 1);
    }

    #[test]
    fn recovery_after_loss_reenters_slow_start() {
        let mut cc = CongestionController::new(64);
        for ack in 1..=7 {
            cc.on_ack(ack);
        }
        cc.on_timeout(); // ssthresh 4, cwnd 1
        cc.on_ack(8); // 1 -> 2
        cc.on_ack(9); // 2 -> 3
        cc.on_ack(10); // 3 -> 4
        assert_eq!(cc.cwnd(), 4.0);
        cc.on_ack(11); // at threshold: additive
        assert_eq!(cc.cwnd(), 4.25);
    }
}
