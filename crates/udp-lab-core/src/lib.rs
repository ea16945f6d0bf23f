//! Protocol state machines: loss simulation, out-of-order reassembly, and
//! the slow-start/AIMD congestion window. No I/O happens in this crate; the
//! loops in `udp-lab-node` drive these against a transport.

pub mod congestion;
pub mod loss;
pub mod reassembly;

pub use congestion::{AckOutcome, CongestionController};
pub use loss::{LossModel, NoLoss, ScriptedLoss, SeededLoss};
pub use reassembly::ReassemblyBuffer;
