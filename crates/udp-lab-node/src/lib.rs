//! Sender and receiver loops wired to a datagram transport.
//!
//! The two loops are independent blocking processes, one per peer role,
//! each owning its state exclusively. The only suspension point is the
//! blocking receive; a timeout there is a protocol signal consumed by the
//! congestion controller, not an error.

pub mod channel;
pub mod receiver;
pub mod sender;
pub mod stats;
pub mod transport;

pub use receiver::Receiver;
pub use sender::{Sender, SenderError, SenderSummary};
pub use stats::{Checkpoint, LatencySample, MemorySink, NullSink, StatsSink};
pub use transport::{Datagram, TransportError, UdpTransport};
