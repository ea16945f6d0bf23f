pub mod codec;
pub mod config;
pub mod frame;

pub use codec::{CodecError, decode, encode};
pub use config::{AckMode, ReceiverConfig, RunOverride, SenderConfig};
pub use frame::{Frame, FrameBody};
