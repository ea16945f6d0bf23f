/// One discrete message on the wire: either a data unit or an acknowledgment
/// of a specific sequence number.
///
/// Exactly one of {payload, ack number} is meaningful per frame; the
/// [`FrameBody`] variant carries that invariant so it cannot be violated by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sequence number assigned by the sender, starting at 0 and incremented
    /// once per data unit attempted (even when the loss simulator suppresses
    /// the transmission). Acknowledgment frames carry 0 here.
    pub seq: u32,
    pub body: FrameBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    /// UTF-8 application payload.
    Data(String),
    /// Acknowledgment of the given sequence number.
    Ack(u32),
}

impl Frame {
    pub fn data(seq: u32, payload: impl Into<String>) -> Self {
        Self {
            seq,
            body: FrameBody::Data(payload.into()),
        }
    }

    /// Build an acknowledgment frame. Acks do not consume sequence numbers.
    pub fn ack(ack_num: u32) -> Self {
        Self {
            seq: 0,
            body: FrameBody::Ack(ack_num),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self.body, FrameBody::Ack(_))
    }
}
