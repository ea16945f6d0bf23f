//! Wire codec for [`Frame`].
//!
//! The layout is bit-exact so independently built peers interoperate.
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//! bytes[0:4]  sequence number, u32
//! byte[4]     is_ack (0x00 data, nonzero ack)
//! if ack:     bytes[5:9]  acknowledged sequence number, u32
//! else:       bytes[5:]   payload, UTF-8 text
//! ```
//!
//! No I/O happens here; this is pure data transformation.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

use crate::frame::{Frame, FrameBody};

/// Fixed header size: sequence number (4) + ack discriminator (1).
pub const HEADER_LEN: usize = 5;

/// Total size of an acknowledgment frame on the wire.
pub const ACK_FRAME_LEN: usize = HEADER_LEN + 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Datagram too short for its declared shape.
    #[error("malformed frame: {0} bytes")]
    MalformedFrame(usize),
    /// Data payload is not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Serialise a frame into a newly allocated buffer.
pub fn encode(frame: &Frame) -> Vec<u8> {
    let mut buf = match &frame.body {
        FrameBody::Data(payload) => BytesMut::with_capacity(HEADER_LEN + payload.len()),
        FrameBody::Ack(_) => BytesMut::with_capacity(ACK_FRAME_LEN),
    };
    buf.put_u32(frame.seq);
    match &frame.body {
        FrameBody::Data(payload) => {
            buf.put_u8(0x00);
            buf.put_slice(payload.as_bytes());
        }
        FrameBody::Ack(ack_num) => {
            buf.put_u8(0x01);
            buf.put_u32(*ack_num);
        }
    }
    buf.to_vec()
}

/// Parse a frame from a raw datagram.
///
/// Fails with [`CodecError::MalformedFrame`] when fewer than [`HEADER_LEN`]
/// bytes are supplied, or when the header marks an acknowledgment and the
/// datagram is not exactly [`ACK_FRAME_LEN`] bytes. Data payloads must be
/// valid UTF-8.
pub fn decode(bytes: &[u8]) -> Result<Frame, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::MalformedFrame(bytes.len()));
    }
    let mut cursor = bytes;
    let seq = cursor.get_u32();
    let is_ack = cursor.get_u8() != 0;

    if is_ack {
        if bytes.len() != ACK_FRAME_LEN {
            return Err(CodecError::MalformedFrame(bytes.len()));
        }
        let ack_num = cursor.get_u32();
        Ok(Frame {
            seq,
            body: FrameBody::Ack(ack_num),
        })
    } else {
        let payload = std::str::from_utf8(cursor)?;
        Ok(Frame::data(seq, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_roundtrip() {
        let frame = Frame::data(42, "Message 42");
        assert_eq!(decode(&encode(&frame)).unwrap(), frame);
    }

    #[test]
    fn ack_roundtrip() {
        let frame = Frame::ack(7);
        assert_eq!(decode(&encode(&frame)).unwrap(), frame);
    }

    #[test]
    fn empty_payload_roundtrip() {
        let frame = Frame::data(0, "");
        let bytes = encode(&frame);
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(decode(&bytes).unwrap(), frame);
    }

    #[test]
    fn data_layout_is_big_endian() {
        let bytes = encode(&Frame::data(0x0102_0304, "hi"));
        assert_eq!(&bytes[..4], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(bytes[4], 0x00);
        assert_eq!(&bytes[5..], b"hi");
    }

    #[test]
    fn ack_layout_is_big_endian() {
        let bytes = encode(&Frame::ack(0x0A0B_0C0D));
        assert_eq!(bytes.len(), ACK_FRAME_LEN);
        assert_eq!(bytes[4], 0x01);
        assert_eq!(&bytes[5..9], &[0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[test]
    fn truncated_header_is_malformed() {
        assert_eq!(decode(&[]), Err(CodecError::MalformedFrame(0)));
        assert_eq!(decode(&[0u8; 4]), Err(CodecError::MalformedFrame(4)));
    }

    #[test]
    fn truncated_ack_is_malformed() {
        let mut bytes = encode(&Frame::ack(3));
        bytes.pop();
        assert_eq!(decode(&bytes), Err(CodecError::MalformedFrame(8)));
    }

    #[test]
    fn oversized_ack_is_malformed() {
        let mut bytes = encode(&Frame::ack(3));
        bytes.push(0xFF);
        assert_eq!(decode(&bytes), Err(CodecError::MalformedFrame(10)));
    }

    #[test]
    fn nonzero_discriminator_reads_as_ack() {
        let mut bytes = encode(&Frame::ack(9));
        bytes[4] = 0x7F;
        assert_eq!(decode(&bytes).unwrap(), Frame::ack(9));
    }

    #[test]
    fn invalid_utf8_payload_is_encoding_error() {
        let mut bytes = encode(&Frame::data(1, "ok"));
        bytes.extend_from_slice(&[0xC3, 0x28]);
        assert!(matches!(decode(&bytes), Err(CodecError::Encoding(_))));
    }
}
