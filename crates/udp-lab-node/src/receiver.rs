//! Receiver loop: gate, decode, reassemble, acknowledge.

use tracing::{debug, info, warn};

use udp_lab_core::{LossModel, ReassemblyBuffer};
use udp_lab_proto::codec;
use udp_lab_proto::{AckMode, Frame, FrameBody, ReceiverConfig};

use crate::transport::{Datagram, TransportError};

/// One protocol run's receiving side. Runs until its transport endpoint is
/// closed; the receiver never initiates data.
pub struct Receiver<T: Datagram> {
    transport: T,
    config: ReceiverConfig,
    buffer: ReassemblyBuffer,
    loss: Box<dyn LossModel>,
}

impl<T: Datagram> Receiver<T> {
    pub fn new(transport: T, config: ReceiverConfig, loss: Box<dyn LossModel>) -> Self {
        Self {
            transport,
            config,
            buffer: ReassemblyBuffer::new(),
            loss,
        }
    }

    /// The in-order output log so far.
    pub fn delivered(&self) -> &[(u32, String)] {
        self.buffer.delivered()
    }

    pub fn expected(&self) -> u32 {
        self.buffer.expected()
    }

    pub fn into_delivered(self) -> Vec<(u32, String)> {
        self.buffer.into_delivered()
    }

    /// Blocking read loop. Datagram-level problems (simulated loss,
    /// malformed or non-UTF-8 frames, transient I/O errors such as the
    /// ICMP-provoked `ECONNREFUSED` a connected UDP socket reports after
    /// its peer goes away) are contained to the datagram; the loop only
    /// ends with [`TransportError::Closed`] once the orchestrator shuts
    /// the endpoint.
    pub fn run(&mut self) -> Result<(), TransportError> {
        loop {
            let datagram = match self.transport.recv(None) {
                Ok(Some(datagram)) => datagram,
                Ok(None) => continue,
                Err(TransportError::Closed) => return Err(TransportError::Closed),
                Err(TransportError::Io(err)) => {
                    warn!(%err, "transient receive error; receiver continuing");
                    continue;
                }
            };
            if self.loss.should_drop(self.config.loss_probability) {
                debug!("inbound datagram dropped by loss model");
                continue;
            }
            let frame = match codec::decode(&datagram) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(%err, "discarding undecodable datagram");
                    continue;
                }
            };
            match frame.body {
                FrameBody::Data(payload) => {
                    let seq = frame.seq;
                    for (delivered_seq, unit) in self.buffer.accept(seq, payload) {
                        info!(seq = delivered_seq, unit = %unit, "delivered");
                    }
                    let Some(ack_num) = self.ack_number_for(seq) else {
                        debug!(seq, "nothing delivered in order yet; withholding ack");
                        continue;
                    };
                    match self.transport.send(&codec::encode(&Frame::ack(ack_num))) {
                        Ok(()) => debug!(seq, ack_num, "ack sent"),
                        Err(TransportError::Closed) => return Err(TransportError::Closed),
                        Err(TransportError::Io(err)) => {
                            warn!(%err, ack_num, "transient ack send error; receiver continuing");
                        }
                    }
                }
                FrameBody::Ack(ack_num) => {
                    info!(ack_num, "ignoring inbound ack");
                }
            }
        }
    }

    fn ack_number_for(&self, received_seq: u32) -> Option<u32> {
        match self.config.ack_mode {
            // One ack per accepted frame, acknowledging that frame itself.
            AckMode::PerFrame => Some(received_seq),
            // Highest contiguous sequence number released so far, if any.
            AckMode::Cumulative => self.buffer.expected().checked_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;
    use udp_lab_core::NoLoss;

    /// Transport double that replays a script of receive outcomes and can
    /// refuse a number of sends with an I/O error.
    struct FlakyTransport {
        inbound: VecDeque<Result<Option<Vec<u8>>, TransportError>>,
        failing_sends: usize,
        sent: Vec<Vec<u8>>,
    }

    impl FlakyTransport {
        fn new(
            inbound: impl IntoIterator<Item = Result<Option<Vec<u8>>, TransportError>>,
            failing_sends: usize,
        ) -> Self {
            Self {
                inbound: inbound.into_iter().collect(),
                failing_sends,
                sent: Vec::new(),
            }
        }
    }

    impl Datagram for FlakyTransport {
        fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            if self.failing_sends > 0 {
                self.failing_sends -= 1;
                return Err(TransportError::Io(io::ErrorKind::ConnectionRefused.into()));
            }
            self.sent.push(bytes.to_vec());
            Ok(())
        }

        fn recv(&mut self, _timeout: Option<Duration>) -> Result<Option<Vec<u8>>, TransportError> {
            self.inbound
                .pop_front()
                .unwrap_or(Err(TransportError::Closed))
        }
    }

    #[test]
    fn transient_io_errors_do_not_stop_the_loop() {
        // A connection-refused receive, then two data frames whose first
        // ack send also fails; the loop must ride through all of it and
        // stop only on Closed.
        let transport = FlakyTransport::new(
            [
                Err(TransportError::Io(io::ErrorKind::ConnectionRefused.into())),
                Ok(Some(codec::encode(&Frame::data(0, "Message 1")))),
                Ok(Some(codec::encode(&Frame::data(1, "Message 2")))),
            ],
            1,
        );
        let mut receiver = Receiver::new(transport, ReceiverConfig::default(), Box::new(NoLoss));

        let result = receiver.run();
        assert!(matches!(result, Err(TransportError::Closed)));

        // Both frames were still processed in order.
        let seqs: Vec<u32> = receiver.delivered().iter().map(|(s, _)| *s).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(receiver.expected(), 2);

        // The first ack was lost to the send failure; the second went out.
        assert_eq!(receiver.transport.sent.len(), 1);
        assert_eq!(
            codec::decode(&receiver.transport.sent[0]).unwrap(),
            Frame::ack(1)
        );
    }

    #[test]
    fn closed_endpoint_still_ends_the_loop() {
        let transport = FlakyTransport::new([Err(TransportError::Closed)], 0);
        let mut receiver = Receiver::new(transport, ReceiverConfig::default(), Box::new(NoLoss));
        assert!(matches!(receiver.run(), Err(TransportError::Closed)));
    }
}
