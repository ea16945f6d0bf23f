//! Message-oriented datagram transport boundary.
//!
//! The protocol assumes an unreliable, unordered channel between one fixed
//! sender address and one fixed receiver address. [`UdpTransport`] is the
//! real thing; [`crate::channel`] provides an in-process stand-in for tests
//! and loopback runs.

use std::io;
use std::net::{ToSocketAddrs, UdpSocket};
use std::time::Duration;
use thiserror::Error;

/// Largest datagram we are prepared to receive.
pub const MAX_DATAGRAM: usize = 65_535;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint was shut down; pending blocking reads fail with this.
    #[error("transport endpoint closed")]
    Closed,
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One blocking datagram endpoint.
pub trait Datagram {
    /// Hand one datagram to the transport. A refusal is fatal to the run;
    /// note that datagram transports happily accept traffic for a peer that
    /// is no longer listening.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Block for the next datagram. `Ok(None)` means the timeout elapsed;
    /// `None` as the timeout blocks indefinitely. A closed endpoint yields
    /// [`TransportError::Closed`].
    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Vec<u8>>, TransportError>;
}

/// UDP endpoint connected to a single fixed peer.
pub struct UdpTransport {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Bind locally and connect to the peer, so that `send`/`recv` talk to
    /// exactly one remote address.
    pub fn connect(bind: impl ToSocketAddrs, peer: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind)?;
        socket.connect(peer)?;
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }

    /// Bind locally without a fixed peer yet; the first inbound datagram
    /// pins the remote address. This is how the receiver side comes up
    /// before it knows who will talk to it.
    pub fn bind(bind: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(bind)?;
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }
}

impl Datagram for UdpTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.socket.send(bytes)?;
        Ok(())
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Vec<u8>>, TransportError> {
        self.socket.set_read_timeout(timeout)?;
        match self.socket.recv_from(&mut self.buf) {
            Ok((len, peer)) => {
                // Pin the peer on first contact so replies have a target.
                if self.socket.peer_addr().is_err() {
                    self.socket.connect(peer)?;
                }
                Ok(Some(self.buf[..len].to_vec()))
            }
            Err(err)
                if timeout.is_some()
                    && matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                Ok(None)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }
}
