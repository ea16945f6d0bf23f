//! In-process datagram transport over `std::sync::mpsc`.
//!
//! [`pair`] returns two connected endpoints with UDP-like semantics: FIFO
//! within one direction, fire-and-forget sends (a datagram addressed to a
//! peer that already went away is silently dropped, just as a UDP `sendto`
//! to a dead address succeeds), and an observable [`TransportError::Closed`]
//! once the peer endpoint is dropped and the inbound queue has drained.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use tracing::debug;

use crate::transport::{Datagram, TransportError};

pub struct ChannelTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

/// Two connected in-process endpoints.
pub fn pair() -> (ChannelTransport, ChannelTransport) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();
    (
        ChannelTransport { tx: a_tx, rx: a_rx },
        ChannelTransport { tx: b_tx, rx: b_rx },
    )
}

impl Datagram for ChannelTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if self.tx.send(bytes.to_vec()).is_err() {
            // Peer endpoint is gone; a datagram network would not notice.
            debug!("peer endpoint gone; datagram dropped");
        }
        Ok(())
    }

    fn recv(&mut self, timeout: Option<Duration>) -> Result<Option<Vec<u8>>, TransportError> {
        match timeout {
            Some(timeout) => match self.rx.recv_timeout(timeout) {
                Ok(bytes) => Ok(Some(bytes)),
                Err(RecvTimeoutError::Timeout) => Ok(None),
                Err(RecvTimeoutError::Disconnected) => Err(TransportError::Closed),
            },
            None => match self.rx.recv() {
                Ok(bytes) => Ok(Some(bytes)),
                Err(_) => Err(TransportError::Closed),
            },
        }
    }
}

impl ChannelTransport {
    /// Non-blocking drain, used by diagnostics and tests.
    pub fn try_recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        match self.rx.try_recv() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_both_directions() {
        let (mut a, mut b) = pair();
        a.send(b"to b").unwrap();
        b.send(b"to a").unwrap();
        assert_eq!(
            b.recv(Some(Duration::from_secs(1))).unwrap().as_deref(),
            Some(&b"to b"[..])
        );
        assert_eq!(
            a.recv(Some(Duration::from_secs(1))).unwrap().as_deref(),
            Some(&b"to a"[..])
        );
    }

    #[test]
    fn timeout_is_not_an_error() {
        let (mut a, _b) = pair();
        assert!(a.recv(Some(Duration::from_millis(10))).unwrap().is_none());
    }

    #[test]
    fn closed_peer_drains_then_fails_observably() {
        let (mut a, b) = pair();
        drop(b);
        assert!(matches!(
            a.recv(Some(Duration::from_millis(10))),
            Err(TransportError::Closed)
        ));
    }

    #[test]
    fn queued_datagrams_survive_peer_drop() {
        let (mut a, mut b) = pair();
        a.send(b"first").unwrap();
        a.send(b"second").unwrap();
        drop(a);
        assert_eq!(b.recv(None).unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(b.recv(None).unwrap().as_deref(), Some(&b"second"[..]));
        assert!(matches!(b.recv(None), Err(TransportError::Closed)));
    }

    #[test]
    fn send_to_dropped_peer_is_fire_and_forget() {
        let (mut a, b) = pair();
        drop(b);
        assert!(a.send(b"into the void").is_ok());
    }
}
