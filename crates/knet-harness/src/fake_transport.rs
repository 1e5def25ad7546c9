//! Deterministic in-memory transport (§1 ambient addition).
//!
//! Stands in for the out-of-scope UDP/SCTP socket layer, the way
//! `original_source/libknet/tests/test-common.c` wraps the real socket
//! code for the test suite. Delivery is immediate and in-process: a
//! `send_to` on one [`InMemoryTransport`] makes the datagram visible to
//! the next `recv_from` on whichever transport is bound to the
//! destination address, on the same shared [`InMemoryNetwork`].

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use knet_core::{KnetError, Transport, TransportEvent};

type Inbox = VecDeque<(SocketAddr, Vec<u8>)>;

/// Shared routing table every [`InMemoryTransport`] bound against it
/// delivers into and drains from. Clone and hand a `bind` to each
/// simulated peer.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    inboxes: Arc<Mutex<HashMap<SocketAddr, Inbox>>>,
}

impl InMemoryNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a transport endpoint at `local`. Datagrams sent to `local`
    /// from any other endpoint on this network become visible to this
    /// transport's `recv_from`.
    #[must_use]
    pub fn bind(&self, local: SocketAddr) -> InMemoryTransport {
        self.inboxes.lock().unwrap().entry(local).or_default();
        InMemoryTransport {
            local,
            network: self.clone(),
        }
    }
}

/// One endpoint on an [`InMemoryNetwork`].
pub struct InMemoryTransport {
    local: SocketAddr,
    network: InMemoryNetwork,
}

impl Transport for InMemoryTransport {
    fn send_to(&self, dst: SocketAddr, buf: &[u8]) -> Result<usize, KnetError> {
        let mut inboxes = self.network.inboxes.lock().unwrap();
        let Some(inbox) = inboxes.get_mut(&dst) else {
            return Err(KnetError::Transport(format!("no such endpoint {dst}")));
        };
        inbox.push_back((self.local, buf.to_vec()));
        Ok(buf.len())
    }

    fn recv_from(&self) -> Result<TransportEvent, KnetError> {
        let mut inboxes = self.network.inboxes.lock().unwrap();
        let inbox = inboxes
            .get_mut(&self.local)
            .ok_or_else(|| KnetError::Transport(format!("unbound endpoint {}", self.local)))?;
        match inbox.pop_front() {
            Some((src, bytes)) => Ok(TransportEvent::Data { src, bytes }),
            None => Ok(TransportEvent::WouldBlock),
        }
    }
}
