//! The wire transport boundary (out-of-scope collaborator, §1).
//!
//! The concrete UDP/SCTP socket layer lives outside this crate; this
//! trait is the contract it would implement. `knet-harness` supplies an
//! in-memory fake against this trait for tests, mirroring how
//! `test-common.c` wraps the real (out-of-scope) socket code for the
//! original test suite.

use std::net::SocketAddr;

use crate::error::KnetError;

/// Result of a non-blocking receive attempt.
///
/// A distinct `WouldBlock` variant rather than an errno-style
/// `(errno == EAGAIN) || (errno = EWOULDBLOCK)` check sidesteps §9's
/// Open Question about that check's assignment-vs-comparison bug --
/// there is no errno sentinel to get wrong.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Data { src: SocketAddr, bytes: Vec<u8> },
    WouldBlock,
}

/// What a concrete socket layer must provide.
pub trait Transport: Send + Sync {
    fn send_to(&self, dst: SocketAddr, buf: &[u8]) -> Result<usize, KnetError>;
    fn recv_from(&self) -> Result<TransportEvent, KnetError>;
}
