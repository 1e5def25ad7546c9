//! # knet-core
//!
//! Crypto orchestration (C1–C5) and per-link lifecycle/ACL (C6–C8) for a
//! redundant-link mesh transport. The TAP shim, ping driver, CLI, log
//! transport, address-parsing helpers and the concrete UDP/SCTP socket
//! layer are out of scope and appear here only as the [`transport::Transport`]
//! trait boundary a real socket layer would implement.

pub mod acl;
pub mod api;
pub mod crypto_instance;
pub mod error;
pub mod handle;
pub mod host;
pub mod link;
pub mod logger;
pub mod recv;
pub mod send;
pub mod transport;
pub mod workers;

pub use acl::{AclAction, AclEntry, AclMatchKind, AclTable};
pub use crypto_instance::{CryptoInstance, CryptoInstanceManager, DerivedSizes, MAX_CRYPTO_INSTANCES};
pub use error::{ErrnoClass, KnetError};
pub use handle::{
    DataFd, Handle, HandleConfig, HostNotifyFn, PmtudNotifyFn, RxClearTrafficPolicy, SockNotifyFn,
    SocketId,
};
pub use host::{Host, HostId, HostStatus};
pub use link::{Link, LinkConfig, LinkState, LinkStatus, TransportKind};
pub use logger::{ChannelLogger, LogLevel, LogRecord, Logger, NullLogger, StdoutLogger};
pub use recv::DecryptOutcome;
pub use transport::{Transport, TransportEvent};
pub use workers::WorkerPool;

/// Maximum channel id a `data_fd` can be registered against, per §4.7.
pub const MAX_CHANNEL: u8 = 32;
