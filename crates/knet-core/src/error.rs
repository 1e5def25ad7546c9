//! Error taxonomy (§7).
//!
//! Five kinds, not five hundred variants: configuration, resource,
//! backend, policy, transport. `knet-abi` is the only place any of this
//! becomes an errno-shaped integer.

use knet_crypto_abi::CryptoError;

/// Which of §7's five kinds an error belongs to. Carried alongside
/// [`KnetError`] so the FFI boundary can map to an errno-equivalent
/// without re-deriving it from the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrnoClass {
    Configuration,
    Resource,
    Backend,
    Policy,
    Transport,
    /// §6/§7: the requested `crypto_model` isn't a built-in backend.
    NotSupported,
}

/// Top-level error returned by every `knet-core` operation.
#[derive(thiserror::Error, Debug)]
pub enum KnetError {
    #[error("configuration: {0}")]
    Configuration(String),
    #[error("resource: {0}")]
    Resource(String),
    /// No backend is registered under the requested `crypto_model` name
    /// (distinct from `Configuration`: this is §7's "unsupported
    /// backend -> not-supported" case, not a malformed argument).
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),
    #[error("backend: {0}")]
    Backend(#[from] CryptoError),
    /// Every installed instance failed to authenticate the packet.
    /// `failed_slot` names whichever slot produced the returned (last)
    /// error -- §9's Open Question resolution: the last alternate's
    /// error is preserved for compatibility, but the slot is now named
    /// rather than silently discarded.
    #[error("backend: decrypt failed on all installed instances (last: slot {failed_slot})")]
    DecryptExhausted {
        source: CryptoError,
        failed_slot: u8,
    },
    #[error("policy: acl rejected")]
    PolicyReject,
    #[error("transport: {0}")]
    Transport(String),
}

impl KnetError {
    /// The §7 kind this error belongs to, for the `knet-abi` boundary.
    #[must_use]
    pub fn class(&self) -> ErrnoClass {
        match self {
            KnetError::Configuration(_) => ErrnoClass::Configuration,
            KnetError::Resource(_) => ErrnoClass::Resource,
            KnetError::UnsupportedBackend(_) => ErrnoClass::NotSupported,
            KnetError::Backend(_) | KnetError::DecryptExhausted { .. } => ErrnoClass::Backend,
            KnetError::PolicyReject => ErrnoClass::Policy,
            KnetError::Transport(_) => ErrnoClass::Transport,
        }
    }
}
