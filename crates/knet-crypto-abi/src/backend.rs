//! The backend vtable contract (C1).
//!
//! A backend is a `dyn CryptoBackend` trait object. Every slot in the
//! instance manager's table is backed by exactly one `BackendInstance`,
//! produced by exactly one backend's `init`.

use std::any::Any;
use std::io::IoSlice;

use crate::config::CryptoConfig;
use crate::error::CryptoError;

/// Log severity passed into `decrypt` so a caller attempting several
/// alternate instances can demote the noise of expected failures.
///
/// Mirrors the original behaviour: a lone installed instance logs
/// decrypt failures at `Err` (a real problem); when multiple instances
/// are staged (mid key-rotation) the dominant "wrong key" case is
/// expected and logged at `Debug` until the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Err,
}

/// Opaque, backend-owned instance state plus the three sizes every caller
/// needs regardless of which backend produced them.
pub struct BackendInstance {
    /// Backend-private state. Only the backend that created it via `init`
    /// ever downcasts this; the core never reaches into it.
    state: Box<dyn Any + Send + Sync>,
    pub sec_block_size: usize,
    pub sec_hash_size: usize,
    pub sec_salt_size: usize,
}

impl BackendInstance {
    #[must_use]
    pub fn new<T: Any + Send + Sync>(
        state: T,
        sec_block_size: usize,
        sec_hash_size: usize,
        sec_salt_size: usize,
    ) -> Self {
        Self {
            state: Box::new(state),
            sec_block_size,
            sec_hash_size,
            sec_salt_size,
        }
    }

    /// Downcast to the concrete state a backend installed. Returns `None`
    /// if called by any backend other than the one that created it --
    /// this should never happen in practice since the registry always
    /// pairs an instance with the backend that produced it.
    #[must_use]
    pub fn state<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref::<T>()
    }
}

/// Contract every cipher+hash implementation must honour.
///
/// `fini` is optional (defaults to a no-op) -- most backends have nothing
/// to tear down beyond dropping `BackendInstance`, but a backend that
/// holds a handle into an external crypto library session can override
/// it.
pub trait CryptoBackend: Send + Sync {
    /// ABI version this backend was compiled against. Checked by the
    /// registry at load time against [`crate::CRYPTO_MODEL_ABI`].
    fn abi_ver(&self) -> u32;

    /// Validate `cfg` and produce a fresh, fully-initialised instance.
    ///
    /// On failure the backend must have cleaned up any partial state
    /// itself -- the caller will not invoke `fini` on a failed `init`.
    fn init(&self, cfg: &CryptoConfig) -> Result<BackendInstance, CryptoError>;

    /// Release backend-private resources held by `instance`, if any.
    fn fini(&self, _instance: &mut BackendInstance) {}

    /// Encrypt-and-sign a single contiguous buffer.
    fn crypt(&self, instance: &BackendInstance, buf_in: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Encrypt-and-sign a gathered vector of buffers as a single message.
    fn cryptv(
        &self,
        instance: &BackendInstance,
        iov: &[IoSlice<'_>],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Authenticate and decrypt. `log_level` hints how loudly the caller
    /// wants failures logged (see [`LogLevel`]); the backend itself does
    /// not log -- it is passed through so the caller (`knet-core`) can
    /// attach it to its own log record.
    fn decrypt(
        &self,
        instance: &BackendInstance,
        buf_in: &[u8],
        log_level: LogLevel,
    ) -> Result<Vec<u8>, CryptoError>;
}
