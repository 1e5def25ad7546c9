//! Backend-facing error type.
//!
//! Everything a backend can fail at: a bad key, a short ciphertext, a MAC
//! mismatch. Higher layers (`knet-core`) translate this into the broader
//! `KnetError` taxonomy; this type never leaks library-level concerns
//! (slots, handles) back down into backend code.

/// Failure reported by a [`crate::CryptoBackend`] operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// `init` was given a key/cipher/hash combination the backend rejects.
    #[error("invalid crypto configuration: {0}")]
    InvalidConfig(String),
    /// Ciphertext failed authentication (MAC/tag mismatch) or truncated input.
    #[error("decryption failed")]
    DecryptFailed,
    /// Encryption failed (e.g. nonce space exhausted, output buffer too small).
    #[error("encryption failed: {0}")]
    EncryptFailed(String),
    /// The backend's `init` hook failed for a reason specific to that backend.
    #[error("backend init failed: {0}")]
    InitFailed(String),
}
